//! cms-axum: Axum adapter for the contacts backend.
//!
//! Provides the middleware that authenticates callers and binds their
//! tenant for the duration of a request, plus the shared error response,
//! body validation and paging parameter helpers used by the route modules.

pub mod app;
pub mod extract;
pub mod middlewares;
pub mod params;
pub mod validation;
mod error;

pub use app::CmsAxumApp;
pub use error::{map_json_rejection, CmsAxumError};
pub use extract::CurrentPrincipal;
pub use params::PageParams;
pub use validation::{validate, validated_body};
