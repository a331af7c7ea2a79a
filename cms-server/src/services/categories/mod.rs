pub mod categories_routes;
pub mod categories_schema;
pub mod categories_service;
pub mod categories_shared;

pub use categories_routes::router;
pub use categories_service::CategoriesService;
pub use categories_shared::{Category, CATEGORY_NAME_FIELD};
