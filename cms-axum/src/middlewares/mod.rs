pub mod authenticate;
pub mod tenant;

pub use authenticate::authenticate;
pub use tenant::bind_tenant;
