pub mod contacts_routes;
pub mod contacts_schema;
pub mod contacts_service;
pub mod contacts_shared;

pub use contacts_routes::router;
pub use contacts_service::ContactsService;
pub use contacts_shared::Contact;
