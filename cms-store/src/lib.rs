//! cms-store: storage drivers and tenant-routed repositories.

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod repository;

#[cfg(feature = "memory")]
pub use memory::MemoryDriver;
#[cfg(feature = "mongodb")]
pub use mongo::MongoDriver;
pub use repository::{new_id, Record, Repository};
