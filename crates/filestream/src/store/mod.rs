//! # Store
//!
//! Directory-rooted namespaces and the schemas that name objects inside them.

mod file_store;
mod schema;

pub use file_store::Store;
pub use schema::ObjectSchema;
