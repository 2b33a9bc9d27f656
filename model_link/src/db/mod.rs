//! Database module for model_link
//!
//! Client construction and schema synchronization.

pub mod connection;
pub mod sync;

// Re-export key types
pub use connection::{build_connection, build_connection_with, Client};
pub use sync::{init_schema, SchemaClient, SyncMode, SyncOptions};
