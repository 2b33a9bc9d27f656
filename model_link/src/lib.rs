//! model_link: connection, schema sync and association helpers for PostgreSQL
//! models.
//!
//! Build a client from a connection descriptor, declare models and link them
//! with one-to-one, many-to-one or many-to-many relations, then let
//! [`init_schema`] authenticate and create, recreate or alter the tables.
//!
//! ```no_run
//! use model_link::{build_connection, init_schema, relate, ConnectionConfig, Model, SyncMode};
//!
//! # async fn run() -> model_link::Result<()> {
//! let mut client = build_connection(&ConnectionConfig::from_env())?;
//!
//! let mut localidad = Model::new("localidad").table_name_as("localidades");
//! let mut provincia = Model::new("provincia").table_name_as("provincias");
//! relate("many-to-one", &mut localidad, &mut provincia, "provincia", "localidades", "provincia_id", None, None)?;
//!
//! client.define(localidad)?;
//! client.define(provincia)?;
//! init_schema(&client, SyncMode::Sync).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod relation;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::{ClientOptions, Config, ConnectionConfig, LoggingConfig};
pub use db::{build_connection, build_connection_with, init_schema, Client, SchemaClient, SyncMode, SyncOptions};
pub use error::{Error, Result};
pub use model_link_macros::Model;
pub use models::{
    Association, AssociationKind, AssociationOptions, Attribute, DataType, DefaultValue, Model,
    ModelDefinition, ModelRegistry, ReferentialAction, ThroughOptions,
};
pub use relation::{declare_relation, relate, Link, PivotLink, Relation, RelationKind};
