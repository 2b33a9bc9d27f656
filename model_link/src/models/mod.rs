//! Models module for model_link
//!
//! Model declarations, association registration and the registry a client
//! syncs from.

pub mod model;
pub mod registry;

pub use model::{
    Association, AssociationKind, AssociationOptions, Attribute, DataType, DefaultValue, Model,
    ModelDefinition, ModelOptions, ReferentialAction, ThroughOptions,
};
pub use registry::ModelRegistry;
