//! Schema module for model_link
//!
//! This module handles database schema analysis, comparison, and DDL
//! generation.

pub mod analyzer;
pub mod diff;
pub mod generator;
pub mod types;

// Re-export key types
pub use analyzer::{Analyzer, PostgresAnalyzer};
pub use diff::{ColumnChange, SchemaDiff};
pub use generator::DdlGenerator;
pub use types::{Column, DatabaseSchema, ForeignKey, PrimaryKey, Table};
