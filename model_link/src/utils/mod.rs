//! Utilities for model_link
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

pub use naming::{get_foreign_key_name, get_table_name, quote_identifier, quote_literal};
