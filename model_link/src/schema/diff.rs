//! Schema difference calculator
//!
//! Compares the live schema with the one the registered models describe.
//! Used by the `alter` sync mode only.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::schema::types::{Column, DatabaseSchema, Table};

/// Represents changes needed to bring `current` in line with `target`
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    pub tables_to_create: Vec<Table>,
    pub columns_to_add: IndexMap<String, Vec<Column>>,
    pub columns_to_drop: IndexMap<String, Vec<String>>,
    pub columns_to_alter: IndexMap<String, Vec<ColumnChange>>,
}

impl SchemaDiff {
    /// Generate a schema diff between two database schemas.
    ///
    /// Tables present only in `current` are left alone; they are not mapped
    /// by any model.
    pub fn generate(current_schema: &DatabaseSchema, target_schema: &DatabaseSchema) -> Self {
        let mut diff = SchemaDiff::default();

        for (table_name, target_table) in &target_schema.tables {
            let current_table = match current_schema.tables.get(table_name) {
                Some(table) => table,
                None => {
                    diff.tables_to_create.push(target_table.clone());
                    continue;
                }
            };

            let current_columns: HashMap<&str, &Column> = current_table
                .columns
                .iter()
                .map(|col| (col.name.as_str(), col))
                .collect();

            let add_columns: Vec<Column> = target_table
                .columns
                .iter()
                .filter(|col| !current_columns.contains_key(col.name.as_str()))
                .cloned()
                .collect();

            if !add_columns.is_empty() {
                diff.columns_to_add.insert(table_name.clone(), add_columns);
            }

            let drop_columns: Vec<String> = current_table
                .columns
                .iter()
                .filter(|col| target_table.column(&col.name).is_none())
                .map(|col| col.name.clone())
                .collect();

            if !drop_columns.is_empty() {
                diff.columns_to_drop.insert(table_name.clone(), drop_columns);
            }

            let alter_columns: Vec<ColumnChange> = target_table
                .columns
                .iter()
                .filter(|col| !target_table.is_primary_key(&col.name))
                .filter_map(|target_col| {
                    let current_col = current_columns.get(target_col.name.as_str())?;
                    if Self::column_needs_alteration(current_col, target_col) {
                        Some(ColumnChange {
                            column_name: target_col.name.clone(),
                            from: (*current_col).clone(),
                            to: target_col.clone(),
                        })
                    } else {
                        None
                    }
                })
                .collect();

            if !alter_columns.is_empty() {
                diff.columns_to_alter.insert(table_name.clone(), alter_columns);
            }
        }

        diff
    }

    /// Check if a column needs to be altered
    fn column_needs_alteration(current: &Column, target: &Column) -> bool {
        !current.data_type.eq_ignore_ascii_case(&target.data_type)
            || current.nullable != target.nullable
            || current.default != target.default
    }

    /// Check if the diff is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.tables_to_create.is_empty()
            && self.columns_to_add.is_empty()
            && self.columns_to_drop.is_empty()
            && self.columns_to_alter.is_empty()
    }
}

/// Represents a column change
#[derive(Debug, Clone)]
pub struct ColumnChange {
    pub column_name: String,
    pub from: Column,
    pub to: Column,
}
