//! Model registry for model_link
//!
//! Holds the models handed to a client and maps them, together with their
//! associations, onto the tables the schema sync creates.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::model::{Association, AssociationKind, Model, ReferentialAction};
use crate::schema::types::{Column, DatabaseSchema, ForeignKey, PrimaryKey, Table};
use crate::utils::naming::get_foreign_key_name;

/// Registry of declared models, in definition order
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Model>,
}

impl ModelRegistry {
    /// Create a new model registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its name
    pub fn define(&mut self, model: Model) -> Result<()> {
        model.validate()?;

        if self.models.contains_key(model.name()) {
            return Err(Error::ModelDefinition(format!(
                "Model {} is already defined",
                model.name()
            )));
        }

        tracing::debug!(model = model.name(), table = model.table_name(), "Defined model");
        self.models.insert(model.name().to_string(), model);
        Ok(())
    }

    /// Get all registered models
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Get a specific model by name
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Convert registered models to the target database schema
    pub fn to_database_schema(&self, schema_name: Option<String>) -> Result<DatabaseSchema> {
        let mut schema = DatabaseSchema::new(schema_name);

        for model in self.models.values() {
            schema.add_table(model_table(model));
        }

        let model_tables: HashSet<String> = self
            .models
            .values()
            .map(|model| model.table_name().to_string())
            .collect();

        for model in self.models.values() {
            for association in model.associations() {
                apply_association(&mut schema, model, association, &model_tables)?;
            }
        }

        Ok(schema)
    }
}

/// Table for a model's own attributes, primary key and timestamps
fn model_table(model: &Model) -> Table {
    let mut table = Table::new(model.table_name());

    let explicit_pk = model
        .attributes()
        .iter()
        .find(|(_, attribute)| attribute.primary_key)
        .map(|(name, _)| name.clone());

    let pk_column = match explicit_pk {
        Some(name) => name,
        None => {
            table.add_column(Column::new("id", "SERIAL"));
            "id".to_string()
        }
    };

    for (name, attribute) in model.attributes() {
        let mut column = Column::new(name, &attribute.data_type.sql_type())
            .nullable(attribute.allow_null)
            .unique(attribute.unique && !attribute.primary_key);
        if let Some(default) = &attribute.default_value {
            column = column.default(&default.to_sql());
        }
        table.add_column(column);
    }

    table.set_primary_key(PrimaryKey {
        columns: vec![pk_column],
    });

    if model.options().timestamps {
        for name in ["created_at", "updated_at"] {
            table.add_column(
                Column::new(name, "TIMESTAMP WITH TIME ZONE").default("CURRENT_TIMESTAMP"),
            );
        }
    }

    if model.options().paranoid {
        table.add_column(Column::new("deleted_at", "TIMESTAMP WITH TIME ZONE").nullable(true));
    }

    table
}

/// Add the foreign key column and constraint an association implies
fn apply_association(
    schema: &mut DatabaseSchema,
    model: &Model,
    association: &Association,
    model_tables: &HashSet<String>,
) -> Result<()> {
    ensure_table(schema, &association.target_table, &association.target)?;

    match association.kind {
        AssociationKind::BelongsTo => add_reference(
            schema,
            model.table_name(),
            &association.target_table,
            association,
            true,
        ),
        AssociationKind::HasOne | AssociationKind::HasMany => add_reference(
            schema,
            &association.target_table,
            model.table_name(),
            association,
            true,
        ),
        AssociationKind::BelongsToMany => {
            let through = association.through.as_deref().ok_or_else(|| {
                Error::ModelDefinition(format!(
                    "Association '{}' on {} has no pivot table",
                    association.alias,
                    model.name()
                ))
            })?;

            // A pivot that was not registered as a model gets a bare join
            // table keyed on both foreign keys
            let join_table = !model_tables.contains(through);
            if join_table && schema.table(through).is_none() {
                let mut pivot = Table::new(through);
                pivot.set_primary_key(PrimaryKey {
                    columns: Vec::new(),
                });
                schema.add_table(pivot);
            }

            add_reference(schema, through, model.table_name(), association, false)?;

            if join_table {
                if let Some(pk) = schema
                    .table_mut(through)
                    .and_then(|pivot| pivot.primary_key.as_mut())
                {
                    if !pk.columns.contains(&association.foreign_key) {
                        pk.columns.push(association.foreign_key.clone());
                    }
                }
            }

            Ok(())
        }
    }
}

fn ensure_table(schema: &DatabaseSchema, table: &str, model: &str) -> Result<()> {
    if schema.table(table).is_none() {
        return Err(Error::ModelDefinition(format!(
            "Associated model {} (table {}) is not registered",
            model, table
        )));
    }
    Ok(())
}

/// Put `association.foreign_key` on `owner` referencing `referenced`
fn add_reference(
    schema: &mut DatabaseSchema,
    owner: &str,
    referenced: &str,
    association: &Association,
    nullable: bool,
) -> Result<()> {
    let (on_delete, on_update) = if association.kind == AssociationKind::BelongsToMany {
        (ReferentialAction::Cascade, ReferentialAction::Cascade)
    } else {
        (
            association.on_delete.unwrap_or(ReferentialAction::SetNull),
            association.on_update.unwrap_or(ReferentialAction::Cascade),
        )
    };

    let table = schema.table_mut(owner).ok_or_else(|| {
        Error::ModelDefinition(format!("Table {} is not registered", owner))
    })?;

    table.add_column(Column::new(&association.foreign_key, "INTEGER").nullable(nullable));
    table.add_foreign_key(ForeignKey {
        name: get_foreign_key_name(owner, &association.foreign_key),
        columns: vec![association.foreign_key.clone()],
        ref_table: referenced.to_string(),
        ref_columns: vec![association.source_key.clone()],
        on_delete: Some(on_delete.to_string()),
        on_update: Some(on_update.to_string()),
    });

    Ok(())
}
