//! Model declarations and association registration

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};
use crate::utils::naming::{get_table_name, is_valid_identifier, quote_literal};

/// Column type of a declared attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    String(u32),
    Text,
    Integer,
    BigInt,
    Float,
    Double,
    Boolean,
    /// Timestamp with time zone
    Date,
    DateOnly,
    Uuid,
    Json,
}

impl DataType {
    /// Postgres type used in DDL
    pub fn sql_type(&self) -> String {
        match self {
            DataType::String(len) => format!("VARCHAR({})", len),
            DataType::Text => "TEXT".to_string(),
            DataType::Integer => "INTEGER".to_string(),
            DataType::BigInt => "BIGINT".to_string(),
            DataType::Float => "REAL".to_string(),
            DataType::Double => "DOUBLE PRECISION".to_string(),
            DataType::Boolean => "BOOLEAN".to_string(),
            DataType::Date => "TIMESTAMP WITH TIME ZONE".to_string(),
            DataType::DateOnly => "DATE".to_string(),
            DataType::Uuid => "UUID".to_string(),
            DataType::Json => "JSONB".to_string(),
        }
    }
}

/// Default value of an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DefaultValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// `CURRENT_TIMESTAMP`
    Now,
}

impl DefaultValue {
    /// SQL expression for a `DEFAULT` clause
    pub fn to_sql(&self) -> String {
        match self {
            DefaultValue::Text(value) => quote_literal(value),
            DefaultValue::Integer(value) => value.to_string(),
            DefaultValue::Float(value) => value.to_string(),
            DefaultValue::Boolean(value) => value.to_string(),
            DefaultValue::Now => "CURRENT_TIMESTAMP".to_string(),
        }
    }
}

/// A declared attribute (column) of a model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub data_type: DataType,
    pub allow_null: bool,
    pub default_value: Option<DefaultValue>,
    pub primary_key: bool,
    pub unique: bool,
}

impl Attribute {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            allow_null: true,
            default_value: None,
            primary_key: false,
            unique: false,
        }
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        if primary_key {
            self.allow_null = false;
        }
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }
}

/// Referential action applied to a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
        };
        f.write_str(action)
    }
}

/// Kind of association registered on a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

/// An association registered on a source model, pointing at `target`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Association {
    pub kind: AssociationKind,
    /// Target model name
    pub target: String,
    pub target_table: String,
    /// Accessor name on the source model
    pub alias: String,
    pub foreign_key: String,
    pub source_key: String,
    /// Pivot table for many-to-many
    pub through: Option<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl Association {
    /// Whether the accessor yields a collection rather than a single row
    pub fn is_collection(&self) -> bool {
        matches!(
            self.kind,
            AssociationKind::HasMany | AssociationKind::BelongsToMany
        )
    }
}

/// Options for `belongs_to`, `has_one` and `has_many`
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationOptions {
    pub alias: String,
    pub foreign_key: String,
    pub source_key: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl AssociationOptions {
    /// Options keyed on `foreign_key`, exposed as `alias`, sourced from `id`
    pub fn new(alias: &str, foreign_key: &str) -> Self {
        Self {
            alias: alias.to_string(),
            foreign_key: foreign_key.to_string(),
            source_key: "id".to_string(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Options for `belongs_to_many`
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughOptions {
    pub alias: String,
    /// Pivot table name
    pub through: String,
    pub foreign_key: String,
    pub source_key: String,
}

impl ThroughOptions {
    pub fn new(alias: &str, through: &Model, foreign_key: &str) -> Self {
        Self {
            alias: alias.to_string(),
            through: through.table_name().to_string(),
            foreign_key: foreign_key.to_string(),
            source_key: "id".to_string(),
        }
    }
}

/// Table-level options of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelOptions {
    /// Maintain `created_at` / `updated_at`
    pub timestamps: bool,
    /// Soft delete through a `deleted_at` column
    pub paranoid: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            timestamps: true,
            paranoid: false,
        }
    }
}

/// A declared, table-backed data entity.
///
/// Models are plain values owned by the caller. Associations are registered
/// on them in place and picked up by the schema sync once the model is
/// handed to a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    name: String,
    table_name: String,
    attributes: IndexMap<String, Attribute>,
    options: ModelOptions,
    associations: Vec<Association>,
}

impl Model {
    /// Declare a model; the table name defaults to the pluralized snake_case name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            table_name: get_table_name(name),
            attributes: IndexMap::new(),
            options: ModelOptions::default(),
            associations: Vec::new(),
        }
    }

    pub fn table_name_as(mut self, table_name: &str) -> Self {
        self.table_name = table_name.to_string();
        self
    }

    pub fn paranoid(mut self, paranoid: bool) -> Self {
        self.options.paranoid = paranoid;
        self
    }

    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.options.timestamps = timestamps;
        self
    }

    pub fn attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn attributes(&self) -> &IndexMap<String, Attribute> {
        &self.attributes
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Look up an association by its accessor name
    pub fn association(&self, alias: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.alias == alias)
    }

    /// Check table, column and key names before the model is registered
    pub fn validate(&self) -> Result<()> {
        if !is_valid_identifier(&self.table_name) {
            return Err(Error::ModelDefinition(format!(
                "Invalid table name '{}' for model {}",
                self.table_name, self.name
            )));
        }

        for column in self.attributes.keys() {
            if !is_valid_identifier(column) {
                return Err(Error::ModelDefinition(format!(
                    "Invalid column name '{}' on model {}",
                    column, self.name
                )));
            }
        }

        if self.attributes.values().filter(|a| a.primary_key).count() > 1 {
            return Err(Error::ModelDefinition(format!(
                "Model {} declares more than one primary key",
                self.name
            )));
        }

        Ok(())
    }

    /// Fails if `alias` is already taken or `key` is not a usable column name
    pub fn check_association(&self, alias: &str, key: &str) -> Result<()> {
        if alias.is_empty() {
            return Err(Error::ModelDefinition(format!(
                "Empty association alias on model {}",
                self.name
            )));
        }

        if self.association(alias).is_some() {
            return Err(Error::ModelDefinition(format!(
                "Association '{}' is already registered on model {}",
                alias, self.name
            )));
        }

        if !is_valid_identifier(key) {
            return Err(Error::ModelDefinition(format!(
                "Invalid foreign key '{}' for association '{}'",
                key, alias
            )));
        }

        Ok(())
    }

    /// Foreign key on this model's table referencing `target`
    pub fn belongs_to(&mut self, target: &Model, options: AssociationOptions) -> Result<()> {
        self.register(AssociationKind::BelongsTo, target, options)
    }

    /// Foreign key on `target`'s table referencing this model, singular accessor
    pub fn has_one(&mut self, target: &Model, options: AssociationOptions) -> Result<()> {
        self.register(AssociationKind::HasOne, target, options)
    }

    /// Foreign key on `target`'s table referencing this model, collection accessor
    pub fn has_many(&mut self, target: &Model, options: AssociationOptions) -> Result<()> {
        self.register(AssociationKind::HasMany, target, options)
    }

    /// Collection accessor through a pivot table holding `foreign_key`
    pub fn belongs_to_many(&mut self, target: &Model, options: ThroughOptions) -> Result<()> {
        self.check_association(&options.alias, &options.foreign_key)?;

        self.associations.push(Association {
            kind: AssociationKind::BelongsToMany,
            target: target.name.clone(),
            target_table: target.table_name.clone(),
            alias: options.alias,
            foreign_key: options.foreign_key,
            source_key: options.source_key,
            through: Some(options.through),
            on_delete: None,
            on_update: None,
        });

        Ok(())
    }

    fn register(
        &mut self,
        kind: AssociationKind,
        target: &Model,
        options: AssociationOptions,
    ) -> Result<()> {
        self.check_association(&options.alias, &options.foreign_key)?;

        self.associations.push(Association {
            kind,
            target: target.name.clone(),
            target_table: target.table_name.clone(),
            alias: options.alias,
            foreign_key: options.foreign_key,
            source_key: options.source_key,
            through: None,
            on_delete: options.on_delete,
            on_update: options.on_update,
        });

        Ok(())
    }
}

/// A type that declares a model, usually through `#[derive(Model)]`
pub trait ModelDefinition {
    /// Build the model declaration
    fn define() -> Model;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn provincia() -> Model {
        Model::new("provincia")
            .attribute("nombre", Attribute::new(DataType::String(255)))
    }

    #[test]
    fn table_name_defaults_to_plural_snake_case() {
        assert_eq!(Model::new("CiudadCapital").table_name(), "ciudad_capitals");
        assert_eq!(
            Model::new("provincia").table_name_as("provincias").table_name(),
            "provincias"
        );
    }

    #[test]
    fn default_values_render_as_sql() {
        assert_eq!(DefaultValue::Text("Desconocido".into()).to_sql(), "'Desconocido'");
        assert_eq!(DefaultValue::Integer(7).to_sql(), "7");
        assert_eq!(DefaultValue::Boolean(false).to_sql(), "false");
        assert_eq!(DefaultValue::Now.to_sql(), "CURRENT_TIMESTAMP");
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let target = provincia();
        let mut source = Model::new("localidad");

        source
            .belongs_to(&target, AssociationOptions::new("provincia", "provincia_id"))
            .unwrap();
        let err = source
            .belongs_to(&target, AssociationOptions::new("provincia", "provincia_id"))
            .unwrap_err();

        assert!(matches!(err, Error::ModelDefinition(_)));
        assert_eq!(source.associations().len(), 1);
    }

    #[test]
    fn validate_rejects_bad_identifiers() {
        let bad_table = Model::new("x").table_name_as("bad table");
        assert!(bad_table.validate().is_err());

        let bad_column = Model::new("x").attribute("1col", Attribute::new(DataType::Integer));
        assert!(bad_column.validate().is_err());

        let two_pks = Model::new("x")
            .attribute("a", Attribute::new(DataType::Integer).primary_key(true))
            .attribute("b", Attribute::new(DataType::Integer).primary_key(true));
        assert!(two_pks.validate().is_err());

        assert!(provincia().validate().is_ok());
    }

    #[test]
    fn collection_accessors() {
        let target = provincia();
        let mut source = Model::new("localidad");
        source
            .has_many(&target, AssociationOptions::new("items", "localidad_id"))
            .unwrap();
        source
            .has_one(&target, AssociationOptions::new("capital", "localidad_id"))
            .unwrap();

        assert!(source.association("items").unwrap().is_collection());
        assert!(!source.association("capital").unwrap().is_collection());
    }
}
