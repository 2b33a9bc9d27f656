//! Database schema analyzer
//!
//! Reads the live table and column layout from `information_schema` so the
//! `alter` sync mode can diff against it.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::error::{Error, Result};
use crate::schema::types::{Column, DatabaseSchema, Table};

/// Schema analyzer trait
#[async_trait]
pub trait Analyzer {
    /// Analyze the tables of `schema_name`
    async fn analyze_schema(&self, schema_name: &str) -> Result<DatabaseSchema>;
}

#[derive(FromRow)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    data_type: String,
    is_nullable: String,
    column_default: Option<String>,
    character_maximum_length: Option<i32>,
}

/// PostgreSQL schema analyzer
pub struct PostgresAnalyzer<'a> {
    pool: &'a PgPool,
}

impl<'a> PostgresAnalyzer<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl<'a> Analyzer for PostgresAnalyzer<'a> {
    async fn analyze_schema(&self, schema_name: &str) -> Result<DatabaseSchema> {
        let mut db_schema = DatabaseSchema::new(Some(schema_name.to_string()));

        // information_schema columns are domain types; cast so they decode as text
        let sql = r#"
            SELECT
                c.table_name::text AS table_name,
                c.column_name::text AS column_name,
                c.data_type::text AS data_type,
                c.is_nullable::text AS is_nullable,
                c.column_default::text AS column_default,
                c.character_maximum_length::int4 AS character_maximum_length
            FROM information_schema.columns c
            JOIN information_schema.tables t
              ON t.table_schema = c.table_schema AND t.table_name = c.table_name
            WHERE c.table_schema = $1 AND t.table_type = 'BASE TABLE'
            ORDER BY c.table_name, c.ordinal_position
        "#;

        let rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(schema_name)
            .fetch_all(self.pool)
            .await
            .map_err(Error::Sync)?;

        for row in rows {
            if db_schema.table(&row.table_name).is_none() {
                db_schema.add_table(Table::new(&row.table_name));
            }

            let column = Column {
                name: row.column_name,
                data_type: normalize_type(&row.data_type, row.character_maximum_length),
                nullable: row.is_nullable == "YES",
                default: row.column_default.as_deref().map(normalize_default),
                is_unique: false,
            };

            if let Some(table) = db_schema.table_mut(&row.table_name) {
                table.add_column(column);
            }
        }

        Ok(db_schema)
    }
}

/// Map an `information_schema` type name onto the spelling the generator emits
pub fn normalize_type(data_type: &str, max_length: Option<i32>) -> String {
    match (data_type, max_length) {
        ("character varying", Some(len)) => format!("VARCHAR({})", len),
        ("character varying", None) => "VARCHAR".to_string(),
        ("character", Some(len)) => format!("CHAR({})", len),
        _ => data_type.to_uppercase(),
    }
}

const NUMERIC_CASTS: [&str; 6] = [
    "smallint",
    "integer",
    "bigint",
    "numeric",
    "real",
    "double precision",
];

/// Strip the type cast Postgres appends to literal defaults.
///
/// Negative numbers come back quoted (`'-1'::integer`) and lose the quotes too.
pub fn normalize_default(default: &str) -> String {
    match default.rfind("'::") {
        Some(idx) if default.starts_with('\'') && idx > 0 => {
            let inner = &default[1..idx];
            let cast = &default[idx + 3..];
            if NUMERIC_CASTS.contains(&cast) && inner.parse::<f64>().is_ok() {
                inner.to_string()
            } else {
                default[..=idx].to_string()
            }
        }
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_match_generated_spelling() {
        assert_eq!(normalize_type("character varying", Some(255)), "VARCHAR(255)");
        assert_eq!(normalize_type("integer", None), "INTEGER");
        assert_eq!(
            normalize_type("timestamp with time zone", None),
            "TIMESTAMP WITH TIME ZONE"
        );
        assert_eq!(normalize_type("jsonb", None), "JSONB");
    }

    #[test]
    fn literal_defaults_lose_their_cast() {
        assert_eq!(
            normalize_default("'Desconocido'::character varying"),
            "'Desconocido'"
        );
        assert_eq!(normalize_default("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
        assert_eq!(
            normalize_default("nextval('provincias_id_seq'::regclass)"),
            "nextval('provincias_id_seq'::regclass)"
        );
        assert_eq!(normalize_default("0"), "0");
    }

    #[test]
    fn quoted_numbers_compare_equal_to_generated_defaults() {
        assert_eq!(normalize_default("'-1'::integer"), "-1");
        assert_eq!(normalize_default("'-2.5'::double precision"), "-2.5");
        assert_eq!(normalize_default("'42'::character varying"), "'42'");
        assert_eq!(normalize_default("''::character varying"), "''");
    }
}
