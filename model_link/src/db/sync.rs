//! Schema synchronization
//!
//! `init_schema` authenticates against the database and then applies one of
//! three sync policies to the models registered on the client. Both steps run
//! once, in order; the first failure is returned as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::connection::Client;
use crate::error::{Error, Result};
use crate::schema::analyzer::{Analyzer, PostgresAnalyzer};
use crate::schema::diff::SchemaDiff;
use crate::schema::generator::DdlGenerator;
use crate::schema::types::DatabaseSchema;

/// Schema application strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Create missing tables, never touch existing ones
    #[default]
    Sync,
    /// Drop and recreate every mapped table
    Force,
    /// Reshape existing tables to match the models
    Alter,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Sync => "sync",
            SyncMode::Force => "force",
            SyncMode::Alter => "alter",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sync" => Ok(SyncMode::Sync),
            "force" => Ok(SyncMode::Force),
            "alter" => Ok(SyncMode::Alter),
            other => Err(Error::InvalidSyncMode(other.to_string())),
        }
    }
}

/// Flags handed to the sync step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    pub force: bool,
    pub alter: bool,
}

impl From<SyncMode> for SyncOptions {
    fn from(mode: SyncMode) -> Self {
        match mode {
            SyncMode::Sync => SyncOptions {
                force: false,
                alter: false,
            },
            SyncMode::Force => SyncOptions {
                force: true,
                alter: false,
            },
            SyncMode::Alter => SyncOptions {
                force: false,
                alter: true,
            },
        }
    }
}

/// The two database operations the synchronizer depends on
#[async_trait]
pub trait SchemaClient {
    /// Probe the database; fails with [`Error::Authentication`]
    async fn authenticate(&self) -> Result<()>;

    /// Apply the registered models; fails with [`Error::Sync`]
    async fn sync(&self, options: SyncOptions) -> Result<()>;
}

/// Authenticate, then sync with the policy of `mode`. Resolves to the mode
/// that ran.
pub async fn init_schema<C>(client: &C, mode: SyncMode) -> Result<SyncMode>
where
    C: SchemaClient + Sync + ?Sized,
{
    client.authenticate().await?;
    client.sync(mode.into()).await?;

    tracing::info!(mode = %mode, "Schema synchronized");
    Ok(mode)
}

#[async_trait]
impl SchemaClient for Client {
    async fn authenticate(&self) -> Result<()> {
        let pool = self.pool().map_err(Error::Authentication)?;
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(Error::Authentication)?;
        Ok(())
    }

    async fn sync(&self, options: SyncOptions) -> Result<()> {
        let target = self
            .models()
            .to_database_schema(Some(self.options().schema.clone()))?;

        let current = if options.alter && !options.force {
            PostgresAnalyzer::new(self.pool().map_err(Error::Sync)?)
                .analyze_schema(&self.options().schema)
                .await?
        } else {
            DatabaseSchema::new(None)
        };

        let statements = plan(&target, &current, options);
        tracing::info!(
            tables = target.tables.len(),
            statements = statements.len(),
            force = options.force,
            alter = options.alter,
            "Applying schema"
        );

        for statement in &statements {
            self.execute(statement).await.map_err(Error::Sync)?;
        }

        Ok(())
    }
}

/// Statements that bring the database to `target` under `options`.
///
/// `current` is only consulted when altering.
pub fn plan(
    target: &DatabaseSchema,
    current: &DatabaseSchema,
    options: SyncOptions,
) -> Vec<String> {
    let generator = DdlGenerator::new();

    if options.force {
        let mut statements = generator.drop_all(target);
        statements.extend(generator.create_all(target));
        statements
    } else if options.alter {
        let diff = SchemaDiff::generate(current, target);
        generator.alter_to(&diff, target)
    } else {
        generator.create_all(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attribute, DataType, ModelRegistry, Model};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(SyncMode::Sync, false, false)]
    #[case(SyncMode::Force, true, false)]
    #[case(SyncMode::Alter, false, true)]
    fn mode_maps_to_flags(#[case] mode: SyncMode, #[case] force: bool, #[case] alter: bool) {
        assert_eq!(SyncOptions::from(mode), SyncOptions { force, alter });
    }

    #[rstest]
    #[case("sync", SyncMode::Sync)]
    #[case("FORCE", SyncMode::Force)]
    #[case(" alter ", SyncMode::Alter)]
    fn parses_known_modes(#[case] input: &str, #[case] expected: SyncMode) {
        assert_eq!(input.parse::<SyncMode>().unwrap(), expected);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(matches!(
            "truncate".parse::<SyncMode>(),
            Err(Error::InvalidSyncMode(mode)) if mode == "truncate"
        ));
        assert_eq!(SyncMode::default(), SyncMode::Sync);
    }

    fn target() -> DatabaseSchema {
        target_in(None)
    }

    fn target_in(schema_name: Option<String>) -> DatabaseSchema {
        let mut registry = ModelRegistry::new();
        registry
            .define(
                Model::new("provincia")
                    .table_name_as("provincias")
                    .attribute("nombre", Attribute::new(DataType::String(255))),
            )
            .unwrap();
        registry.to_database_schema(schema_name).unwrap()
    }

    #[test]
    fn sync_only_creates() {
        let statements = plan(&target(), &DatabaseSchema::new(None), SyncMode::Sync.into());

        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"provincias\""));
    }

    #[test]
    fn force_drops_before_creating() {
        let statements = plan(&target(), &DatabaseSchema::new(None), SyncMode::Force.into());

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "DROP TABLE IF EXISTS \"provincias\" CASCADE;");
        assert!(statements[1].starts_with("CREATE TABLE"));
    }

    #[test]
    fn alter_against_matching_schema_is_a_no_op() {
        let target = target();
        let statements = plan(&target, &target, SyncMode::Alter.into());

        assert!(statements.is_empty());
    }

    #[test]
    fn configured_schema_qualifies_every_statement() {
        let target = target_in(Some("tenant".to_string()));

        let statements = plan(&target, &DatabaseSchema::new(None), SyncMode::Force.into());

        assert_eq!(statements[0], "DROP TABLE IF EXISTS \"tenant\".\"provincias\" CASCADE;");
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS \"tenant\".\"provincias\""));
    }
}
