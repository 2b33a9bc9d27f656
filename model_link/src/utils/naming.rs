//! Naming utilities for model_link
//!
//! Table-name derivation, constraint names and identifier quoting.

use inflector::Inflector;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

/// Default table name for a model: snake_case, pluralized
pub fn get_table_name(model_name: &str) -> String {
    model_name.to_snake_case().to_plural()
}

/// Foreign key constraint name, `fk_{table}_{column}`
pub fn get_foreign_key_name(table_name: &str, column_name: &str) -> String {
    format!("fk_{}_{}", table_name, column_name)
}

/// Plain Postgres identifier: a letter or underscore, then at most 62 word characters
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Double-quote an identifier for Postgres
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal for Postgres
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_plural_snake_case() {
        assert_eq!(get_table_name("UserProfile"), "user_profiles");
        assert_eq!(get_table_name("provincia"), "provincias");
    }

    #[test]
    fn foreign_key_names_embed_table_and_column() {
        assert_eq!(
            get_foreign_key_name("localidades", "provincia_id"),
            "fk_localidades_provincia_id"
        );
    }

    #[test]
    fn identifier_rules() {
        assert!(is_valid_identifier("provincia_id"));
        assert!(is_valid_identifier("_hidden"));
        assert!(!is_valid_identifier("1st"));
        assert!(!is_valid_identifier("drop table"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier(&"a".repeat(64)));
    }

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_identifier("localidades"), "\"localidades\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("O'Higgins"), "'O''Higgins'");
    }
}
