//! DDL generator
//!
//! Turns the target schema (and, for `alter`, a diff against the live one)
//! into Postgres statements. Every returned string holds exactly one
//! statement. Tables are qualified with the schema name when there is one.

use std::collections::HashSet;

use crate::schema::diff::{ColumnChange, SchemaDiff};
use crate::schema::types::{Column, DatabaseSchema, ForeignKey, Table};
use crate::utils::naming::quote_identifier;

/// Postgres DDL generator
#[derive(Debug, Default, Clone)]
pub struct DdlGenerator {
    schema_name: Option<String>,
}

impl DdlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose single-table statements are qualified with `schema_name`
    pub fn with_schema(schema_name: Option<String>) -> Self {
        Self { schema_name }
    }

    /// Same generator, qualified by `schema` when it names one
    fn scoped_to(&self, schema: &DatabaseSchema) -> Self {
        Self {
            schema_name: schema
                .schema_name
                .clone()
                .or_else(|| self.schema_name.clone()),
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` for every table, referenced tables first.
    ///
    /// Foreign keys closing a reference cycle are added after every table of
    /// the cycle exists.
    pub fn create_all(&self, schema: &DatabaseSchema) -> Vec<String> {
        self.scoped_to(schema).create_ordered(&order_tables(schema))
    }

    /// `DROP TABLE IF EXISTS ... CASCADE` for every table, dependents first
    pub fn drop_all(&self, schema: &DatabaseSchema) -> Vec<String> {
        let generator = self.scoped_to(schema);
        order_tables(schema)
            .tables
            .into_iter()
            .rev()
            .map(|table| generator.drop_table_sql(&table.name))
            .collect()
    }

    /// Statements applying an `alter` diff; `target` supplies foreign keys
    /// for added columns
    pub fn alter_to(&self, diff: &SchemaDiff, target: &DatabaseSchema) -> Vec<String> {
        let generator = self.scoped_to(target);

        let mut creatable = DatabaseSchema::new(target.schema_name.clone());
        for table in &diff.tables_to_create {
            creatable.add_table(table.clone());
        }
        let mut statements = generator.create_ordered(&order_tables(&creatable));

        for (table_name, columns) in &diff.columns_to_add {
            let target_table = target.table(table_name);
            for column in columns {
                let fk = target_table.and_then(|t| t.foreign_key_for(&column.name));
                statements.push(generator.add_column_sql(table_name, column, fk));
            }
        }

        for (table_name, changes) in &diff.columns_to_alter {
            for change in changes {
                statements.extend(generator.alter_column_sql(table_name, change));
            }
        }

        for (table_name, column_names) in &diff.columns_to_drop {
            for column_name in column_names {
                statements.push(generator.drop_column_sql(table_name, column_name));
            }
        }

        statements
    }

    fn create_ordered(&self, order: &TableOrder<'_>) -> Vec<String> {
        let mut statements: Vec<String> = order
            .tables
            .iter()
            .map(|table| self.create_table_with(table, |fk| !order.is_deferred(table, fk)))
            .collect();

        // DROP first so a rerun of `sync` does not trip over an existing constraint
        for (table, fk) in &order.deferred {
            statements.push(self.drop_constraint_sql(&table.name, &fk.name));
            statements.push(self.add_foreign_key_sql(&table.name, fk));
        }

        statements
    }

    /// Generate SQL to create a table, foreign keys inline
    pub fn create_table_sql(&self, table: &Table) -> String {
        self.create_table_with(table, |_| true)
    }

    fn create_table_with<F>(&self, table: &Table, inline: F) -> String
    where
        F: Fn(&ForeignKey) -> bool,
    {
        let mut definitions: Vec<String> = table
            .columns
            .iter()
            .map(|column| format!("  {}", column_definition(column)))
            .collect();

        if let Some(pk) = &table.primary_key {
            if !pk.columns.is_empty() {
                definitions.push(format!("  PRIMARY KEY ({})", quote_list(&pk.columns)));
            }
        }

        for fk in table.foreign_keys.iter().filter(|fk| inline(*fk)) {
            definitions.push(format!(
                "  CONSTRAINT {} FOREIGN KEY ({}) {}",
                quote_identifier(&fk.name),
                quote_list(&fk.columns),
                self.references_clause(fk)
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            self.table_ref(&table.name),
            definitions.join(",\n")
        )
    }

    /// Generate SQL to drop a table
    pub fn drop_table_sql(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE;", self.table_ref(table_name))
    }

    /// Generate SQL to add a column, with its reference if it is a foreign key
    pub fn add_column_sql(&self, table_name: &str, column: &Column, fk: Option<&ForeignKey>) -> String {
        let reference = fk
            .map(|fk| format!(" {}", self.references_clause(fk)))
            .unwrap_or_default();

        format!(
            "ALTER TABLE {} ADD COLUMN {}{};",
            self.table_ref(table_name),
            column_definition(column),
            reference
        )
    }

    /// Generate SQL to drop a column
    pub fn drop_column_sql(&self, table_name: &str, column_name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.table_ref(table_name),
            quote_identifier(column_name)
        )
    }

    pub fn add_foreign_key_sql(&self, table_name: &str, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) {};",
            self.table_ref(table_name),
            quote_identifier(&fk.name),
            quote_list(&fk.columns),
            self.references_clause(fk)
        )
    }

    pub fn drop_constraint_sql(&self, table_name: &str, constraint_name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {};",
            self.table_ref(table_name),
            quote_identifier(constraint_name)
        )
    }

    /// Generate SQL to alter type, nullability and default of a column
    pub fn alter_column_sql(&self, table_name: &str, change: &ColumnChange) -> Vec<String> {
        let table = self.table_ref(table_name);
        let column = quote_identifier(&change.column_name);
        let mut statements = Vec::new();

        if !change.from.data_type.eq_ignore_ascii_case(&change.to.data_type) {
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{};",
                table, column, change.to.data_type, column, change.to.data_type
            ));
        }

        if change.from.nullable != change.to.nullable {
            let action = if change.to.nullable {
                "DROP NOT NULL"
            } else {
                "SET NOT NULL"
            };
            statements.push(format!("ALTER TABLE {} ALTER COLUMN {} {};", table, column, action));
        }

        if change.from.default != change.to.default {
            match &change.to.default {
                Some(default_val) => statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                    table, column, default_val
                )),
                None => statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
                    table, column
                )),
            }
        }

        statements
    }

    fn table_ref(&self, table_name: &str) -> String {
        match &self.schema_name {
            Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(table_name)),
            None => quote_identifier(table_name),
        }
    }

    fn references_clause(&self, fk: &ForeignKey) -> String {
        format!(
            "REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
            self.table_ref(&fk.ref_table),
            quote_list(&fk.ref_columns),
            fk.on_delete.as_deref().unwrap_or("NO ACTION"),
            fk.on_update.as_deref().unwrap_or("NO ACTION")
        )
    }
}

fn column_definition(column: &Column) -> String {
    let default = column
        .default
        .as_ref()
        .map(|value| format!(" DEFAULT {}", value))
        .unwrap_or_default();
    let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
    let unique = if column.is_unique { " UNIQUE" } else { "" };

    format!(
        "{} {}{} {}{}",
        quote_identifier(&column.name),
        column.data_type,
        default,
        nullable,
        unique
    )
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Creation order of a schema's tables
#[derive(Debug, Default)]
pub struct TableOrder<'a> {
    /// Every referenced table precedes the tables pointing at it
    pub tables: Vec<&'a Table>,
    /// Foreign keys that close a cycle; added once all tables exist
    pub deferred: Vec<(&'a Table, &'a ForeignKey)>,
}

impl TableOrder<'_> {
    fn is_deferred(&self, table: &Table, fk: &ForeignKey) -> bool {
        self.deferred
            .iter()
            .any(|(owner, deferred)| owner.name == table.name && deferred.name == fk.name)
    }
}

/// Order tables so every referenced table precedes the tables pointing at it.
///
/// References to tables outside `schema` and self references are ignored. A
/// reference back into a table still being visited is deferred instead.
pub fn order_tables(schema: &DatabaseSchema) -> TableOrder<'_> {
    let mut order = TableOrder::default();
    let mut done: HashSet<&str> = HashSet::new();
    let mut visiting: HashSet<&str> = HashSet::new();

    for table in schema.tables.values() {
        visit(schema, table, &mut visiting, &mut done, &mut order);
    }

    order
}

fn visit<'a>(
    schema: &'a DatabaseSchema,
    table: &'a Table,
    visiting: &mut HashSet<&'a str>,
    done: &mut HashSet<&'a str>,
    order: &mut TableOrder<'a>,
) {
    if done.contains(table.name.as_str()) {
        return;
    }
    visiting.insert(table.name.as_str());

    for fk in &table.foreign_keys {
        if fk.ref_table == table.name {
            continue;
        }
        if visiting.contains(fk.ref_table.as_str()) {
            order.deferred.push((table, fk));
            continue;
        }
        if let Some(referenced) = schema.tables.get(&fk.ref_table) {
            visit(schema, referenced, visiting, done, order);
        }
    }

    visiting.remove(table.name.as_str());
    done.insert(table.name.as_str());
    order.tables.push(table);
}
