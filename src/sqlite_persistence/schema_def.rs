//! Declarative SQLite schema definitions.
//!
//! Tables are declared as consts and created/validated on open, so a store
//! refuses to run against a database whose shape drifted from the code.

use anyhow::{bail, Result};
use rusqlite::Connection;

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // unused_mut: only mutated when optional assignments are passed
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn sql(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
    /// Always `ON DELETE CASCADE`; subtree removal rides on this.
    pub foreign_key: Option<&'static ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut columns_sql = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let mut sql = format!("{} {}", column.name, column.sql_type.sql());
            if column.is_primary_key {
                sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                sql.push_str(" NOT NULL");
            }
            if let Some(default_value) = column.default_value {
                sql.push_str(&format!(" DEFAULT {}", default_value));
            }
            if let Some(fk) = column.foreign_key {
                sql.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE CASCADE",
                    fk.foreign_table, fk.foreign_column
                ));
            }
            columns_sql.push(sql);
        }
        for unique in self.unique_constraints {
            columns_sql.push(format!("UNIQUE ({})", unique.join(", ")));
        }
        conn.execute(
            &format!("CREATE TABLE {} ({})", self.name, columns_sql.join(", ")),
            [],
        )?;
        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({})",
                    index_name, self.name, column_name
                ),
                [],
            )?;
        }
        Ok(())
    }

    /// Check that the live table has exactly the declared columns, by name
    /// and type.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", self.name))?;
        let actual: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<std::result::Result<_, _>>()?;

        if actual.len() != self.columns.len() {
            bail!(
                "table {} has {} columns, expected {} ({})",
                self.name,
                actual.len(),
                self.columns.len(),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        for (expected, (name, sql_type)) in self.columns.iter().zip(actual.iter()) {
            if expected.name != name {
                bail!(
                    "table {} column mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    name
                );
            }
            if expected.sql_type.sql() != sql_type {
                bail!(
                    "table {} column {} type mismatch: expected {}, got {}",
                    self.name,
                    name,
                    expected.sql_type.sql(),
                    sql_type
                );
            }
        }
        Ok(())
    }
}

pub struct Schema {
    pub tables: &'static [Table],
}

impl Schema {
    /// True when the database holds no user tables yet.
    pub fn is_empty_database(conn: &Connection) -> Result<bool> {
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )?;
        Ok(table_count == 0)
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: Table = Table {
        name: "sample",
        columns: &[
            sqlite_column!("id", SqlType::Text, is_primary_key = true),
            sqlite_column!("name", SqlType::Text, non_null = true),
            sqlite_column!("created", SqlType::Integer, default_value = Some(DEFAULT_TIMESTAMP)),
        ],
        indices: &[("idx_sample_name", "name")],
        unique_constraints: &[&["name"]],
    };

    #[test]
    fn create_then_validate_roundtrips() {
        let conn = Connection::open_in_memory().unwrap();
        SAMPLE.create(&conn).unwrap();
        SAMPLE.validate(&conn).unwrap();
    }

    #[test]
    fn validate_detects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE sample (id TEXT PRIMARY KEY)", [])
            .unwrap();
        let error = SAMPLE.validate(&conn).unwrap_err().to_string();
        assert!(error.contains("expected 3"));
    }

    #[test]
    fn validate_detects_type_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE sample (id TEXT PRIMARY KEY, name INTEGER NOT NULL, created INTEGER)",
            [],
        )
        .unwrap();
        let error = SAMPLE.validate(&conn).unwrap_err().to_string();
        assert!(error.contains("type mismatch"));
    }

    #[test]
    fn empty_database_detection() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(Schema::is_empty_database(&conn).unwrap());
        SAMPLE.create(&conn).unwrap();
        assert!(!Schema::is_empty_database(&conn).unwrap());
    }
}
