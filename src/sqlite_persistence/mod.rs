mod schema_def;

pub use schema_def::{Column, ForeignKey, Schema, SqlType, Table, DEFAULT_TIMESTAMP};
