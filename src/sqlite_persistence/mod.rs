mod schema_def;

pub use schema_def::{
    Column, ForeignKey, ForeignKeyOnDelete, Schema, SqlType, Table, DEFAULT_TIMESTAMP,
};
