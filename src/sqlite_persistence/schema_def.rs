use anyhow::{bail, Result};
use rusqlite::{params, types::Type, Connection};

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Only mutated when optional field assignments are passed
            // (e.g., `non_null = true`).
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
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

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnDelete {
    NoAction,
    Restrict,
    SetNull,
    Cascade,
}

impl ForeignKeyOnDelete {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnDelete::NoAction => "NO ACTION",
            ForeignKeyOnDelete::Restrict => "RESTRICT",
            ForeignKeyOnDelete::SetNull => "SET NULL",
            ForeignKeyOnDelete::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnDelete,
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<S>,
    pub foreign_key: Option<&'a ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut column_defs: Vec<String> = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let mut def = format!("{} {}", column.name, column.sql_type.as_sql());
            if column.is_primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                def.push_str(" NOT NULL");
            }
            if column.is_unique {
                def.push_str(" UNIQUE");
            }
            if let Some(default_value) = column.default_value {
                def.push_str(&format!(" DEFAULT {}", default_value));
            }
            if let Some(foreign_key) = column.foreign_key {
                def.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    foreign_key.foreign_table,
                    foreign_key.foreign_column,
                    foreign_key.on_delete.as_sql(),
                ));
            }
            column_defs.push(def);
        }
        for unique_constraint in self.unique_constraints {
            column_defs.push(format!("UNIQUE ({})", unique_constraint.join(", ")));
        }

        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, column_defs.join(", ")),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }
}

/// The full expected shape of the database. `create` builds it from scratch,
/// `validate` checks an existing file against it via PRAGMA introspection.
pub struct Schema {
    pub tables: &'static [Table],
}

fn strip_wrapping_parentheses<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    if s.starts_with('(') && s.ends_with(')') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

impl Schema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            Self::validate_columns(conn, table)?;
            Self::validate_indices(conn, table)?;
            Self::validate_unique_constraints(conn, table)?;
            Self::validate_foreign_keys(conn, table)?;
        }
        Ok(())
    }

    fn validate_columns(conn: &Connection, table: &Table) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
        let actual_columns: Vec<Column<'_, String>> = stmt
            .query_map(params![], |row| {
                let name = row.get::<usize, String>(1)?;
                let sql_type = match row.get::<_, String>(2)?.as_str() {
                    "TEXT" => &SqlType::Text,
                    "INTEGER" => &SqlType::Integer,
                    "REAL" => &SqlType::Real,
                    "BLOB" => &SqlType::Blob,
                    _ => {
                        return Err(rusqlite::Error::InvalidColumnType(
                            2,
                            "".to_string(),
                            Type::Text,
                        ))
                    }
                };
                Ok(Column {
                    name,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get::<_, Option<String>>(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                    is_unique: false,
                    foreign_key: None,
                })
            })?
            .collect::<Result<_, _>>()?;

        if actual_columns.len() != table.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found: [{}], expected: [{}]",
                table.name,
                actual_columns.len(),
                table.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                table
                    .columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(table.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    table.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != expected.sql_type {
                bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {:?}",
                    table.name,
                    expected.name,
                    expected.sql_type,
                    actual.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch: expected {}, got {}",
                    table.name,
                    expected.name,
                    expected.non_null,
                    actual.non_null
                );
            }
            // Stored defaults may come back wrapped in parentheses.
            if actual.default_value.as_ref().map(strip_wrapping_parentheses)
                != expected.default_value.map(strip_wrapping_parentheses)
            {
                bail!(
                    "Table {} column {} default value mismatch: expected {:?}, got {:?}",
                    table.name,
                    expected.name,
                    expected.default_value,
                    actual.default_value
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch: expected {}, got {}",
                    table.name,
                    expected.name,
                    expected.is_primary_key,
                    actual.is_primary_key
                );
            }
        }
        Ok(())
    }

    fn validate_indices(conn: &Connection, table: &Table) -> Result<()> {
        for (index_name, _columns) in table.indices {
            let index_exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, table.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !index_exists {
                bail!("Table {} is missing index '{}'", table.name, index_name);
            }
        }
        Ok(())
    }

    fn validate_unique_constraints(conn: &Connection, table: &Table) -> Result<()> {
        if table.unique_constraints.is_empty() {
            return Ok(());
        }

        // SQLite surfaces unique constraints as indices with unique=1.
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", table.name))?;
        let unique_indices: Vec<String> = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let is_unique: i32 = row.get(2)?;
                Ok((name, is_unique))
            })?
            .filter_map(|r| r.ok())
            .filter(|(_, is_unique)| *is_unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut unique_index_columns: Vec<Vec<String>> = Vec::new();
        for index_name in &unique_indices {
            let mut idx_stmt = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
            let mut cols: Vec<String> = idx_stmt
                .query_map([], |row| row.get::<_, String>(2))?
                .filter_map(|r| r.ok())
                .collect();
            cols.sort();
            unique_index_columns.push(cols);
        }

        for expected_columns in table.unique_constraints {
            let mut expected_sorted: Vec<&str> = expected_columns.to_vec();
            expected_sorted.sort_unstable();

            let found = unique_index_columns.iter().any(|actual_cols| {
                actual_cols.iter().map(|s| s.as_str()).collect::<Vec<_>>() == expected_sorted
            });
            if !found {
                bail!(
                    "Table {} is missing unique constraint on columns ({})",
                    table.name,
                    expected_columns.join(", ")
                );
            }
        }
        Ok(())
    }

    fn validate_foreign_keys(conn: &Connection, table: &Table) -> Result<()> {
        // PRAGMA foreign_key_list: id, seq, table, from, to, on_update, on_delete, match
        struct ActualFk {
            from_column: String,
            to_table: String,
            to_column: String,
            on_delete: String,
        }

        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", table.name))?;
        let actual_fks: Vec<ActualFk> = stmt
            .query_map([], |row| {
                Ok(ActualFk {
                    from_column: row.get(3)?,
                    to_table: row.get(2)?,
                    to_column: row.get(4)?,
                    on_delete: row.get(6)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        for column in table.columns {
            let expected_fk = match column.foreign_key {
                Some(fk) => fk,
                None => continue,
            };
            let expected_on_delete = expected_fk.on_delete.as_sql();

            let found = actual_fks.iter().any(|actual| {
                actual.from_column == column.name
                    && actual.to_table == expected_fk.foreign_table
                    && actual.to_column == expected_fk.foreign_column
                    && actual.on_delete == expected_on_delete
            });
            if found {
                continue;
            }

            match actual_fks.iter().find(|a| a.from_column == column.name) {
                Some(actual) => bail!(
                    "Table {} column {} has foreign key mismatch: expected REFERENCES {}({}) ON DELETE {}, got REFERENCES {}({}) ON DELETE {}",
                    table.name,
                    column.name,
                    expected_fk.foreign_table,
                    expected_fk.foreign_column,
                    expected_on_delete,
                    actual.to_table,
                    actual.to_column,
                    actual.on_delete
                ),
                None => bail!(
                    "Table {} column {} is missing foreign key: expected REFERENCES {}({}) ON DELETE {}",
                    table.name,
                    column.name,
                    expected_fk.foreign_table,
                    expected_fk.foreign_column,
                    expected_on_delete
                ),
            }
        }
        Ok(())
    }
}
