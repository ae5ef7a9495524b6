//! SQLite connection wrapper.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tabsync_model::{Receiver, Row, TableSchema};
use tracing::debug;

use crate::catalog::SqColumn;
use crate::codec::ColumnMap;
use crate::error::{Result, StoreError};

/// Quotes an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// An open SQLite database.
#[derive(Debug)]
pub struct SqLite {
    conn: Connection,
}

impl SqLite {
    /// Opens or creates the database file at `path`.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn connect_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Private on-disk database deleted when the connection closes.
    pub fn connect_temp() -> Result<Self> {
        Ok(Self {
            conn: Connection::open("")?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Attaches another database file under `alias`.
    pub fn attach(&self, path: impl AsRef<Path>, alias: &str) -> Result<()> {
        let path = path.as_ref().to_string_lossy();
        self.conn.execute(
            &format!("attach database ?1 as {}", quote_identifier(alias)),
            [path.as_ref()],
        )?;
        debug!(alias, path = %path, "attached database");
        Ok(())
    }

    pub fn begin(&self) -> Result<()> {
        self.conn.execute_batch("begin")?;
        Ok(())
    }

    pub fn commit(&self) -> Result<()> {
        self.conn.execute_batch("commit")?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("rollback")?;
        Ok(())
    }

    /// Returns false while an explicit transaction is open.
    pub fn is_autocommit(&self) -> bool {
        self.conn.is_autocommit()
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Runs `sql` and reads every result row into `schema`.
    ///
    /// Result columns are matched to fields by name, ignoring ASCII case.
    /// Fields without a matching column stay absent, so narrower projections
    /// read into a subset of the schema.
    pub fn query_rows(&self, sql: &str, schema: &TableSchema) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        self.query_rows_with(sql, schema, &mut |row: Row| rows.push(row))?;
        Ok(rows)
    }

    /// Streaming form of [`SqLite::query_rows`]; returns the row count.
    pub fn query_rows_with(
        &self,
        sql: &str,
        schema: &TableSchema,
        receiver: &mut dyn Receiver<Row>,
    ) -> Result<usize> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = ColumnMap::new(schema, stmt.column_names().into_iter().enumerate());
        let mut rows = stmt.query([])?;
        let mut count = 0;
        while let Some(row) = rows.next()? {
            receiver.receive(columns.decode(row)?);
            count += 1;
        }
        Ok(count)
    }

    /// Result set metadata of `sql` without running it.
    ///
    /// Declared types are lower-cased and empty for computed columns.
    pub fn result_columns(&self, sql: &str) -> Result<Vec<SqColumn>> {
        let stmt = self.conn.prepare(sql)?;
        let columns = stmt
            .columns()
            .into_iter()
            .enumerate()
            .map(|(idx, column)| SqColumn {
                column_id: idx + 1,
                name: column.name().to_string(),
                column_type: column
                    .decl_type()
                    .map(str::to_ascii_lowercase)
                    .unwrap_or_default(),
                nullable: true,
                default_value: None,
                pk_index: None,
            })
            .collect();
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("asset"), "\"asset\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_begin_leaves_autocommit() {
        let db = SqLite::connect_in_memory().unwrap();
        assert!(db.is_autocommit());
        db.begin().unwrap();
        assert!(!db.is_autocommit());
        db.commit().unwrap();
        assert!(db.is_autocommit());
    }

    #[test]
    fn test_result_columns_lowercase_declared_types() {
        let db = SqLite::connect_in_memory().unwrap();
        db.execute_batch("create table t (a INT, b STRING)").unwrap();
        let columns = db.result_columns("select b, a + 1 as c from t").unwrap();
        let described: Vec<_> = columns
            .iter()
            .map(|column| (column.column_id, column.name.as_str(), column.column_type.as_str()))
            .collect();
        assert_eq!(described, vec![(1, "b", "string"), (2, "c", "")]);
    }
}
