//! Catalog introspection: attached databases, their tables, columns and
//! indexes as SQLite itself reports them.

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::sqlite::{SqLite, quote_identifier};

/// Every attached database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqSchema {
    pub databases: Vec<SqDatabase>,
}

impl SqSchema {
    pub fn database(&self, name: &str) -> Option<&SqDatabase> {
        self.databases.iter().find(|db| db.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqDatabase {
    pub seq: i64,
    /// Schema name: `main`, `temp` or an attach alias.
    pub name: String,
    /// Backing file, empty for in-memory and temporary databases.
    pub file: String,
    pub tables: Vec<SqTable>,
    pub indexes: Vec<SqIndex>,
    /// Views, triggers and anything else that is neither table nor index.
    pub objects: Vec<SqObject>,
}

impl SqDatabase {
    pub fn table(&self, name: &str) -> Option<&SqTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&SqIndex> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

/// A catalog entry as listed by `sqlite_master`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqObject {
    pub object_type: String,
    pub name: String,
    pub table_name: String,
    pub root_page: Option<i64>,
    pub sql: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqTable {
    pub name: String,
    pub sql: Option<String>,
    pub columns: Vec<SqColumn>,
}

impl SqTable {
    pub fn column(&self, name: &str) -> Option<&SqColumn> {
        self.columns.iter().find(|column| column.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqColumn {
    /// 1-based column position.
    pub column_id: usize,
    pub name: String,
    /// Declared type, lower-cased.
    pub column_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// 1-based position within the primary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pk_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqIndex {
    pub name: String,
    pub table_name: String,
    pub sql: Option<String>,
    /// Indexed column names in key order; expression columns are omitted.
    pub columns: Vec<String>,
}

impl SqLite {
    /// Introspects every attached database.
    pub fn schema(&self) -> Result<SqSchema> {
        let conn = self.connection();
        let mut stmt = conn.prepare("select seq, name, file from pragma_database_list")?;
        let listed = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut databases = Vec::with_capacity(listed.len());
        for (seq, name, file) in listed {
            databases.push(read_database(conn, seq, name, file.unwrap_or_default())?);
        }
        Ok(SqSchema { databases })
    }
}

fn read_database(conn: &Connection, seq: i64, name: String, file: String) -> Result<SqDatabase> {
    let mut stmt = conn.prepare(&format!(
        "select type, name, tbl_name, rootpage, sql from {}.sqlite_master",
        quote_identifier(&name)
    ))?;
    let objects = stmt
        .query_map([], |row| {
            Ok(SqObject {
                object_type: row.get(0)?,
                name: row.get(1)?,
                table_name: row.get(2)?,
                root_page: row.get(3)?,
                sql: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut database = SqDatabase {
        seq,
        name,
        file,
        tables: Vec::new(),
        indexes: Vec::new(),
        objects: Vec::new(),
    };
    for object in objects {
        match object.object_type.as_str() {
            "table" => {
                let columns = read_columns(conn, &database.name, &object.name)?;
                database.tables.push(SqTable {
                    name: object.name,
                    sql: object.sql,
                    columns,
                });
            }
            "index" => {
                let columns = read_index_columns(conn, &database.name, &object.name)?;
                database.indexes.push(SqIndex {
                    name: object.name,
                    table_name: object.table_name,
                    sql: object.sql,
                    columns,
                });
            }
            _ => database.objects.push(object),
        }
    }
    debug!(
        database = database.name.as_str(),
        tables = database.tables.len(),
        indexes = database.indexes.len(),
        "introspected database"
    );
    Ok(database)
}

fn read_columns(conn: &Connection, schema: &str, table: &str) -> Result<Vec<SqColumn>> {
    let mut stmt = conn.prepare(
        "select cid, name, type, \"notnull\", dflt_value, pk from pragma_table_info(?1, ?2)",
    )?;
    let columns = stmt
        .query_map([table, schema], |row| {
            let cid: usize = row.get(0)?;
            let column_type: String = row.get(2)?;
            let not_null: i64 = row.get(3)?;
            let pk: usize = row.get(5)?;
            Ok(SqColumn {
                column_id: cid + 1,
                name: row.get(1)?,
                column_type: column_type.to_ascii_lowercase(),
                nullable: not_null == 0,
                default_value: row.get(4)?,
                pk_index: (pk > 0).then_some(pk),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn read_index_columns(conn: &Connection, schema: &str, index: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("select name from pragma_index_info(?1, ?2) order by seqno")?;
    let names = stmt
        .query_map([index, schema], |row| row.get::<_, Option<String>>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names.into_iter().flatten().collect())
}
