//! Relational mapping between a database schema and SQLite tables.

use tabsync_model::{
    Batch, DEFAULT_BATCH_SIZE, DatabaseSchema, FieldType, Row, Snapshot, TableSchema,
};
use tracing::{debug, info};

use crate::codec::{BoundValue, ColumnMap};
use crate::error::{Result, StoreError};
use crate::sqlite::{SqLite, quote_identifier};

/// Column type declared for a field type; tables have none.
pub fn sq_type(field_type: FieldType) -> Option<&'static str> {
    match field_type {
        FieldType::Bool => Some("boolean"),
        FieldType::Bytes => Some("blob"),
        FieldType::Double => Some("double"),
        FieldType::Float => Some("float"),
        FieldType::Enum | FieldType::Int32 | FieldType::Int64 => Some("int"),
        FieldType::String => Some("string"),
        FieldType::Table => None,
    }
}

/// `create table` statement for one table, columns in field order.
pub fn create_table_sql(name: &str, table: &TableSchema) -> Result<String> {
    let columns = table
        .fields()
        .iter()
        .map(|field| {
            let column_type = sq_type(field.field_type()).ok_or_else(|| {
                StoreError::UnsupportedType {
                    field: format!("{name}.{}", field.name()),
                    field_type: field.field_type(),
                }
            })?;
            Ok(format!("{} {column_type}", quote_identifier(field.name())))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "create table if not exists {}({})",
        quote_identifier(name),
        columns.join(", ")
    ))
}

fn insert_sql(name: &str, table: &TableSchema) -> String {
    let columns: Vec<String> = table
        .fields()
        .iter()
        .map(|field| quote_identifier(field.name()))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "insert into {}({}) values ({placeholders})",
        quote_identifier(name),
        columns.join(", ")
    )
}

/// Maps the tables of one database schema onto a SQLite database.
#[derive(Debug)]
pub struct SqMapper {
    db: SqLite,
    schema: DatabaseSchema,
}

impl SqMapper {
    pub fn new(db: SqLite, schema: DatabaseSchema) -> Self {
        Self { db, schema }
    }

    pub fn db(&self) -> &SqLite {
        &self.db
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    pub fn into_db(self) -> SqLite {
        self.db
    }

    /// Drops and recreates every table of the schema.
    pub fn drop_and_create_tables(&self) -> Result<()> {
        let conn = self.db.connection();
        for (field, table) in self.schema.tables() {
            let name = field.name();
            conn.execute_batch(&format!("drop table if exists {}", quote_identifier(name)))
                .map_err(|source| StoreError::Ddl {
                    table: name.to_string(),
                    action: "drop",
                    source,
                })?;
            let sql = create_table_sql(name, table)?;
            conn.execute_batch(&sql).map_err(|source| StoreError::Ddl {
                table: name.to_string(),
                action: "create",
                source,
            })?;
            debug!(table = name, columns = table.len(), "created table");
        }
        Ok(())
    }

    /// Inserts every row of `snapshot`; returns the number of rows written.
    ///
    /// Tables are written in schema order with one prepared statement each.
    /// Outside an explicit transaction every table is committed on its own;
    /// inside one, the caller decides.
    pub fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<usize> {
        if let Some((table, _)) = snapshot
            .tables()
            .find(|(table, _)| self.schema.table(table).is_none())
        {
            return Err(StoreError::UnknownTable {
                table: table.to_string(),
            });
        }

        let mut inserted = 0;
        for (field, table) in self.schema.tables() {
            let rows = snapshot.rows(field.name());
            if !rows.is_empty() {
                inserted += self.insert_table(field.name(), table, rows)?;
            }
        }
        info!(rows = inserted, "inserted snapshot");
        Ok(inserted)
    }

    fn insert_table(&self, name: &str, table: &TableSchema, rows: &[Row]) -> Result<usize> {
        let conn = self.db.connection();
        let tx = if conn.is_autocommit() {
            Some(conn.unchecked_transaction()?)
        } else {
            None
        };

        let insert_error = |source| StoreError::Insert {
            table: name.to_string(),
            source,
        };
        let mut stmt = conn.prepare(&insert_sql(name, table)).map_err(insert_error)?;
        for row in rows {
            if let Some((number, _)) = row
                .iter()
                .find(|&(number, _)| table.field_by_number(number).is_none())
            {
                return Err(StoreError::UnknownField {
                    table: name.to_string(),
                    number,
                });
            }
            for (idx, field) in table.fields().iter().enumerate() {
                let value = row.get(field);
                if let Some(value) = value
                    && value.field_type() != field.field_type()
                {
                    return Err(StoreError::TypeMismatch {
                        table: name.to_string(),
                        field: field.name().to_string(),
                        expected: field.field_type(),
                        actual: value.field_type(),
                    });
                }
                stmt.raw_bind_parameter(idx + 1, BoundValue(value))
                    .map_err(|source| StoreError::Bind {
                        table: name.to_string(),
                        field: field.name().to_string(),
                        source,
                    })?;
            }
            stmt.raw_execute().map_err(insert_error)?;
        }
        drop(stmt);

        if let Some(tx) = tx {
            tx.commit().map_err(insert_error)?;
        }
        debug!(table = name, rows = rows.len(), "inserted rows");
        Ok(rows.len())
    }

    /// Reads all rows of one table.
    pub fn read_table(&self, name: &str) -> Result<Vec<Row>> {
        let (_, table) = self.schema.table(name).ok_or_else(|| StoreError::UnknownTable {
            table: name.to_string(),
        })?;
        self.db
            .query_rows(&format!("select * from {}", quote_identifier(name)), table)
            .map_err(|err| StoreError::read(name, err))
    }

    /// Reads the database table by table.
    ///
    /// Batches are cut by table count: every batch holds the complete rows of
    /// up to `batch_size` tables, in schema order. See
    /// [`SqMapper::snapshot_rows`] for batches bounded by row count.
    pub fn snapshot(&self, batch_size: usize) -> Result<TableBatches<'_>> {
        if batch_size == 0 {
            return Err(StoreError::InvalidBatchSize);
        }
        Ok(TableBatches {
            mapper: self,
            batch_size,
            next_table: 0,
            failed: false,
        })
    }

    /// Reads the database in batches of at most `batch_size` rows.
    ///
    /// Tables are paged by rowid, so a batch may end inside one table and
    /// span the start of the next.
    pub fn snapshot_rows(&self, batch_size: usize) -> Result<RowBatches<'_>> {
        if batch_size == 0 {
            return Err(StoreError::InvalidBatchSize);
        }
        Ok(RowBatches {
            mapper: self,
            batch_size,
            next_table: 0,
            after_rowid: i64::MIN,
            failed: false,
        })
    }

    /// Reads every table into one snapshot.
    pub fn snapshot_all(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        for batch in self.snapshot(DEFAULT_BATCH_SIZE)? {
            snapshot.merge(batch?);
        }
        Ok(snapshot)
    }

    /// Reads up to `limit` rows with a rowid above `after_rowid`, returning
    /// them with the last rowid read.
    fn read_page(
        &self,
        name: &str,
        table: &TableSchema,
        after_rowid: i64,
        limit: usize,
    ) -> Result<(Vec<Row>, i64)> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "select rowid, * from {} where rowid > ?1 order by rowid limit ?2",
            quote_identifier(name)
        ))?;
        let columns = ColumnMap::new(table, stmt.column_names().into_iter().enumerate().skip(1));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut result = stmt.query([after_rowid, limit])?;

        let mut rows = Vec::new();
        let mut last_rowid = after_rowid;
        while let Some(row) = result.next()? {
            last_rowid = row.get(0)?;
            rows.push(columns.decode(row)?);
        }
        Ok((rows, last_rowid))
    }
}

/// Batches of whole tables, see [`SqMapper::snapshot`].
pub struct TableBatches<'m> {
    mapper: &'m SqMapper,
    batch_size: usize,
    next_table: usize,
    failed: bool,
}

impl Iterator for TableBatches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut batch = Batch::new();
        let mut tables_read = 0;
        while let Some((field, _)) = self.mapper.schema.table_at(self.next_table) {
            self.next_table += 1;
            match self.mapper.read_table(field.name()) {
                Ok(rows) => batch.extend_table(field.name(), rows),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
            tables_read += 1;
            if tables_read == self.batch_size {
                break;
            }
        }
        if tables_read == 0 {
            return None;
        }
        debug!(tables = tables_read, rows = batch.row_count(), "read table batch");
        Some(Ok(batch))
    }
}

/// Batches bounded by row count, see [`SqMapper::snapshot_rows`].
pub struct RowBatches<'m> {
    mapper: &'m SqMapper,
    batch_size: usize,
    next_table: usize,
    after_rowid: i64,
    failed: bool,
}

impl Iterator for RowBatches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut batch = Batch::new();
        let mut count = 0;
        while count < self.batch_size {
            let Some((field, table)) = self.mapper.schema.table_at(self.next_table) else {
                break;
            };
            let wanted = self.batch_size - count;
            let (rows, last_rowid) =
                match self.mapper.read_page(field.name(), table, self.after_rowid, wanted) {
                    Ok(page) => page,
                    Err(err) => {
                        self.failed = true;
                        return Some(Err(StoreError::read(field.name(), err)));
                    }
                };
            if rows.len() < wanted {
                self.next_table += 1;
                self.after_rowid = i64::MIN;
            } else {
                self.after_rowid = last_rowid;
            }
            count += rows.len();
            batch.extend_table(field.name(), rows);
        }
        if count == 0 {
            return None;
        }
        debug!(rows = count, "read row batch");
        Some(Ok(batch))
    }
}

#[cfg(test)]
mod tests {
    use tabsync_model::Field;

    use super::*;

    fn produce() -> TableSchema {
        TableSchema::new(
            "Produce",
            vec![
                Field::optional("produce_id", 1, FieldType::Int32),
                Field::optional("is_organic", 2, FieldType::Bool),
                Field::optional("photo", 3, FieldType::Bytes),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            create_table_sql("fresh", &produce()).unwrap(),
            "create table if not exists \"fresh\"(\"produce_id\" int, \"is_organic\" boolean, \"photo\" blob)"
        );
    }

    #[test]
    fn test_insert_sql_binds_every_field() {
        assert_eq!(
            insert_sql("fresh", &produce()),
            "insert into \"fresh\"(\"produce_id\", \"is_organic\", \"photo\") values (?, ?, ?)"
        );
    }

    #[test]
    fn test_sq_type_has_no_table_mapping() {
        assert_eq!(sq_type(FieldType::Enum), Some("int"));
        assert_eq!(sq_type(FieldType::String), Some("string"));
        assert_eq!(sq_type(FieldType::Table), None);
    }
}
