//! Serializable schema declarations.
//!
//! Datasets declare their tables as static data (typically a JSON file)
//! which is validated into a [`DatabaseSchema`] once at startup.
//!
//! ```json
//! {
//!   "name": "GroceryStore",
//!   "enums": [{"name": "Kind", "values": [{"name": "APPLE", "number": 1}]}],
//!   "tables": [{
//!     "name": "fresh_produce",
//!     "number": 1,
//!     "columns": [
//!       {"name": "produce_id", "number": 1, "type": "int32"},
//!       {"name": "kind", "number": 2, "type": "enum", "enum": "Kind"}
//!     ]
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::schema::{DatabaseSchema, EnumType, Field, FieldType, TableSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDecl {
    pub name: String,
    #[serde(default)]
    pub enums: Vec<EnumType>,
    pub tables: Vec<TableDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDecl {
    pub name: String,
    pub number: u32,
    pub columns: Vec<ColumnDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDecl {
    pub name: String,
    pub number: u32,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Enum type name, required for `enum` columns.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
}

impl SchemaDecl {
    /// Validates the declaration into a database schema.
    pub fn into_database_schema(self) -> Result<DatabaseSchema> {
        let enums: HashMap<String, Arc<EnumType>> = self
            .enums
            .into_iter()
            .map(|enum_type| (enum_type.name.clone(), Arc::new(enum_type)))
            .collect();
        let mut tables = Vec::with_capacity(self.tables.len());
        for table in self.tables {
            let mut columns = Vec::with_capacity(table.columns.len());
            for column in table.columns {
                columns.push(column_field(column, &enums)?);
            }
            let schema = TableSchema::new(table.name.clone(), columns)?;
            tables.push(Field::table(table.name, table.number, schema));
        }
        DatabaseSchema::new(self.name, tables)
    }
}

fn column_field(column: ColumnDecl, enums: &HashMap<String, Arc<EnumType>>) -> Result<Field> {
    match (column.field_type, column.enum_name) {
        (FieldType::Enum, Some(enum_name)) => {
            let enum_type = enums
                .get(&enum_name)
                .ok_or_else(|| ModelError::UndeclaredEnum {
                    field: column.name.clone(),
                    enum_name: enum_name.clone(),
                })?;
            Ok(Field::enumeration(
                column.name,
                column.number,
                Arc::clone(enum_type),
            ))
        }
        // Enum columns without a name fail TableSchema validation.
        (field_type, _) => Ok(Field::optional(column.name, column.number, field_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROCERY: &str = r#"{
        "name": "GroceryStore",
        "enums": [{"name": "Kind", "values": [{"name": "APPLE", "number": 1}]}],
        "tables": [{
            "name": "fresh_produce",
            "number": 1,
            "columns": [
                {"name": "produce_id", "number": 1, "type": "int32"},
                {"name": "kind", "number": 2, "type": "enum", "enum": "Kind"},
                {"name": "vendor_data", "number": 3, "type": "bytes"}
            ]
        }]
    }"#;

    #[test]
    fn test_declaration_builds_schema() {
        let decl: SchemaDecl = serde_json::from_str(GROCERY).unwrap();
        let schema = decl.into_database_schema().unwrap();
        let (field, table) = schema.table("fresh_produce").unwrap();
        assert_eq!(field.number(), 1);
        let kind = table.field_by_name("kind").unwrap();
        assert_eq!(kind.field_type(), FieldType::Enum);
        assert_eq!(kind.enum_type().unwrap().number_of("APPLE").unwrap(), 1);
        assert_eq!(
            table.field_by_number(3).unwrap().field_type(),
            FieldType::Bytes
        );
    }

    #[test]
    fn test_undeclared_enum_is_rejected() {
        let decl: SchemaDecl = serde_json::from_str(&GROCERY.replace("\"Kind\"}", "\"Size\"}"))
            .unwrap();
        let err = decl.into_database_schema().unwrap_err();
        assert!(matches!(err, ModelError::UndeclaredEnum { .. }));
    }

    #[test]
    fn test_table_column_is_rejected() {
        let decl = SchemaDecl {
            name: "Db".to_string(),
            enums: Vec::new(),
            tables: vec![TableDecl {
                name: "t".to_string(),
                number: 1,
                columns: vec![ColumnDecl {
                    name: "nested".to_string(),
                    number: 1,
                    field_type: FieldType::Table,
                    enum_name: None,
                }],
            }],
        };
        assert!(matches!(
            decl.into_database_schema(),
            Err(ModelError::InvalidField { .. })
        ));
    }
}
