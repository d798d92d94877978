//! Pass-through query execution and schema introspection.
//!
//! Queries are executed exactly as given; every result row is materialized
//! into a column-name to value mapping in the order SQLite returns it.

use std::sync::Arc;

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use oleh_core::Row;

use crate::db::Database;
use crate::error::StorageError;

/// One column of an introspected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub description: String,
}

/// Structured record store backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    db: Arc<Database>,
}

impl SqliteRecordStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Execute a query and materialize every row.
    pub fn query(&self, sql: &str) -> Result<Vec<Row>, StorageError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Row::new();
                for (idx, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), to_json(row.get_ref(idx)?));
                }
                results.push(record);
            }

            debug!(rows = results.len(), "Record query executed");
            Ok(results)
        })
    }

    /// Describe the columns of `table`, in declaration order.
    pub fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, StorageError> {
        let columns = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.name, p.type, COALESCE(d.description, '')
                 FROM pragma_table_info(?1) AS p
                 LEFT JOIN column_descriptions AS d
                   ON d.table_name = ?1 AND d.column_name = p.name
                 ORDER BY p.cid",
            )?;
            let rows = stmt.query_map([table], |row| {
                Ok(ColumnInfo {
                    column_name: row.get(0)?,
                    data_type: row.get(1)?,
                    description: row.get(2)?,
                })
            })?;
            let mut columns = Vec::new();
            for column in rows {
                columns.push(column?);
            }
            Ok(columns)
        })?;

        if columns.is_empty() {
            return Err(StorageError::UnknownTable(table.to_string()));
        }
        Ok(columns)
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branches::{import_branches, BranchRecord};

    fn make_store() -> SqliteRecordStore {
        let db = Arc::new(Database::in_memory().unwrap());
        let branches = vec![
            BranchRecord {
                branch: "Tel Aviv Branch".to_string(),
                address: "6 Esther HaMalka St".to_string(),
                email: "telaviv@example.gov.il".to_string(),
                contact: "*2994".to_string(),
                serving: "Tel Aviv, Ramat Gan, Givatayim".to_string(),
            },
            BranchRecord {
                branch: "Jerusalem Branch".to_string(),
                address: "15 Hillel St".to_string(),
                email: "jerusalem@example.gov.il".to_string(),
                contact: "*2994".to_string(),
                serving: "Jerusalem, Mevaseret Zion".to_string(),
            },
        ];
        import_branches(&db, &branches).unwrap();
        SqliteRecordStore::new(db)
    }

    #[test]
    fn test_query_materializes_rows_in_order() {
        let store = make_store();
        let rows = store
            .query(
                "SELECT branch, contact FROM ministry_of_aliyah_branch_info ORDER BY branch DESC",
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["branch"], "Tel Aviv Branch");
        assert_eq!(rows[1]["branch"], "Jerusalem Branch");
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_query_fuzzy_city_match() {
        let store = make_store();
        let rows = store
            .query(
                "SELECT branch, address, email, contact FROM ministry_of_aliyah_branch_info
                 WHERE LOWER(serving) LIKE '%ramat gan%'",
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["address"], "6 Esther HaMalka St");
    }

    #[test]
    fn test_query_zero_rows() {
        let store = make_store();
        let rows = store
            .query("SELECT * FROM ministry_of_aliyah_branch_info WHERE LOWER(serving) LIKE '%eilat%'")
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_query_scalar_types() {
        let store = make_store();
        let rows = store
            .query("SELECT 1 AS i, 2.5 AS r, NULL AS n, 'x' AS t, X'0102' AS b")
            .unwrap();
        assert_eq!(rows[0]["i"], 1);
        assert_eq!(rows[0]["r"], 2.5);
        assert!(rows[0]["n"].is_null());
        assert_eq!(rows[0]["t"], "x");
        assert_eq!(rows[0]["b"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_query_error_is_returned() {
        let store = make_store();
        let err = store.query("SELECT * FROM no_such_table").unwrap_err();
        assert!(err.to_string().contains("no_such_table"));
    }

    #[test]
    fn test_describe_table() {
        let store = make_store();
        let columns = store
            .describe_table("ministry_of_aliyah_branch_info")
            .unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["branch", "address", "email", "contact", "serving"]);
        assert_eq!(columns[0].data_type, "TEXT");
        assert!(columns[4].description.contains("cities"));
    }

    #[test]
    fn test_describe_unknown_table() {
        let store = make_store();
        let err = store.describe_table("nope").unwrap_err();
        assert!(matches!(err, StorageError::UnknownTable(_)));
    }
}
