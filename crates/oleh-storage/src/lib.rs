//! OlehAssist storage crate - SQLite structured-record store.
//!
//! Provides a WAL-mode SQLite database with migrations for the Ministry of
//! Aliyah branch directory, a pass-through query executor that materializes
//! rows as column-name to value mappings, schema introspection, and a JSON
//! branch importer.

pub mod branches;
pub mod db;
pub mod error;
pub mod migrations;
pub mod records;

pub use branches::{import_branches, load_branch_file, BranchRecord};
pub use db::Database;
pub use error::StorageError;
pub use records::{ColumnInfo, SqliteRecordStore};
