//! Branch directory import.

use std::path::Path;

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::error::StorageError;

/// One Ministry of Aliyah branch office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub branch: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact: String,
    /// English names of the cities the branch serves.
    #[serde(default)]
    pub serving: String,
}

/// Read a JSON array of branch records from disk.
pub fn load_branch_file(path: &Path) -> Result<Vec<BranchRecord>, StorageError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| StorageError::Import(format!("{}: {}", path.display(), e)))
}

/// Insert branch records in one transaction. Returns the number inserted.
pub fn import_branches(db: &Database, branches: &[BranchRecord]) -> Result<usize, StorageError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ministry_of_aliyah_branch_info (branch, address, email, contact, serving)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for b in branches {
                stmt.execute(params![b.branch, b.address, b.email, b.contact, b.serving])?;
            }
        }
        tx.commit()?;
        info!(count = branches.len(), "Branch records imported");
        Ok(branches.len())
    })
}
