//! Database schema migrations.
//!
//! Creates the branch directory table and the column description catalog
//! that schema introspection reads from.

use rusqlite::Connection;
use tracing::info;

use crate::error::StorageError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| StorageError::Migration(format!("migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StorageError::Migration(format!("version query: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: branch_directory");
    }

    Ok(())
}

/// Version 1: branch directory and column descriptions.
fn apply_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ministry_of_aliyah_branch_info (
            branch   TEXT NOT NULL,
            address  TEXT NOT NULL DEFAULT '',
            email    TEXT NOT NULL DEFAULT '',
            contact  TEXT NOT NULL DEFAULT '',
            serving  TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_branch_serving
            ON ministry_of_aliyah_branch_info (serving);

        CREATE TABLE IF NOT EXISTS column_descriptions (
            table_name   TEXT NOT NULL,
            column_name  TEXT NOT NULL,
            description  TEXT NOT NULL,
            PRIMARY KEY (table_name, column_name)
        );

        INSERT OR IGNORE INTO column_descriptions (table_name, column_name, description) VALUES
            ('ministry_of_aliyah_branch_info', 'branch',  'Name of the Ministry of Aliyah branch office'),
            ('ministry_of_aliyah_branch_info', 'address', 'Street address of the branch'),
            ('ministry_of_aliyah_branch_info', 'email',   'Contact email of the branch'),
            ('ministry_of_aliyah_branch_info', 'contact', 'Phone number of the branch'),
            ('ministry_of_aliyah_branch_info', 'serving', 'Comma-separated English names of the cities and towns the branch serves');

        INSERT INTO schema_migrations (version, name) VALUES (1, 'branch_directory');
        ",
    )
    .map_err(|e| StorageError::Migration(format!("v1: {}", e)))
}
