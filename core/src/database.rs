//! # Database Schema
//!
//! Applies SQL migrations to a scratch SQLite database and dumps the
//! resulting DDL.

use crate::error::{AppError, AppResult};
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The dumped schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    /// `CREATE` statements in creation order, separated by blank lines.
    pub schema: String,
    /// Number of tables.
    pub table_count: usize,
}

/// Migration files below `dir` in name order. `*.down.sql` files are ignored.
pub fn migration_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(".sql") && !name.ends_with(".down.sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Runs every migration in `dir` inside one transaction on a scratch
/// database and returns its schema.
///
/// The scratch database lives in a temporary directory removed on return.
pub fn dump_schema(dir: &Path) -> AppResult<DatabaseInfo> {
    let files = migration_files(dir)?;
    info!(dir = %dir.display(), migrations = files.len(), "Dumping database schema");

    let scratch_dir = tempfile::tempdir()?;
    let conn = Connection::open(scratch_dir.path().join("scratch.db")).map_err(db_error)?;

    conn.execute("BEGIN", []).map_err(db_error)?;
    for file in &files {
        let sql = fs::read_to_string(file)?;
        if let Err(e) = conn.execute_batch(&sql) {
            if let Err(rollback) = conn.execute("ROLLBACK", []) {
                warn!(error = %rollback, "Rollback of scratch database failed");
            }
            return Err(AppError::Database(format!(
                "migration {} failed: {}",
                file.display(),
                e
            )));
        }
        debug!(file = %file.display(), "Applied migration");
    }
    conn.execute("COMMIT", []).map_err(db_error)?;

    let info = read_schema(&conn)?;

    if let Err((_, e)) = conn.close() {
        warn!(error = %e, "Failed to close scratch database");
    }
    if let Err(e) = scratch_dir.close() {
        warn!(error = %e, "Failed to remove scratch directory");
    }

    info!(tables = info.table_count, "Database schema dumped");
    Ok(info)
}

fn read_schema(conn: &Connection) -> AppResult<DatabaseInfo> {
    let mut stmt = conn
        .prepare(
            "SELECT sql FROM sqlite_master \
             WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
        )
        .map_err(db_error)?;
    let statements: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(db_error)?
        .collect::<Result<_, _>>()
        .map_err(db_error)?;

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )
        .map_err(db_error)?;

    let schema = statements
        .iter()
        .map(|s| format!("{};", s.trim_end_matches(';')))
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(DatabaseInfo {
        schema,
        table_count: usize::try_from(table_count).unwrap_or_default(),
    })
}

fn db_error(err: rusqlite::Error) -> AppError {
    AppError::Database(err.to_string())
}
