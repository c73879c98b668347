//! Loading generated scripts into a database
//!
//! The generated SQL home holds one DDL script and one INSERT script per
//! partition. Loading runs the DDL first, then every INSERT script. Each
//! script is executed verbatim; its own `BEGIN;`/`COMMIT;` markers decide
//! the transaction boundaries.

use crate::export::{DDL_SCRIPT_SUFFIX, is_ddl_script};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(feature = "postgres-backend")]
pub mod postgres;

#[cfg(feature = "postgres-backend")]
pub use self::postgres::PostgresExecutor;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Script execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Runs SQL scripts against a database.
#[async_trait]
pub trait SqlExecutor: Send {
    /// Execute a script of one or more `;`-separated statements.
    async fn execute_script(&mut self, sql: &str) -> DatabaseResult<()>;
}

/// Scripts executed by [`load_scripts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub ddl_script: PathBuf,
    pub insert_scripts: Vec<PathBuf>,
}

/// Execute `<sql_home>/*_ddl.sql`, then every `<sql_home>/*/*.sql` in
/// descending name order.
///
/// Exactly one DDL script must be present. Scripts are matched by location
/// and suffix, whatever their table prefix.
pub async fn load_scripts<E>(executor: &mut E, sql_home: &Path) -> DatabaseResult<LoadReport>
where
    E: SqlExecutor + ?Sized,
{
    let ddl_script = find_ddl_script(sql_home)?;
    let insert_scripts = find_insert_scripts(sql_home)?;
    info!("INSERT scripts: {}", insert_scripts.len());

    info!("Executing DDL {}", ddl_script.display());
    execute_file(executor, &ddl_script).await?;

    for (index, script) in insert_scripts.iter().enumerate() {
        info!("({}) Executing {}", index + 1, script.display());
        execute_file(executor, script).await?;
    }

    Ok(LoadReport {
        ddl_script,
        insert_scripts,
    })
}

async fn execute_file<E>(executor: &mut E, path: &Path) -> DatabaseResult<()>
where
    E: SqlExecutor + ?Sized,
{
    let sql = std::fs::read_to_string(path).map_err(|e| {
        DatabaseError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    executor.execute_script(&sql).await.map_err(|e| match e {
        DatabaseError::QueryFailed(msg) => {
            DatabaseError::QueryFailed(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

fn find_ddl_script(sql_home: &Path) -> DatabaseResult<PathBuf> {
    let mut candidates: Vec<PathBuf> = list_dir(sql_home)?
        .into_iter()
        .filter(|p| p.is_file() && is_ddl_script(p))
        .collect();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(DatabaseError::InvalidInput(format!(
            "No DDL script (*{}) in {}",
            DDL_SCRIPT_SUFFIX,
            sql_home.display()
        ))),
        n => Err(DatabaseError::InvalidInput(format!(
            "Expected one DDL script in {}, found {}",
            sql_home.display(),
            n
        ))),
    }
}

fn find_insert_scripts(sql_home: &Path) -> DatabaseResult<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    for subdir in list_dir(sql_home)?.into_iter().filter(|p| p.is_dir()) {
        scripts.extend(
            list_dir(&subdir)?
                .into_iter()
                .filter(|p| p.is_file() && is_sql_script(p) && !is_ddl_script(p)),
        );
    }
    scripts.sort_by(|a, b| b.cmp(a));
    Ok(scripts)
}

fn is_sql_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "sql")
}

fn list_dir(dir: &Path) -> DatabaseResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        DatabaseError::IoError(format!("Failed to list {}: {}", dir.display(), e))
    })?;
    entries
        .map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|e| DatabaseError::IoError(e.to_string()))
        })
        .collect()
}
