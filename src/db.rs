use crate::error::{AcademyError, Result};
use libsql::{Builder, Connection, Database};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct DatabaseManager {
    db: Database,
    path: PathBuf,
}

impl DatabaseManager {
    /// Open (or create) the SQLite database file at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening database at {}", path.display());

        let db = Builder::new_local(&path)
            .build()
            .await
            .map_err(|e| AcademyError::Database {
                message: format!("Failed to open database: {e}"),
            })?;

        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a connection to the database with foreign keys enforced
    pub async fn get_connection(&self) -> Result<Connection> {
        let conn = self.db.connect().map_err(|e| AcademyError::Database {
            message: format!("Failed to get database connection: {e}"),
        })?;

        conn.execute("PRAGMA foreign_keys = ON", libsql::params![])
            .await
            .map_err(|e| AcademyError::Database {
                message: format!("Failed to enable foreign keys: {e}"),
            })?;

        Ok(conn)
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;

        let migration_sql = include_str!("../migrations/001_create_academy_schema.sql");
        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| AcademyError::Database {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Clear all data from the database (useful for development)
    pub async fn clear_all_data(&self) -> Result<()> {
        let conn = self.get_connection().await?;

        // Children before parents (foreign key constraints)
        for table in ["course_registrations", "lessons", "courses", "categories", "users"] {
            conn.execute(&format!("DELETE FROM {table}"), libsql::params![])
                .await
                .map_err(|e| AcademyError::Database {
                    message: format!("Failed to clear {table}: {e}"),
                })?;
        }

        info!("Cleared all data from database");
        Ok(())
    }
}
