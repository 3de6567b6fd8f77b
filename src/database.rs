use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::error::AdminError;
use crate::schema::{CREATE_SCHEMA_SQL, SCHEMA_VERSION};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path, busy_timeout: Duration) -> Result<Self, AdminError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(busy_timeout)?;
        info!("Database opened at: {}", db_path.display());

        let db = Self::configure(conn)?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, AdminError> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self, AdminError> {
        // Cascading deletes from homestays to their children depend on this
        conn.pragma_update(None, "foreign_keys", true)?;

        let db = Self { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so readers that race the merge see either
    /// the state before it or after it. Any error returned by `f` drops the
    /// transaction, which rolls back every statement it executed.
    pub fn immediate_transaction<T, F>(&mut self, f: F) -> Result<T, AdminError>
    where
        F: FnOnce(&Transaction) -> Result<T, AdminError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }

    fn ensure_schema(&self) -> Result<(), AdminError> {
        let table_exists: bool = self
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            debug!("Creating schema version {}", SCHEMA_VERSION);
            self.conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        let stored_version: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(AdminError::Error(format!(
                "Schema version mismatch: database is at '{}', expected '{}'",
                other, SCHEMA_VERSION
            ))),
            None => Err(AdminError::Error("Schema version missing".to_string())),
        }
    }
}
