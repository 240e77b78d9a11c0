mod execute;
mod select;
mod transaction;

use std::sync::Arc;

use tracing::debug;

use crate::core::Result;
use crate::driver::{self, Database, Transaction};

/// Database session handle.
///
/// Wraps a shared [`Database`] handle and at most one open transaction.
/// Every statement runs inside the open transaction if there is one, and on
/// the shared handle otherwise.
///
/// A session with an open transaction must not be used from several threads
/// at once; hand other threads a [`Clone`] of it instead, which shares the
/// handle but starts with no transaction.
pub struct Session {
    /// Shared database handle
    db: Arc<dyn Database>,
    /// Open transaction (if any)
    tx: Option<Box<dyn Transaction>>,
}

impl Session {
    /// Opens a session through the driver registered under `driver`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sqlsession::Session;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut session = Session::open("sqlite", ":memory:")?;
    /// session.update("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(driver: &str, data_source: &str) -> Result<Self> {
        let db = driver::lookup_driver(driver)?.open(data_source)?;
        debug!(driver, "session opened");
        Ok(Self::from_database(db))
    }

    /// Wraps an already opened handle.
    pub fn from_database(db: Arc<dyn Database>) -> Self {
        Self { db, tx: None }
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Check if session is in a transaction
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Close the session and its database handle
    ///
    /// An open transaction is rolled back first; the rollback's error is
    /// dropped. The returned error is the handle's close result. Clones
    /// share the handle and are closed with it.
    pub fn close(&mut self) -> Result<()> {
        self.end();
        self.db.close()
    }
}

impl Clone for Session {
    /// Shares the database handle. The clone never carries the open
    /// transaction.
    fn clone(&self) -> Self {
        Self::from_database(Arc::clone(&self.db))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Roll back a forgotten transaction; the shared handle stays open.
        self.end();
    }
}
