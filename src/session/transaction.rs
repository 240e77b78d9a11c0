use tracing::debug;

use crate::core::{DbError, Result};
use crate::session::Session;

impl Session {
    /// Begin a new transaction
    ///
    /// # Examples
    ///
    /// ```
    /// # use sqlsession::{Session, params};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut session = Session::open("sqlite", ":memory:")?;
    /// # session.update("CREATE TABLE users (id INTEGER, name TEXT)", &[])?;
    /// session.begin()?;
    /// session.insert("INSERT INTO users VALUES (?, ?)", params![1, "Alice"])?;
    /// session.insert("INSERT INTO users VALUES (?, ?)", params![2, "Bob"])?;
    /// session.commit()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            return Err(DbError::already_in_transaction());
        }

        self.tx = Some(self.db.begin()?);
        debug!("transaction started");
        Ok(())
    }

    /// Commit the current transaction
    ///
    /// On failure the transaction stays open.
    pub fn commit(&mut self) -> Result<()> {
        let tx = self.tx.as_mut().ok_or_else(DbError::not_in_transaction)?;
        tx.commit()?;
        self.tx = None;
        debug!("transaction committed");
        Ok(())
    }

    /// Rollback the current transaction
    ///
    /// On failure the transaction stays open.
    pub fn rollback(&mut self) -> Result<()> {
        let tx = self.tx.as_mut().ok_or_else(DbError::not_in_transaction)?;
        tx.rollback()?;
        self.tx = None;
        debug!("transaction rolled back");
        Ok(())
    }

    /// Rolls back the open transaction, if any, for use as deferred cleanup.
    ///
    /// The session is idle afterwards even when the rollback fails; that
    /// error is dropped.
    pub fn end(&mut self) {
        let Some(mut tx) = self.tx.take() else {
            return;
        };
        match tx.rollback() {
            Ok(()) => debug!("transaction ended by rollback"),
            Err(err) => debug!(error = %err, "discarded rollback error while ending transaction"),
        }
    }
}
