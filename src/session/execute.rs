use tracing::trace;

use crate::core::{Result, Value};
use crate::result::ExecResult;
use crate::session::Session;

impl Session {
    /// Runs a mutating statement on the open transaction, or on the shared
    /// handle when there is none.
    fn exec(&mut self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        match self.tx.as_mut() {
            Some(tx) => {
                trace!(sql, "exec in transaction");
                tx.exec(sql, args)
            }
            None => self.db.exec(sql, args),
        }
    }

    /// Executes an insert and returns the driver-reported id of the new row.
    ///
    /// Fails with an execution error when the driver cannot report one.
    pub fn insert(&mut self, sql: &str, args: &[Value]) -> Result<i64> {
        self.exec(sql, args)?.last_insert_id()
    }

    /// Executes a statement and returns the number of affected rows.
    pub fn update(&mut self, sql: &str, args: &[Value]) -> Result<i64> {
        self.exec(sql, args)?.rows_affected()
    }
}
