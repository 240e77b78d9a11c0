use crate::core::{DbError, Result};

/// Outcome of a mutating statement, as reported by the driver.
///
/// Either figure may be missing when the driver cannot report it; the
/// accessors turn that into an [`DbError::ExecutionError`] instead of a
/// silent zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    last_insert_id: Option<i64>,
    rows_affected: Option<i64>,
}

impl ExecResult {
    pub fn new(last_insert_id: Option<i64>, rows_affected: Option<i64>) -> Self {
        Self {
            last_insert_id,
            rows_affected,
        }
    }

    pub fn last_insert_id(&self) -> Result<i64> {
        self.last_insert_id.ok_or_else(|| {
            DbError::ExecutionError("driver does not support LastInsertId".into())
        })
    }

    pub fn rows_affected(&self) -> Result<i64> {
        self.rows_affected.ok_or_else(|| {
            DbError::ExecutionError("driver does not support RowsAffected".into())
        })
    }
}
