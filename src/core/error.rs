use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Opening or closing the underlying handle failed, or the handle is closed.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A mutating statement failed, or its id / row count is unavailable.
    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    /// Copying a row into its destinations failed.
    #[error("Scan error: {0}")]
    ScanError(String),

    #[error("Unsupported target type: {0} (return type must be a record or a map)")]
    UnsupportedTargetType(String),

    #[error("Transaction state error: {0}")]
    TransactionStateError(String),
}

impl DbError {
    pub(crate) fn already_in_transaction() -> Self {
        Self::TransactionStateError("previous transaction not closed".into())
    }

    pub(crate) fn not_in_transaction() -> Self {
        Self::TransactionStateError("not in transaction".into())
    }

    pub(crate) fn database_closed() -> Self {
        Self::ConnectionError("sql: database is closed".into())
    }

    pub fn is_transaction_state(&self) -> bool {
        matches!(self, Self::TransactionStateError(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::ConnectionError(err.to_string())
    }
}
