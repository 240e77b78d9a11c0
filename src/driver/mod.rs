//! Driver seam.
//!
//! A [`Driver`] opens a [`Database`] handle from an opaque data source
//! string. The handle is shared by every session opened on it and must be
//! safe for concurrent use; a [`Transaction`] is owned by exactly one
//! session at a time.

pub mod config;
pub mod registry;
pub mod sqlite;

use std::sync::Arc;

use crate::core::{Result, Value};
use crate::result::{ExecResult, Rows};

pub use config::SqliteConfig;
pub use registry::{drivers, lookup_driver, register_driver};
pub use sqlite::SqliteDriver;

pub trait Driver: Send + Sync {
    fn open(&self, data_source: &str) -> Result<Arc<dyn Database>>;
}

/// Long-lived, shareable database handle.
pub trait Database: Send + Sync {
    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult>;

    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows>;

    fn begin(&self) -> Result<Box<dyn Transaction>>;

    /// Closes the handle. Later calls on it fail with a connection error.
    fn close(&self) -> Result<()>;
}

/// An open transaction.
///
/// `commit` and `rollback` leave the transaction usable for another attempt
/// when they fail.
pub trait Transaction: Send {
    fn exec(&mut self, sql: &str, args: &[Value]) -> Result<ExecResult>;

    fn query(&mut self, sql: &str, args: &[Value]) -> Result<Rows>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}
