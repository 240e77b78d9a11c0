// ============================================================================
// sqlsession Library
// ============================================================================

//! Session handle, transaction bookkeeping and generic row decoding on top
//! of SQL drivers.
//!
//! # Examples
//!
//! ```
//! use sqlsession::{Record, Session, params};
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[db("id")]
//!     id: i64,
//!     #[db("name")]
//!     name: String,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::open("sqlite", ":memory:")?;
//! session.update("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
//! let id = session.insert("INSERT INTO users (name) VALUES (?)", params!["Ann"])?;
//!
//! let users: Vec<User> = session.select("SELECT id, name FROM users WHERE id = ?", params![id])?;
//! assert_eq!(users[0].name, "Ann");
//! # Ok(())
//! # }
//! ```

// Lets `#[derive(Record)]` output resolve `::sqlsession` inside this crate.
extern crate self as sqlsession;

pub mod core;
pub mod decode;
pub mod driver;
pub mod result;
pub mod session;

pub use crate::core::{DbError, FromValue, Result, Row, Value};
pub use crate::decode::{DecodeError, Decoder, Dynamic, RowTarget, TargetShape, decode};
pub use crate::driver::{
    Database, Driver, SqliteConfig, SqliteDriver, Transaction, register_driver,
};
pub use crate::result::{ExecResult, Rows, Slot};
pub use crate::session::Session;
pub use sqlsession_derive::Record;

/// Builds a `&[Value]` argument list.
///
/// ```
/// use sqlsession::{Value, params};
///
/// let args: &[Value] = params![7, "Ann", None::<i64>];
/// assert_eq!(args[2], Value::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[$crate::Value]
    };
    ($($arg:expr),+ $(,)?) => {
        &[$($crate::Value::from($arg)),+] as &[$crate::Value]
    };
}
