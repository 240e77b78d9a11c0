pub mod convert;
pub mod error;
pub mod value;

pub use convert::FromValue;
pub use error::{DbError, Result};
pub use value::Value;

pub type Row = Vec<Value>;
