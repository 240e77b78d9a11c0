mod result;
mod rows;

pub use result::ExecResult;
pub use rows::{Rows, Slot};
