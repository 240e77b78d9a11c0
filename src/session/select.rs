use crate::core::{Result, Value};
use crate::decode::{RowTarget, decode};
use crate::result::Rows;
use crate::session::Session;

impl Session {
    /// Issues a read statement on the open transaction, or on the shared
    /// handle when there is none.
    pub fn query(&mut self, sql: &str, args: &[Value]) -> Result<Rows> {
        match self.tx.as_mut() {
            Some(tx) => tx.query(sql, args),
            None => self.db.query(sql, args),
        }
    }

    /// Queries and decodes every row into `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::HashMap;
    /// # use sqlsession::{Session, Value};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut session = Session::open("sqlite", ":memory:")?;
    /// let rows: Vec<HashMap<String, Value>> = session.select("SELECT 1 AS one", &[])?;
    /// assert_eq!(rows[0]["one"], Value::Integer(1));
    /// # Ok(())
    /// # }
    /// ```
    pub fn select<T: RowTarget>(&mut self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        let rows = self.query(sql, args)?;
        Ok(decode(rows)?)
    }
}
