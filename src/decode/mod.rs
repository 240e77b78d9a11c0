//! Generic row decoding.
//!
//! A query's [`Rows`] are turned into one value of a target type per row.
//! The target's [`TargetShape`] is determined once, before the first row:
//!
//! * **Mapping** targets (`HashMap<String, V>`, `BTreeMap<String, V>`) receive
//!   every column under its name, passed through [`Dynamic::from_scanned`].
//! * **Record** targets (structs deriving `Record`) publish a static
//!   descriptor of their annotated columns; each matching column is converted
//!   into its field with [`FromValue`](crate::FromValue).
//! * Anything else is rejected with [`DbError::UnsupportedTargetType`].

mod mapping;
mod record;

use std::fmt;
use std::marker::PhantomData;

use tracing::trace;

use crate::core::{DbError, Result, Value};
use crate::result::{Rows, Slot};

pub use mapping::Dynamic;
pub use record::descriptor;

/// How a target type consumes the columns of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    Mapping,
    Record,
    Unsupported(&'static str),
}

/// A type rows can be decoded into.
///
/// Mapping types implement [`RowTarget::insert_column`]; record types,
/// normally through `#[derive(Record)]`, implement [`RowTarget::describe`]
/// and [`RowTarget::assign`].
pub trait RowTarget: Default {
    fn shape() -> TargetShape;

    /// Appends the annotated column names of a record, depth-first, with
    /// flattened records expanded in place. The position of a name in the
    /// list is its field locator.
    fn describe(_columns: &mut Vec<&'static str>) {}

    /// Number of locators [`RowTarget::describe`] produces.
    fn width() -> usize {
        let mut columns = Vec::new();
        Self::describe(&mut columns);
        columns.len()
    }

    /// Writes a scanned value into the field at `locator`.
    fn assign(&mut self, locator: usize, _value: Value) -> Result<()> {
        Err(DbError::ScanError(format!(
            "no field at locator {} in target",
            locator
        )))
    }

    /// Stores a scanned value under its column name.
    fn insert_column(&mut self, _column: &str, _value: Value) {}
}

macro_rules! unsupported_targets {
    ($($ty:ty),*) => {
        $(
            impl RowTarget for $ty {
                fn shape() -> TargetShape {
                    TargetShape::Unsupported(stringify!($ty))
                }
            }
        )*
    };
}

unsupported_targets!(i64, i32, f64, bool, String, Vec<u8>, Value, Vec<Value>);

enum Plan {
    Mapping,
    /// Field locator per column; `None` columns scan into a discard slot.
    Record(Vec<Option<usize>>),
}

/// Iterator decoding one `T` per row.
///
/// The first scan or conversion failure is yielded as an error and ends the
/// iteration; values yielded before it stay valid.
pub struct Decoder<T> {
    rows: Rows,
    plan: Plan,
    finished: bool,
    _target: PhantomData<fn() -> T>,
}

impl<T: RowTarget> Decoder<T> {
    pub fn new(rows: Rows) -> Result<Self> {
        let plan = match T::shape() {
            TargetShape::Mapping => Plan::Mapping,
            TargetShape::Record => Plan::Record(record::bind_columns::<T>(&rows)),
            TargetShape::Unsupported(name) => {
                return Err(DbError::UnsupportedTargetType(name.to_string()));
            }
        };

        Ok(Self {
            rows,
            plan,
            finished: false,
            _target: PhantomData,
        })
    }

    pub fn columns(&self) -> &[String] {
        self.rows.columns()
    }

    fn decode_current(&mut self) -> Result<T> {
        let mut target = T::default();

        match &self.plan {
            Plan::Mapping => {
                let mut slots = vec![Slot::Empty; self.rows.columns().len()];
                self.rows.scan(&mut slots)?;
                for (column, mut slot) in self.rows.columns().iter().zip(slots) {
                    if let Some(value) = slot.take() {
                        target.insert_column(column, value);
                    }
                }
            }
            Plan::Record(bindings) => {
                let mut slots: Vec<Slot> = bindings
                    .iter()
                    .map(|binding| match binding {
                        Some(_) => Slot::Empty,
                        None => Slot::Discard,
                    })
                    .collect();
                self.rows.scan(&mut slots)?;

                for (index, (binding, mut slot)) in bindings.iter().zip(slots).enumerate() {
                    let (Some(locator), Some(value)) = (binding, slot.take()) else {
                        continue;
                    };
                    target
                        .assign(*locator, value)
                        .map_err(|err| in_column(err, &self.rows.columns()[index]))?;
                }
            }
        }

        Ok(target)
    }
}

fn in_column(err: DbError, column: &str) -> DbError {
    match err {
        DbError::ScanError(msg) => {
            DbError::ScanError(format!("column {:?}: {}", column, msg))
        }
        other => other,
    }
}

impl<T: RowTarget> Iterator for Decoder<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || !self.rows.advance() {
            self.finished = true;
            return None;
        }

        let item = self.decode_current();
        if let Err(err) = &item {
            trace!(error = %err, "row decode aborted");
            self.finished = true;
        }
        Some(item)
    }
}

impl<T: RowTarget> std::iter::FusedIterator for Decoder<T> {}

/// Failure of [`decode`], carrying the values decoded before it.
pub struct DecodeError<T> {
    pub decoded: Vec<T>,
    pub error: DbError,
}

impl<T> fmt::Debug for DecodeError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("decoded", &self.decoded.len())
            .field("error", &self.error)
            .finish()
    }
}

impl<T> fmt::Display for DecodeError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (after {} decoded rows)",
            self.error,
            self.decoded.len()
        )
    }
}

impl<T> std::error::Error for DecodeError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<DecodeError<T>> for DbError {
    fn from(err: DecodeError<T>) -> Self {
        err.error
    }
}

/// Decodes every row of `rows` into `T`.
///
/// Decoding is append-only: on failure the rows decoded so far are returned
/// inside the [`DecodeError`].
pub fn decode<T: RowTarget>(rows: Rows) -> std::result::Result<Vec<T>, DecodeError<T>> {
    let decoder = Decoder::<T>::new(rows).map_err(|error| DecodeError {
        decoded: Vec::new(),
        error,
    })?;

    let mut decoded = Vec::new();
    for item in decoder {
        match item {
            Ok(value) => decoded.push(value),
            Err(error) => return Err(DecodeError { decoded, error }),
        }
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        id: i64,
        label: Option<String>,
    }

    // Hand-written equivalent of a derived record.
    impl RowTarget for Pair {
        fn shape() -> TargetShape {
            TargetShape::Record
        }

        fn describe(columns: &mut Vec<&'static str>) {
            columns.push("id");
            columns.push("label");
        }

        fn assign(&mut self, locator: usize, value: Value) -> Result<()> {
            match locator {
                0 => self.id = crate::FromValue::from_value(value)?,
                1 => self.label = crate::FromValue::from_value(value)?,
                _ => return Err(DbError::ScanError("bad locator".into())),
            }
            Ok(())
        }
    }

    fn rows(columns: &[&str], data: Vec<Vec<Value>>) -> Rows {
        Rows::new(columns.iter().map(|c| c.to_string()).collect(), data)
    }

    #[test]
    fn test_empty_result_set() {
        let maps: Vec<HashMap<String, Value>> = decode(rows(&["id"], Vec::new())).unwrap();
        assert!(maps.is_empty());

        let records: Vec<Pair> = decode(rows(&["id"], Vec::new())).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_mapping_coerces_bytes() {
        let result: Vec<HashMap<String, Value>> = decode(rows(
            &["id", "name"],
            vec![vec![Value::Integer(7), Value::Blob(b"Ann".to_vec())]],
        ))
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["id"], Value::Integer(7));
        assert_eq!(result[0]["name"], Value::Text("Ann".into()));
    }

    #[test]
    fn test_mapping_key_set_equals_columns() {
        let result: Vec<BTreeMap<String, Value>> = decode(rows(
            &["b", "a", "c"],
            vec![vec![Value::Null, Value::Boolean(true), Value::Float(1.5)]],
        ))
        .unwrap();

        let keys: Vec<&str> = result[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(result[0]["b"], Value::Null);
    }

    #[test]
    fn test_record_ignores_unmatched_columns() {
        let result: Vec<Pair> = decode(rows(
            &["extra", "id"],
            vec![vec![Value::Text("ignored".into()), Value::Integer(3)]],
        ))
        .unwrap();

        assert_eq!(
            result,
            vec![Pair {
                id: 3,
                label: None
            }]
        );
    }

    #[test]
    fn test_unsupported_target_fails_before_rows() {
        let err = Decoder::<i64>::new(rows(&["id"], vec![vec![Value::Integer(1)]]))
            .err()
            .unwrap();
        assert!(matches!(err, DbError::UnsupportedTargetType(_)));
    }

    #[test]
    fn test_scan_error_keeps_earlier_rows() {
        let err = decode::<Pair>(rows(
            &["id"],
            vec![
                vec![Value::Integer(1)],
                vec![Value::Null],
                vec![Value::Integer(3)],
            ],
        ))
        .unwrap_err();

        assert_eq!(err.decoded, vec![Pair { id: 1, label: None }]);
        match err.error {
            DbError::ScanError(msg) => assert!(msg.contains("\"id\""), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_decoder_stops_after_error() {
        let mut decoder = Decoder::<Pair>::new(rows(
            &["id"],
            vec![vec![Value::Text("x".into())], vec![Value::Integer(2)]],
        ))
        .unwrap();

        assert!(decoder.next().unwrap().is_err());
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_width_follows_describe() {
        assert_eq!(Pair::width(), 2);
        assert_eq!(<HashMap<String, Value>>::width(), 0);
    }
}
