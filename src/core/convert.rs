//! Conversion of scanned column values into record field types.
//!
//! The rules follow what SQL drivers usually do when scanning into a typed
//! destination: numbers convert between widths when they fit, text parses
//! into numbers and dates, and `NULL` only fits an `Option`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::core::{DbError, Result, Value};

/// A type that can be the destination of a scanned column.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn unsupported<T>(value: &Value, target: &str) -> Result<T> {
    Err(DbError::ScanError(format!(
        "unsupported conversion of {} value {} into type {}",
        value.type_name(),
        value,
        target
    )))
}

fn null_into<T>(target: &str) -> Result<T> {
    Err(DbError::ScanError(format!(
        "converting NULL to {} is unsupported",
        target
    )))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            Value::Boolean(b) => Ok(i64::from(b)),
            // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
            Value::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(f as i64)
            }
            Value::Text(ref s) => s.trim().parse::<i64>().map_err(|err| {
                DbError::ScanError(format!("converting {:?} to i64: {}", s, err))
            }),
            Value::Null => null_into("i64"),
            ref other => unsupported(other, "i64"),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    if value.is_null() {
                        return null_into(stringify!($ty));
                    }
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| {
                        DbError::ScanError(format!(
                            "converting {} to {}: value out of range",
                            wide,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            Value::Text(ref s) => s.trim().parse::<f64>().map_err(|err| {
                DbError::ScanError(format!("converting {:?} to f64: {}", s, err))
            }),
            Value::Null => null_into("f64"),
            ref other => unsupported(other, "f64"),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            Value::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" => Ok(true),
                "0" | "f" | "false" => Ok(false),
                _ => Err(DbError::ScanError(format!(
                    "converting {:?} to bool: invalid syntax",
                    s
                ))),
            },
            Value::Null => null_into("bool"),
            ref other => unsupported(other, "bool"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Blob(bytes) => String::from_utf8(bytes).map_err(|err| {
                DbError::ScanError(format!("converting BLOB to String: {}", err))
            }),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Null => null_into("String"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(bytes) => Ok(bytes),
            Value::Text(s) => Ok(s.into_bytes()),
            // A nil byte slice in scan terms: empty, not an error.
            Value::Null => Ok(Vec::new()),
            ref other => unsupported(other, "Vec<u8>"),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Text(ref s) => serde_json::from_str(s).map_err(|err| {
                DbError::ScanError(format!("converting TEXT to JSON: {}", err))
            }),
            Value::Blob(ref b) => serde_json::from_slice(b).map_err(|err| {
                DbError::ScanError(format!("converting BLOB to JSON: {}", err))
            }),
            Value::Integer(i) => Ok(serde_json::Value::from(i)),
            Value::Float(f) => Ok(serde_json::Value::from(f)),
            Value::Boolean(b) => Ok(serde_json::Value::Bool(b)),
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(ref s) => parse_naive_datetime(s).ok_or_else(|| {
                DbError::ScanError(format!("converting {:?} to NaiveDateTime", s))
            }),
            Value::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    DbError::ScanError(format!("timestamp {} out of range", secs))
                }),
            Value::Null => null_into("NaiveDateTime"),
            ref other => unsupported(other, "NaiveDateTime"),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(ref s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| parse_naive_datetime(s).map(|naive| Utc.from_utc_datetime(&naive)))
                .ok_or_else(|| {
                    DbError::ScanError(format!("converting {:?} to DateTime<Utc>", s))
                }),
            Value::Integer(secs) => DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                DbError::ScanError(format!("timestamp {} out of range", secs))
            }),
            Value::Null => null_into("DateTime<Utc>"),
            ref other => unsupported(other, "DateTime<Utc>"),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(ref s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| parse_naive_datetime(s).map(|dt| dt.date()))
                .ok_or_else(|| DbError::ScanError(format!("converting {:?} to NaiveDate", s))),
            Value::Null => null_into("NaiveDate"),
            ref other => unsupported(other, "NaiveDate"),
        }
    }
}
