//! Attribute filters.
//!
//! A filter is a bidirectional coercion between the storage form of an
//! attribute and its richer in-memory form. `input` runs when an attribute
//! is written (toward storage), `output` when it is read (toward the rich
//! type). Dispatch is a tagged variant, not runtime interception; each
//! variant's behavior is fixed at model-definition time.

use crate::error::{Result, TypeError};
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime};

/// Storage format for datetime attributes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value coercion applied on attribute reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Stored as 0/1 integer, read as boolean
    Boolean,
    /// Coerced to integer in both directions
    Integer,
    /// Coerced to double in both directions
    Float,
    /// Stored as `YYYY-MM-DD HH:MM:SS` text, read as a timestamp
    Datetime,
    /// Stored as serialized JSON text, read as a JSON value
    Json,
}

impl Filter {
    /// Coerce a value toward its storage form. NULL passes through every
    /// filter untouched.
    pub fn input(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }
        match self {
            Filter::Boolean => match value.as_bool() {
                Some(b) => Ok(Value::BigInt(i64::from(b))),
                None => Err(TypeError::new("BOOLEAN", value.type_name()).into()),
            },
            Filter::Integer => coerce_int(value),
            Filter::Float => coerce_float(value),
            Filter::Datetime => datetime_input(value),
            Filter::Json => json_input(value),
        }
    }

    /// Coerce a stored value toward its rich form.
    pub fn output(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }
        match self {
            Filter::Boolean => match value.as_bool() {
                Some(b) => Ok(Value::Bool(b)),
                None => Err(TypeError::new("BOOLEAN", value.type_name()).into()),
            },
            Filter::Integer => coerce_int(value),
            Filter::Float => coerce_float(value),
            Filter::Datetime => datetime_output(value),
            Filter::Json => json_output(value),
        }
    }
}

fn coerce_int(value: Value) -> Result<Value> {
    match &value {
        Value::BigInt(_) => Ok(value),
        Value::Bool(b) => Ok(Value::BigInt(i64::from(*b))),
        Value::Double(d) => {
            if d.fract() != 0.0 {
                tracing::warn!(value = *d, "truncating fractional value to integer");
            }
            Ok(Value::BigInt(*d as i64))
        }
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::BigInt)
            .map_err(|_| TypeError::new("BIGINT", format!("'{s}'")).into()),
        _ => Err(TypeError::new("BIGINT", value.type_name()).into()),
    }
}

fn coerce_float(value: Value) -> Result<Value> {
    match &value {
        Value::Double(_) => Ok(value),
        Value::BigInt(i) => Ok(Value::Double(*i as f64)),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| TypeError::new("DOUBLE", format!("'{s}'")).into()),
        _ => Err(TypeError::new("DOUBLE", value.type_name()).into()),
    }
}

fn datetime_input(value: Value) -> Result<Value> {
    match &value {
        Value::Timestamp(micros) => match DateTime::from_timestamp_micros(*micros) {
            Some(dt) => Ok(Value::Text(dt.format(DATETIME_FORMAT).to_string())),
            None => Err(TypeError::new("TIMESTAMP", format!("{micros}")).into()),
        },
        // Bare integers are unix seconds
        Value::BigInt(secs) => match DateTime::from_timestamp(*secs, 0) {
            Some(dt) => Ok(Value::Text(dt.format(DATETIME_FORMAT).to_string())),
            None => Err(TypeError::new("TIMESTAMP", format!("{secs}")).into()),
        },
        Value::Text(s) => {
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .map_err(|_| TypeError::new("DATETIME", format!("'{s}'")))?;
            Ok(value)
        }
        _ => Err(TypeError::new("DATETIME", value.type_name()).into()),
    }
}

fn datetime_output(value: Value) -> Result<Value> {
    match &value {
        Value::Timestamp(_) => Ok(value),
        Value::Text(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .map(|dt| Value::Timestamp(dt.and_utc().timestamp_micros()))
            .map_err(|_| TypeError::new("DATETIME", format!("'{s}'")).into()),
        _ => Err(TypeError::new("DATETIME", value.type_name()).into()),
    }
}

fn json_input(value: Value) -> Result<Value> {
    match &value {
        Value::Text(s) => {
            serde_json::from_str::<serde_json::Value>(s)
                .map_err(|_| TypeError::new("JSON", format!("'{s}'")))?;
            Ok(value)
        }
        _ => Ok(Value::Text(value.to_json().to_string())),
    }
}

fn json_output(value: Value) -> Result<Value> {
    match &value {
        Value::Json(_) => Ok(value),
        Value::Text(s) => serde_json::from_str::<serde_json::Value>(s)
            .map(Value::from_json)
            .map_err(|_| TypeError::new("JSON", format!("'{s}'")).into()),
        _ => Err(TypeError::new("JSON", value.type_name()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_round_trip() {
        let stored = Filter::Boolean.input(Value::Bool(true)).unwrap();
        assert_eq!(stored, Value::BigInt(1));
        assert_eq!(
            Filter::Boolean.output(stored).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Filter::Boolean.output(Value::BigInt(0)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn integer_coerces_text_and_bool() {
        assert_eq!(
            Filter::Integer.input(Value::Text(" 42 ".into())).unwrap(),
            Value::BigInt(42)
        );
        assert_eq!(
            Filter::Integer.input(Value::Bool(true)).unwrap(),
            Value::BigInt(1)
        );
        assert!(Filter::Integer.input(Value::Text("abc".into())).is_err());
    }

    #[test]
    fn float_coerces_int() {
        assert_eq!(
            Filter::Float.input(Value::BigInt(3)).unwrap(),
            Value::Double(3.0)
        );
    }

    #[test]
    fn datetime_round_trip() {
        let stored = Filter::Datetime.input(Value::BigInt(0)).unwrap();
        assert_eq!(stored, Value::Text("1970-01-01 00:00:00".into()));

        let rich = Filter::Datetime.output(stored).unwrap();
        assert_eq!(rich, Value::Timestamp(0));
    }

    #[test]
    fn datetime_rejects_garbage_text() {
        assert!(
            Filter::Datetime
                .input(Value::Text("not a date".into()))
                .is_err()
        );
        assert!(
            Filter::Datetime
                .output(Value::Text("2024-13-45 99:00:00".into()))
                .is_err()
        );
    }

    #[test]
    fn json_round_trip() {
        let rich = Value::Json(serde_json::json!({"a": [1, 2]}));
        let stored = Filter::Json.input(rich.clone()).unwrap();
        assert_eq!(stored, Value::Text(r#"{"a":[1,2]}"#.into()));
        assert_eq!(Filter::Json.output(stored).unwrap(), rich);
    }

    #[test]
    fn json_rejects_invalid_text() {
        assert!(Filter::Json.output(Value::Text("{oops".into())).is_err());
    }

    #[test]
    fn null_passes_through_every_filter() {
        for filter in [
            Filter::Boolean,
            Filter::Integer,
            Filter::Float,
            Filter::Datetime,
            Filter::Json,
        ] {
            assert_eq!(filter.input(Value::Null).unwrap(), Value::Null);
            assert_eq!(filter.output(Value::Null).unwrap(), Value::Null);
        }
    }
}
