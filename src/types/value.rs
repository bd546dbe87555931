//! Runtime values for Switchboard
//!
//! A `Value` is a typed literal bound to a variable or rendered into a
//! response body or query parameter.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

/// A typed runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value
    Boolean(bool),
    /// Calendar date (no time component)
    Date(NaiveDate),
    /// Date and time, second precision
    Datetime(NaiveDateTime),
    /// 64-bit signed integer
    Int(i64),
    /// Character string
    String(String),
    /// Universally unique identifier
    Uuid(Uuid),
}

impl Value {
    /// Get the type kind name for this value
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::Datetime(_) => "datetime",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Uuid(_) => "uuid",
        }
    }

    /// Serialize this value to its literal text form.
    ///
    /// Boolean, int and string round-trip exactly through
    /// [`ValueType::from_literal`](crate::types::ValueType::from_literal);
    /// temporal kinds serialize to a canonical UTC timestamp.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Boolean(value) => {
                if *value {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            Value::Date(value) => value
                .and_time(NaiveTime::MIN)
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            Value::Datetime(value) => value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            Value::Int(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Uuid(value) => value.to_string(),
        }
    }
}
