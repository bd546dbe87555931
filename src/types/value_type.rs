//! Type descriptors for Switchboard
//!
//! This module parses type descriptors into `ValueType` instances and
//! converts between literal strings and typed values.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Value;

/// String length marker for "no maximum length"
pub const UNBOUNDED: i64 = -1;

/// A parsed type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean type
    Boolean,
    /// Calendar date type
    Date,
    /// Date and time type, second precision
    Datetime,
    /// 64-bit signed integer type
    Int,
    /// String type with a maximum character count, [`UNBOUNDED`] for none
    String { limit: i64 },
    /// Universally unique identifier type
    Uuid,
}

impl ValueType {
    /// Parse a type descriptor.
    ///
    /// The accepted grammar is `boolean | date | datetime | int | string |
    /// uuid | string(N)` with N >= -1; anything else is rejected.
    pub fn parse(descriptor: &str) -> Result<Self> {
        match descriptor {
            "boolean" => return Ok(ValueType::Boolean),
            "date" => return Ok(ValueType::Date),
            "datetime" => return Ok(ValueType::Datetime),
            "int" => return Ok(ValueType::Int),
            "string" => return Ok(ValueType::String { limit: UNBOUNDED }),
            "uuid" => return Ok(ValueType::Uuid),
            _ => {}
        }

        if let Some(inner) = descriptor
            .strip_prefix("string(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let limit: i64 = inner
                .parse()
                .map_err(|_| Error::InvalidDescriptor(descriptor.to_string()))?;
            if limit < UNBOUNDED {
                return Err(Error::InvalidDescriptor(descriptor.to_string()));
            }
            return Ok(ValueType::String { limit });
        }

        Err(Error::InvalidDescriptor(descriptor.to_string()))
    }

    /// Get the type kind name
    pub fn kind(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Datetime => "datetime",
            ValueType::Int => "int",
            ValueType::String { .. } => "string",
            ValueType::Uuid => "uuid",
        }
    }

    /// Parse a literal string into a typed value.
    pub fn from_literal(&self, literal: &str) -> Result<Value> {
        match self {
            ValueType::Boolean => match literal {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(self.invalid_literal(literal)),
            },
            ValueType::Date => {
                let bytes = literal.as_bytes();
                if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
                    return Err(self.invalid_literal(literal));
                }
                NaiveDate::parse_from_str(literal, "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|_| self.invalid_literal(literal))
            }
            ValueType::Datetime => {
                let bytes = literal.as_bytes();
                if bytes.len() != 19
                    || bytes[4] != b'-'
                    || bytes[7] != b'-'
                    || bytes[10] != b'T'
                    || bytes[13] != b':'
                    || bytes[16] != b':'
                {
                    return Err(self.invalid_literal(literal));
                }
                NaiveDateTime::parse_from_str(literal, "%Y-%m-%dT%H:%M:%S")
                    .map(Value::Datetime)
                    .map_err(|_| self.invalid_literal(literal))
            }
            ValueType::Int => literal
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.invalid_literal(literal)),
            ValueType::String { limit } => {
                if *limit >= 0 {
                    let actual = literal.chars().count();
                    if actual as i64 > *limit {
                        return Err(Error::LengthOverflow {
                            actual,
                            max: *limit,
                        });
                    }
                }
                Ok(Value::String(literal.to_string()))
            }
            // Only serialization is supported for uuid values today.
            ValueType::Uuid => Err(Error::UuidLiteralUnsupported),
        }
    }

    fn invalid_literal(&self, literal: &str) -> Error {
        Error::InvalidLiteral {
            kind: self.kind(),
            literal: literal.to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String { limit } if *limit != UNBOUNDED => write!(f, "string({})", limit),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_descriptors() {
        assert_eq!(ValueType::parse("boolean").unwrap(), ValueType::Boolean);
        assert_eq!(ValueType::parse("date").unwrap(), ValueType::Date);
        assert_eq!(ValueType::parse("datetime").unwrap(), ValueType::Datetime);
        assert_eq!(ValueType::parse("int").unwrap(), ValueType::Int);
        assert_eq!(
            ValueType::parse("string").unwrap(),
            ValueType::String { limit: UNBOUNDED }
        );
        assert_eq!(ValueType::parse("uuid").unwrap(), ValueType::Uuid);
    }

    #[test]
    fn test_parse_bounded_string() {
        assert_eq!(
            ValueType::parse("string(32)").unwrap(),
            ValueType::String { limit: 32 }
        );
        // string(-1) is interchangeable with the unbounded string
        assert_eq!(
            ValueType::parse("string(-1)").unwrap(),
            ValueType::parse("string").unwrap()
        );
        assert_eq!(
            ValueType::parse("string(0)").unwrap(),
            ValueType::String { limit: 0 }
        );
    }

    #[test]
    fn test_parse_rejects_bad_descriptors() {
        for descriptor in [
            "text",
            "Boolean",
            "string(",
            "string()",
            "string(abc)",
            "string(-2)",
            "string(5)x",
            "",
        ] {
            assert!(
                matches!(
                    ValueType::parse(descriptor),
                    Err(Error::InvalidDescriptor(_))
                ),
                "descriptor '{}' should be rejected",
                descriptor
            );
        }
    }

    #[test]
    fn test_boolean_literals() {
        assert_eq!(
            ValueType::Boolean.from_literal("true").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            ValueType::Boolean.from_literal("false").unwrap(),
            Value::Boolean(false)
        );
        assert!(ValueType::Boolean.from_literal("TRUE").is_err());
        assert!(ValueType::Boolean.from_literal("1").is_err());
    }

    #[test]
    fn test_int_literals() {
        assert_eq!(ValueType::Int.from_literal("42").unwrap(), Value::Int(42));
        assert_eq!(ValueType::Int.from_literal("-7").unwrap(), Value::Int(-7));
        assert!(ValueType::Int.from_literal("4.2").is_err());
        assert!(ValueType::Int.from_literal("forty").is_err());
    }

    #[test]
    fn test_date_literals() {
        assert_eq!(
            ValueType::Date.from_literal("2024-01-15").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        // wrong length, wrong separators, impossible dates
        assert!(ValueType::Date.from_literal("2024-1-15").is_err());
        assert!(ValueType::Date.from_literal("2024/01/15").is_err());
        assert!(ValueType::Date.from_literal("2024-02-30").is_err());
        assert!(ValueType::Date.from_literal("2024-01-15T00:00:00").is_err());
    }

    #[test]
    fn test_datetime_literals() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 5)
            .unwrap();
        assert_eq!(
            ValueType::Datetime.from_literal("2024-01-15T10:30:05").unwrap(),
            Value::Datetime(expected)
        );
        assert!(ValueType::Datetime.from_literal("2024-01-15 10:30:05").is_err());
        assert!(ValueType::Datetime.from_literal("2024-01-15T25:00:00").is_err());
        assert!(ValueType::Datetime.from_literal("2024-01-15T10:30").is_err());
    }

    #[test]
    fn test_string_length_limit() {
        let bounded = ValueType::String { limit: 4 };
        assert_eq!(
            bounded.from_literal("abcd").unwrap(),
            Value::String("abcd".to_string())
        );
        assert!(matches!(
            bounded.from_literal("abcde"),
            Err(Error::LengthOverflow { actual: 5, max: 4 })
        ));

        // limits count characters, not bytes
        assert!(bounded.from_literal("héllo").is_err());
        assert!(ValueType::String { limit: 5 }.from_literal("héllo").is_ok());

        let unbounded = ValueType::String { limit: UNBOUNDED };
        assert!(unbounded.from_literal(&"x".repeat(10_000)).is_ok());
    }

    #[test]
    fn test_uuid_literal_unsupported() {
        assert!(matches!(
            ValueType::Uuid.from_literal("67e55044-10b1-426f-9247-bb680e5fe0c8"),
            Err(Error::UuidLiteralUnsupported)
        ));
    }

    #[test]
    fn test_literal_round_trip() {
        for (value_type, literal) in [
            (ValueType::Boolean, "true"),
            (ValueType::Int, "-9007199254740993"),
            (ValueType::String { limit: UNBOUNDED }, "hello world"),
        ] {
            let value = value_type.from_literal(literal).unwrap();
            assert_eq!(value.to_literal(), literal);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueType::String { limit: 32 }.to_string(), "string(32)");
        assert_eq!(ValueType::String { limit: UNBOUNDED }.to_string(), "string");
        assert_eq!(ValueType::Datetime.to_string(), "datetime");
    }
}
