//! `EvalType`, `FieldType` and `Value` definitions.

use std::cmp::Ordering;
use std::fmt;

use arrow::datatypes::{DataType as ArrowDataType, Field, TimeUnit};
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::kernels::compare::{compare_int_pair, compare_real_pair};

/// Element domain of a column or expression.
///
/// Every kernel is specific to one domain; mixing domains is a contract
/// violation by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvalType {
    /// 64-bit integer, signed or unsigned depending on [`FieldType::unsigned`].
    Int,
    /// 64-bit floating point.
    Real,
    /// Fixed-size 128-bit decimal.
    Decimal,
    /// Byte string compared with binary collation.
    String,
    /// Signed duration in nanoseconds.
    Duration,
    /// Point in time, microseconds since the Unix epoch.
    Time,
    /// JSON document text.
    Json,
}

impl EvalType {
    /// All domains, in declaration order.
    pub const ALL: [EvalType; 7] = [
        EvalType::Int,
        EvalType::Real,
        EvalType::Decimal,
        EvalType::String,
        EvalType::Duration,
        EvalType::Time,
        EvalType::Json,
    ];

    /// Returns the SQL-facing name of the domain.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EvalType::Int => "INT",
            EvalType::Real => "REAL",
            EvalType::Decimal => "DECIMAL",
            EvalType::String => "STRING",
            EvalType::Duration => "DURATION",
            EvalType::Time => "TIME",
            EvalType::Json => "JSON",
        }
    }

    /// Returns whether columns of this domain store fixed-width slots.
    #[must_use]
    pub fn is_fixed_width(&self) -> bool {
        !matches!(self, EvalType::String | EvalType::Json)
    }

    /// Maps an Arrow data type onto the domain that reads it.
    ///
    /// Returns None for unsupported Arrow types.
    #[must_use]
    pub fn from_arrow(arrow_type: &ArrowDataType) -> Option<Self> {
        match arrow_type {
            ArrowDataType::Int8
            | ArrowDataType::Int16
            | ArrowDataType::Int32
            | ArrowDataType::Int64
            | ArrowDataType::UInt8
            | ArrowDataType::UInt16
            | ArrowDataType::UInt32
            | ArrowDataType::UInt64
            | ArrowDataType::Boolean => Some(EvalType::Int),
            ArrowDataType::Float32 | ArrowDataType::Float64 => Some(EvalType::Real),
            ArrowDataType::Decimal128(_, _) => Some(EvalType::Decimal),
            ArrowDataType::Utf8
            | ArrowDataType::LargeUtf8
            | ArrowDataType::Binary
            | ArrowDataType::LargeBinary => Some(EvalType::String),
            ArrowDataType::Duration(_) => Some(EvalType::Duration),
            ArrowDataType::Timestamp(_, _) | ArrowDataType::Date32 => Some(EvalType::Time),
            _ => None,
        }
    }

    /// Returns the Arrow type a column of this domain exports to.
    ///
    /// Decimal exports carry their scale separately; see
    /// [`crate::vectorized::Column::to_array`].
    #[must_use]
    pub fn to_arrow(&self, unsigned: bool) -> ArrowDataType {
        match self {
            EvalType::Int if unsigned => ArrowDataType::UInt64,
            EvalType::Int => ArrowDataType::Int64,
            EvalType::Real => ArrowDataType::Float64,
            EvalType::Decimal => ArrowDataType::Decimal128(38, 10),
            EvalType::String => ArrowDataType::Binary,
            EvalType::Duration => ArrowDataType::Duration(TimeUnit::Nanosecond),
            EvalType::Time => ArrowDataType::Timestamp(TimeUnit::Microsecond, None),
            EvalType::Json => ArrowDataType::Utf8,
        }
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static type information of an expression, fixed by type inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldType {
    /// Element domain.
    pub eval_type: EvalType,
    /// Unsigned interpretation of `Int` values.
    pub unsigned: bool,
    /// Whether the expression may produce NULL.
    pub nullable: bool,
}

impl FieldType {
    /// Creates a signed, nullable field type.
    #[must_use]
    pub fn new(eval_type: EvalType) -> Self {
        FieldType {
            eval_type,
            unsigned: false,
            nullable: true,
        }
    }

    /// Shorthand for a signed `Int` field.
    #[must_use]
    pub fn int() -> Self {
        FieldType::new(EvalType::Int)
    }

    /// Shorthand for an unsigned `Int` field.
    #[must_use]
    pub fn unsigned_int() -> Self {
        FieldType::new(EvalType::Int).with_unsigned(true)
    }

    /// Sets the unsigned flag.
    #[must_use]
    pub fn with_unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    /// Sets nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Derives the field type of an Arrow field.
    ///
    /// Unsigned Arrow integers map to unsigned `Int`.
    #[must_use]
    pub fn from_arrow(field: &Field) -> Option<Self> {
        let eval_type = EvalType::from_arrow(field.data_type())?;
        let unsigned = matches!(
            field.data_type(),
            ArrowDataType::UInt8
                | ArrowDataType::UInt16
                | ArrowDataType::UInt32
                | ArrowDataType::UInt64
        );
        Some(FieldType {
            eval_type,
            unsigned,
            nullable: field.is_nullable(),
        })
    }
}

/// Row-level scalar value.
///
/// `Int` holds the raw 64-bit pattern; whether it reads as signed or unsigned
/// is decided by the owning expression's [`FieldType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit integer bit pattern.
    Int(i64),
    /// 64-bit floating point value.
    Real(f64),
    /// Decimal value.
    Decimal(Decimal),
    /// Byte string.
    String(Vec<u8>),
    /// Duration in nanoseconds.
    Duration(i64),
    /// Microseconds since the Unix epoch.
    Time(i64),
    /// JSON document text.
    Json(String),
    /// Null value.
    Null,
}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the domain of this value, or None for Null.
    #[must_use]
    pub fn eval_type(&self) -> Option<EvalType> {
        match self {
            Value::Int(_) => Some(EvalType::Int),
            Value::Real(_) => Some(EvalType::Real),
            Value::Decimal(_) => Some(EvalType::Decimal),
            Value::String(_) => Some(EvalType::String),
            Value::Duration(_) => Some(EvalType::Duration),
            Value::Time(_) => Some(EvalType::Time),
            Value::Json(_) => Some(EvalType::Json),
            Value::Null => None,
        }
    }

    /// Creates a string value from text.
    #[must_use]
    pub fn string(s: &str) -> Self {
        Value::String(s.as_bytes().to_vec())
    }

    /// Attempts to extract an integer bit pattern.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract an f64 value.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to extract a decimal value.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Attempts to extract the bytes of a string value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(b) => Some(b.as_slice()),
            Value::Json(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Compares two non-null values of the same domain.
    ///
    /// `Int` operands are compared with the given signedness flags, so the
    /// bit pattern of `-1` read as unsigned is greater than any signed value.
    /// Returns None if either value is null or the domains differ.
    #[must_use]
    pub fn compare(
        &self,
        other: &Value,
        lhs_unsigned: bool,
        rhs_unsigned: bool,
    ) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                Some(compare_int_pair(lhs_unsigned, rhs_unsigned, *a, *b).cmp(&0))
            }
            (Value::Duration(a), Value::Duration(b)) | (Value::Time(a), Value::Time(b)) => {
                Some(a.cmp(b))
            }
            (Value::Real(a), Value::Real(b)) => Some(compare_real_pair(*a, *b).cmp(&0)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.as_slice().cmp(b.as_slice())),
            (Value::Json(a), Value::Json(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            Value::Duration(nanos) => {
                let sign = if *nanos < 0 { "-" } else { "" };
                let total = nanos.unsigned_abs();
                let secs = total / 1_000_000_000;
                let micros = (total % 1_000_000_000) / 1_000;
                write!(
                    f,
                    "{sign}{:02}:{:02}:{:02}.{micros:06}",
                    secs / 3600,
                    (secs / 60) % 60,
                    secs % 60
                )
            }
            Value::Time(micros) => match DateTime::from_timestamp_micros(*micros) {
                Some(dt) => write!(f, "{}", dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f")),
                None => write!(f, "<invalid time {micros}>"),
            },
            Value::Json(v) => f.write_str(v),
            Value::Null => f.write_str("NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_type_fixed_width() {
        assert!(EvalType::Int.is_fixed_width());
        assert!(EvalType::Decimal.is_fixed_width());
        assert!(EvalType::Time.is_fixed_width());
        assert!(!EvalType::String.is_fixed_width());
        assert!(!EvalType::Json.is_fixed_width());
    }

    #[test]
    fn test_field_type_from_arrow_unsigned() {
        let field = Field::new("u", ArrowDataType::UInt64, true);
        let ft = FieldType::from_arrow(&field).unwrap();
        assert_eq!(ft.eval_type, EvalType::Int);
        assert!(ft.unsigned);

        let field = Field::new("s", ArrowDataType::Int32, false);
        let ft = FieldType::from_arrow(&field).unwrap();
        assert!(!ft.unsigned);
        assert!(!ft.nullable);
    }

    #[test]
    fn test_compare_int_signedness() {
        let all_ones = Value::Int(-1);
        let zero = Value::Int(0);
        assert_eq!(all_ones.compare(&zero, false, false), Some(Ordering::Less));
        assert_eq!(all_ones.compare(&zero, true, false), Some(Ordering::Greater));
        assert_eq!(zero.compare(&all_ones, false, true), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_null_is_none() {
        assert_eq!(Value::Null.compare(&Value::Int(1), false, false), None);
        assert_eq!(Value::Int(1).compare(&Value::Real(1.0), false, false), None);
    }

    #[test]
    fn test_display_duration_and_time() {
        assert_eq!(Value::Duration(3_723_000_000_000).to_string(), "01:02:03.000000");
        assert_eq!(Value::Duration(-1_500_000).to_string(), "-00:00:00.001500");
        assert_eq!(Value::Time(0).to_string(), "1970-01-01 00:00:00.000000");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
