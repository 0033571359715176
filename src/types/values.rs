use std::fmt;

use super::{LogicalType, TypeError};

/// Represents a dynamically typed, nullable single value.
/// This is the single-valued counter-part of arrow’s `Array`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    /// represents `DataType::Null` (castable to/from any other type)
    Null,
    /// true or false value
    Boolean(Option<bool>),
    /// 32bit float
    Float32(Option<f32>),
    /// 64bit float
    Float64(Option<f64>),
    /// signed 8bit int
    Int8(Option<i8>),
    /// signed 16bit int
    Int16(Option<i16>),
    /// signed 32bit int
    Int32(Option<i32>),
    /// signed 64bit int
    Int64(Option<i64>),
    /// unsigned 8bit int
    UInt8(Option<u8>),
    /// unsigned 16bit int
    UInt16(Option<u16>),
    /// unsigned 32bit int
    UInt32(Option<u32>),
    /// unsigned 64bit int
    UInt64(Option<u64>),
    /// utf-8 encoded string.
    String(Option<String>),
}

macro_rules! impl_scalar {
    ($ty:ty, $scalar:tt) => {
        impl From<$ty> for ScalarValue {
            fn from(value: $ty) -> Self {
                ScalarValue::$scalar(Some(value))
            }
        }

        impl From<Option<$ty>> for ScalarValue {
            fn from(value: Option<$ty>) -> Self {
                ScalarValue::$scalar(value)
            }
        }
    };
}

impl_scalar!(f32, Float32);
impl_scalar!(f64, Float64);
impl_scalar!(i8, Int8);
impl_scalar!(i16, Int16);
impl_scalar!(i32, Int32);
impl_scalar!(i64, Int64);
impl_scalar!(u8, UInt8);
impl_scalar!(u16, UInt16);
impl_scalar!(u32, UInt32);
impl_scalar!(u64, UInt64);
impl_scalar!(bool, Boolean);
impl_scalar!(String, String);

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(Some(value.to_string()))
    }
}

impl ScalarValue {
    pub fn get_logical_type(&self) -> LogicalType {
        match self {
            ScalarValue::Null => LogicalType::SqlNull,
            ScalarValue::Boolean(_) => LogicalType::Boolean,
            ScalarValue::Float32(_) => LogicalType::Float,
            ScalarValue::Float64(_) => LogicalType::Double,
            ScalarValue::Int8(_) => LogicalType::Tinyint,
            ScalarValue::Int16(_) => LogicalType::Smallint,
            ScalarValue::Int32(_) => LogicalType::Integer,
            ScalarValue::Int64(_) => LogicalType::Bigint,
            ScalarValue::UInt8(_) => LogicalType::UTinyint,
            ScalarValue::UInt16(_) => LogicalType::USmallint,
            ScalarValue::UInt32(_) => LogicalType::UInteger,
            ScalarValue::UInt64(_) => LogicalType::UBigint,
            ScalarValue::String(_) => LogicalType::Varchar,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            ScalarValue::Null => true,
            ScalarValue::Boolean(v) => v.is_none(),
            ScalarValue::Float32(v) => v.is_none(),
            ScalarValue::Float64(v) => v.is_none(),
            ScalarValue::Int8(v) => v.is_none(),
            ScalarValue::Int16(v) => v.is_none(),
            ScalarValue::Int32(v) => v.is_none(),
            ScalarValue::Int64(v) => v.is_none(),
            ScalarValue::UInt8(v) => v.is_none(),
            ScalarValue::UInt16(v) => v.is_none(),
            ScalarValue::UInt32(v) => v.is_none(),
            ScalarValue::UInt64(v) => v.is_none(),
            ScalarValue::String(v) => v.is_none(),
        }
    }

    /// A null of the given type. Unresolved types produce the untyped `Null`.
    pub fn new_null(ty: &LogicalType) -> ScalarValue {
        match ty {
            LogicalType::Invalid | LogicalType::Unknown | LogicalType::SqlNull => ScalarValue::Null,
            LogicalType::Boolean => ScalarValue::Boolean(None),
            LogicalType::Tinyint => ScalarValue::Int8(None),
            LogicalType::UTinyint => ScalarValue::UInt8(None),
            LogicalType::Smallint => ScalarValue::Int16(None),
            LogicalType::USmallint => ScalarValue::UInt16(None),
            LogicalType::Integer => ScalarValue::Int32(None),
            LogicalType::UInteger => ScalarValue::UInt32(None),
            LogicalType::Bigint => ScalarValue::Int64(None),
            LogicalType::UBigint => ScalarValue::UInt64(None),
            LogicalType::Float => ScalarValue::Float32(None),
            LogicalType::Double => ScalarValue::Float64(None),
            LogicalType::Varchar => ScalarValue::String(None),
        }
    }

    /// Convert the value to `ty`, the way an explicit cast would.
    pub fn cast_to(&self, ty: &LogicalType) -> Result<ScalarValue, TypeError> {
        let from = self.get_logical_type();
        if from == *ty {
            return Ok(self.clone());
        }
        if self.is_null() {
            return Ok(ScalarValue::new_null(ty));
        }
        match (self, ty) {
            (_, LogicalType::Invalid | LogicalType::Unknown | LogicalType::SqlNull) => {
                Err(TypeError::CannotCast { from, to: *ty })
            }
            (ScalarValue::String(Some(s)), _) => ScalarValue::parse_str(s, ty),
            (_, LogicalType::Varchar) => Ok(ScalarValue::String(Some(self.to_string()))),
            _ if from.is_numeric() && ty.is_numeric() => self.cast_numeric(ty),
            _ => Err(TypeError::CannotCast { from, to: *ty }),
        }
    }

    /// Parse the text form of a value of type `ty`.
    pub fn parse_str(s: &str, ty: &LogicalType) -> Result<ScalarValue, TypeError> {
        let trimmed = s.trim();
        let invalid = || TypeError::InvalidInputSyntax {
            ty: *ty,
            value: s.to_string(),
        };
        match ty {
            LogicalType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "t" | "true" | "y" | "yes" | "on" | "1" => Ok(ScalarValue::Boolean(Some(true))),
                "f" | "false" | "n" | "no" | "off" | "0" => Ok(ScalarValue::Boolean(Some(false))),
                _ => Err(invalid()),
            },
            LogicalType::Float => trimmed
                .parse::<f32>()
                .map(|v| ScalarValue::Float32(Some(v)))
                .map_err(|_| invalid()),
            LogicalType::Double => trimmed
                .parse::<f64>()
                .map(|v| ScalarValue::Float64(Some(v)))
                .map_err(|_| invalid()),
            LogicalType::Varchar => Ok(ScalarValue::String(Some(s.to_string()))),
            ty if ty.is_integral() => {
                let v = trimmed.parse::<i128>().map_err(|_| invalid())?;
                ScalarValue::from_i128(v, ty)
            }
            _ => Err(TypeError::CannotCast {
                from: LogicalType::Varchar,
                to: *ty,
            }),
        }
    }

    fn cast_numeric(&self, ty: &LogicalType) -> Result<ScalarValue, TypeError> {
        let out_of_range = || TypeError::OutOfRange {
            ty: *ty,
            value: self.to_string(),
        };
        match ty {
            LogicalType::Float => self
                .as_f64()
                .map(|v| ScalarValue::Float32(Some(v as f32)))
                .ok_or_else(out_of_range),
            LogicalType::Double => self
                .as_f64()
                .map(|v| ScalarValue::Float64(Some(v)))
                .ok_or_else(out_of_range),
            _ => {
                let v = match self.as_i128() {
                    Some(v) => v,
                    None => {
                        let f = self.as_f64().ok_or_else(out_of_range)?;
                        if !f.is_finite() {
                            return Err(out_of_range());
                        }
                        f.round() as i128
                    }
                };
                ScalarValue::from_i128(v, ty)
            }
        }
    }

    fn from_i128(v: i128, ty: &LogicalType) -> Result<ScalarValue, TypeError> {
        let out_of_range = |_| TypeError::OutOfRange {
            ty: *ty,
            value: v.to_string(),
        };
        let value = match ty {
            LogicalType::Tinyint => ScalarValue::Int8(Some(i8::try_from(v).map_err(out_of_range)?)),
            LogicalType::Smallint => {
                ScalarValue::Int16(Some(i16::try_from(v).map_err(out_of_range)?))
            }
            LogicalType::Integer => {
                ScalarValue::Int32(Some(i32::try_from(v).map_err(out_of_range)?))
            }
            LogicalType::Bigint => {
                ScalarValue::Int64(Some(i64::try_from(v).map_err(out_of_range)?))
            }
            LogicalType::UTinyint => {
                ScalarValue::UInt8(Some(u8::try_from(v).map_err(out_of_range)?))
            }
            LogicalType::USmallint => {
                ScalarValue::UInt16(Some(u16::try_from(v).map_err(out_of_range)?))
            }
            LogicalType::UInteger => {
                ScalarValue::UInt32(Some(u32::try_from(v).map_err(out_of_range)?))
            }
            LogicalType::UBigint => {
                ScalarValue::UInt64(Some(u64::try_from(v).map_err(out_of_range)?))
            }
            other => {
                return Err(TypeError::InternalError(format!(
                    "{} is not an integral type",
                    other
                )))
            }
        };
        Ok(value)
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            ScalarValue::Int8(v) => v.map(i128::from),
            ScalarValue::Int16(v) => v.map(i128::from),
            ScalarValue::Int32(v) => v.map(i128::from),
            ScalarValue::Int64(v) => v.map(i128::from),
            ScalarValue::UInt8(v) => v.map(i128::from),
            ScalarValue::UInt16(v) => v.map(i128::from),
            ScalarValue::UInt32(v) => v.map(i128::from),
            ScalarValue::UInt64(v) => v.map(i128::from),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float32(v) => v.map(f64::from),
            ScalarValue::Float64(v) => *v,
            ScalarValue::Int8(v) => v.map(f64::from),
            ScalarValue::Int16(v) => v.map(f64::from),
            ScalarValue::Int32(v) => v.map(f64::from),
            ScalarValue::Int64(v) => v.map(|v| v as f64),
            ScalarValue::UInt8(v) => v.map(f64::from),
            ScalarValue::UInt16(v) => v.map(f64::from),
            ScalarValue::UInt32(v) => v.map(f64::from),
            ScalarValue::UInt64(v) => v.map(|v| v as f64),
            _ => None,
        }
    }
}

macro_rules! format_option {
    ($F:expr, $EXPR:expr) => {{
        match $EXPR {
            Some(e) => write!($F, "{}", e),
            None => write!($F, "NULL"),
        }
    }};
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Boolean(v) => format_option!(f, v),
            ScalarValue::Float32(v) => format_option!(f, v),
            ScalarValue::Float64(v) => format_option!(f, v),
            ScalarValue::Int8(v) => format_option!(f, v),
            ScalarValue::Int16(v) => format_option!(f, v),
            ScalarValue::Int32(v) => format_option!(f, v),
            ScalarValue::Int64(v) => format_option!(f, v),
            ScalarValue::UInt8(v) => format_option!(f, v),
            ScalarValue::UInt16(v) => format_option!(f, v),
            ScalarValue::UInt32(v) => format_option!(f, v),
            ScalarValue::UInt64(v) => format_option!(f, v),
            ScalarValue::String(v) => format_option!(f, v),
        }
    }
}

impl TryFrom<&sqlparser::ast::Value> for ScalarValue {
    type Error = TypeError;

    fn try_from(v: &sqlparser::ast::Value) -> Result<Self, Self::Error> {
        match v {
            sqlparser::ast::Value::Number(n, _) => {
                if let Ok(int) = n.parse::<i32>() {
                    Ok(int.into())
                } else if let Ok(bigint) = n.parse::<i64>() {
                    Ok(bigint.into())
                } else if let Ok(float) = n.parse::<f64>() {
                    Ok(float.into())
                } else {
                    Err(TypeError::InvalidInputSyntax {
                        ty: LogicalType::Double,
                        value: n.clone(),
                    })
                }
            }
            sqlparser::ast::Value::SingleQuotedString(s)
            | sqlparser::ast::Value::DoubleQuotedString(s)
            | sqlparser::ast::Value::EscapedStringLiteral(s)
            | sqlparser::ast::Value::NationalStringLiteral(s) => Ok(s.clone().into()),
            sqlparser::ast::Value::Boolean(b) => Ok((*b).into()),
            sqlparser::ast::Value::Null => Ok(Self::Null),
            other => Err(TypeError::NotImplementedSqlparserValue(other.to_string())),
        }
    }
}

#[cfg(test)]
mod values_test {
    use pretty_assertions::assert_eq;
    use sqlparser::ast::Value;
    use test_case::test_case;

    use super::ScalarValue;
    use crate::types::{LogicalType, TypeError};

    #[test_case(ScalarValue::from(42), LogicalType::Bigint, ScalarValue::from(42_i64))]
    #[test_case(ScalarValue::from(42), LogicalType::Double, ScalarValue::from(42.0_f64))]
    #[test_case(ScalarValue::from(2.6_f64), LogicalType::Integer, ScalarValue::from(3))]
    #[test_case(ScalarValue::from("17"), LogicalType::Smallint, ScalarValue::from(17_i16))]
    #[test_case(ScalarValue::from(" on "), LogicalType::Boolean, ScalarValue::from(true))]
    #[test_case(ScalarValue::from(7_u8), LogicalType::Varchar, ScalarValue::from("7"))]
    #[test_case(ScalarValue::Null, LogicalType::Integer, ScalarValue::Int32(None))]
    #[test_case(ScalarValue::Int64(None), LogicalType::Varchar, ScalarValue::String(None))]
    fn test_cast_to(value: ScalarValue, ty: LogicalType, expected: ScalarValue) {
        let casted = value.cast_to(&ty).unwrap();
        assert_eq!(casted, expected);
        assert_eq!(casted.get_logical_type(), ty);
    }

    #[test]
    fn test_cast_out_of_range() {
        let err = ScalarValue::from(300).cast_to(&LogicalType::Tinyint);
        assert!(matches!(err, Err(TypeError::OutOfRange { .. })));
        let err = ScalarValue::from(-1).cast_to(&LogicalType::UInteger);
        assert!(matches!(err, Err(TypeError::OutOfRange { .. })));
        let err = ScalarValue::from(f64::NAN).cast_to(&LogicalType::Bigint);
        assert!(matches!(err, Err(TypeError::OutOfRange { .. })));
    }

    #[test]
    fn test_cast_invalid() {
        let err = ScalarValue::from("abc").cast_to(&LogicalType::Integer);
        assert_eq!(
            err.unwrap_err().to_string(),
            "invalid input syntax for type INTEGER: \"abc\""
        );
        let err = ScalarValue::from(true).cast_to(&LogicalType::Integer);
        assert!(matches!(err, Err(TypeError::CannotCast { .. })));
        let err = ScalarValue::from(1).cast_to(&LogicalType::Unknown);
        assert!(matches!(err, Err(TypeError::CannotCast { .. })));
    }

    #[test_case(Value::Number("1".to_string(), false), ScalarValue::from(1))]
    #[test_case(Value::Number("5000000000".to_string(), false), ScalarValue::from(5_000_000_000_i64))]
    #[test_case(Value::Number("1.5".to_string(), false), ScalarValue::from(1.5_f64))]
    #[test_case(Value::SingleQuotedString("hi".to_string()), ScalarValue::from("hi"))]
    #[test_case(Value::Boolean(false), ScalarValue::from(false))]
    #[test_case(Value::Null, ScalarValue::Null)]
    fn test_from_sqlparser_value(value: Value, expected: ScalarValue) {
        assert_eq!(ScalarValue::try_from(&value).unwrap(), expected);
    }

    #[test]
    fn test_placeholder_is_not_a_value() {
        let value = Value::Placeholder("$1".to_string());
        assert!(ScalarValue::try_from(&value).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ScalarValue::from(42).to_string(), "42");
        assert_eq!(ScalarValue::Int32(None).to_string(), "NULL");
        assert_eq!(ScalarValue::from("hi").to_string(), "hi");
    }
}
