use strum_macros::Display;

use super::TypeError;

/// Type identifiers of parameters and expressions:
/// sqlparser::ast::DataType -> LogicalType -> arrow::datatypes::DataType
///
/// `Invalid` marks a parameter slot that has never been referenced and
/// `Unknown` one that is referenced but whose type is not determined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogicalType {
    Invalid,
    Unknown,
    #[strum(serialize = "NULL")]
    SqlNull,
    Boolean,
    Tinyint,
    UTinyint,
    Smallint,
    USmallint,
    Integer,
    UInteger,
    Bigint,
    UBigint,
    Float,
    Double,
    Varchar,
}

impl LogicalType {
    /// Whether the type denotes a concrete data type a value can carry.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, LogicalType::Invalid | LogicalType::Unknown)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::Tinyint
                | LogicalType::UTinyint
                | LogicalType::Smallint
                | LogicalType::USmallint
                | LogicalType::Integer
                | LogicalType::UInteger
                | LogicalType::Bigint
                | LogicalType::UBigint
                | LogicalType::Float
                | LogicalType::Double
        )
    }

    pub fn is_integral(&self) -> bool {
        self.is_signed_numeric() || self.is_unsigned_numeric()
    }

    pub fn is_signed_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::Tinyint
                | LogicalType::Smallint
                | LogicalType::Integer
                | LogicalType::Bigint
        )
    }

    pub fn is_unsigned_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::UTinyint
                | LogicalType::USmallint
                | LogicalType::UInteger
                | LogicalType::UBigint
        )
    }

    pub fn max_logical_type(
        left: &LogicalType,
        right: &LogicalType,
    ) -> Result<LogicalType, TypeError> {
        if left == right {
            return Ok(*left);
        }
        match (left, right) {
            // SqlNull and Unknown can be cast to anything
            (LogicalType::SqlNull | LogicalType::Unknown, _) => return Ok(*right),
            (_, LogicalType::SqlNull | LogicalType::Unknown) => return Ok(*left),
            _ => {}
        }
        if left.is_numeric() && right.is_numeric() {
            return LogicalType::combine_numeric_types(left, right);
        }
        Err(TypeError::InternalError(format!(
            "can not compare two types: {} and {}",
            left, right
        )))
    }

    fn combine_numeric_types(
        left: &LogicalType,
        right: &LogicalType,
    ) -> Result<LogicalType, TypeError> {
        if left == right {
            return Ok(*left);
        }
        if left.is_signed_numeric() && right.is_unsigned_numeric() {
            // this method is symmetric
            // arrange it so the left type is smaller
            // to limit the number of options we need to check
            return LogicalType::combine_numeric_types(right, left);
        }

        if LogicalType::can_implicit_cast(left, right) {
            return Ok(*right);
        }
        if LogicalType::can_implicit_cast(right, left) {
            return Ok(*left);
        }
        // neither side casts implicitly: left is unsigned and right is signed,
        // e.g. UINTEGER and INTEGER, so widen to a signed type holding both
        match (left, right) {
            (LogicalType::UBigint, _) | (_, LogicalType::Bigint) => Ok(LogicalType::Double),
            (LogicalType::UInteger, _) | (_, LogicalType::Integer) => Ok(LogicalType::Bigint),
            (LogicalType::USmallint, _) | (_, LogicalType::Smallint) => Ok(LogicalType::Integer),
            (LogicalType::UTinyint, _) | (_, LogicalType::Tinyint) => Ok(LogicalType::Smallint),
            _ => Err(TypeError::InternalError(format!(
                "can not combine these numeric types {} and {}",
                left, right
            ))),
        }
    }

    pub fn can_implicit_cast(from: &LogicalType, to: &LogicalType) -> bool {
        if from == to {
            return true;
        }
        match from {
            LogicalType::Invalid => false,
            LogicalType::Unknown | LogicalType::SqlNull => true,
            LogicalType::Boolean => false,
            LogicalType::Tinyint => matches!(
                to,
                LogicalType::Smallint
                    | LogicalType::Integer
                    | LogicalType::Bigint
                    | LogicalType::Float
                    | LogicalType::Double
            ),
            LogicalType::UTinyint => matches!(
                to,
                LogicalType::USmallint
                    | LogicalType::UInteger
                    | LogicalType::UBigint
                    | LogicalType::Smallint
                    | LogicalType::Integer
                    | LogicalType::Bigint
                    | LogicalType::Float
                    | LogicalType::Double
            ),
            LogicalType::Smallint => matches!(
                to,
                LogicalType::Integer
                    | LogicalType::Bigint
                    | LogicalType::Float
                    | LogicalType::Double
            ),
            LogicalType::USmallint => matches!(
                to,
                LogicalType::UInteger
                    | LogicalType::UBigint
                    | LogicalType::Integer
                    | LogicalType::Bigint
                    | LogicalType::Float
                    | LogicalType::Double
            ),
            LogicalType::Integer => matches!(
                to,
                LogicalType::Bigint | LogicalType::Float | LogicalType::Double
            ),
            LogicalType::UInteger => matches!(
                to,
                LogicalType::UBigint
                    | LogicalType::Bigint
                    | LogicalType::Float
                    | LogicalType::Double
            ),
            LogicalType::Bigint => matches!(to, LogicalType::Float | LogicalType::Double),
            LogicalType::UBigint => matches!(to, LogicalType::Float | LogicalType::Double),
            LogicalType::Float => matches!(to, LogicalType::Double),
            LogicalType::Double => false,
            LogicalType::Varchar => false,
        }
    }
}

/// sqlparser datatype to logical type
impl TryFrom<sqlparser::ast::DataType> for LogicalType {
    type Error = TypeError;

    fn try_from(value: sqlparser::ast::DataType) -> Result<Self, Self::Error> {
        match value {
            sqlparser::ast::DataType::Char(_)
            | sqlparser::ast::DataType::Varchar(_)
            | sqlparser::ast::DataType::Nvarchar(_)
            | sqlparser::ast::DataType::Text
            | sqlparser::ast::DataType::String => Ok(LogicalType::Varchar),
            sqlparser::ast::DataType::Float(_) | sqlparser::ast::DataType::Real => {
                Ok(LogicalType::Float)
            }
            sqlparser::ast::DataType::Double => Ok(LogicalType::Double),
            sqlparser::ast::DataType::TinyInt(_) => Ok(LogicalType::Tinyint),
            sqlparser::ast::DataType::UnsignedTinyInt(_) => Ok(LogicalType::UTinyint),
            sqlparser::ast::DataType::SmallInt(_) => Ok(LogicalType::Smallint),
            sqlparser::ast::DataType::UnsignedSmallInt(_) => Ok(LogicalType::USmallint),
            sqlparser::ast::DataType::Int(_) | sqlparser::ast::DataType::Integer(_) => {
                Ok(LogicalType::Integer)
            }
            sqlparser::ast::DataType::UnsignedInt(_)
            | sqlparser::ast::DataType::UnsignedInteger(_) => Ok(LogicalType::UInteger),
            sqlparser::ast::DataType::BigInt(_) => Ok(LogicalType::Bigint),
            sqlparser::ast::DataType::UnsignedBigInt(_) => Ok(LogicalType::UBigint),
            sqlparser::ast::DataType::Boolean => Ok(LogicalType::Boolean),
            other => Err(TypeError::NotImplementedSqlparserDataType(
                other.to_string(),
            )),
        }
    }
}

impl From<LogicalType> for arrow::datatypes::DataType {
    fn from(value: LogicalType) -> Self {
        use arrow::datatypes::DataType;
        match value {
            // unresolved types have no physical representation
            LogicalType::Invalid | LogicalType::Unknown | LogicalType::SqlNull => DataType::Null,
            LogicalType::Boolean => DataType::Boolean,
            LogicalType::Tinyint => DataType::Int8,
            LogicalType::UTinyint => DataType::UInt8,
            LogicalType::Smallint => DataType::Int16,
            LogicalType::USmallint => DataType::UInt16,
            LogicalType::Integer => DataType::Int32,
            LogicalType::UInteger => DataType::UInt32,
            LogicalType::Bigint => DataType::Int64,
            LogicalType::UBigint => DataType::UInt64,
            LogicalType::Float => DataType::Float32,
            LogicalType::Double => DataType::Float64,
            LogicalType::Varchar => DataType::Utf8,
        }
    }
}

#[cfg(test)]
mod types_test {
    use sqlparser::ast::DataType;
    use test_case::test_case;

    use super::LogicalType;

    #[test_case(LogicalType::Integer, LogicalType::Bigint, LogicalType::Bigint)]
    #[test_case(LogicalType::Integer, LogicalType::Double, LogicalType::Double)]
    #[test_case(LogicalType::Integer, LogicalType::UInteger, LogicalType::Bigint)]
    #[test_case(LogicalType::Bigint, LogicalType::UBigint, LogicalType::Double)]
    #[test_case(LogicalType::UTinyint, LogicalType::Smallint, LogicalType::Smallint)]
    #[test_case(LogicalType::UTinyint, LogicalType::Tinyint, LogicalType::Smallint)]
    #[test_case(LogicalType::USmallint, LogicalType::Tinyint, LogicalType::Integer)]
    #[test_case(LogicalType::UInteger, LogicalType::Smallint, LogicalType::Bigint)]
    #[test_case(LogicalType::UBigint, LogicalType::Tinyint, LogicalType::Double)]
    #[test_case(LogicalType::Unknown, LogicalType::Varchar, LogicalType::Varchar)]
    #[test_case(LogicalType::Boolean, LogicalType::SqlNull, LogicalType::Boolean)]
    fn test_max_logical_type(left: LogicalType, right: LogicalType, expected: LogicalType) {
        assert_eq!(
            LogicalType::max_logical_type(&left, &right).unwrap(),
            expected
        );
        assert_eq!(
            LogicalType::max_logical_type(&right, &left).unwrap(),
            expected
        );
    }

    #[test]
    fn test_max_logical_type_incompatible() {
        assert!(LogicalType::max_logical_type(&LogicalType::Boolean, &LogicalType::Integer).is_err());
        assert!(LogicalType::max_logical_type(&LogicalType::Varchar, &LogicalType::Double).is_err());
    }

    #[test_case(DataType::Int(None), LogicalType::Integer)]
    #[test_case(DataType::BigInt(None), LogicalType::Bigint)]
    #[test_case(DataType::Text, LogicalType::Varchar)]
    #[test_case(DataType::Varchar(None), LogicalType::Varchar)]
    #[test_case(DataType::Real, LogicalType::Float)]
    #[test_case(DataType::Boolean, LogicalType::Boolean)]
    fn test_from_sqlparser_data_type(data_type: DataType, expected: LogicalType) {
        assert_eq!(LogicalType::try_from(data_type).unwrap(), expected);
    }

    #[test]
    fn test_unsupported_sqlparser_data_type() {
        assert!(LogicalType::try_from(DataType::Date).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(LogicalType::Integer.to_string(), "INTEGER");
        assert_eq!(LogicalType::SqlNull.to_string(), "NULL");
        assert_eq!(LogicalType::UBigint.to_string(), "UBIGINT");
    }

    #[test]
    fn test_unresolved_types() {
        assert!(!LogicalType::Invalid.is_resolved());
        assert!(!LogicalType::Unknown.is_resolved());
        assert!(LogicalType::SqlNull.is_resolved());
        assert!(LogicalType::Varchar.is_resolved());
    }
}
