use super::LogicalType;

#[derive(thiserror::Error, Debug)]
pub enum TypeError {
    #[error("not implemented sqlparser datatype: {0}")]
    NotImplementedSqlparserDataType(String),
    #[error("not implemented sqlparser value: {0}")]
    NotImplementedSqlparserValue(String),
    #[error("invalid input syntax for type {ty}: \"{value}\"")]
    InvalidInputSyntax { ty: LogicalType, value: String },
    #[error("value {value} out of range for type {ty}")]
    OutOfRange { ty: LogicalType, value: String },
    #[error("cannot cast type {from} to {to}")]
    CannotCast { from: LogicalType, to: LogicalType },
    #[error("type internal error: {0}")]
    InternalError(String),
}
