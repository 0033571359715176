use crate::catalog::CatalogError;
use crate::types::LogicalType;

#[derive(thiserror::Error, Debug)]
pub enum BindError {
    #[error("there is no parameter ${0}")]
    NoSuchParameter(usize),
    #[error("invalid parameter reference: {0}")]
    InvalidParameterReference(String),
    #[error("inconsistent types deduced for parameter ${paramno}: {previous} versus {current}")]
    InconsistentParameterTypes {
        paramno: usize,
        previous: LogicalType,
        current: LogicalType,
    },
    #[error("could not determine data type of parameter ${0}")]
    UndeterminedParameterType(usize),
    #[error("cannot coerce {from} to {to}")]
    CannotCoerce { from: LogicalType, to: LogicalType },
    #[error("unsupported expr: {0}")]
    UnsupportedExpr(String),
    #[error("unsupported statement: {0}")]
    UnsupportedStmt(String),
    #[error("sqlparser unsupported statement: {0}")]
    SqlParserUnsupportedStmt(String),
    #[error("bind internal error: {0}")]
    Internal(String),
    #[error("type error: {0}")]
    TypeError(
        #[from]
        #[source]
        crate::types::TypeError,
    ),
    #[error("catalog error: {0}")]
    CatalogError(
        #[from]
        #[source]
        CatalogError,
    ),
}
