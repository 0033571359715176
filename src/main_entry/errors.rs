use arrow::error::ArrowError;
use sqlparser::parser::ParserError;

use crate::analyzer::BindError;
use crate::catalog::CatalogError;
use crate::param::ParamError;
use crate::types::TypeError;

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("parse error: {0}")]
    ParserError(
        #[source]
        #[from]
        ParserError,
    ),
    #[error("catalog error: {0}")]
    CatalogError(
        #[source]
        #[from]
        CatalogError,
    ),
    #[error("bind error: {0}")]
    BindError(
        #[source]
        #[from]
        BindError,
    ),
    #[error("param error: {0}")]
    ParamError(
        #[source]
        #[from]
        ParamError,
    ),
    #[error("type error: {0}")]
    TypeError(
        #[source]
        #[from]
        TypeError,
    ),
    #[error("Arrow error: {0}")]
    ArrowError(
        #[source]
        #[from]
        ArrowError,
    ),
    #[error("prepared statement \"{0}\" already exists")]
    DuplicatePreparedStatement(String),
    #[error("prepared statement \"{0}\" does not exist")]
    PreparedStatementNotExists(String),
    #[error("wrong number of parameters for prepared statement \"{name}\": expected {expected} parameters but got {actual}")]
    WrongParameterCount {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid EXECUTE argument: {0}")]
    InvalidExecuteArgument(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}
