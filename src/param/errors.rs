use sqlparser::tokenizer::TokenizerError;

use crate::types::TypeError;

#[derive(thiserror::Error, Debug)]
pub enum ParamError {
    #[error(
        "expected {expected} parameters, got {values} values and {nulls} null flags"
    )]
    ArgumentCountMismatch {
        expected: usize,
        values: usize,
        nulls: usize,
    },
    #[error("could not determine data type of parameter ${0}")]
    UnresolvedParameterType(usize),
    #[error("there is no parameter ${0}")]
    NoSuchParameter(usize),
    #[error("type error: {0}")]
    TypeError(
        #[from]
        #[source]
        TypeError,
    ),
    #[error("tokenizer error: {0}")]
    TokenizerError(
        #[from]
        #[source]
        TokenizerError,
    ),
}
