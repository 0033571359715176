mod bind_context;
mod binding;
mod errors;
mod expression;
mod sqlparser_util;
mod statement;

pub use bind_context::*;
pub use binding::*;
pub use errors::*;
pub use expression::*;
use log::debug;
use sqlparser::ast::Statement;
pub use sqlparser_util::*;
pub use statement::*;

use derive_new::new;

use crate::catalog::Catalog;
use crate::types::LogicalType;

static LOGGING_TARGET: &str = "plparam::analyzer";

/// Callbacks the analyzer makes when it meets a `$n` parameter. Installing
/// one on a [`ParseState`] decides how parameter types are found.
pub trait ParamRefHook {
    /// A reference to parameter `paramno` (1-based) was found. Returns the
    /// type currently known for it, `Unknown` if it is still undetermined.
    fn param_ref(&mut self, paramno: usize) -> Result<LogicalType, BindError>;

    /// An expression of unknown type referring to parameter `paramno` is
    /// being coerced to `target`. Returns the type the parameter ends up with.
    fn coerce_param(&mut self, paramno: usize, target: LogicalType)
        -> Result<LogicalType, BindError>;

    /// Called once the whole statement has been analyzed.
    fn check_params(&self) -> Result<(), BindError>;
}

/// The result names and types of an analyzed statement.
#[derive(new, Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzedStatement {
    pub names: Vec<String>,
    pub types: Vec<LogicalType>,
}

/// The state of semantic analysis of one statement.
pub struct ParseState<'a> {
    catalog: &'a Catalog,
    /// One bind context per query level, innermost last
    scopes: Vec<BindContext>,
    param_hook: Option<Box<dyn ParamRefHook + 'a>>,
    /// The count of bound tables
    bound_tables: usize,
}

impl<'a> ParseState<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            scopes: vec![],
            param_hook: None,
            bound_tables: 0,
        }
    }

    pub fn set_param_hook(&mut self, hook: Box<dyn ParamRefHook + 'a>) {
        self.param_hook = Some(hook);
    }

    pub fn has_param_hook(&self) -> bool {
        self.param_hook.is_some()
    }

    pub fn generate_table_index(&mut self) -> usize {
        self.bound_tables += 1;
        self.bound_tables
    }

    /// Type every expression of `statement`, resolving parameter types through
    /// the installed hook, then let the hook check that every parameter got a
    /// type.
    pub fn analyze_statement(
        &mut self,
        statement: &Statement,
    ) -> Result<AnalyzedStatement, BindError> {
        debug!(
            target: LOGGING_TARGET,
            "Analyzer raw statement: {:?}", statement
        );
        let analyzed = self.bind_statement(statement)?;
        if let Some(hook) = &self.param_hook {
            hook.check_params()?;
        }
        debug!(
            target: LOGGING_TARGET,
            "Analyzer result names: {:?}, types: {:?}", analyzed.names, analyzed.types
        );
        Ok(analyzed)
    }
}
