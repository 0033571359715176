use derive_new::new;
use sqlparser::ast::Statement;

use crate::types::LogicalType;

#[derive(new, Debug, Clone)]
pub struct PreparedStatementData {
    /// The name given by PREPARE
    pub(crate) name: String,
    /// The unbound SQL statement that was prepared
    pub(crate) statement: Statement,
    /// The parameter types, declared or inferred
    pub(crate) param_types: Vec<LogicalType>,
    /// The result names
    pub(crate) names: Vec<String>,
    /// The result types
    pub(crate) types: Vec<LogicalType>,
}

impl PreparedStatementData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn param_types(&self) -> &[LogicalType] {
        &self.param_types
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn types(&self) -> &[LogicalType] {
        &self.types
    }
}
