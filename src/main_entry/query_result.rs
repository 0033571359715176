use std::sync::Arc;

use arrow::array::StringArray;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use derive_new::new;

use super::PreparedStatementData;
use crate::analyzer::AnalyzedStatement;
use crate::types::LogicalType;

#[derive(new, Debug)]
pub struct ExecutedQueryResult {
    pub(crate) name: String,
    /// The prepared statement with every parameter replaced by its value
    pub(crate) sql: String,
    /// One row holding the bound parameter values
    pub(crate) params: RecordBatch,
}

impl ExecutedQueryResult {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &RecordBatch {
        &self.params
    }
}

#[derive(Debug)]
pub enum QueryResult {
    /// A statement without output, carrying its command tag
    Command(String),
    Prepared(PreparedStatementData),
    Executed(ExecutedQueryResult),
    /// The result columns of a statement that was only analyzed
    Described(AnalyzedStatement),
}

impl QueryResult {
    /// The rows to show for this result, if any.
    pub fn to_record_batch(&self) -> Result<Option<RecordBatch>, ArrowError> {
        match self {
            QueryResult::Command(_) => Ok(None),
            QueryResult::Prepared(prepared) => {
                let names = (1..=prepared.param_types().len())
                    .map(|paramno| format!("${}", paramno))
                    .collect::<Vec<_>>();
                describe("parameter", &names, prepared.param_types()).map(Some)
            }
            QueryResult::Executed(executed) => Ok(Some(executed.params.clone())),
            QueryResult::Described(analyzed) => {
                describe("column", &analyzed.names, &analyzed.types).map(Some)
            }
        }
    }
}

fn describe(
    label: &str,
    names: &[String],
    types: &[LogicalType],
) -> Result<RecordBatch, ArrowError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(label, DataType::Utf8, false),
        Field::new("type", DataType::Utf8, false),
    ]));
    let types = types.iter().map(|ty| ty.to_string()).collect::<Vec<_>>();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from_iter_values(names)),
            Arc::new(StringArray::from_iter_values(types)),
        ],
    )
}
