use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::{Parser, ParserError};

pub struct Sqlparser {}

impl Sqlparser {
    pub fn parse(sql: String) -> Result<Vec<Statement>, ParserError> {
        let dialect = PostgreSqlDialect {};
        Parser::parse_sql(&dialect, sql.as_str())
    }
}
