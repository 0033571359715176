use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;
use sqlparser::ast::{ColumnDef, Expr, Ident, ObjectName, Statement, UnaryOperator, Value};

use super::{DatabaseError, ExecutedQueryResult, PreparedStatementData, QueryResult, SessionConfig};
use crate::analyzer::{ParseState, SqlparserResolver};
use crate::catalog::{Catalog, TableCatalogEntry};
use crate::memory::MemoryContext;
use crate::param::{
    fixed_param_setup, setup_variable_paramlist, variable_param_setup, ParamState,
};
use crate::parser::Sqlparser;
use crate::types::{LogicalType, ScalarValue};

static LOGGING_TARGET: &str = "plparam::session";

/// A client session: the tables it knows and the statements it prepared.
#[derive(Default)]
pub struct Session {
    config: SessionConfig,
    catalog: Catalog,
    prepared_statements: BTreeMap<String, PreparedStatementData>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            catalog: Catalog::default(),
            prepared_statements: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn prepared_statements(&self) -> impl Iterator<Item = &PreparedStatementData> {
        self.prepared_statements.values()
    }

    pub fn get_prepared(&self, name: &str) -> Result<&PreparedStatementData, DatabaseError> {
        self.prepared_statements
            .get(name)
            .ok_or_else(|| DatabaseError::PreparedStatementNotExists(name.to_string()))
    }

    pub fn run(&mut self, sql: &str) -> Result<Vec<QueryResult>, DatabaseError> {
        let statements = Sqlparser::parse(sql.to_string())?;
        if statements.is_empty() {
            return Err(DatabaseError::InternalError(
                "invalid statement".to_string(),
            ));
        }
        statements
            .iter()
            .map(|statement| self.run_statement(statement))
            .collect()
    }

    pub fn run_statement(&mut self, statement: &Statement) -> Result<QueryResult, DatabaseError> {
        debug!(target: LOGGING_TARGET, "Session run statement: {}", statement);
        match statement {
            Statement::CreateTable {
                name,
                columns,
                if_not_exists,
                ..
            } => {
                self.create_table(name, columns, *if_not_exists)?;
                Ok(QueryResult::Command("CREATE TABLE".to_string()))
            }
            Statement::Prepare {
                name,
                data_types,
                statement,
            } => {
                let name = SqlparserResolver::normalize_ident(name);
                let declared = data_types
                    .iter()
                    .map(|ty| LogicalType::try_from(ty.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                let prepared = self.prepare(&name, statement, &declared)?;
                Ok(QueryResult::Prepared(prepared.clone()))
            }
            Statement::Execute { name, parameters } => {
                let name = SqlparserResolver::normalize_ident(name);
                let args = parameters
                    .iter()
                    .map(evaluate_constant)
                    .collect::<Result<Vec<_>, _>>()?;
                let executed = self.execute(&name, args)?;
                Ok(QueryResult::Executed(executed))
            }
            Statement::Deallocate { name, .. } => {
                if is_all(name) {
                    self.deallocate_all();
                    Ok(QueryResult::Command("DEALLOCATE ALL".to_string()))
                } else {
                    self.deallocate(&SqlparserResolver::normalize_ident(name))?;
                    Ok(QueryResult::Command("DEALLOCATE".to_string()))
                }
            }
            other => {
                let mut pstate = ParseState::new(&self.catalog);
                let analyzed = pstate.analyze_statement(other)?;
                Ok(QueryResult::Described(analyzed))
            }
        }
    }

    fn create_table(
        &mut self,
        name: &ObjectName,
        columns: &[ColumnDef],
        if_not_exists: bool,
    ) -> Result<(), DatabaseError> {
        let table = SqlparserResolver::object_name_to_table(name)?;
        let columns = columns
            .iter()
            .map(SqlparserResolver::column_def_to_column_definition)
            .collect::<Result<Vec<_>, _>>()?;
        let entry = TableCatalogEntry::try_new(table, columns)?;
        self.catalog.create_table(entry, if_not_exists)?;
        Ok(())
    }

    /// Analyze `statement` and keep it under `name`. Parameters without a
    /// declared type get the type their usage implies.
    pub fn prepare(
        &mut self,
        name: &str,
        statement: &Statement,
        declared: &[LogicalType],
    ) -> Result<&PreparedStatementData, DatabaseError> {
        if self.prepared_statements.contains_key(name) {
            return Err(DatabaseError::DuplicatePreparedStatement(name.to_string()));
        }

        let memory_context = MemoryContext::new(format!("prepare {}", name));
        let (analyzed, param_types) = if self.config.variable_params {
            let mut state = ParamState::with_types(&memory_context, declared)
                .with_max_params(self.config.max_params);
            let analyzed = {
                let mut pstate = ParseState::new(&self.catalog);
                variable_param_setup(&mut pstate, &mut state);
                pstate.analyze_statement(statement)?
            };
            (analyzed, state.param_types().to_vec())
        } else {
            let mut pstate = ParseState::new(&self.catalog);
            fixed_param_setup(&mut pstate, declared);
            (pstate.analyze_statement(statement)?, declared.to_vec())
        };
        debug!(
            target: LOGGING_TARGET,
            "Session prepared {} with parameter types {:?}", name, param_types
        );

        let prepared = PreparedStatementData::new(
            name.to_string(),
            statement.clone(),
            param_types,
            analyzed.names,
            analyzed.types,
        );
        Ok(self
            .prepared_statements
            .entry(name.to_string())
            .or_insert(prepared))
    }

    /// Bind `args` to the parameters of prepared statement `name`.
    pub fn execute(
        &self,
        name: &str,
        args: Vec<ScalarValue>,
    ) -> Result<ExecutedQueryResult, DatabaseError> {
        let prepared = self.get_prepared(name)?;
        if args.len() != prepared.param_types().len() {
            return Err(DatabaseError::WrongParameterCount {
                name: name.to_string(),
                expected: prepared.param_types().len(),
                actual: args.len(),
            });
        }

        let memory_context = MemoryContext::new(format!("execute {}", name));
        let state = ParamState::with_types(&memory_context, prepared.param_types());
        let nulls = args
            .iter()
            .map(|arg| if arg.is_null() { b'n' } else { b' ' })
            .collect_vec();
        let params = setup_variable_paramlist(&state, &args, &nulls)?;
        let sql = params.substitute(&prepared.statement().to_string())?;
        let batch = params.to_record_batch()?;
        Ok(ExecutedQueryResult::new(name.to_string(), sql, batch))
    }

    pub fn deallocate(&mut self, name: &str) -> Result<(), DatabaseError> {
        self.prepared_statements
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::PreparedStatementNotExists(name.to_string()))
    }

    pub fn deallocate_all(&mut self) {
        self.prepared_statements.clear();
    }
}

fn is_all(name: &Ident) -> bool {
    name.quote_style.is_none() && name.value.eq_ignore_ascii_case("all")
}

/// Evaluate an EXECUTE argument. Only constants are accepted.
fn evaluate_constant(expr: &Expr) -> Result<ScalarValue, DatabaseError> {
    match expr {
        Expr::Value(value) => Ok(ScalarValue::try_from(value)?),
        Expr::Nested(expr) | Expr::UnaryOp {
            op: UnaryOperator::Plus,
            expr,
        } => evaluate_constant(expr),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match expr.as_ref() {
            Expr::Value(Value::Number(n, long)) => Ok(ScalarValue::try_from(&Value::Number(
                format!("-{}", n),
                *long,
            ))?),
            other => Err(DatabaseError::InvalidExecuteArgument(format!("-{}", other))),
        },
        Expr::Cast { expr, data_type } => {
            let ty = LogicalType::try_from(data_type.clone())?;
            Ok(evaluate_constant(expr)?.cast_to(&ty)?)
        }
        Expr::TypedString { data_type, value } => {
            let ty = LogicalType::try_from(data_type.clone())?;
            Ok(ScalarValue::parse_str(value, &ty)?)
        }
        other => Err(DatabaseError::InvalidExecuteArgument(other.to_string())),
    }
}

#[cfg(test)]
mod session_test {
    use arrow::array::{Array, Int32Array, Int64Array, StringArray, UInt32Array};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::Session;
    use crate::analyzer::BindError;
    use crate::main_entry::{
        DatabaseError, ExecutedQueryResult, QueryResult, SessionConfigBuilder,
    };
    use crate::param::ParamError;
    use crate::types::{LogicalType, TypeError};

    fn build_session() -> Session {
        let mut session = Session::default();
        session
            .run("create table t1 (a int, b varchar, c bigint)")
            .unwrap();
        session
    }

    fn run_one(session: &mut Session, sql: &str) -> Result<QueryResult, DatabaseError> {
        let mut results = session.run(sql)?;
        assert_eq!(results.len(), 1);
        Ok(results.remove(0))
    }

    fn execute(session: &mut Session, sql: &str) -> Result<ExecutedQueryResult, DatabaseError> {
        match run_one(session, sql)? {
            QueryResult::Executed(executed) => Ok(executed),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_prepare_infers_parameter_types() {
        let mut session = build_session();
        let result = run_one(
            &mut session,
            "prepare q1 as select a, b from t1 where a = $1 and b = $2",
        )
        .unwrap();
        let QueryResult::Prepared(prepared) = result else {
            panic!("expected a prepared statement");
        };
        assert_eq!(prepared.name(), "q1");
        assert_eq!(
            prepared.param_types(),
            &[LogicalType::Integer, LogicalType::Varchar]
        );
        assert_eq!(prepared.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(session.prepared_statements().count(), 1);
    }

    #[test]
    fn test_execute_binds_values() {
        let mut session = build_session();
        session
            .run("prepare q1 as select a, b from t1 where a = $1 and b = $2")
            .unwrap();
        let executed = execute(&mut session, "execute q1 (42, 'it''s')").unwrap();

        assert_eq!(
            executed.sql(),
            "SELECT a, b FROM t1 WHERE a = 42 AND b = 'it''s'"
        );
        let params = executed.params();
        assert_eq!(params.num_columns(), 2);
        let a = params.column(0).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(a.value(0), 42);
        let b = params.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(b.value(0), "it's");
    }

    #[test]
    fn test_execute_with_null_and_casts() {
        let mut session = build_session();
        session
            .run("prepare q2 (bigint) as update t1 set b = $2 where c > $1")
            .unwrap();
        let executed = execute(&mut session, "execute q2 (-7, null)").unwrap();
        assert_eq!(executed.sql(), "UPDATE t1 SET b = NULL WHERE c > -7");
        let c = executed
            .params()
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(c.value(0), -7);
        assert!(executed.params().column(1).is_null(0));

        let executed = execute(&mut session, "execute q2 ('12', 'x'::text)").unwrap();
        assert_eq!(executed.sql(), "UPDATE t1 SET b = 'x' WHERE c > 12");
    }

    #[test]
    fn test_execute_negative_value_after_minus() {
        let mut session = build_session();
        session.run("prepare q1 (int) as select -$1").unwrap();
        let executed = execute(&mut session, "execute q1 (-7)").unwrap();
        assert_eq!(executed.sql(), "SELECT - -7");
        let results = session.run(executed.sql()).unwrap();
        let QueryResult::Described(analyzed) = &results[0] else {
            panic!("expected a described statement");
        };
        assert_eq!(analyzed.types, vec![LogicalType::Integer]);
    }

    #[test]
    fn test_unsigned_parameters() {
        let mut session = build_session();
        session
            .run("create table u1 (a int unsigned, b int)")
            .unwrap();
        let result = run_one(
            &mut session,
            "prepare q1 as select a from u1 where a = b and a = $1",
        )
        .unwrap();
        let QueryResult::Prepared(prepared) = result else {
            panic!("expected a prepared statement");
        };
        assert_eq!(prepared.param_types(), &[LogicalType::UInteger]);
        let executed = execute(&mut session, "execute q1 (5)").unwrap();
        let a = executed
            .params()
            .column(0)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .unwrap();
        assert_eq!(a.value(0), 5);
        let err = execute(&mut session, "execute q1 (-1)").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::ParamError(ParamError::TypeError(TypeError::OutOfRange { .. }))
        ));

        let result = run_one(&mut session, "prepare q2 as select a from u1 where a in (b, $1)")
            .unwrap();
        let QueryResult::Prepared(prepared) = result else {
            panic!("expected a prepared statement");
        };
        assert_eq!(prepared.param_types(), &[LogicalType::Bigint]);
    }

    #[test]
    fn test_prepare_errors() {
        let mut session = build_session();
        let err = run_one(&mut session, "prepare q as select $1").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::BindError(BindError::UndeterminedParameterType(1))
        ));
        let err = run_one(&mut session, "prepare q as select $2::int").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::BindError(BindError::UndeterminedParameterType(1))
        ));

        session.run("prepare q as select $1::int").unwrap();
        let err = run_one(&mut session, "prepare q as select 1").unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicatePreparedStatement(_)));
    }

    #[test_case("execute q (1, 2)"; "too many arguments")]
    #[test_case("execute q"; "no arguments")]
    fn test_wrong_parameter_count(sql: &str) {
        let mut session = build_session();
        session.run("prepare q as select a from t1 where a = $1").unwrap();
        let err = run_one(&mut session, sql).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::WrongParameterCount {
                expected: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_execute_invalid_argument() {
        let mut session = build_session();
        session.run("prepare q as select a from t1 where a = $1").unwrap();
        let err = run_one(&mut session, "execute q ('forty-two')").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::ParamError(ParamError::TypeError(TypeError::InvalidInputSyntax { .. }))
        ));
        let err = run_one(&mut session, "execute q (a)").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidExecuteArgument(_)));
    }

    #[test]
    fn test_deallocate() {
        let mut session = build_session();
        session
            .run("prepare q1 as select $1::int; prepare q2 as select $1::text")
            .unwrap();
        session.run("deallocate q1").unwrap();
        let err = run_one(&mut session, "execute q1 (1)").unwrap_err();
        assert!(matches!(err, DatabaseError::PreparedStatementNotExists(_)));
        let err = run_one(&mut session, "deallocate prepare q1").unwrap_err();
        assert!(matches!(err, DatabaseError::PreparedStatementNotExists(_)));

        session.run("deallocate all").unwrap();
        assert_eq!(session.prepared_statements().count(), 0);
    }

    #[test]
    fn test_fixed_parameters() {
        let config = SessionConfigBuilder::default()
            .variable_params(false)
            .build()
            .unwrap();
        let mut session = Session::new(config);
        session.run("create table t1 (a int, b varchar)").unwrap();

        session
            .run("prepare q (int) as select b from t1 where a = $1")
            .unwrap();
        let err = run_one(&mut session, "prepare r as select $1::int").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::BindError(BindError::NoSuchParameter(1))
        ));
        let err = run_one(&mut session, "prepare r (text) as select b from t1 where a = $1")
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::BindError(BindError::InconsistentParameterTypes { .. })
                | DatabaseError::BindError(BindError::TypeError(_))
        ));
    }

    #[test]
    fn test_max_params() {
        let config = SessionConfigBuilder::default().max_params(2).build().unwrap();
        let mut session = Session::new(config);
        let err = run_one(&mut session, "prepare q as select $3::int").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::BindError(BindError::NoSuchParameter(3))
        ));
    }

    #[test]
    fn test_describe_statement() {
        let mut session = build_session();
        let result = run_one(&mut session, "select a, b as name from t1").unwrap();
        let QueryResult::Described(analyzed) = result else {
            panic!("expected a description");
        };
        assert_eq!(analyzed.names, vec!["a".to_string(), "name".to_string()]);
        assert_eq!(
            analyzed.types,
            vec![LogicalType::Integer, LogicalType::Varchar]
        );
    }

    #[test]
    fn test_create_table_errors() {
        let mut session = build_session();
        assert!(session.run("create table t1 (a int)").is_err());
        session.run("create table if not exists t1 (a int)").unwrap();
        assert!(session.run("create table t2 (a int, a int)").is_err());
        assert!(session.run("create table t2 (a json)").is_err());
    }
}
