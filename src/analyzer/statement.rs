use derive_new::new;
use sqlparser::ast::{
    Assignment, Expr, Ident, JoinConstraint, JoinOperator, ObjectName, Query, Select, SelectItem,
    SetExpr, Statement, TableFactor, TableWithJoins, Values,
};

use super::{AnalyzedStatement, BindContext, BindError, BoundExpression, ParseState, SqlparserResolver};
use crate::types::LogicalType;

/// The output of a query level: one bound expression per result column.
#[derive(new, Debug)]
pub struct BoundQuery {
    /// The names returned by this query.
    pub(crate) names: Vec<String>,
    /// The projection list
    pub(crate) select_list: Vec<BoundExpression>,
}

impl BoundQuery {
    pub fn types(&self) -> Vec<LogicalType> {
        self.select_list.iter().map(|e| e.return_type()).collect()
    }
}

impl ParseState<'_> {
    pub(crate) fn bind_statement(
        &mut self,
        statement: &Statement,
    ) -> Result<AnalyzedStatement, BindError> {
        match statement {
            Statement::Query(query) => {
                let bound = self.bind_query(query, None)?;
                let types = bound.types();
                Ok(AnalyzedStatement::new(bound.names, types))
            }
            Statement::Insert {
                table_name,
                columns,
                source,
                ..
            } => {
                self.bind_insert(table_name, columns, source)?;
                Ok(AnalyzedStatement::default())
            }
            Statement::Update {
                table,
                assignments,
                from,
                selection,
                ..
            } => {
                self.with_scope(|this| {
                    this.bind_update(table, assignments, from.as_ref(), selection.as_ref())
                })?;
                Ok(AnalyzedStatement::default())
            }
            Statement::Delete {
                table_name,
                selection,
                ..
            } => {
                self.with_scope(|this| {
                    this.bind_table_factor(table_name)?;
                    this.bind_where_clause(selection.as_ref())
                })?;
                Ok(AnalyzedStatement::default())
            }
            other => Err(BindError::UnsupportedStmt(other.to_string())),
        }
    }

    /// Run `f` on a fresh query level whose tables are visible to nested
    /// levels as correlated references.
    fn with_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, BindError>,
    ) -> Result<T, BindError> {
        self.scopes.push(BindContext::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn current_scope(&mut self) -> Result<&mut BindContext, BindError> {
        self.scopes
            .last_mut()
            .ok_or_else(|| BindError::Internal("no query level to bind into".to_string()))
    }

    /// Bind a query; with `expected` the output columns are coerced to those
    /// types, which is how INSERT targets type their sources.
    pub(crate) fn bind_query(
        &mut self,
        query: &Query,
        expected: Option<&[LogicalType]>,
    ) -> Result<BoundQuery, BindError> {
        if query.with.is_some() {
            return Err(BindError::UnsupportedStmt(format!(
                "WITH clause in {}",
                query
            )));
        }
        self.with_scope(|this| {
            let node = match &*query.body {
                SetExpr::Select(select) => this.bind_select_body(select, expected)?,
                other => this.bind_set_expr(other, expected)?,
            };
            for order_by in query.order_by.iter() {
                if Self::is_output_reference(&order_by.expr, &node.names) {
                    continue;
                }
                this.bind_expression(&order_by.expr)?;
            }
            if let Some(limit) = &query.limit {
                let limit = this.bind_expression(limit)?;
                this.coerce_expression(limit, LogicalType::Bigint)?;
            }
            if let Some(offset) = &query.offset {
                let offset = this.bind_expression(&offset.value)?;
                this.coerce_expression(offset, LogicalType::Bigint)?;
            }
            Ok(node)
        })
    }

    /// ORDER BY may name an output column or its ordinal.
    fn is_output_reference(expr: &Expr, names: &[String]) -> bool {
        match expr {
            Expr::Identifier(ident) => names.contains(&SqlparserResolver::normalize_ident(ident)),
            Expr::Value(sqlparser::ast::Value::Number(..)) => true,
            _ => false,
        }
    }

    fn bind_set_expr(
        &mut self,
        body: &SetExpr,
        expected: Option<&[LogicalType]>,
    ) -> Result<BoundQuery, BindError> {
        match body {
            SetExpr::Select(select) => {
                self.with_scope(|this| this.bind_select_body(select, expected))
            }
            SetExpr::Query(query) => self.bind_query(query, expected),
            SetExpr::SetOperation { left, right, .. } => {
                let left = self.bind_set_expr(left, expected)?;
                let right = self.bind_set_expr(right, expected)?;
                if left.select_list.len() != right.select_list.len() {
                    return Err(BindError::Internal(format!(
                        "each set operation query must have the same number of columns, {} versus {}",
                        left.select_list.len(),
                        right.select_list.len()
                    )));
                }
                let mut select_list = vec![];
                for (l, r) in left.select_list.into_iter().zip(right.select_list) {
                    let (mut unified, _) =
                        self.unify_expressions(vec![l, r], Some(LogicalType::Varchar))?;
                    unified.truncate(1);
                    select_list.extend(unified);
                }
                Ok(BoundQuery::new(left.names, select_list))
            }
            SetExpr::Values(values) => self.bind_values(values, expected),
            other => Err(BindError::UnsupportedStmt(other.to_string())),
        }
    }

    fn bind_values(
        &mut self,
        values: &Values,
        expected: Option<&[LogicalType]>,
    ) -> Result<BoundQuery, BindError> {
        let width = values.rows.first().map(|row| row.len()).unwrap_or_default();
        if let Some(expected) = expected {
            if expected.len() != width {
                return Err(BindError::Internal(format!(
                    "insert column count mismatch, expected: {}, actual: {}",
                    expected.len(),
                    width
                )));
            }
        }

        let mut columns: Vec<Vec<BoundExpression>> = (0..width).map(|_| vec![]).collect();
        for row in values.rows.iter() {
            if row.len() != width {
                return Err(BindError::Internal(
                    "VALUES lists must all be the same length".to_string(),
                ));
            }
            for (idx, expr) in row.iter().enumerate() {
                let bound = self.bind_expression(expr)?;
                columns[idx].push(bound);
            }
        }

        let mut names = vec![];
        let mut select_list = vec![];
        for (idx, column) in columns.into_iter().enumerate() {
            let column = match expected {
                Some(expected) => column
                    .into_iter()
                    .map(|e| self.coerce_expression(e, expected[idx]))
                    .collect::<Result<Vec<_>, _>>()?,
                None => {
                    self.unify_expressions(column, Some(LogicalType::Varchar))?
                        .0
                }
            };
            names.push(format!("column{}", idx + 1));
            select_list.extend(column.into_iter().take(1));
        }
        Ok(BoundQuery::new(names, select_list))
    }

    fn bind_select_body(
        &mut self,
        select: &Select,
        expected: Option<&[LogicalType]>,
    ) -> Result<BoundQuery, BindError> {
        for table in select.from.iter() {
            self.bind_table_with_joins(table)?;
        }
        // WHERE is bound before the projection so `SELECT $1 ... WHERE a = $1`
        // sees the type WHERE decided
        self.bind_where_clause(select.selection.as_ref())?;
        for expr in select.group_by.iter() {
            self.bind_expression(expr)?;
        }
        self.bind_where_clause(select.having.as_ref())?;

        let mut names = vec![];
        let mut select_list = vec![];
        for item in select.projection.iter() {
            match item {
                SelectItem::UnnamedExpr(expr) => {
                    let bound = self.bind_expression(expr)?;
                    names.push(bound.alias());
                    select_list.push(bound);
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    let bound = self.bind_expression(expr)?;
                    names.push(SqlparserResolver::normalize_ident(alias));
                    select_list.push(bound);
                }
                SelectItem::Wildcard(_) => {
                    let idents = self.expand_wildcard(None)?;
                    self.bind_column_list(idents, &mut names, &mut select_list)?;
                }
                SelectItem::QualifiedWildcard(table_name, _) => {
                    let idents = self.expand_wildcard(Some(table_name))?;
                    self.bind_column_list(idents, &mut names, &mut select_list)?;
                }
            }
        }

        if let Some(expected) = expected {
            if expected.len() != select_list.len() {
                return Err(BindError::Internal(format!(
                    "insert column count mismatch, expected: {}, actual: {}",
                    expected.len(),
                    select_list.len()
                )));
            }
            select_list = select_list
                .into_iter()
                .zip(expected)
                .map(|(e, ty)| self.coerce_expression(e, *ty))
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(BoundQuery::new(names, select_list))
    }

    fn bind_column_list(
        &mut self,
        idents: Vec<[Ident; 2]>,
        names: &mut Vec<String>,
        select_list: &mut Vec<BoundExpression>,
    ) -> Result<(), BindError> {
        for idents in idents {
            let bound = self.bind_expression(&Expr::CompoundIdentifier(idents.to_vec()))?;
            names.push(bound.alias());
            select_list.push(bound);
        }
        Ok(())
    }

    /// `*` or `t.*` as qualified column references of the current level.
    fn expand_wildcard(
        &mut self,
        table_name: Option<&ObjectName>,
    ) -> Result<Vec<[Ident; 2]>, BindError> {
        let bind_context = self.current_scope()?;
        let bindings = match table_name {
            Some(table_name) => {
                let table_name = SqlparserResolver::object_name_to_table(table_name)?;
                match bind_context.get_binding(&table_name) {
                    Some(binding) => vec![binding],
                    None => {
                        return Err(BindError::Internal(format!(
                            "missing FROM-clause entry for table {}",
                            table_name
                        )))
                    }
                }
            }
            None if bind_context.is_empty() => {
                return Err(BindError::Internal(
                    "SELECT * with no tables specified is not valid".to_string(),
                ))
            }
            None => bind_context.binding_list.iter().collect(),
        };
        Ok(bindings
            .into_iter()
            .flat_map(|binding| {
                binding.names.iter().map(|name| {
                    [
                        Ident::with_quote('"', binding.alias.clone()),
                        Ident::with_quote('"', name.clone()),
                    ]
                })
            })
            .collect())
    }

    /// WHERE, HAVING and ON conditions must be boolean.
    fn bind_where_clause(&mut self, condition: Option<&Expr>) -> Result<(), BindError> {
        if let Some(condition) = condition {
            let bound = self.bind_expression(condition)?;
            self.coerce_expression(bound, LogicalType::Boolean)?;
        }
        Ok(())
    }

    fn bind_table_with_joins(&mut self, table: &TableWithJoins) -> Result<(), BindError> {
        self.bind_table_factor(&table.relation)?;
        for join in table.joins.iter() {
            self.bind_table_factor(&join.relation)?;
            match &join.join_operator {
                JoinOperator::Inner(constraint)
                | JoinOperator::LeftOuter(constraint)
                | JoinOperator::RightOuter(constraint)
                | JoinOperator::FullOuter(constraint) => match constraint {
                    JoinConstraint::On(expr) => self.bind_where_clause(Some(expr))?,
                    JoinConstraint::Using(_) | JoinConstraint::Natural | JoinConstraint::None => {}
                },
                JoinOperator::CrossJoin => {}
                other => {
                    return Err(BindError::UnsupportedStmt(format!(
                        "join operator {:?}",
                        other
                    )))
                }
            }
        }
        Ok(())
    }

    pub(crate) fn bind_table_factor(&mut self, factor: &TableFactor) -> Result<(), BindError> {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let table_name = SqlparserResolver::object_name_to_table(name)?;
                let catalog = self.catalog;
                let table = catalog.get_table(&table_name)?;
                let alias = alias
                    .as_ref()
                    .map(|alias| SqlparserResolver::normalize_ident(&alias.name))
                    .unwrap_or(table_name);
                let names = table.columns().iter().map(|c| c.name.clone()).collect();
                let types = table.columns().iter().map(|c| c.ty).collect();
                let index = self.generate_table_index();
                self.current_scope()?.add_binding(alias, index, types, names)
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                let alias = alias.as_ref().ok_or_else(|| {
                    BindError::Internal("subquery in FROM must have an alias".to_string())
                })?;
                let bound = self.bind_query(subquery, None)?;
                let mut names = bound.names.clone();
                for (name, column_alias) in names.iter_mut().zip(alias.columns.iter()) {
                    *name = SqlparserResolver::normalize_ident(column_alias);
                }
                let index = self.generate_table_index();
                self.current_scope()?.add_binding(
                    SqlparserResolver::normalize_ident(&alias.name),
                    index,
                    bound.types(),
                    names,
                )
            }
            other => Err(BindError::UnsupportedStmt(other.to_string())),
        }
    }

    fn bind_insert(
        &mut self,
        table_name: &ObjectName,
        columns: &[Ident],
        source: &Query,
    ) -> Result<(), BindError> {
        let table_name = SqlparserResolver::object_name_to_table(table_name)?;
        let catalog = self.catalog;
        let table = catalog.get_table(&table_name)?;
        // insert column mapped to table column type
        let expected_types = if columns.is_empty() {
            table.columns().iter().map(|c| c.ty).collect::<Vec<_>>()
        } else {
            let mut expected_types = vec![];
            for col in columns.iter() {
                let name = SqlparserResolver::normalize_ident(col);
                match table.get_column(&name) {
                    Some(column) => expected_types.push(column.ty),
                    None => {
                        return Err(BindError::Internal(format!(
                            "column {} not found in table {}",
                            name, table_name
                        )))
                    }
                }
            }
            expected_types
        };
        self.bind_query(source, Some(&expected_types))?;
        Ok(())
    }

    fn bind_update(
        &mut self,
        table: &TableWithJoins,
        assignments: &[Assignment],
        from: Option<&TableWithJoins>,
        selection: Option<&Expr>,
    ) -> Result<(), BindError> {
        let table_name = match &table.relation {
            TableFactor::Table { name, .. } => SqlparserResolver::object_name_to_table(name)?,
            other => return Err(BindError::UnsupportedStmt(other.to_string())),
        };
        self.bind_table_with_joins(table)?;
        if let Some(from) = from {
            self.bind_table_with_joins(from)?;
        }
        self.bind_where_clause(selection)?;

        let catalog = self.catalog;
        let target = catalog.get_table(&table_name)?;
        for assignment in assignments.iter() {
            let name = match assignment.id.last() {
                Some(ident) => SqlparserResolver::normalize_ident(ident),
                None => {
                    return Err(BindError::Internal(
                        "empty assignment target".to_string(),
                    ))
                }
            };
            let column = target.get_column(&name).ok_or_else(|| {
                BindError::Internal(format!(
                    "column {} not found in table {}",
                    name, table_name
                ))
            })?;
            let value = self.bind_expression(&assignment.value)?;
            self.coerce_expression(value, column.ty)?;
        }
        Ok(())
    }
}
