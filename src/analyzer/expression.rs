use std::slice;

use derive_new::new;
use itertools::Itertools;
use log::debug;
use sqlparser::ast::{BinaryOperator, DataType, Expr, Ident, Query, UnaryOperator, Value};

use super::{BindError, ParseState, SqlparserResolver, LOGGING_TARGET};
use crate::types::{LogicalType, ScalarValue};

/// The Expression represents a bound Expression with a return type
#[derive(new, Debug, Clone)]
pub struct BoundExpressionBase {
    /// The alias of the expression,
    pub(crate) alias: String,
    pub(crate) return_type: LogicalType,
}

#[derive(new, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBinding {
    pub(crate) table_idx: usize,
    pub(crate) column_idx: usize,
}

#[derive(new, Debug, Clone)]
pub struct BoundColumnRefExpression {
    pub(crate) base: BoundExpressionBase,
    pub(crate) binding: ColumnBinding,
    /// The subquery depth (i.e. depth 0 = current query, depth 1 = parent query, depth 2 = parent
    /// of parent, etc...). This is only non-zero for correlated expressions inside subqueries.
    pub(crate) depth: usize,
}

/// A `$n` reference. Its return type is `Unknown` until a coercion decides it.
#[derive(new, Debug, Clone)]
pub struct BoundParameterExpression {
    pub(crate) base: BoundExpressionBase,
    pub(crate) paramno: usize,
}

#[derive(new, Debug, Clone)]
pub struct BoundConstantExpression {
    pub(crate) base: BoundExpressionBase,
    pub(crate) value: ScalarValue,
}

#[derive(new, Debug, Clone)]
pub struct BoundCastExpression {
    pub(crate) base: BoundExpressionBase,
    pub(crate) child: Box<BoundExpression>,
}

/// Operators, predicates and CASE; only the result type matters here.
#[derive(new, Debug, Clone)]
pub struct BoundOperatorExpression {
    pub(crate) base: BoundExpressionBase,
    pub(crate) children: Vec<BoundExpression>,
}

#[derive(new, Debug, Clone)]
pub struct BoundSubqueryExpression {
    pub(crate) base: BoundExpressionBase,
}

#[derive(Debug, Clone)]
pub enum BoundExpression {
    BoundColumnRefExpression(BoundColumnRefExpression),
    BoundParameterExpression(BoundParameterExpression),
    BoundConstantExpression(BoundConstantExpression),
    BoundCastExpression(BoundCastExpression),
    BoundOperatorExpression(BoundOperatorExpression),
    BoundSubqueryExpression(BoundSubqueryExpression),
}

impl BoundExpression {
    fn base(&self) -> &BoundExpressionBase {
        match self {
            BoundExpression::BoundColumnRefExpression(expr) => &expr.base,
            BoundExpression::BoundParameterExpression(expr) => &expr.base,
            BoundExpression::BoundConstantExpression(expr) => &expr.base,
            BoundExpression::BoundCastExpression(expr) => &expr.base,
            BoundExpression::BoundOperatorExpression(expr) => &expr.base,
            BoundExpression::BoundSubqueryExpression(expr) => &expr.base,
        }
    }

    pub fn return_type(&self) -> LogicalType {
        self.base().return_type
    }

    pub fn alias(&self) -> String {
        self.base().alias.clone()
    }

    /// String literals and NULL adapt to the type of whatever they meet, so
    /// they only decide a common type when nothing else does.
    fn is_untyped_literal(&self) -> bool {
        matches!(
            self,
            BoundExpression::BoundConstantExpression(c)
                if matches!(c.base.return_type, LogicalType::Varchar | LogicalType::SqlNull)
        )
    }

    fn operator(alias: String, return_type: LogicalType, children: Vec<BoundExpression>) -> Self {
        BoundExpression::BoundOperatorExpression(BoundOperatorExpression::new(
            BoundExpressionBase::new(alias, return_type),
            children,
        ))
    }
}

impl ParseState<'_> {
    pub fn bind_expression(&mut self, expr: &Expr) -> Result<BoundExpression, BindError> {
        match expr {
            Expr::Identifier(ident) => self.bind_column_ref_expr(slice::from_ref(ident)),
            Expr::CompoundIdentifier(idents) => self.bind_column_ref_expr(idents),
            Expr::Value(Value::Placeholder(p)) => self.bind_parameter_expr(p),
            Expr::Value(v) => {
                let value = ScalarValue::try_from(v)?;
                let base = BoundExpressionBase::new(v.to_string(), value.get_logical_type());
                Ok(BoundExpression::BoundConstantExpression(
                    BoundConstantExpression::new(base, value),
                ))
            }
            Expr::TypedString { data_type, value } => {
                let ty = LogicalType::try_from(data_type.clone())?;
                let value = ScalarValue::parse_str(value, &ty)?;
                let base = BoundExpressionBase::new(expr.to_string(), ty);
                Ok(BoundExpression::BoundConstantExpression(
                    BoundConstantExpression::new(base, value),
                ))
            }
            Expr::Cast {
                expr: child,
                data_type,
            } => self.bind_cast_expr(expr, child, data_type),
            Expr::Nested(child) => self.bind_expression(child),
            Expr::BinaryOp { left, op, right } => self.bind_binary_op(expr, left, op, right),
            Expr::UnaryOp { op, expr: child } => self.bind_unary_op(expr, op, child),
            Expr::IsNull(child) | Expr::IsNotNull(child) => {
                let child = self.bind_expression(child)?;
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    vec![child],
                ))
            }
            Expr::InList {
                expr: child, list, ..
            } => {
                let mut children = vec![self.bind_expression(child)?];
                for item in list {
                    children.push(self.bind_expression(item)?);
                }
                let (children, _) = self.unify_expressions(children, Some(LogicalType::Varchar))?;
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    children,
                ))
            }
            Expr::Between {
                expr: child,
                low,
                high,
                ..
            } => {
                let children = vec![
                    self.bind_expression(child)?,
                    self.bind_expression(low)?,
                    self.bind_expression(high)?,
                ];
                let (children, _) = self.unify_expressions(children, Some(LogicalType::Varchar))?;
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    children,
                ))
            }
            Expr::Like {
                expr: child,
                pattern,
                ..
            }
            | Expr::ILike {
                expr: child,
                pattern,
                ..
            } => {
                let child = self.bind_expression(child)?;
                let child = self.coerce_expression(child, LogicalType::Varchar)?;
                let pattern = self.bind_expression(pattern)?;
                let pattern = self.coerce_expression(pattern, LogicalType::Varchar)?;
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    vec![child, pattern],
                ))
            }
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => self.bind_case_expr(
                expr,
                operand.as_deref(),
                conditions,
                results,
                else_result.as_deref(),
            ),
            Expr::Exists { subquery, .. } => {
                self.bind_subquery(subquery)?;
                let base = BoundExpressionBase::new(expr.to_string(), LogicalType::Boolean);
                Ok(BoundExpression::BoundSubqueryExpression(
                    BoundSubqueryExpression::new(base),
                ))
            }
            Expr::Subquery(subquery) => {
                let column = self.bind_single_column_subquery(subquery)?;
                let base = BoundExpressionBase::new(expr.to_string(), column.return_type());
                Ok(BoundExpression::BoundSubqueryExpression(
                    BoundSubqueryExpression::new(base),
                ))
            }
            Expr::InSubquery {
                expr: child,
                subquery,
                ..
            } => {
                let child = self.bind_expression(child)?;
                let column = self.bind_single_column_subquery(subquery)?;
                let (children, _) =
                    self.unify_expressions(vec![child, column], Some(LogicalType::Varchar))?;
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    children,
                ))
            }
            other => Err(BindError::UnsupportedExpr(other.to_string())),
        }
    }

    fn bind_column_ref_expr(&mut self, idents: &[Ident]) -> Result<BoundExpression, BindError> {
        let idents = idents
            .iter()
            .map(SqlparserResolver::normalize_ident)
            .collect_vec();

        let (table_name, column_name) = match idents.as_slice() {
            [column] => (None, column),
            [table, column] => (Some(table), column),
            _ => return Err(BindError::UnsupportedExpr(idents.join("."))),
        };

        // innermost query level first, outer levels are correlated references
        for (depth, bind_context) in self.scopes.iter().rev().enumerate() {
            let binding = match table_name {
                Some(table_name) => bind_context.get_binding(table_name),
                None => bind_context.get_matching_binding(column_name)?,
            };
            if let Some(binding) = binding {
                let bound_col_ref = binding.bind_column(column_name, depth)?;
                return Ok(BoundExpression::BoundColumnRefExpression(bound_col_ref));
            }
        }
        debug!(
            target: LOGGING_TARGET,
            "Analyzer bind contexts: {:#?}", self.scopes
        );
        match table_name {
            Some(table_name) => Err(BindError::Internal(format!(
                "missing FROM-clause entry for table {}",
                table_name
            ))),
            None => Err(BindError::Internal(format!(
                "column not found: {}",
                column_name
            ))),
        }
    }

    fn bind_parameter_expr(&mut self, placeholder: &str) -> Result<BoundExpression, BindError> {
        let paramno = placeholder
            .strip_prefix('$')
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| BindError::InvalidParameterReference(placeholder.to_string()))?;
        let hook = self
            .param_hook
            .as_mut()
            .ok_or(BindError::NoSuchParameter(paramno))?;
        let ty = hook.param_ref(paramno)?;
        debug!(
            target: LOGGING_TARGET,
            "Analyzer parameter reference ${} has type {}", paramno, ty
        );
        let base = BoundExpressionBase::new(placeholder.to_string(), ty);
        Ok(BoundExpression::BoundParameterExpression(
            BoundParameterExpression::new(base, paramno),
        ))
    }

    fn bind_cast_expr(
        &mut self,
        expr: &Expr,
        child: &Expr,
        data_type: &DataType,
    ) -> Result<BoundExpression, BindError> {
        let target = LogicalType::try_from(data_type.clone())?;
        let child = self.bind_expression(child)?;
        let source = child.return_type();
        if source == LogicalType::Unknown {
            // an explicit cast decides the type of an unknown parameter
            return self.coerce_expression(child, target);
        }
        if source == target {
            return Ok(child);
        }
        if let BoundExpression::BoundConstantExpression(constant) = &child {
            let value = constant.value.cast_to(&target)?;
            let base = BoundExpressionBase::new(expr.to_string(), target);
            return Ok(BoundExpression::BoundConstantExpression(
                BoundConstantExpression::new(base, value),
            ));
        }
        let base = BoundExpressionBase::new(expr.to_string(), target);
        Ok(BoundExpression::BoundCastExpression(
            BoundCastExpression::new(base, Box::new(child)),
        ))
    }

    fn bind_binary_op(
        &mut self,
        expr: &Expr,
        left: &Expr,
        op: &BinaryOperator,
        right: &Expr,
    ) -> Result<BoundExpression, BindError> {
        let left = self.bind_expression(left)?;
        let right = self.bind_expression(right)?;
        match op {
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq => {
                // unknown = unknown compares as text
                let (children, _) =
                    self.unify_expressions(vec![left, right], Some(LogicalType::Varchar))?;
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    children,
                ))
            }
            BinaryOperator::Plus
            | BinaryOperator::Minus
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo => {
                let (children, ty) = self.unify_expressions(vec![left, right], None)?;
                if ty.is_resolved() && !ty.is_numeric() {
                    return Err(BindError::UnsupportedExpr(format!(
                        "operator does not exist: {} {} {}",
                        ty, op, ty
                    )));
                }
                Ok(BoundExpression::operator(expr.to_string(), ty, children))
            }
            BinaryOperator::And | BinaryOperator::Or => {
                let children = vec![
                    self.coerce_expression(left, LogicalType::Boolean)?,
                    self.coerce_expression(right, LogicalType::Boolean)?,
                ];
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    children,
                ))
            }
            BinaryOperator::StringConcat => {
                let children = vec![
                    self.coerce_unknown(left, LogicalType::Varchar)?,
                    self.coerce_unknown(right, LogicalType::Varchar)?,
                ];
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Varchar,
                    children,
                ))
            }
            other => Err(BindError::UnsupportedExpr(other.to_string())),
        }
    }

    fn bind_unary_op(
        &mut self,
        expr: &Expr,
        op: &UnaryOperator,
        child: &Expr,
    ) -> Result<BoundExpression, BindError> {
        let child = self.bind_expression(child)?;
        match op {
            UnaryOperator::Not => {
                let child = self.coerce_expression(child, LogicalType::Boolean)?;
                Ok(BoundExpression::operator(
                    expr.to_string(),
                    LogicalType::Boolean,
                    vec![child],
                ))
            }
            UnaryOperator::Plus | UnaryOperator::Minus => {
                let ty = child.return_type();
                if ty.is_resolved() && !ty.is_numeric() {
                    return Err(BindError::UnsupportedExpr(format!(
                        "operator does not exist: {} {}",
                        op, ty
                    )));
                }
                Ok(BoundExpression::operator(expr.to_string(), ty, vec![child]))
            }
            other => Err(BindError::UnsupportedExpr(other.to_string())),
        }
    }

    fn bind_case_expr(
        &mut self,
        expr: &Expr,
        operand: Option<&Expr>,
        conditions: &[Expr],
        results: &[Expr],
        else_result: Option<&Expr>,
    ) -> Result<BoundExpression, BindError> {
        let mut children = vec![];
        match operand {
            Some(operand) => {
                let mut compared = vec![self.bind_expression(operand)?];
                for condition in conditions {
                    compared.push(self.bind_expression(condition)?);
                }
                let (compared, _) = self.unify_expressions(compared, Some(LogicalType::Varchar))?;
                children.extend(compared);
            }
            None => {
                for condition in conditions {
                    let condition = self.bind_expression(condition)?;
                    children.push(self.coerce_expression(condition, LogicalType::Boolean)?);
                }
            }
        }

        let mut branches = vec![];
        for result in results.iter().chain(else_result) {
            branches.push(self.bind_expression(result)?);
        }
        let (branches, ty) = self.unify_expressions(branches, Some(LogicalType::Varchar))?;
        children.extend(branches);
        Ok(BoundExpression::operator(expr.to_string(), ty, children))
    }

    fn bind_subquery(&mut self, subquery: &Query) -> Result<super::BoundQuery, BindError> {
        self.bind_query(subquery, None)
    }

    /// The output expression of a subquery used as a value.
    fn bind_single_column_subquery(
        &mut self,
        subquery: &Query,
    ) -> Result<BoundExpression, BindError> {
        let bound = self.bind_subquery(subquery)?;
        match <[BoundExpression; 1]>::try_from(bound.select_list) {
            Ok([column]) => Ok(column),
            Err(_) => Err(BindError::Internal(
                "subquery must return only one column".to_string(),
            )),
        }
    }

    /// Coerce `expr` to `target`. An unknown parameter takes the target type
    /// through the installed hook, literals are converted in place and other
    /// expressions get an implicit cast.
    pub fn coerce_expression(
        &mut self,
        expr: BoundExpression,
        target: LogicalType,
    ) -> Result<BoundExpression, BindError> {
        let source = expr.return_type();
        if source == target || !target.is_resolved() {
            return Ok(expr);
        }
        match expr {
            BoundExpression::BoundParameterExpression(mut param)
                if source == LogicalType::Unknown =>
            {
                let hook = self
                    .param_hook
                    .as_mut()
                    .ok_or(BindError::NoSuchParameter(param.paramno))?;
                let ty = hook.coerce_param(param.paramno, target)?;
                debug!(
                    target: LOGGING_TARGET,
                    "Analyzer coerced parameter ${} to {}", param.paramno, ty
                );
                param.base.return_type = ty;
                Ok(BoundExpression::BoundParameterExpression(param))
            }
            BoundExpression::BoundConstantExpression(constant)
                if matches!(source, LogicalType::Varchar | LogicalType::SqlNull) =>
            {
                let value = constant.value.cast_to(&target)?;
                let base = BoundExpressionBase::new(constant.base.alias, target);
                Ok(BoundExpression::BoundConstantExpression(
                    BoundConstantExpression::new(base, value),
                ))
            }
            expr if LogicalType::can_implicit_cast(&source, &target) => {
                let base = BoundExpressionBase::new(expr.alias(), target);
                Ok(BoundExpression::BoundCastExpression(
                    BoundCastExpression::new(base, Box::new(expr)),
                ))
            }
            _ => Err(BindError::CannotCoerce {
                from: source,
                to: target,
            }),
        }
    }

    /// Like `coerce_expression`, but leaves typed expressions untouched.
    fn coerce_unknown(
        &mut self,
        expr: BoundExpression,
        target: LogicalType,
    ) -> Result<BoundExpression, BindError> {
        if expr.return_type() == LogicalType::Unknown {
            self.coerce_expression(expr, target)
        } else {
            Ok(expr)
        }
    }

    /// Find the common type of `exprs` and coerce all of them to it. When no
    /// expression has a type, `default_type` is used if given; otherwise the
    /// expressions are returned unchanged with an `Unknown` common type.
    pub fn unify_expressions(
        &mut self,
        exprs: Vec<BoundExpression>,
        default_type: Option<LogicalType>,
    ) -> Result<(Vec<BoundExpression>, LogicalType), BindError> {
        let mut common = Self::common_type(exprs.iter().filter(|e| !e.is_untyped_literal()))?;
        if common == LogicalType::Unknown {
            common = Self::common_type(exprs.iter())?;
        }
        if common == LogicalType::Unknown {
            match default_type {
                Some(ty) => common = ty,
                None => return Ok((exprs, LogicalType::Unknown)),
            }
        }
        let exprs = exprs
            .into_iter()
            .map(|e| self.coerce_expression(e, common))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((exprs, common))
    }

    fn common_type<'e>(
        exprs: impl Iterator<Item = &'e BoundExpression>,
    ) -> Result<LogicalType, BindError> {
        let mut common = LogicalType::Unknown;
        for ty in exprs.map(|e| e.return_type()) {
            if ty.is_resolved() && ty != LogicalType::SqlNull {
                common = LogicalType::max_logical_type(&common, &ty)?;
            }
        }
        Ok(common)
    }
}
