use std::fmt;
use std::sync::Arc;

use arrow::array::{
    new_null_array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, StringArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use bumpalo::collections::Vec as BumpVec;
use derive_new::new;
use itertools::Itertools;
use log::debug;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

use super::{ParamError, ParamState, LOGGING_TARGET};
use crate::memory::MemoryContext;
use crate::types::{LogicalType, ScalarValue};

/// The parameter value is constant for the whole execution.
pub const PARAM_FLAG_CONST: u16 = 0x0001;

/// A non-null parameter value whose storage belongs to a memory context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datum<'ctx> {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Text(&'ctx str),
}

impl<'ctx> Datum<'ctx> {
    /// Copy `value` into `memory_context`. Nulls have no datum.
    pub fn from_scalar(value: &ScalarValue, memory_context: &'ctx MemoryContext) -> Option<Self> {
        match value {
            ScalarValue::Null => None,
            ScalarValue::Boolean(v) => v.map(Datum::Boolean),
            ScalarValue::Int8(v) => v.map(Datum::Int8),
            ScalarValue::Int16(v) => v.map(Datum::Int16),
            ScalarValue::Int32(v) => v.map(Datum::Int32),
            ScalarValue::Int64(v) => v.map(Datum::Int64),
            ScalarValue::UInt8(v) => v.map(Datum::UInt8),
            ScalarValue::UInt16(v) => v.map(Datum::UInt16),
            ScalarValue::UInt32(v) => v.map(Datum::UInt32),
            ScalarValue::UInt64(v) => v.map(Datum::UInt64),
            ScalarValue::Float32(v) => v.map(Datum::Float32),
            ScalarValue::Float64(v) => v.map(Datum::Float64),
            ScalarValue::String(v) => v
                .as_deref()
                .map(|s| Datum::Text(memory_context.alloc_str(s))),
        }
    }

    /// Render the datum as a SQL literal.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Datum::Boolean(true) => "TRUE".to_string(),
            Datum::Boolean(false) => "FALSE".to_string(),
            Datum::Float32(v) => float_literal(f64::from(*v), v.to_string()),
            Datum::Float64(v) => float_literal(*v, v.to_string()),
            Datum::Text(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_string(),
        }
    }

    fn to_array(self) -> ArrayRef {
        match self {
            Datum::Boolean(v) => Arc::new(BooleanArray::from(vec![v])),
            Datum::Int8(v) => Arc::new(Int8Array::from(vec![v])),
            Datum::Int16(v) => Arc::new(Int16Array::from(vec![v])),
            Datum::Int32(v) => Arc::new(Int32Array::from(vec![v])),
            Datum::Int64(v) => Arc::new(Int64Array::from(vec![v])),
            Datum::UInt8(v) => Arc::new(UInt8Array::from(vec![v])),
            Datum::UInt16(v) => Arc::new(UInt16Array::from(vec![v])),
            Datum::UInt32(v) => Arc::new(UInt32Array::from(vec![v])),
            Datum::UInt64(v) => Arc::new(UInt64Array::from(vec![v])),
            Datum::Float32(v) => Arc::new(Float32Array::from(vec![v])),
            Datum::Float64(v) => Arc::new(Float64Array::from(vec![v])),
            Datum::Text(v) => Arc::new(StringArray::from(vec![v])),
        }
    }
}

fn float_literal(v: f64, text: String) -> String {
    if v.is_nan() {
        "'NaN'".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "'Infinity'".to_string()
        } else {
            "'-Infinity'".to_string()
        }
    } else {
        text
    }
}

impl fmt::Display for Datum<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Boolean(v) => write!(f, "{}", v),
            Datum::Int8(v) => write!(f, "{}", v),
            Datum::Int16(v) => write!(f, "{}", v),
            Datum::Int32(v) => write!(f, "{}", v),
            Datum::Int64(v) => write!(f, "{}", v),
            Datum::UInt8(v) => write!(f, "{}", v),
            Datum::UInt16(v) => write!(f, "{}", v),
            Datum::UInt32(v) => write!(f, "{}", v),
            Datum::UInt64(v) => write!(f, "{}", v),
            Datum::Float32(v) => write!(f, "{}", v),
            Datum::Float64(v) => write!(f, "{}", v),
            Datum::Text(v) => write!(f, "{}", v),
        }
    }
}

/// One bound parameter.
#[derive(new, Debug, Clone, Copy, PartialEq)]
pub struct ParamExternData<'ctx> {
    /// `None` marks a null
    pub value: Option<Datum<'ctx>>,
    pub ptype: LogicalType,
    pub pflags: u16,
}

impl ParamExternData<'_> {
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn to_sql_literal(&self) -> String {
        match &self.value {
            Some(datum) => datum.to_sql_literal(),
            None => "NULL".to_string(),
        }
    }
}

/// Decides whether a parameter is null.
pub trait NullIndicator {
    fn is_null(&self) -> bool;
}

impl NullIndicator for bool {
    fn is_null(&self) -> bool {
        *self
    }
}

/// `'n'` marks a null, anything else a value.
impl NullIndicator for u8 {
    fn is_null(&self) -> bool {
        *self == b'n'
    }
}

impl NullIndicator for char {
    fn is_null(&self) -> bool {
        *self == 'n'
    }
}

/// The parameter values of one execution, allocated in a memory context.
#[derive(Debug, Clone, Copy)]
pub struct ParamListInfo<'ctx> {
    params: &'ctx [ParamExternData<'ctx>],
}

impl<'ctx> ParamListInfo<'ctx> {
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &'ctx [ParamExternData<'ctx>] {
        self.params
    }

    /// Look up parameter `paramno`, numbered from 1.
    pub fn get(&self, paramno: usize) -> Option<&'ctx ParamExternData<'ctx>> {
        paramno.checked_sub(1).and_then(|idx| self.params.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'ctx ParamExternData<'ctx>> {
        self.params.iter()
    }

    /// A one row batch holding column `$n` for every parameter.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let fields = self
            .params
            .iter()
            .enumerate()
            .map(|(idx, param)| {
                Field::new(format!("${}", idx + 1).as_str(), param.ptype.into(), true)
            })
            .collect_vec();
        let schema = Arc::new(Schema::new(fields));
        if self.params.is_empty() {
            return Ok(RecordBatch::new_empty(schema));
        }
        let columns = self
            .params
            .iter()
            .map(|param| match param.value {
                Some(datum) => datum.to_array(),
                None => new_null_array(&DataType::from(param.ptype), 1),
            })
            .collect_vec();
        RecordBatch::try_new(schema, columns)
    }

    /// Replace every `$n` in `sql` with the literal of parameter `n`.
    pub fn substitute(&self, sql: &str) -> Result<String, ParamError> {
        let dialect = PostgreSqlDialect {};
        let tokens = Tokenizer::new(&dialect, sql).tokenize()?;
        let mut output = String::with_capacity(sql.len());
        for token in tokens {
            match token {
                Token::Placeholder(placeholder) => {
                    match placeholder
                        .strip_prefix('$')
                        .and_then(|n| n.parse::<usize>().ok())
                    {
                        Some(paramno) => {
                            let param =
                                self.get(paramno).ok_or(ParamError::NoSuchParameter(paramno))?;
                            let literal = param.to_sql_literal();
                            // `-` followed by `-7` would start a line comment
                            if output.ends_with('-') && literal.starts_with('-') {
                                output.push(' ');
                            }
                            output.push_str(&literal);
                        }
                        None => output.push_str(&placeholder),
                    }
                }
                // the tokenizer unescapes quoted text, put the escapes back
                Token::SingleQuotedString(s) => push_quoted(&mut output, "", '\'', &s),
                Token::NationalStringLiteral(s) => push_quoted(&mut output, "N", '\'', &s),
                Token::HexStringLiteral(s) => push_quoted(&mut output, "X", '\'', &s),
                Token::DoubleQuotedString(s) => push_quoted(&mut output, "", '"', &s),
                Token::EscapedStringLiteral(s) => {
                    output.push_str("E'");
                    for ch in s.chars() {
                        match ch {
                            '\\' => output.push_str("\\\\"),
                            '\'' => output.push_str("\\'"),
                            '\n' => output.push_str("\\n"),
                            '\r' => output.push_str("\\r"),
                            '\t' => output.push_str("\\t"),
                            other => output.push(other),
                        }
                    }
                    output.push('\'');
                }
                Token::Word(Word {
                    value,
                    quote_style: Some(quote),
                    ..
                }) => {
                    output.push(quote);
                    let end = if quote == '[' { ']' } else { quote };
                    output.push_str(&value.replace(end, &format!("{}{}", end, end)));
                    output.push(end);
                }
                Token::EOF => {}
                other => output.push_str(&other.to_string()),
            }
        }
        Ok(output)
    }
}

fn push_quoted(output: &mut String, prefix: &str, quote: char, value: &str) {
    output.push_str(prefix);
    output.push(quote);
    for ch in value.chars() {
        if ch == quote {
            output.push(quote);
        }
        output.push(ch);
    }
    output.push(quote);
}

/// Bind `values` to the parameters recorded in `state`. Entry `i` takes the
/// type `param_types[i]` and either `values[i]`, cast to that type, or null
/// when `nulls[i]` says so. The list lives in the state's memory context.
pub fn setup_variable_paramlist<'ctx, N: NullIndicator>(
    state: &ParamState<'ctx>,
    values: &[ScalarValue],
    nulls: &[N],
) -> Result<ParamListInfo<'ctx>, ParamError> {
    let num_params = state.num_params();
    if values.len() < num_params || nulls.len() < num_params {
        return Err(ParamError::ArgumentCountMismatch {
            expected: num_params,
            values: values.len(),
            nulls: nulls.len(),
        });
    }
    if let Some(idx) = state.param_types().iter().position(|ty| !ty.is_resolved()) {
        return Err(ParamError::UnresolvedParameterType(idx + 1));
    }

    let memory_context = state.memory_context();
    let mut params = BumpVec::with_capacity_in(num_params, memory_context.arena());
    for ((ptype, value), null) in state.param_types().iter().zip(values).zip(nulls) {
        let value = if null.is_null() {
            None
        } else {
            Datum::from_scalar(&value.cast_to(ptype)?, memory_context)
        };
        params.push(ParamExternData::new(value, *ptype, PARAM_FLAG_CONST));
    }
    debug!(
        target: LOGGING_TARGET,
        "built {} parameters in memory context {}",
        num_params,
        memory_context.name()
    );
    Ok(ParamListInfo {
        params: params.into_bump_slice(),
    })
}

#[cfg(test)]
mod param_list_test {
    use arrow::array::{Array, Int32Array, StringArray};
    use arrow::datatypes::DataType;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::parser::Sqlparser;
    use crate::types::TypeError;

    #[test]
    fn test_build_values() {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer, LogicalType::Varchar]);
        let values = vec![ScalarValue::from(42), ScalarValue::from("hi")];
        let list = setup_variable_paramlist(&state, &values, &[false, false]).unwrap();

        assert_eq!(list.num_params(), 2);
        assert_eq!(
            list.params(),
            &[
                ParamExternData::new(
                    Some(Datum::Int32(42)),
                    LogicalType::Integer,
                    PARAM_FLAG_CONST
                ),
                ParamExternData::new(
                    Some(Datum::Text("hi")),
                    LogicalType::Varchar,
                    PARAM_FLAG_CONST
                ),
            ]
        );
    }

    #[test_case(&[b'n'] ; "spi null flag")]
    #[test_case(&[b'n', b' '] ; "extra flags")]
    fn test_null_flag_wins(nulls: &[u8]) {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer]);
        let list = setup_variable_paramlist(&state, &[ScalarValue::from(0)], nulls).unwrap();
        assert_eq!(list.num_params(), 1);
        let param = list.get(1).unwrap();
        assert!(param.is_null());
        assert_eq!(param.ptype, LogicalType::Integer);
    }

    #[test]
    fn test_null_indicators() {
        assert!(true.is_null());
        assert!(!false.is_null());
        assert!(b'n'.is_null());
        assert!(!b' '.is_null());
        assert!('n'.is_null());
        assert!(!'N'.is_null());
    }

    #[test]
    fn test_empty_list() {
        let ctx = MemoryContext::new("test");
        let state = ParamState::new(&ctx);
        let list = setup_variable_paramlist::<bool>(&state, &[], &[]).unwrap();
        assert_eq!(list.num_params(), 0);
        assert!(list.get(1).is_none());
        assert_eq!(list.to_record_batch().unwrap().num_columns(), 0);
    }

    #[test_case(1, 2 ; "too few values")]
    #[test_case(2, 1 ; "too few nulls")]
    fn test_argument_count_mismatch(num_values: usize, num_nulls: usize) {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer, LogicalType::Integer]);
        let values = vec![ScalarValue::from(1); num_values];
        let nulls = vec![false; num_nulls];
        let err = setup_variable_paramlist(&state, &values, &nulls).unwrap_err();
        assert!(matches!(
            err,
            ParamError::ArgumentCountMismatch { expected: 2, .. }
        ));
    }

    #[test]
    fn test_extra_values_ignored() {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Boolean]);
        let values = vec![ScalarValue::from(true), ScalarValue::from(7)];
        let list = setup_variable_paramlist(&state, &values, &['x', 'x', 'x']).unwrap();
        assert_eq!(list.num_params(), 1);
        assert_eq!(list.get(1).unwrap().value, Some(Datum::Boolean(true)));
    }

    #[test]
    fn test_unresolved_type() {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer, LogicalType::Unknown]);
        let values = vec![ScalarValue::from(1), ScalarValue::from(2)];
        let err = setup_variable_paramlist(&state, &values, &[false, false]).unwrap_err();
        assert!(matches!(err, ParamError::UnresolvedParameterType(2)));
    }

    #[test]
    fn test_values_cast_to_declared_type() {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(
            &ctx,
            &[LogicalType::Bigint, LogicalType::Double, LogicalType::Varchar],
        );
        let values = vec![
            ScalarValue::from("12"),
            ScalarValue::from(3),
            ScalarValue::from(true),
        ];
        let list = setup_variable_paramlist(&state, &values, &[false; 3]).unwrap();
        let datums = list.iter().map(|p| p.value).collect_vec();
        assert_eq!(
            datums,
            vec![
                Some(Datum::Int64(12)),
                Some(Datum::Float64(3.0)),
                Some(Datum::Text("true"))
            ]
        );

        let state = ParamState::with_types(&ctx, &[LogicalType::Tinyint]);
        let err = setup_variable_paramlist(&state, &[ScalarValue::from(300)], &[false]).unwrap_err();
        assert!(matches!(
            err,
            ParamError::TypeError(TypeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_types_match_state() {
        let ctx = MemoryContext::new("test");
        let types = [
            LogicalType::Boolean,
            LogicalType::Smallint,
            LogicalType::UInteger,
            LogicalType::Float,
        ];
        let state = ParamState::with_types(&ctx, &types);
        let values = vec![ScalarValue::Null; 4];
        let list = setup_variable_paramlist(&state, &values, &[b'n', b' ', b'n', b' ']).unwrap();
        assert_eq!(list.num_params(), state.num_params());
        for (param, ty) in list.iter().zip(state.param_types()) {
            assert_eq!(param.ptype, *ty);
            assert_eq!(param.pflags, PARAM_FLAG_CONST);
            assert!(param.is_null());
        }
    }

    #[test]
    fn test_to_record_batch() {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer, LogicalType::Varchar]);
        let values = vec![ScalarValue::from(7), ScalarValue::from("x")];
        let list = setup_variable_paramlist(&state, &values, &[false, true]).unwrap();
        let batch = list.to_record_batch().unwrap();

        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.schema().field(0).name(), "$1");
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);
        let a = batch.column(0).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(a.value(0), 7);
        let b = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(b.is_null(0));
    }

    #[test_case("select * from t where a = $1 and b = $2", "select * from t where a = 42 and b = 'it''s'")]
    #[test_case("select $3, '$1'", "select NULL, '$1'")]
    #[test_case("select $2 || 'o''k' -- $1", "select 'it''s' || 'o''k' -- $1")]
    fn test_substitute(sql: &str, expected: &str) {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(
            &ctx,
            &[LogicalType::Integer, LogicalType::Varchar, LogicalType::Double],
        );
        let values = vec![ScalarValue::from(42), ScalarValue::from("it's"), ScalarValue::Null];
        let list = setup_variable_paramlist(&state, &values, &[false, false, false]).unwrap();
        assert_eq!(list.substitute(sql).unwrap(), expected);
    }

    #[test_case(r#"select N'x''y', $1"#, r#"select N'x''y', 42"#; "national string")]
    #[test_case(r#"select "a""b", $1"#, r#"select "a""b", 42"#; "quoted identifier")]
    #[test_case(r#"select E'a\'b\\c', $1"#, r#"select E'a\'b\\c', 42"#; "escaped string")]
    #[test_case(r#"select E'tab\there', $1"#, r#"select E'tab\there', 42"#; "escaped control character")]
    #[test_case(r#"select X'1F', $1"#, r#"select X'1F', 42"#; "hex string")]
    fn test_substitute_keeps_quoted_tokens(sql: &str, expected: &str) {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer]);
        let list = setup_variable_paramlist(&state, &[ScalarValue::from(42)], &[false]).unwrap();
        assert_eq!(list.substitute(sql).unwrap(), expected);
    }

    #[test_case("select -$1", "select - -7"; "unary minus")]
    #[test_case("select 1-$1", "select 1- -7"; "binary minus no space")]
    #[test_case("select 1 - $1", "select 1 - -7"; "binary minus spaced")]
    #[test_case("select $1-1", "select -7-1"; "leading param")]
    fn test_substitute_negative_value(sql: &str, expected: &str) {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer]);
        let list = setup_variable_paramlist(&state, &[ScalarValue::from(-7)], &[false]).unwrap();
        let substituted = list.substitute(sql).unwrap();
        assert_eq!(substituted, expected);
        assert_eq!(
            Sqlparser::parse(substituted).unwrap().len(),
            1,
            "substituted sql must stay a single statement"
        );
    }

    #[test]
    fn test_substitute_missing_parameter() {
        let ctx = MemoryContext::new("test");
        let state = ParamState::with_types(&ctx, &[LogicalType::Integer]);
        let list = setup_variable_paramlist(&state, &[ScalarValue::from(1)], &[false]).unwrap();
        let err = list.substitute("select $2").unwrap_err();
        assert!(matches!(err, ParamError::NoSuchParameter(2)));
    }

    #[test_case(Datum::Boolean(false), "FALSE")]
    #[test_case(Datum::Int64(-5), "-5")]
    #[test_case(Datum::Float64(1.5), "1.5")]
    #[test_case(Datum::Float64(f64::NAN), "'NaN'")]
    #[test_case(Datum::Float32(1.1), "1.1")]
    #[test_case(Datum::Float32(f32::NEG_INFINITY), "'-Infinity'")]
    #[test_case(Datum::Text("o'k"), "'o''k'")]
    fn test_sql_literal(datum: Datum, expected: &str) {
        assert_eq!(datum.to_sql_literal(), expected);
    }
}
