use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use arrow::util::pretty::print_batches;

pub fn pretty_batches(batches: &[RecordBatch]) {
    _ = print_batches(batches);
}

/// follow rules: https://www.sqlite.org/sqllogictest/doc/trunk/about.wiki
/// NULL values are rendered as "NULL".
/// Empty strings are rendered as "(empty)".
///
/// ```markdown
/// SLT pattern: query <type-string> <sort-mode> <label>
/// - <type-string>: "T" for a text result, "I" for an integer result, and "R" for a floating-point result.
/// ```
pub fn record_batch_to_string(batch: &RecordBatch) -> Result<String, ArrowError> {
    let mut output = String::new();
    for row in 0..batch.num_rows() {
        for col in 0..batch.num_columns() {
            if col != 0 {
                output.push(' ');
            }
            let column = batch.column(col);

            // NULL values are rendered as "NULL".
            if column.is_null(row) {
                output.push_str("NULL");
                continue;
            }
            let string = array_value_to_string(column, row)?;

            // Empty strings are rendered as "(empty)".
            if *column.data_type() == DataType::Utf8 && string.is_empty() {
                output.push_str("(empty)");
                continue;
            }
            output.push_str(&string);
        }
        output.push('\n');
    }

    Ok(output)
}

#[cfg(test)]
mod util_test {
    use arrow::error::ArrowError;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use crate::memory::MemoryContext;
    use crate::param::{setup_variable_paramlist, ParamState};
    use crate::types::{LogicalType, ScalarValue};
    use crate::util::record_batch_to_string;

    fn render_params(values: &[ScalarValue], nulls: &[u8]) -> Result<String, ArrowError> {
        let ctx = MemoryContext::new("render");
        let state = ParamState::with_types(
            &ctx,
            &[LogicalType::Integer, LogicalType::Varchar, LogicalType::Boolean],
        );
        let list = setup_variable_paramlist(&state, values, nulls).unwrap();
        record_batch_to_string(&list.to_record_batch()?)
    }

    #[test_case(&[ScalarValue::from(42), ScalarValue::from("hi"), ScalarValue::from(true)], b"   ", "42 hi true\n")]
    #[test_case(&[ScalarValue::from(-1), ScalarValue::from(""), ScalarValue::from(false)], b"  n", "-1 (empty) NULL\n")]
    #[test_case(&[ScalarValue::from(7), ScalarValue::from("x"), ScalarValue::from(true)], b"nnn", "NULL NULL NULL\n")]
    fn test_record_batch_to_string(
        values: &[ScalarValue],
        nulls: &[u8],
        expected: &str,
    ) -> Result<(), ArrowError> {
        assert_eq!(render_params(values, nulls)?, expected);
        Ok(())
    }

    #[test]
    fn test_empty_parameter_list() -> Result<(), ArrowError> {
        let ctx = MemoryContext::new("render");
        let state = ParamState::new(&ctx);
        let list = setup_variable_paramlist::<u8>(&state, &[], &[]).unwrap();
        assert_eq!(record_batch_to_string(&list.to_record_batch()?)?, "");
        Ok(())
    }
}
