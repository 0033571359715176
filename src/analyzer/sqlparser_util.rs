use sqlparser::ast::{ColumnDef, Ident, ObjectName};

use super::BindError;
use crate::catalog::{ColumnDefinition, DEFAULT_SCHEMA};

pub struct SqlparserResolver;

impl SqlparserResolver {
    /// Unquoted identifiers are case-insensitive and folded to lower case.
    pub fn normalize_ident(ident: &Ident) -> String {
        match ident.quote_style {
            Some(_) => ident.value.clone(),
            None => ident.value.to_lowercase(),
        }
    }

    /// Resolve object_name which is a name of a table, possibly qualified with
    /// the default schema, i.e. public.obj
    pub fn object_name_to_table(object_name: &ObjectName) -> Result<String, BindError> {
        match object_name.0.as_slice() {
            [table] => Ok(Self::normalize_ident(table)),
            [schema, table] if Self::normalize_ident(schema) == DEFAULT_SCHEMA => {
                Ok(Self::normalize_ident(table))
            }
            _ => Err(BindError::SqlParserUnsupportedStmt(object_name.to_string())),
        }
    }

    pub fn column_def_to_column_definition(
        column_def: &ColumnDef,
    ) -> Result<ColumnDefinition, BindError> {
        let name = Self::normalize_ident(&column_def.name);
        let ty = column_def.data_type.clone().try_into()?;
        Ok(ColumnDefinition::new(name, ty))
    }
}
