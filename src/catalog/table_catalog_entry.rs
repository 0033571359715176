use std::collections::HashMap;

use derive_new::new;

use super::CatalogError;
use crate::types::LogicalType;

#[derive(Clone, Debug)]
pub struct TableCatalogEntry {
    pub(crate) name: String,
    /// A list of columns that are part of this table
    pub(crate) columns: Vec<ColumnDefinition>,
    /// A map of column name to column index
    pub(crate) name_map: HashMap<String, usize>,
}

impl TableCatalogEntry {
    pub fn try_new(name: String, columns: Vec<ColumnDefinition>) -> Result<Self, CatalogError> {
        let mut name_map = HashMap::new();
        for (idx, col) in columns.iter().enumerate() {
            if name_map.insert(col.name.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateColumn {
                    table: name,
                    column: col.name.clone(),
                });
            }
        }
        Ok(Self {
            name,
            columns,
            name_map,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.name_map.get(name).map(|idx| &self.columns[*idx])
    }
}

#[derive(new, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnDefinition {
    /// The name of the entry
    pub(crate) name: String,
    /// The type of the column
    pub(crate) ty: LogicalType,
}
