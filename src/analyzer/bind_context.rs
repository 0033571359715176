use std::collections::HashMap;

use derive_new::new;

use super::{BindError, Binding};
use crate::types::LogicalType;

/// The BindContext object keeps track of all the tables and columns
/// that are encountered while one query level is analyzed.
#[derive(new, Debug, Clone)]
pub struct BindContext {
    /// table name -> table binding
    #[new(default)]
    pub(crate) bindings: HashMap<String, Binding>,
    #[new(default)]
    pub(crate) binding_list: Vec<Binding>,
}

impl BindContext {
    pub fn add_binding(
        &mut self,
        alias: String,
        index: usize,
        types: Vec<LogicalType>,
        names: Vec<String>,
    ) -> Result<(), BindError> {
        if self.bindings.contains_key(&alias) {
            return Err(BindError::Internal(format!(
                "table name {} specified more than once",
                alias
            )));
        }
        let name_map = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let binding = Binding::new(alias.clone(), index, types, names, name_map);
        self.bindings.insert(alias, binding.clone());
        self.binding_list.push(binding);
        Ok(())
    }

    pub fn get_binding(&self, table_name: &str) -> Option<&Binding> {
        self.bindings.get(table_name)
    }

    /// The alias of the only binding that has `column_name`, if any.
    pub fn get_matching_binding(&self, column_name: &str) -> Result<Option<&Binding>, BindError> {
        let mut matching = None;
        for binding in self.binding_list.iter() {
            if binding.has_match_binding(column_name) {
                if matching.is_some() {
                    return Err(BindError::Internal(format!(
                        "Ambiguous column name {}",
                        column_name
                    )));
                }
                matching = Some(binding);
            }
        }
        Ok(matching)
    }

    pub fn is_empty(&self) -> bool {
        self.binding_list.is_empty()
    }
}
