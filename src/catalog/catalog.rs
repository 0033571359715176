use std::collections::BTreeMap;

use super::{CatalogError, TableCatalogEntry};

/// The Catalog object holds the tables known to a session.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableCatalogEntry>,
    /// The catalog version, incremented whenever anything changes in the catalog
    catalog_version: usize,
}

impl Catalog {
    pub fn create_table(
        &mut self,
        entry: TableCatalogEntry,
        if_not_exists: bool,
    ) -> Result<(), CatalogError> {
        if self.tables.contains_key(entry.name()) {
            if if_not_exists {
                return Ok(());
            }
            return Err(CatalogError::CatalogEntryExists(entry.name().to_string()));
        }
        self.catalog_version += 1;
        self.tables.insert(entry.name().to_string(), entry);
        Ok(())
    }

    pub fn get_table(&self, table: &str) -> Result<&TableCatalogEntry, CatalogError> {
        self.tables
            .get(table)
            .ok_or_else(|| CatalogError::CatalogEntryNotExists(table.to_string()))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableCatalogEntry> {
        self.tables.values()
    }

    pub fn catalog_version(&self) -> usize {
        self.catalog_version
    }
}
