#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("CatalogEntry: {0} already exists")]
    CatalogEntryExists(String),
    #[error("CatalogEntry: {0} not exists")]
    CatalogEntryNotExists(String),
    #[error("duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },
}
