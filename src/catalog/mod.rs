#[allow(clippy::module_inception)]
mod catalog;
mod constants;
mod errors;
mod table_catalog_entry;

pub use catalog::*;
pub use constants::*;
pub use errors::*;
pub use table_catalog_entry::*;
