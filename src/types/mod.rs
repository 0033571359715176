mod errors;
#[allow(clippy::module_inception)]
mod types;
mod values;

pub use errors::*;
pub use types::*;
pub use values::*;
