mod config;
mod errors;
mod prepared_statement_data;
mod query_result;
mod session;

pub use config::*;
pub use errors::*;
pub use prepared_statement_data::*;
pub use query_result::*;
pub use session::*;
