pub mod analyzer;
pub mod catalog;
pub mod cli;
pub mod main_entry;
pub mod memory;
pub mod param;
pub mod parser;
pub mod types;
pub mod util;

pub use self::main_entry::{DatabaseError, Session, SessionConfig};
