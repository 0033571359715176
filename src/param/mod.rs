//! Binding of runtime values to the `$n` parameters of a statement.
//!
//! At analysis time [`variable_param_setup`] lets the analyzer record the
//! type of every parameter it meets into a [`ParamState`]. At execution time
//! [`setup_variable_paramlist`] turns caller values plus null indicators into
//! a [`ParamListInfo`] allocated in the state's memory context.

mod errors;
mod param_list;
mod param_state;

pub use errors::*;
pub use param_list::*;
pub use param_state::*;

static LOGGING_TARGET: &str = "plparam::param";
