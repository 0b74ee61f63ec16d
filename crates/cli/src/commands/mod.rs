//! Command implementations.

mod parse;
mod run;
mod validate;

pub use parse::run_parse;
pub use run::run_notifier;
pub use validate::run_validate;
