//! Command implementations, one submodule per subcommand.

pub mod check;
pub mod clear;
pub mod list;
pub mod parse;
pub mod query;
