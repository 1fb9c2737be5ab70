//! CLI subcommand implementations

pub mod check;
pub mod environments;
pub mod execute;
pub mod parse;
pub mod validate;
