//! Command-line interface

pub mod commands;
pub mod error;
pub mod logging;

pub use error::CliError;
