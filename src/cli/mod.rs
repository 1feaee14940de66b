//! CLI module
//!
//! Command-line interface for running list operations defined in YAML.
//!
//! # Commands
//!
//! - `list` - Fetch pages and print the selected value of each
//! - `validate` - Check an operation definition
//! - `show` - Print the parsed operation definition

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{parse_param, Runner};
