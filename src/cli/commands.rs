//! CLI commands and argument parsing

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated list executor CLI
#[derive(Parser, Debug)]
#[command(name = "pagewalk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Operation definition file (YAML)
    #[arg(short, long, global = true)]
    pub operation: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch pages and print the selected value of each
    List {
        /// Start from this continuation token (fetches a single page)
        #[arg(long)]
        next_token: Option<String>,

        /// Fetch only the first page
        #[arg(long)]
        no_auto_iteration: bool,

        /// Page-size hint sent with every request
        #[arg(long)]
        page_size: Option<u32>,

        /// Select expression: `*`, a field path, a JSONPath, or `^Param`
        #[arg(short, long)]
        select: Option<String>,

        /// Request parameter as NAME=VALUE (VALUE is parsed as JSON when possible)
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Request parameters as a JSON object
        #[arg(long)]
        params_json: Option<String>,
    },

    /// Validate the operation definition
    Validate,

    /// Print the parsed operation definition
    Show,
}
