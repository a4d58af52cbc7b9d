//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::backend::BackendKind;
use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Statechart compiler CLI
#[derive(Parser, Debug)]
#[command(name = "statekit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true, env = "STATEKIT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile every chart of a document with one backend
    Compile {
        /// Chart document (TOML, or JSON by extension)
        input: PathBuf,

        /// Code generator
        #[arg(short, long, value_enum, default_value = "c")]
        backend: BackendKind,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the state-vector encoding of every chart
    Analyze {
        /// Chart document
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Validate a chart document
    Check {
        /// Chart document
        input: PathBuf,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

/// Execute the CLI command
pub fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Compile {
            input,
            backend,
            output,
        } => commands::compile::execute(input, backend, output, &config),
        Commands::Analyze { input, format } => commands::analyze::execute(input, format, &config),
        Commands::Check { input } => commands::check::execute(input, &config),
    }
}
