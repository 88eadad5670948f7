pub mod format;
pub mod toml_config;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jscheck", about = "Catch and fix common JavaScript mistakes")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report issues in files, directories or stdin (`-`)
    Check {
        /// Paths to check (files, directories, or `-` for stdin)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Path to jscheck.toml (defaults to ./jscheck.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Apply automatic fixes in place
    Fix {
        /// Paths to fix (files, directories, or `-` to fix stdin to stdout)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Path to jscheck.toml (defaults to ./jscheck.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report what would change without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// List the built-in rules
    Rules,

    /// Generate a starter jscheck.toml
    Init {
        /// Output file path for the generated config
        #[arg(short, long, default_value = "jscheck.toml")]
        output: PathBuf,

        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Serve analyze/fix tools over stdio JSON-RPC
    Mcp {
        /// Path to jscheck.toml (defaults to ./jscheck.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Compact,
    Github,
}
