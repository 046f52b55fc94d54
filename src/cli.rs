// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_API_URL;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "repo-exporter",
    version,
    about = "Export a GitHub repository into a single text archive",
    long_about = "repo-exporter walks the GitHub API and writes a repository's metadata, files, \
                  issues, pull requests and project boards into one flat text file. \
                  Useful for backups, migrations, or handing repository context to other tools."
)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a repository to {owner}_{repo}_export_{timestamp}.txt
    ///
    /// Example: repo-exporter export rust-lang/rustlings --output-dir backups
    Export {
        /// Repository as owner/name or a GitHub URL
        repo: String,

        /// Directory the export file is written to
        #[arg(long, short, default_value = ".")]
        output_dir: PathBuf,

        /// GitHub token (falls back to the GITHUB_TOKEN environment variable)
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// API base URL, for GitHub Enterprise
        #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Items per page (1-100)
        #[arg(long, default_value_t = 100)]
        per_page: u32,

        /// Retries after a rate-limited response
        #[arg(long, default_value_t = 2)]
        max_retries: u32,

        /// Per-request network timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Print the export to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
}
