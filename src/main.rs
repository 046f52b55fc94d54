// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) on stderr
// 3. Build the configuration and the GitHub client
// 4. Assemble the export, section by section
// 5. Write it to a file (or stdout)
// 6. Exit with proper code (0 = complete, 1 = some sections failed, 2 = error)
//
// Rust concepts used:
// - async/await: network I/O, awaited one request at a time
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - ExportConfig
mod error; // src/error.rs - error types
mod export; // src/export/ - assembling and writing the archive
mod fetch; // src/fetch/ - one fetcher per resource kind
mod github; // src/github/ - API client and pagination
mod progress; // src/progress.rs - spinner / log progress events

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::ExportConfig;
use export::{ExportDocument, Exporter};
use github::RepositoryRef;

// The #[tokio::main] attribute transforms our async main into a real main function
// A single-threaded runtime is enough: we never run two requests at once
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so they never mix with --stdout output
fn init_logging(verbose: bool) {
    let default = if verbose {
        "repo_exporter=debug"
    } else {
        "repo_exporter=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = every section exported
//   Ok(1) = exported, but some sections hold an error note
//   Err = nothing was written
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Export {
            repo,
            output_dir,
            token,
            api_url,
            per_page,
            max_retries,
            timeout_secs,
            stdout,
        } => {
            let config = ExportConfig::new(&token)
                .with_base_url(&api_url)
                .with_per_page(per_page)
                .with_max_retries(max_retries)
                .with_timeout(Duration::from_secs(timeout_secs));

            handle_export(&repo, &config, &output_dir, stdout).await
        }
    }
}

// Handles the 'export' subcommand
async fn handle_export(
    repo: &str,
    config: &ExportConfig,
    output_dir: &Path,
    to_stdout: bool,
) -> Result<i32> {
    let repo: RepositoryRef = repo.parse()?;
    let client = config.build_client()?;

    if !to_stdout {
        println!("📦 Exporting GitHub repository: {}", repo);
    }

    let exporter = Exporter::new(client, config.per_page, progress::reporter(to_stdout));
    let document = exporter
        .assemble(&repo)
        .await
        .with_context(|| format!("Export of {} failed", repo))?;

    if to_stdout {
        print!("{}", document.render());
    } else {
        let path = export::write_export(output_dir, &document, chrono::Local::now())
            .with_context(|| format!("Could not write export to {}", output_dir.display()))?;
        println!("✅ Repository exported to: {}", path.display());
        print_summary(&document);
    }

    let failed = document.failed_sections();
    if failed.is_empty() {
        Ok(0)
    } else {
        let names: Vec<&str> = failed.iter().map(|k| k.section_name()).collect();
        eprintln!("⚠️  Sections with errors: {}", names.join(", "));
        Ok(1)
    }
}

// One line per section: record count, or a cross for a failed section
fn print_summary(document: &ExportDocument) {
    for section in document.sections() {
        match section.record_count() {
            Some(count) => println!("   ✓ {:<14} {} record(s)", section.kind.section_name(), count),
            None => println!("   ✗ {:<14} failed (see note in file)", section.kind.section_name()),
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a current_thread runtime?
//    - tokio can run many tasks on many threads, but we await every request
//      in turn, so one thread does all the work
//    - The rate-limit wait is a tokio::time::sleep, which parks this one task
//
// 2. What does {:#} do for anyhow errors?
//    - {} prints only the outermost message ("Export of o/r failed")
//    - {:#} appends every cause: "Export of o/r failed: could not read
//      repository metadata: ..."
//
// 3. Why exit codes?
//    - Scripts and CI can tell a clean export (0) from a partial one (1)
//      and from a failure (2) without parsing output
// -----------------------------------------------------------------------------
