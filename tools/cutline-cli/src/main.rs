//! Cutline CLI: command-line interface for non-destructive edit documents.
//!
//! Usage:
//!   cutline init <PATH> [OPTIONS]   Create an edit document for a source clip
//!   cutline validate <PATH>         Replay and check every operation
//!   cutline info <PATH>             Show the source and committed operations
//!   cutline plan <PATH>             Print the export plan as JSON
//!   cutline export <PATH>           Run the export plan through a backend

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cutline_common::config::AppConfig;

mod commands;
mod document;

#[derive(Parser)]
#[command(
    name = "cutline",
    about = "Non-destructive video edit planning and export",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit structured JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    /// Read configuration from this file instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new edit document for a source clip
    Init {
        /// Where to write the document
        path: PathBuf,

        /// Media reference of the source clip
        #[arg(long)]
        source: String,

        /// Source duration (seconds)
        #[arg(long)]
        duration: f64,

        /// Source width in pixels
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Source height in pixels
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Source frame rate
        #[arg(long)]
        fps: Option<f64>,

        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Replay an edit document and report invalid operations
    Validate {
        /// Path to the edit document
        path: PathBuf,
    },

    /// Show edit document information
    Info {
        /// Path to the edit document
        path: PathBuf,
    },

    /// Print the export plan for an edit document
    Plan {
        /// Path to the edit document
        path: PathBuf,
    },

    /// Export an edit document through a processing backend
    Export {
        /// Path to the edit document
        path: PathBuf,

        /// Processing backend
        #[arg(long, default_value = "dry-run")]
        backend: String,

        /// Also sample timeline thumbnails after the export
        #[arg(long)]
        thumbnails: bool,

        /// Also write a 720x1280 compressed copy of the output
        #[arg(long)]
        compress: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    cutline_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init {
            path,
            source,
            duration,
            width,
            height,
            fps,
            force,
        } => commands::init::run(path, source, duration, width, height, fps, force),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Plan { path } => commands::plan::run(path, &config),
        Commands::Export {
            path,
            backend,
            thumbnails,
            compress,
        } => commands::export::run(path, backend, thumbnails, compress, &config).await,
    }
}
