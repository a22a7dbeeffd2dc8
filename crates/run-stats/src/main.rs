use std::path::PathBuf;

use clap::{Parser, Subcommand};
use run_stats::cli::commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "run-stats")]
#[command(author, version, about = "Running club export consolidation and statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the standard chart set as JSON
    Report {
        /// Directory of period files, a single period file, or a dataset cache
        path: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Load only the first period file
        #[arg(long)]
        debug: bool,
    },
    /// Consolidate period files into the dataset cache
    Consolidate {
        /// Directory of period files
        dir: PathBuf,

        /// Cache file (default: platform data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Load only the first period file
        #[arg(long)]
        debug: bool,
    },
    /// Check period files against their date windows
    Check {
        /// Directory of period files
        dir: PathBuf,

        /// Load only the first period file
        #[arg(long)]
        debug: bool,
    },
}

fn main() {
    // Logs go to stderr; stdout is reserved for report JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            path,
            output,
            debug,
        } => commands::report(path, output, debug),
        Commands::Consolidate { dir, output, debug } => commands::consolidate(dir, output, debug),
        Commands::Check { dir, debug } => commands::check(dir, debug),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", run_stats::error::format_user_error(&e));
        std::process::exit(1);
    }
}
