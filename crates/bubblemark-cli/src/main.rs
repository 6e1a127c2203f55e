//! The `bubblemark` command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "bubblemark",
    version,
    about = "Bubble-sheet marking and concept analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark one student's sheets
    Mark {
        /// Marking config (.toml)
        #[arg(long)]
        config: PathBuf,

        /// Reading sheet detection output (.json)
        #[arg(long)]
        reading: Option<PathBuf>,

        /// Combined QR/AR sheet detection output (.json)
        #[arg(long)]
        qrar: Option<PathBuf>,

        /// Manually assessed writing score
        #[arg(long, default_value = "0")]
        writing_score: f64,

        /// Student name
        #[arg(long, default_value = "Student")]
        student: String,

        /// Output directory
        #[arg(long, default_value = "./bubblemark-results")]
        output: PathBuf,

        /// Output format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Mark every student listed in a manifest
    Batch {
        /// Marking config (.toml)
        #[arg(long)]
        config: PathBuf,

        /// Batch manifest (.json)
        #[arg(long)]
        manifest: PathBuf,

        /// Output directory
        #[arg(long, default_value = "./bubblemark-results")]
        output: PathBuf,
    },

    /// Validate a marking config and its concept mapping
    Validate {
        /// Marking config (.toml)
        #[arg(long)]
        config: PathBuf,
    },

    /// Create a starter marking config and concept mapping
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bubblemark=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Mark {
            config,
            reading,
            qrar,
            writing_score,
            student,
            output,
            format,
        } => commands::mark::execute(config, reading, qrar, writing_score, student, output, format),
        Commands::Batch {
            config,
            manifest,
            output,
        } => commands::batch::execute(config, manifest, output),
        Commands::Validate { config } => commands::validate::execute(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
