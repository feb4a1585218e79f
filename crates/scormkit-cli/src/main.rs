//! scormkit CLI — replay and scoring tools for the SCORM runtime.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(
    name = "scormkit",
    version,
    about = "SCORM runtime replay and score aggregation tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded runtime session against a gateway
    Replay {
        /// Path to a .toml session script
        #[arg(long)]
        session: PathBuf,

        /// Config file path (memory gateway when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enrollment to bind (required with a REST gateway)
        #[arg(long)]
        enrollment: Option<Uuid>,

        /// Prior best quiz score to seed (memory gateway only)
        #[arg(long)]
        quiz_best: Option<f64>,

        /// Passing threshold override
        #[arg(long)]
        threshold: Option<u32>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Compute the combined best score for given channel bests
    Score {
        /// Best quiz score (0-100)
        #[arg(long)]
        quiz: Option<f64>,

        /// Best SCORM score (0-100)
        #[arg(long)]
        scorm: Option<f64>,

        /// Quiz channel weight in percent
        #[arg(long, default_value = "70")]
        quiz_weight: u32,

        /// SCORM channel weight in percent
        #[arg(long, default_value = "30")]
        scorm_weight: u32,

        /// Passing threshold
        #[arg(long, default_value = "70")]
        threshold: u32,
    },

    /// Validate session script files
    Validate {
        /// Path to a session script file or directory
        #[arg(long)]
        session: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scormkit=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay {
            session,
            config,
            enrollment,
            quiz_best,
            threshold,
            format,
        } => commands::replay::execute(session, config, enrollment, quiz_best, threshold, format)
            .await,
        Commands::Score {
            quiz,
            scorm,
            quiz_weight,
            scorm_weight,
            threshold,
        } => commands::score::execute(quiz, scorm, quiz_weight, scorm_weight, threshold),
        Commands::Validate { session } => commands::validate::execute(session),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
