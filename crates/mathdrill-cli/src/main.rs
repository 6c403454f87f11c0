//! mathdrill CLI: validate, render and score math exercises.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "mathdrill", version, about = "Math exercise validator, renderer and exam scorer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate exercise JSON files
    Validate {
        /// Path to an exercise file or directory
        #[arg(long)]
        exercise: PathBuf,
    },

    /// Render an exercise level's diagram as SVG
    Render {
        /// Path to the exercise file
        #[arg(long)]
        exercise: PathBuf,

        /// Level id (default: first level)
        #[arg(long)]
        level: Option<String>,

        /// Seed for variable generation (default: random)
        #[arg(long)]
        seed: Option<u64>,

        /// Output SVG file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate a concrete question from an exercise level
    Generate {
        /// Path to the exercise file
        #[arg(long)]
        exercise: PathBuf,

        /// Level id (default: first level)
        #[arg(long)]
        level: Option<String>,

        /// Seed for variable generation (default: random)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Score answers against an exam subject
    Score {
        /// Exam subject JSON
        #[arg(long)]
        subject: PathBuf,

        /// Answers JSON (question id -> answer)
        #[arg(long)]
        answers: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Persist the result through the configured store
        #[arg(long)]
        save: bool,

        /// Write an HTML score sheet
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and example exercise
    Init,
}

#[tokio::main]
async fn main() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "mathdrill=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { exercise } => commands::validate::execute(exercise),
        Commands::Render {
            exercise,
            level,
            seed,
            output,
            config,
        } => commands::render::execute(exercise, level, seed, output, config),
        Commands::Generate {
            exercise,
            level,
            seed,
            format,
        } => commands::generate::execute(exercise, level, seed, format),
        Commands::Score {
            subject,
            answers,
            config,
            save,
            html,
            format,
        } => commands::score::execute(subject, answers, config, save, html, format).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
