use algpred::config::{JobMode, PipelineConfig, DEFAULT_MODEL_PATH, DEFAULT_OUTPUT};
use algpred::errors::PipelineResult;
use clap::{Parser, ValueEnum};
use log::{error, info, Level};
use simple_logger::init_with_level;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "algpred")]
#[command(about = "Prediction of allergenic and non-allergenic proteins and peptides")]
#[command(version)]
struct Cli {
    /// Input FASTA or plain-text file, one sequence per line ("-" for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Job type
    #[arg(short, long, value_enum)]
    job: Job,

    /// Prediction threshold; probabilities at or above it are labeled allergen
    #[arg(short, long, default_value = "0.5")]
    threshold: f64,

    /// Sliding window length (scan mode)
    #[arg(short, long)]
    length: Option<usize>,

    /// Sliding window step size (scan mode)
    #[arg(short, long, default_value = "1")]
    step: usize,

    /// Classifier model (JSON)
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Working directory for the model, outputs and audit log.
    /// A relative --input still resolves against the current directory
    #[arg(short, long)]
    working_directory: Option<PathBuf>,

    /// Skip writing the cleaned FASTA, candidate FASTA and feature CSV
    #[arg(long, default_value = "false")]
    no_intermediates: bool,

    /// Number of threads (defaults to all available cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Debug logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Job {
    /// Predict whole sequences
    Pred,
    /// Protein scan with sliding windows
    Scan,
    /// Design: score every single-residue mutant
    Des,
}

impl From<Job> for JobMode {
    fn from(job: Job) -> Self {
        match job {
            Job::Pred => JobMode::Predict,
            Job::Scan => JobMode::Scan,
            Job::Des => JobMode::Design,
        }
    }
}

fn build_config(cli: Cli) -> PipelineResult<PipelineConfig> {
    PipelineConfig::builder(cli.input, cli.job.into())
        .output(cli.output)
        .threshold(cli.threshold)
        .window_length(cli.length)
        .step(cli.step)
        .model_path(cli.model)
        .working_directory(cli.working_directory)
        .write_intermediates(!cli.no_intermediates)
        .num_threads(cli.threads)
        .build()
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::Debug } else { Level::Info };
    init_with_level(level).unwrap_or_else(|e| eprintln!("Logger already initialized: {}", e));

    let config = build_config(cli).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    info!("AlgPred: {} mode, threshold {}", config.job, config.threshold);

    algpred::run(&config).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    info!("Thanks for using AlgPred");
}
