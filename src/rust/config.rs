use crate::audit::DEFAULT_AUDIT_LOG;
use crate::errors::{PipelineError, PipelineResult};
use crate::types::{StepSize, Threshold, WindowLength};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default location of the classifier artifact
pub const DEFAULT_MODEL_PATH: &str = "algpred3_model.json";

/// Default result table name
pub const DEFAULT_OUTPUT: &str = "final_predictions.csv";

const COMPRESSED_EXTENSIONS: [&str; 4] = ["gz", "bz2", "xz", "zst"];

/// Which candidate generator a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobMode {
    /// Score every input sequence as a whole
    Predict,
    /// Score sliding-window sub-peptides
    Scan,
    /// Score every single-residue mutant
    Design,
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobMode::Predict => write!(f, "pred"),
            JobMode::Scan => write!(f, "scan"),
            JobMode::Design => write!(f, "des"),
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input FASTA or plain-text file, `-` for stdin
    pub input: PathBuf,
    /// Result CSV
    pub output: PathBuf,
    /// Job mode
    pub job: JobMode,
    /// Probability cutoff
    pub threshold: Threshold,
    /// Window length, required in scan mode
    pub window: Option<WindowLength>,
    /// Window step
    pub step: StepSize,
    /// Classifier artifact
    pub model_path: PathBuf,
    /// Directory that relative output, model and log paths resolve against
    pub working_directory: Option<PathBuf>,
    /// Audit log for rejected records
    pub audit_log: PathBuf,
    /// Whether to keep the cleaned FASTA, candidate FASTA and feature CSV
    pub write_intermediates: bool,
    /// Performance settings
    pub performance: PerformanceConfig,
}

/// Performance-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of threads for parallel encoding and mutant enumeration
    pub num_threads: Option<usize>,
}

impl PipelineConfig {
    /// Create a configuration with defaults for everything but input and job
    pub fn new<P: Into<PathBuf>>(input: P, job: JobMode) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            job,
            threshold: Threshold::default(),
            window: None,
            step: StepSize::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            working_directory: None,
            audit_log: PathBuf::from(DEFAULT_AUDIT_LOG),
            write_intermediates: true,
            performance: PerformanceConfig::default(),
        }
    }

    pub fn builder<P: Into<PathBuf>>(input: P, job: JobMode) -> PipelineConfigBuilder {
        PipelineConfigBuilder::new(input, job)
    }

    /// Validate the configuration
    pub fn validate(&self) -> PipelineResult<()> {
        if self.job == JobMode::Scan && self.window.is_none() {
            return Err(PipelineError::MissingWindowLength);
        }

        if let Some(dir) = &self.working_directory {
            if !dir.is_dir() {
                return Err(PipelineError::ConfigurationError {
                    field: "working_directory".to_string(),
                    message: format!("Working directory does not exist: {:?}", dir),
                });
            }
        }

        if self.performance.num_threads == Some(0) {
            return Err(PipelineError::ConfigurationError {
                field: "num_threads".to_string(),
                message: "Thread count must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the number of threads to use
    pub fn effective_thread_count(&self) -> usize {
        self.performance
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }

    /// Resolve a path against the working directory; absolute paths are kept
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        match &self.working_directory {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output)
    }

    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.model_path)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.resolve(&self.audit_log)
    }

    /// Input file name without directory or compression/format extensions
    pub fn input_stem(&self) -> String {
        let compressed = self
            .input
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| COMPRESSED_EXTENSIONS.contains(&e));
        let path = if compressed { self.input.with_extension("") } else { self.input.clone() };
        match path.file_stem().and_then(|s| s.to_str()) {
            Some("-") | None => "stdin".to_string(),
            Some(stem) => stem.to_string(),
        }
    }

    /// Validated input records, e.g. `proteins_clean.fasta`
    pub fn cleaned_fasta_path(&self) -> PathBuf {
        self.resolve(format!("{}_clean.fasta", self.input_stem()))
    }

    /// Derived candidate sequences; prediction mode scores the cleaned FASTA directly
    pub fn candidates_fasta_path(&self) -> Option<PathBuf> {
        match self.job {
            JobMode::Predict => None,
            JobMode::Scan => Some(self.resolve("scan_windows.fasta")),
            JobMode::Design => {
                Some(self.resolve(format!("{}_clean_mutants.fasta", self.input_stem())))
            }
        }
    }

    /// Feature matrix handed to the classifier
    pub fn features_csv_path(&self) -> PathBuf {
        match self.job {
            JobMode::Predict => self.resolve(format!("{}_clean_DPC.csv", self.input_stem())),
            JobMode::Scan => self.resolve("scan_windows_DPC.csv"),
            JobMode::Design => {
                self.resolve(format!("{}_clean_mutants_DPC.csv", self.input_stem()))
            }
        }
    }
}

/// Configuration builder taking raw values; validation happens in `build`
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
    threshold: f64,
    window_length: Option<usize>,
    step: usize,
}

impl PipelineConfigBuilder {
    /// Create a new builder with basic configuration
    pub fn new<P: Into<PathBuf>>(input: P, job: JobMode) -> Self {
        Self {
            config: PipelineConfig::new(input, job),
            threshold: Threshold::default().get(),
            window_length: None,
            step: StepSize::default().get(),
        }
    }

    pub fn output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.config.output = output.into();
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn window_length(mut self, length: Option<usize>) -> Self {
        self.window_length = length;
        self
    }

    pub fn step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.model_path = path.into();
        self
    }

    pub fn working_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.config.working_directory = dir;
        self
    }

    pub fn audit_log<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.audit_log = path.into();
        self
    }

    pub fn write_intermediates(mut self, write: bool) -> Self {
        self.config.write_intermediates = write;
        self
    }

    /// Set the number of threads
    pub fn num_threads(mut self, threads: Option<usize>) -> Self {
        self.config.performance.num_threads = threads;
        self
    }

    /// Build the final configuration
    pub fn build(mut self) -> PipelineResult<PipelineConfig> {
        self.config.threshold = Threshold::new(self.threshold).map_err(|e| {
            PipelineError::ConfigurationError { field: "threshold".to_string(), message: e }
        })?;

        self.config.step = StepSize::new(self.step).map_err(|e| {
            PipelineError::ConfigurationError { field: "step".to_string(), message: e }
        })?;

        self.config.window = self
            .window_length
            .map(WindowLength::new)
            .transpose()
            .map_err(|e| PipelineError::ConfigurationError {
                field: "length".to_string(),
                message: e,
            })?;

        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::new("proteins.fasta", JobMode::Predict);

        assert_eq!(config.threshold.get(), 0.5);
        assert_eq!(config.step.get(), 1);
        assert_eq!(config.output, PathBuf::from("final_predictions.csv"));
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert!(config.write_intermediates);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        // scan without window length
        let result = PipelineConfig::builder("in.fa", JobMode::Scan).build();
        assert!(matches!(result, Err(PipelineError::MissingWindowLength)));

        let result = PipelineConfig::builder("in.fa", JobMode::Predict).threshold(1.2).build();
        assert!(matches!(result, Err(PipelineError::ConfigurationError { ref field, .. }) if field == "threshold"));

        let result = PipelineConfig::builder("in.fa", JobMode::Scan)
            .window_length(Some(0))
            .build();
        assert!(matches!(result, Err(PipelineError::ConfigurationError { ref field, .. }) if field == "length"));

        let result = PipelineConfig::builder("in.fa", JobMode::Scan)
            .window_length(Some(5))
            .step(0)
            .build();
        assert!(matches!(result, Err(PipelineError::ConfigurationError { ref field, .. }) if field == "step"));

        let result = PipelineConfig::builder("in.fa", JobMode::Predict)
            .working_directory(Some(PathBuf::from("/definitely/not/a/dir")))
            .build();
        assert!(result.is_err());

        let result = PipelineConfig::builder("in.fa", JobMode::Predict).num_threads(Some(0)).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::builder("in.fa", JobMode::Scan)
            .window_length(Some(9))
            .step(3)
            .threshold(0.35)
            .num_threads(Some(2))
            .write_intermediates(false)
            .build()
            .unwrap();

        assert_eq!(config.window.map(|w| w.get()), Some(9));
        assert_eq!(config.step.get(), 3);
        assert_eq!(config.threshold.get(), 0.35);
        assert_eq!(config.effective_thread_count(), 2);
        assert!(!config.write_intermediates);
    }

    #[test]
    fn test_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::builder("data/proteins.fasta.gz", JobMode::Design)
            .working_directory(Some(dir.path().to_path_buf()))
            .output("/abs/out.csv")
            .build()
            .unwrap();

        assert_eq!(config.input_stem(), "proteins");
        assert_eq!(config.output_path(), PathBuf::from("/abs/out.csv"));
        assert_eq!(config.model_path(), dir.path().join(DEFAULT_MODEL_PATH));
        assert_eq!(config.cleaned_fasta_path(), dir.path().join("proteins_clean.fasta"));
        assert_eq!(
            config.candidates_fasta_path(),
            Some(dir.path().join("proteins_clean_mutants.fasta"))
        );
        assert_eq!(config.features_csv_path(), dir.path().join("proteins_clean_mutants_DPC.csv"));
    }

    #[test]
    fn test_stdin_stem() {
        let config = PipelineConfig::new("-", JobMode::Scan);
        assert_eq!(config.input_stem(), "stdin");
        assert_eq!(config.features_csv_path(), PathBuf::from("scan_windows_DPC.csv"));
    }
}
