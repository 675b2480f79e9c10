use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No valid sequences remain after filtering")]
    NoValidSequences,

    #[error("No windows generated: every sequence is shorter than the window length {0}")]
    NoWindowsGenerated(usize),

    #[error("Protein scan mode requires a window length (--length)")]
    MissingWindowLength,

    #[error("Model file missing: {}", .0.display())]
    ModelMissing(PathBuf),

    #[error("Failed to load model {}: {message}", .path.display())]
    ModelLoad { path: PathBuf, message: String },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Feature mismatch: {message}")]
    FeatureMismatch { message: String },

    #[error("Invalid probability {value} returned for candidate {index}")]
    InvalidProbability { index: usize, value: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {field} - {message}")]
    ConfigurationError { field: String, message: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Extension trait for Result to add context
pub trait PipelineResultExt<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> PipelineResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> PipelineResultExt<T> for Result<T, E>
where
    E: Into<PipelineError>,
{
    fn with_context<F>(self, f: F) -> PipelineResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                PipelineError::ValidationError { message } => {
                    PipelineError::ValidationError { message: format!("{}: {}", context, message) }
                }
                other => {
                    PipelineError::ValidationError { message: format!("{}: {}", context, other) }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_wraps_message() {
        let result: Result<(), PipelineError> =
            Err(PipelineError::ValidationError { message: "bad residue".to_string() });
        let err = result.with_context(|| "record seq3".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: record seq3: bad residue");
    }

    #[test]
    fn test_fatal_messages() {
        assert!(PipelineError::NoValidSequences.to_string().contains("No valid sequences"));
        assert!(PipelineError::NoWindowsGenerated(9).to_string().contains("No windows generated"));
        assert!(PipelineError::ModelMissing(PathBuf::from("m.json"))
            .to_string()
            .contains("m.json"));
    }
}
