use log::info;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Summary of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Records read from the input
    pub sequences_read: usize,
    /// Records that passed validation
    pub sequences_kept: usize,
    /// Records excluded by validation
    pub sequences_rejected: usize,
    /// Candidates scored
    pub candidates: usize,
    /// Candidates labeled allergen
    pub allergens: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl RunMetrics {
    /// Fraction of scored candidates labeled allergen
    pub fn allergen_ratio(&self) -> f64 {
        if self.candidates == 0 {
            0.0
        } else {
            self.allergens as f64 / self.candidates as f64
        }
    }

    /// Candidates scored per second
    pub fn candidates_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() == 0.0 {
            0.0
        } else {
            self.candidates as f64 / self.elapsed.as_secs_f64()
        }
    }

    pub fn log_summary(&self) {
        info!(
            "Sequences: {} read, {} kept, {} rejected",
            self.sequences_read, self.sequences_kept, self.sequences_rejected
        );
        info!(
            "Candidates: {} scored, {} allergen ({:.1}%) in {:.3?}",
            self.candidates,
            self.allergens,
            self.allergen_ratio() * 100.0,
            self.elapsed
        );
    }
}

/// Performance timer for measuring operation durations
pub struct PerformanceTimer {
    start: Instant,
    operation: String,
}

impl PerformanceTimer {
    /// Start timing an operation
    pub fn start(operation: &str) -> Self {
        Self { start: Instant::now(), operation: operation.to_string() }
    }

    /// Finish timing and return the duration
    pub fn finish(self) -> Duration {
        self.start.elapsed()
    }

    /// Finish timing and log the result
    pub fn finish_and_log(self) -> Duration {
        let operation = self.operation.clone();
        let duration = self.finish();
        info!("{} took {:.3?}", operation, duration);
        duration
    }
}

/// Macro for easy performance timing
#[macro_export]
macro_rules! time_operation {
    ($operation:expr, $code:block) => {{
        let timer = $crate::metrics::PerformanceTimer::start($operation);
        let result = $code;
        timer.finish_and_log();
        result
    }};
}
