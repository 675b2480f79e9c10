use serde::{Deserialize, Serialize};
use std::fmt;

/// A type-safe wrapper for sliding-window lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowLength(pub usize);

impl WindowLength {
    /// Create a new window length with validation
    pub fn new(length: usize) -> Result<Self, String> {
        if length == 0 {
            Err("Window length must be greater than 0".to_string())
        } else {
            Ok(WindowLength(length))
        }
    }

    /// Get the raw value
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for WindowLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type-safe wrapper for sliding-window step sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepSize(pub usize);

impl StepSize {
    /// Create a new step size with validation
    pub fn new(step: usize) -> Result<Self, String> {
        if step == 0 {
            Err("Step size must be greater than 0".to_string())
        } else {
            Ok(StepSize(step))
        }
    }

    /// Get the raw value
    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for StepSize {
    fn default() -> Self {
        StepSize(1)
    }
}

impl fmt::Display for StepSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Probability cutoff applied uniformly to every candidate in a run.
///
/// The comparison is inclusive: a probability equal to the threshold is
/// labeled positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Threshold(pub f64);

impl Threshold {
    /// Create a new threshold with validation
    pub fn new(threshold: f64) -> Result<Self, String> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            Err(format!("Threshold must be within [0, 1], got {}", threshold))
        } else {
            Ok(Threshold(threshold))
        }
    }

    /// Get the raw value
    pub fn get(&self) -> f64 {
        self.0
    }

    /// Whether a probability falls on the positive side of the cutoff
    pub fn is_positive(&self, probability: f64) -> bool {
        probability >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(0.5)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
