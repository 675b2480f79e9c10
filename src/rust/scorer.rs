use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::candidates::Candidate;
use crate::composition::{DipeptideEncoder, FeatureMatrix};
use crate::errors::{PipelineError, PipelineResult};
use crate::model::Classifier;
use crate::types::Threshold;

/// Binary label derived from a probability and the run threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    #[serde(rename = "Allergen")]
    Allergen,
    #[serde(rename = "Non-Allergen")]
    NonAllergen,
}

impl Prediction {
    pub fn from_probability(probability: f64, threshold: Threshold) -> Self {
        if threshold.is_positive(probability) {
            Prediction::Allergen
        } else {
            Prediction::NonAllergen
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Prediction::Allergen)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Allergen => write!(f, "Allergen"),
            Prediction::NonAllergen => write!(f, "Non-Allergen"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub candidate: Candidate,
    pub probability: f64,
    pub prediction: Prediction,
}

/// Output of one scoring pass: the feature matrix that was scored and the
/// per-candidate results in candidate order
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub features: FeatureMatrix,
    pub results: Vec<ScoredResult>,
}

impl ScoredBatch {
    pub fn positives(&self) -> usize {
        self.results.iter().filter(|r| r.prediction.is_positive()).count()
    }
}

/// Applies a classifier and a threshold to a candidate batch
pub struct Scorer<'a> {
    encoder: DipeptideEncoder<'a>,
    classifier: &'a dyn Classifier,
    threshold: Threshold,
}

impl<'a> Scorer<'a> {
    pub fn new(
        encoder: DipeptideEncoder<'a>,
        classifier: &'a dyn Classifier,
        threshold: Threshold,
    ) -> Self {
        Self { encoder, classifier, threshold }
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Check the classifier's declared input layout against the encoder.
    ///
    /// Models that declare neither names nor width cannot be checked; their
    /// columns are assumed to follow the encoder order.
    pub fn check_layout(&self) -> PipelineResult<()> {
        let expected = self.encoder.feature_names();
        if let Some(names) = self.classifier.feature_names() {
            if names != expected.as_slice() {
                let first_diff = names
                    .iter()
                    .zip(&expected)
                    .position(|(a, b)| a != b)
                    .unwrap_or_else(|| names.len().min(expected.len()));
                return Err(PipelineError::FeatureMismatch {
                    message: format!(
                        "model declares {} features, encoder produces {}; first difference at column {}",
                        names.len(),
                        expected.len(),
                        first_diff
                    ),
                });
            }
        } else if let Some(width) = self.classifier.n_features() {
            if width != expected.len() {
                return Err(PipelineError::FeatureMismatch {
                    message: format!(
                        "model expects {} features, encoder produces {}",
                        width,
                        expected.len()
                    ),
                });
            }
        } else {
            warn!("Model does not declare its feature layout; assuming encoder column order");
        }
        Ok(())
    }

    /// Encode every candidate, score the whole matrix in one classifier call
    /// and label each probability against the threshold.
    pub fn score(&self, candidates: Vec<Candidate>) -> PipelineResult<ScoredBatch> {
        self.check_layout()?;

        let sequences: Vec<&str> = candidates.iter().map(|c| c.sequence.as_str()).collect();
        let features = self.encoder.encode_batch(&sequences);
        debug!("Encoded {} candidates into {} columns", features.n_rows(), features.n_cols());

        let probabilities = self.classifier.predict_proba(&features)?;
        if probabilities.len() != candidates.len() {
            return Err(PipelineError::Model(format!(
                "classifier returned {} probabilities for {} candidates",
                probabilities.len(),
                candidates.len()
            )));
        }

        let results = candidates
            .into_iter()
            .zip(probabilities)
            .enumerate()
            .map(|(index, (candidate, probability))| {
                if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
                    return Err(PipelineError::InvalidProbability { index, value: probability });
                }
                Ok(ScoredResult {
                    candidate,
                    probability,
                    prediction: Prediction::from_probability(probability, self.threshold),
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(ScoredBatch { features, results })
    }
}
