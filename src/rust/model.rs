//! Pre-trained classifiers.
//!
//! The pipeline only needs the probability of the positive (allergen) class
//! for each row of a feature matrix, expressed by the [`Classifier`] trait.
//! [`ModelArtifact`] is the bundled backend: a JSON export of a logistic
//! regression, a random forest or a gradient-boosted tree ensemble. Trees use
//! the flat node arrays of scikit-learn's `tree_` object, so a fitted model
//! can be exported without re-training.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::composition::FeatureMatrix;
use crate::errors::{PipelineError, PipelineResult};

/// Marks a leaf in `children_left` / `children_right`
pub const LEAF: i64 = -1;

/// Scores a feature matrix.
///
/// Implementations receive columns in encoder order and must return one
/// probability in `[0, 1]` per row, in row order.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>>;

    /// Column names the model was trained on, when known
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Number of input columns the model expects, when known
    fn n_features(&self) -> Option<usize> {
        self.feature_names().map(|names| names.len())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LogisticModel {
    fn validate(&self) -> Result<(), String> {
        match &self.feature_names {
            Some(names) if names.len() != self.coefficients.len() => Err(format!(
                "{} feature names for {} coefficients",
                names.len(),
                self.coefficients.len()
            )),
            _ => Ok(()),
        }
    }

    fn probability(&self, row: &[f64]) -> f64 {
        let z: f64 = self.coefficients.iter().zip(row).map(|(w, x)| w * x).sum();
        sigmoid(z + self.intercept)
    }
}

/// One decision tree in scikit-learn's flat layout.
///
/// Node `i` sends a row left when `row[feature[i]] <= threshold[i]`. For
/// classification trees `value[i]` holds per-class weights `[negative,
/// positive]`; for boosting trees it holds the single leaf output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [self.children_right.len(), self.feature.len(), self.threshold.len(), self.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err("tree node arrays have different lengths".to_string());
        }
        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if (left == LEAF) != (right == LEAF) {
                return Err(format!("node {} has exactly one child", i));
            }
            if left != LEAF {
                for child in [left, right] {
                    if child <= i as i64 || child >= n as i64 {
                        return Err(format!("node {} has child {} out of range", i, child));
                    }
                }
                if self.feature[i] < 0 {
                    return Err(format!("split node {} has negative feature index", i));
                }
            } else if self.value[i].is_empty() {
                return Err(format!("leaf {} has no value", i));
            }
        }
        Ok(())
    }

    fn max_feature(&self) -> Option<usize> {
        self.children_left
            .iter()
            .zip(&self.feature)
            .filter(|(left, _)| **left != LEAF)
            .map(|(_, f)| *f as usize)
            .max()
    }

    /// Leaf values reached by `row`. Children always have a larger index
    /// than their parent (checked by `validate`), so the walk terminates.
    /// `row` must be wider than `max_feature` (checked by `predict_proba`).
    fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let x = row[self.feature[node] as usize];
            node = if x <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }

    /// Positive-class fraction at the leaf reached by `row`
    fn positive_fraction(&self, row: &[f64]) -> f64 {
        let leaf = self.leaf(row);
        let total: f64 = leaf.iter().sum();
        match leaf.get(1) {
            Some(positive) if total > 0.0 => positive / total,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl RandomForest {
    fn probability(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.positive_fraction(row)).sum();
        sum / self.trees.len() as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub trees: Vec<DecisionTree>,
    pub learning_rate: f64,
    /// Raw (log-odds) score before the first tree
    #[serde(default)]
    pub init: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl GradientBoosting {
    fn probability(&self, row: &[f64]) -> f64 {
        let raw: f64 = self
            .trees
            .iter()
            .map(|t| t.leaf(row).first().copied().unwrap_or(0.0))
            .sum::<f64>()
            * self.learning_rate;
        sigmoid(self.init + raw)
    }
}

/// A serialized classifier, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Logistic(LogisticModel),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl ModelArtifact {
    /// Load and validate a JSON model.
    ///
    /// A missing file is reported separately from a file that exists but
    /// cannot be decoded.
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::ModelMissing(path.to_path_buf()));
        }
        let load_error =
            |message: String| PipelineError::ModelLoad { path: path.to_path_buf(), message };

        let file = File::open(path).map_err(|e| load_error(e.to_string()))?;
        let model: ModelArtifact =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| load_error(e.to_string()))?;
        model.validate().map_err(load_error)?;

        debug!("Loaded {} model from {}", model.kind(), path.display());
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Logistic(_) => "logistic",
            ModelArtifact::RandomForest(_) => "random_forest",
            ModelArtifact::GradientBoosting(_) => "gradient_boosting",
        }
    }

    fn trees(&self) -> &[DecisionTree] {
        match self {
            ModelArtifact::Logistic(_) => &[],
            ModelArtifact::RandomForest(m) => &m.trees,
            ModelArtifact::GradientBoosting(m) => &m.trees,
        }
    }

    /// Structural checks run once at load time
    pub fn validate(&self) -> Result<(), String> {
        if let ModelArtifact::Logistic(m) = self {
            return m.validate();
        }
        if self.trees().is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for (i, tree) in self.trees().iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {}: {}", i, e))?;
            if let (Some(max), Some(names)) = (tree.max_feature(), self.feature_names()) {
                if max >= names.len() {
                    return Err(format!(
                        "tree {} splits on feature {} but only {} features are named",
                        i,
                        max,
                        names.len()
                    ));
                }
            }
        }
        Ok(())
    }

    fn probability(&self, row: &[f64]) -> f64 {
        match self {
            ModelArtifact::Logistic(m) => m.probability(row),
            ModelArtifact::RandomForest(m) => m.probability(row),
            ModelArtifact::GradientBoosting(m) => m.probability(row),
        }
    }
}

impl Classifier for ModelArtifact {
    fn predict_proba(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>> {
        if let ModelArtifact::Logistic(m) = self {
            if m.coefficients.len() != features.n_cols() {
                return Err(PipelineError::FeatureMismatch {
                    message: format!(
                        "model has {} coefficients, feature matrix has {} columns",
                        m.coefficients.len(),
                        features.n_cols()
                    ),
                });
            }
        }
        if let Some(max) = self.trees().iter().filter_map(DecisionTree::max_feature).max() {
            if max >= features.n_cols() {
                return Err(PipelineError::FeatureMismatch {
                    message: format!(
                        "model splits on feature {}, feature matrix has {} columns",
                        max,
                        features.n_cols()
                    ),
                });
            }
        }
        Ok(features.iter_rows().map(|row| self.probability(row)).collect())
    }

    fn feature_names(&self) -> Option<&[String]> {
        match self {
            ModelArtifact::Logistic(m) => m.feature_names.as_deref(),
            ModelArtifact::RandomForest(m) => m.feature_names.as_deref(),
            ModelArtifact::GradientBoosting(m) => m.feature_names.as_deref(),
        }
    }

    fn n_features(&self) -> Option<usize> {
        match self {
            ModelArtifact::Logistic(m) => Some(m.coefficients.len()),
            _ => self.feature_names().map(|names| names.len()),
        }
    }
}
