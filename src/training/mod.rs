//! Model training module
//!
//! Random forest classifier used to model historical hiring decisions:
//! - CART decision trees (Gini / entropy) with class-distribution leaves
//! - Bootstrap-aggregated random forest with per-split feature sampling
//! - Classification reports (per-class precision / recall / F1)
//! - Seeded train / validation splitting

pub mod decision_tree;
pub mod metrics;
pub mod random_forest;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use random_forest::{MaxFeatures, RandomForest};

use crate::error::{AbdmfError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Share of rows held out for validation when none is given
pub const DEFAULT_VALIDATION_SPLIT: f64 = 0.2;

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub criterion: Criterion,
    /// Seeds both the forest and the train / validation shuffle
    pub random_state: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            criterion: Criterion::Gini,
            random_state: 42,
        }
    }
}

impl ModelParams {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(AbdmfError::ConfigError(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(AbdmfError::ConfigError(
                "max_depth must be at least 1 when set".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(AbdmfError::ConfigError(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(AbdmfError::ConfigError(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(AbdmfError::ConfigError(format!(
                    "max_features fraction must be within (0, 1], got {}",
                    f
                )));
            }
        }
        Ok(())
    }
}

/// Rows of a train / validation split
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_val: Array2<f64>,
    pub y_val: Array1<f64>,
}

/// Shuffle rows with a seeded generator and hold out `ceil(n * validation_split)`
/// of them for validation. Both partitions must end up non-empty.
pub fn train_validation_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    validation_split: f64,
    seed: u64,
) -> Result<DataSplit> {
    if !(validation_split > 0.0 && validation_split < 1.0) {
        return Err(AbdmfError::InvalidInput(format!(
            "validation_split must be within (0, 1), got {}",
            validation_split
        )));
    }
    let n = x.nrows();
    if n != y.len() {
        return Err(AbdmfError::ShapeError {
            expected: format!("{} decisions", n),
            actual: format!("{} decisions", y.len()),
        });
    }

    let n_val = (n as f64 * validation_split).ceil() as usize;
    if n_val == 0 || n_val >= n {
        return Err(AbdmfError::InvalidInput(format!(
            "Cannot split {} records into non-empty training and validation sets",
            n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (val_idx, train_idx) = indices.split_at(n_val);

    Ok(DataSplit {
        x_train: x.select(Axis(0), train_idx),
        y_train: y.select(Axis(0), train_idx),
        x_val: x.select(Axis(0), val_idx),
        y_val: y.select(Axis(0), val_idx),
    })
}
