//! Decision Analysis Module
//!
//! Models historical hiring decisions with a random forest and explains
//! individual candidate decisions through prediction confidence and
//! feature importances. A trained model can be persisted as a single
//! bincode blob and restored later.

use crate::error::{AbdmfError, Result};
use crate::preprocessing::FeatureEncoder;
use crate::training::decision_tree::argmax;
use crate::training::{
    train_validation_split, ClassificationReport, ModelParams, RandomForest,
    DEFAULT_VALIDATION_SPLIT,
};
use chrono::{DateTime, Utc};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Blob layout version written by `save_model`
const MODEL_FORMAT_VERSION: u32 = 1;

/// Configuration for decision analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionAnalyzerConfig {
    /// Random forest hyperparameters
    pub model_params: ModelParams,
    /// Importance at or above which a feature is reported as significant
    pub feature_importance_threshold: f64,
    /// Confidence at or above which a prediction is flagged high-confidence
    pub confidence_threshold: f64,
}

impl Default for DecisionAnalyzerConfig {
    fn default() -> Self {
        Self {
            model_params: ModelParams::default(),
            feature_importance_threshold: 0.05,
            confidence_threshold: 0.8,
        }
    }
}

impl DecisionAnalyzerConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.model_params.validate()?;
        for (name, value) in [
            ("feature_importance_threshold", self.feature_importance_threshold),
            ("confidence_threshold", self.confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AbdmfError::ConfigError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Quality of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub train: ClassificationReport,
    pub validation: ClassificationReport,
    /// Importance per feature column
    pub feature_importance: BTreeMap<String, f64>,
}

/// Fitted model state, present only after successful training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Feature columns in training order
    pub feature_names: Vec<String>,
    pub encoder: FeatureEncoder,
    pub forest: RandomForest,
    pub metrics: PerformanceMetrics,
    pub trained_at: DateTime<Utc>,
}

/// Explanation of a single candidate decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionAnalysis {
    pub prediction: bool,
    /// Probability of the predicted class
    pub confidence: f64,
    pub significant_features: BTreeMap<String, f64>,
    pub all_features: BTreeMap<String, f64>,
    pub high_confidence: bool,
}

/// On-disk form of a trained analyzer
#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    config: DecisionAnalyzerConfig,
    model: TrainedModel,
}

/// Random-forest model of historical decisions
#[derive(Debug, Clone, Default)]
pub struct DecisionAnalyzer {
    config: DecisionAnalyzerConfig,
    model: Option<TrainedModel>,
}

impl DecisionAnalyzer {
    /// Create an untrained analyzer, validating the configuration
    pub fn new(config: DecisionAnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model: None,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &DecisionAnalyzerConfig {
        &self.config
    }

    /// Whether `train` has succeeded (or a model was loaded)
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Fitted model, if any
    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    /// Metrics recorded by the last training run
    pub fn performance_metrics(&self) -> Option<&PerformanceMetrics> {
        self.model.as_ref().map(|m| &m.metrics)
    }

    /// Encode `features` with an encoder fitted on the same frame.
    pub fn preprocess_features(&self, features: &DataFrame) -> Result<ndarray::Array2<f64>> {
        crate::preprocessing::preprocess_features(features)
    }

    /// Fit the classifier on `features` against binary `decisions`.
    ///
    /// The column order of `features` becomes the model's schema. Rows are
    /// shuffled with the configured seed before `validation_split` of them
    /// are held out.
    pub fn train(
        &mut self,
        features: &DataFrame,
        decisions: &[bool],
        validation_split: f64,
    ) -> Result<PerformanceMetrics> {
        if features.height() == 0 {
            return Err(AbdmfError::EmptyDataset);
        }
        if features.width() == 0 {
            return Err(AbdmfError::InvalidInput(
                "At least one feature column is required".to_string(),
            ));
        }
        if features.height() != decisions.len() {
            return Err(AbdmfError::ShapeError {
                expected: format!("{} decisions", features.height()),
                actual: format!("{} decisions", decisions.len()),
            });
        }

        let params = &self.config.model_params;

        let mut encoder = FeatureEncoder::new();
        let x = encoder.fit_transform(features)?;
        let y: Array1<f64> = decisions.iter().map(|&d| if d { 1.0 } else { 0.0 }).collect();

        let split = train_validation_split(&x, &y, validation_split, params.random_state)?;

        let mut forest = RandomForest::from_params(params);
        forest.fit(&split.x_train, &split.y_train)?;

        let train_pred = forest.predict(&split.x_train)?;
        let val_pred = forest.predict(&split.x_val)?;

        let feature_names = encoder.feature_names();
        let feature_importance = importance_map(&feature_names, &forest);

        let metrics = PerformanceMetrics {
            train: ClassificationReport::compute(&split.y_train.to_vec(), &train_pred.to_vec()),
            validation: ClassificationReport::compute(&split.y_val.to_vec(), &val_pred.to_vec()),
            feature_importance,
        };

        info!(
            records = features.height(),
            features = feature_names.len(),
            train_accuracy = metrics.train.accuracy,
            validation_accuracy = metrics.validation.accuracy,
            "Trained decision model"
        );

        self.model = Some(TrainedModel {
            feature_names,
            encoder,
            forest,
            metrics: metrics.clone(),
            trained_at: Utc::now(),
        });

        Ok(metrics)
    }

    /// Train with the default validation split
    pub fn train_default(
        &mut self,
        features: &DataFrame,
        decisions: &[bool],
    ) -> Result<PerformanceMetrics> {
        self.train(features, decisions, DEFAULT_VALIDATION_SPLIT)
    }

    /// Predict and explain the decision for a single candidate row.
    pub fn analyze_decision(&self, candidate: &DataFrame) -> Result<DecisionAnalysis> {
        let model = self
            .model
            .as_ref()
            .ok_or(AbdmfError::ModelNotTrained("analyzing decisions"))?;

        if candidate.height() != 1 {
            return Err(AbdmfError::InvalidInput(format!(
                "Expected exactly one candidate record, got {}",
                candidate.height()
            )));
        }

        let x = model.encoder.transform(candidate)?;
        let proba = model.forest.predict_proba(&x)?;
        let row = proba.row(0);

        let best_idx = argmax(row.iter().copied());
        let confidence = row[best_idx];

        let predicted_class = model.forest.classes().get(best_idx).copied().unwrap_or(0.0);
        let prediction = (predicted_class - 1.0).abs() < 1e-10;

        let all_features = model.metrics.feature_importance.clone();
        let significant_features = all_features
            .iter()
            .filter(|&(_, &v)| v >= self.config.feature_importance_threshold)
            .map(|(k, &v)| (k.clone(), v))
            .collect();

        debug!(prediction, confidence, "Analyzed candidate decision");

        Ok(DecisionAnalysis {
            prediction,
            confidence,
            significant_features,
            all_features,
            high_confidence: confidence >= self.config.confidence_threshold,
        })
    }

    /// Serialize configuration and trained model into one blob
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let model = self
            .model
            .as_ref()
            .ok_or(AbdmfError::ModelNotTrained("saving"))?;

        let artifact = ModelArtifact {
            format_version: MODEL_FORMAT_VERSION,
            config: self.config.clone(),
            model: model.clone(),
        };
        Ok(bincode::serialize(&artifact)?)
    }

    /// Restore an analyzer from a blob produced by `to_bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact = bincode::deserialize(bytes)?;
        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(AbdmfError::SerializationError(format!(
                "Unsupported model format version {}",
                artifact.format_version
            )));
        }
        artifact.config.validate()?;

        Ok(Self {
            config: artifact.config,
            model: Some(artifact.model),
        })
    }

    /// Save the trained model and configuration
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), bytes)?;
        info!(path = %path.as_ref().display(), "Saved decision model");
        Ok(())
    }

    /// Load a trained model and configuration
    pub fn load_model(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let analyzer = Self::from_bytes(&bytes)?;
        info!(path = %path.as_ref().display(), "Loaded decision model");
        Ok(analyzer)
    }
}

fn importance_map(feature_names: &[String], forest: &RandomForest) -> BTreeMap<String, f64> {
    feature_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let value = forest
                .feature_importances()
                .and_then(|imp| imp.get(i).copied())
                .unwrap_or(0.0);
            (name.clone(), value)
        })
        .collect()
}
