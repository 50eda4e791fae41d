//! Framework facade
//!
//! [`Abdmf`] wires the bias detector, decision analyzer and feedback system
//! together: historical data is scanned for bias and used to train the
//! decision model with protected attributes removed, candidates are
//! evaluated without their protected attributes, and system-level reports
//! combine model quality with user feedback.

use crate::analysis::{DecisionAnalysis, DecisionAnalyzer, PerformanceMetrics};
use crate::config::AbdmfConfig;
use crate::error::{AbdmfError, Result};
use crate::fairness::{BiasDetector, BiasReport};
use crate::feedback::{FeedbackAnalysis, FeedbackSystem};
use crate::training::DEFAULT_VALIDATION_SPLIT;
use crate::utils::{self, frame, OUTCOME_COLUMN};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Outcome of scanning historical decisions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub bias_scan: BiasReport,
    pub model_metrics: PerformanceMetrics,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of evaluating one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub decision_analysis: DecisionAnalysis,
    /// Protected values supplied with the candidate, echoed for audit only
    pub protected_attributes: BTreeMap<String, Option<String>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub total_feedback: usize,
    pub candidates_evaluated: usize,
    pub historical_records_scanned: usize,
    pub model_trained: bool,
    pub decision_analysis_performance: Option<PerformanceMetrics>,
    pub uptime_secs: f64,
}

/// Snapshot of system health and user feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemReport {
    pub system_metrics: SystemMetrics,
    pub feedback_analysis: FeedbackAnalysis,
    pub timestamp: DateTime<Utc>,
}

/// Automated bias detection and decision monitoring
#[derive(Debug)]
pub struct Abdmf {
    config: AbdmfConfig,
    bias_detector: BiasDetector,
    decision_analyzer: DecisionAnalyzer,
    feedback_system: FeedbackSystem,
    candidates_evaluated: usize,
    historical_records_scanned: usize,
    started_at: Instant,
}

impl Abdmf {
    /// Build all components from a validated configuration
    pub fn new(config: AbdmfConfig) -> Result<Self> {
        let bias_detector = BiasDetector::new(config.bias_detector.clone())?;
        let decision_analyzer = DecisionAnalyzer::new(config.decision_analyzer.clone())?;
        let feedback_system = FeedbackSystem::new(config.feedback_system.clone())?;

        Ok(Self {
            config,
            bias_detector,
            decision_analyzer,
            feedback_system,
            candidates_evaluated: 0,
            historical_records_scanned: 0,
            started_at: Instant::now(),
        })
    }

    /// Build from a YAML configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(AbdmfConfig::from_yaml_file(path)?)
    }

    /// Replace the decision analyzer, e.g. with one restored from disk
    pub fn with_decision_analyzer(mut self, analyzer: DecisionAnalyzer) -> Self {
        self.config.decision_analyzer = analyzer.config().clone();
        self.decision_analyzer = analyzer;
        self
    }

    pub fn config(&self) -> &AbdmfConfig {
        &self.config
    }

    pub fn bias_detector(&self) -> &BiasDetector {
        &self.bias_detector
    }

    pub fn decision_analyzer(&self) -> &DecisionAnalyzer {
        &self.decision_analyzer
    }

    pub fn feedback_system(&self) -> &FeedbackSystem {
        &self.feedback_system
    }

    pub fn feedback_system_mut(&mut self) -> &mut FeedbackSystem {
        &mut self.feedback_system
    }

    /// Scan historical decisions for bias and train the decision model.
    ///
    /// The model never sees the outcome column or any protected attribute.
    pub fn scan_historical_data(&mut self, data: &DataFrame) -> Result<ScanResult> {
        utils::validate_data(data, &[OUTCOME_COLUMN])?;

        let bias_scan = self.bias_detector.generate_bias_report(data)?;

        let mut excluded = vec![OUTCOME_COLUMN.to_string()];
        excluded.extend(self.config.bias_detector.protected_attributes.iter().cloned());
        let features = frame::drop_columns(data, &excluded)?;
        let decisions = frame::selected_outcomes(data)?;

        let model_metrics =
            self.decision_analyzer
                .train(&features, &decisions, DEFAULT_VALIDATION_SPLIT)?;

        self.historical_records_scanned += data.height();
        info!(
            records = data.height(),
            features = features.width(),
            significant_bias = bias_scan.summary.significant_bias_detected,
            "Scanned historical data"
        );

        Ok(ScanResult {
            bias_scan,
            model_metrics,
            timestamp: Utc::now(),
        })
    }

    /// Analyze a candidate's decision with protected attributes withheld.
    pub fn evaluate_candidate(&mut self, candidate: &DataFrame) -> Result<CandidateEvaluation> {
        if candidate.height() == 0 {
            return Err(AbdmfError::EmptyDataset);
        }

        let mut protected_attributes = BTreeMap::new();
        for attribute in &self.config.bias_detector.protected_attributes {
            if frame::has_column(candidate, attribute) {
                let value = frame::column_as_strings(candidate, attribute)?
                    .into_iter()
                    .next()
                    .flatten();
                protected_attributes.insert(attribute.clone(), value);
            }
        }

        let withheld: Vec<String> = protected_attributes.keys().cloned().collect();
        let features = frame::drop_columns(candidate, &withheld)?;
        let decision_analysis = self.decision_analyzer.analyze_decision(&features)?;

        self.candidates_evaluated += 1;
        info!(
            prediction = decision_analysis.prediction,
            confidence = decision_analysis.confidence,
            "Evaluated candidate"
        );

        Ok(CandidateEvaluation {
            decision_analysis,
            protected_attributes,
            timestamp: Utc::now(),
        })
    }

    /// Aggregate system metrics and a feedback analysis over all feedback
    pub fn generate_report(&self) -> SystemReport {
        SystemReport {
            system_metrics: SystemMetrics {
                total_feedback: self.feedback_system.len(),
                candidates_evaluated: self.candidates_evaluated,
                historical_records_scanned: self.historical_records_scanned,
                model_trained: self.decision_analyzer.is_trained(),
                decision_analysis_performance: self.decision_analyzer.performance_metrics().cloned(),
                uptime_secs: self.started_at.elapsed().as_secs_f64(),
            },
            feedback_analysis: self.feedback_system.analyze_feedback(None),
            timestamp: Utc::now(),
        }
    }

    /// Persist the trained decision model
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        self.decision_analyzer.save_model(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::HiringDataGenerator;
    use polars::prelude::*;

    fn quick_config() -> AbdmfConfig {
        let mut config = AbdmfConfig::default();
        config.bias_detector.minimum_sample_size = 10;
        config.decision_analyzer.model_params.n_estimators = 10;
        config
    }

    #[test]
    fn test_scan_requires_outcome() {
        let mut system = Abdmf::new(quick_config()).unwrap();
        let df = df!("gender" => &["M", "F"]).unwrap();
        assert!(matches!(
            system.scan_historical_data(&df),
            Err(AbdmfError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_evaluate_requires_training() {
        let mut system = Abdmf::new(quick_config()).unwrap();
        let candidate = df!("experience" => &[4i64]).unwrap();
        assert!(matches!(
            system.evaluate_candidate(&candidate),
            Err(AbdmfError::ModelNotTrained(_))
        ));
        assert_eq!(system.generate_report().system_metrics.candidates_evaluated, 0);
    }

    #[test]
    fn test_scan_then_evaluate() {
        let mut system = Abdmf::new(quick_config()).unwrap();
        let data = HiringDataGenerator::new().generate(120).unwrap();
        let scan = system.scan_historical_data(&data).unwrap();

        // gender, race and age are protected by default
        let features = &system.decision_analyzer().model().unwrap().feature_names;
        assert!(!features.contains(&"gender".to_string()));
        assert!(!features.contains(&"selected".to_string()));
        assert!(features.contains(&"experience".to_string()));
        assert_eq!(scan.model_metrics.feature_importance.len(), features.len());

        let candidate = df!(
            "gender" => &["F"],
            "race" => &["B"],
            "age" => &[28i64],
            "experience" => &[5i64],
            "education_level" => &["Master"],
            "education_score" => &[85.0],
            "interview_score" => &[90.0]
        )
        .unwrap();
        let evaluation = system.evaluate_candidate(&candidate).unwrap();
        assert_eq!(evaluation.protected_attributes["gender"].as_deref(), Some("F"));
        assert_eq!(evaluation.protected_attributes["age"].as_deref(), Some("28"));

        let report = system.generate_report();
        assert_eq!(report.system_metrics.candidates_evaluated, 1);
        assert_eq!(report.system_metrics.historical_records_scanned, 120);
        assert!(report.system_metrics.model_trained);
    }
}
