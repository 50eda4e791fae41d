//! ABDMF - Automated Bias Detection & Decision Monitoring Framework
//!
//! This crate audits hiring decisions for group fairness and monitors the
//! decision process over time:
//! - Bias detection over historical decisions (disparate impact, statistical parity)
//! - A random forest model of past decisions with per-candidate explanations
//! - Collection and analysis of user feedback
//!
//! # Modules
//!
//! ## Components
//! - [`fairness`] - Group-fairness metrics and bias reports
//! - [`analysis`] - Decision model training, explanation and persistence
//! - [`feedback`] - Feedback validation, storage and analysis
//! - [`framework`] - The [`Abdmf`](framework::Abdmf) facade tying them together
//!
//! ## Machine learning
//! - [`preprocessing`] - Feature encoding
//! - [`training`] - Decision trees, random forests and classification metrics
//!
//! ## Support
//! - [`config`] - YAML configuration
//! - [`synthetic`] - Synthetic hiring data
//! - [`utils`] - Data loading and helpers
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use abdmf::prelude::*;
//!
//! let data = HiringDataGenerator::new().with_bias(InjectedBias::default()).generate(1000)?;
//! let mut system = Abdmf::new(AbdmfConfig::default())?;
//! let scan = system.scan_historical_data(&data)?;
//! println!("{:?}", scan.bias_scan.recommendations);
//! # Ok::<(), abdmf::error::AbdmfError>(())
//! ```

// Core error handling
pub mod error;

// Components
pub mod analysis;
pub mod fairness;
pub mod feedback;
pub mod framework;

// Machine learning
pub mod preprocessing;
pub mod training;

// Support
pub mod cli;
pub mod config;
pub mod synthetic;
pub mod utils;

pub use error::{AbdmfError, ErrorKind, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{
        DecisionAnalysis, DecisionAnalyzer, DecisionAnalyzerConfig, PerformanceMetrics,
    };
    pub use crate::config::AbdmfConfig;
    pub use crate::error::{AbdmfError, ErrorKind, Result};
    pub use crate::fairness::{BiasDetector, BiasDetectorConfig, BiasMetric, BiasReport};
    pub use crate::feedback::{
        FeedbackAnalysis, FeedbackCategory, FeedbackConfig, FeedbackPayload, FeedbackSystem,
        TrendDirection, UserType,
    };
    pub use crate::framework::{Abdmf, CandidateEvaluation, ScanResult, SystemReport};
    pub use crate::preprocessing::{preprocess_features, FeatureEncoder};
    pub use crate::synthetic::{HiringDataGenerator, InjectedBias};
    pub use crate::training::{ModelParams, RandomForest, DEFAULT_VALIDATION_SPLIT};
    pub use crate::utils::{DataLoader, OUTCOME_COLUMN};
}
