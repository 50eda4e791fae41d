//! Framework configuration
//!
//! One YAML document configures all three components. Every section and
//! every field is optional and falls back to its documented default:
//!
//! ```yaml
//! bias_detector:
//!   protected_attributes: [gender, race]
//!   threshold: 0.2
//!   minimum_sample_size: 100
//! decision_analyzer:
//!   model_params:
//!     n_estimators: 100
//!     max_features: sqrt
//!   feature_importance_threshold: 0.05
//!   confidence_threshold: 0.8
//! feedback_system:
//!   satisfaction_scale: [1, 5]
//!   retention_period_days: 365
//! ```

use crate::analysis::DecisionAnalyzerConfig;
use crate::error::{AbdmfError, Result};
use crate::fairness::BiasDetectorConfig;
use crate::feedback::FeedbackConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration of the whole framework
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbdmfConfig {
    pub bias_detector: BiasDetectorConfig,
    pub decision_analyzer: DecisionAnalyzerConfig,
    pub feedback_system: FeedbackConfig,
}

impl AbdmfConfig {
    /// Load and validate configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AbdmfError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AbdmfConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.bias_detector.validate()?;
        self.decision_analyzer.validate()?;
        self.feedback_system.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::MaxFeatures;
    use crate::feedback::UserType;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = AbdmfConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, AbdmfConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
bias_detector:
  protected_attributes: [gender]
  minimum_sample_size: 30
decision_analyzer:
  model_params:
    n_estimators: 25
    max_features: { fraction: 0.5 }
feedback_system:
  user_types: [HR, DEI_Officer]
  satisfaction_scale: [0, 10]
"#;
        let config = AbdmfConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.bias_detector.protected_attributes, vec!["gender"]);
        assert_eq!(config.bias_detector.minimum_sample_size, 30);
        assert_eq!(config.bias_detector.threshold, 0.2);
        assert_eq!(config.decision_analyzer.model_params.n_estimators, 25);
        assert_eq!(
            config.decision_analyzer.model_params.max_features,
            MaxFeatures::Fraction(0.5)
        );
        assert_eq!(config.decision_analyzer.model_params.random_state, 42);
        assert_eq!(
            config.feedback_system.user_types,
            vec![UserType::Hr, UserType::DeiOfficer]
        );
        assert_eq!(config.feedback_system.satisfaction_scale, (0.0, 10.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = AbdmfConfig::from_yaml_str("bias_detector:\n  threshold: 2.0\n");
        assert!(matches!(result, Err(AbdmfError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let result = AbdmfConfig::from_yaml_str("bias_detector: [unclosed");
        assert!(matches!(result, Err(AbdmfError::ConfigError(_))));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let config = AbdmfConfig::default();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{}", config.to_yaml().unwrap()).unwrap();

        let loaded = AbdmfConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
