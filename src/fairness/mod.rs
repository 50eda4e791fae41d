//! Bias Detection Module
//!
//! Group-fairness metrics over historical selection decisions.
//!
//! For every protected attribute the records are partitioned by attribute
//! value and each group's selection rate (share of records with
//! `selected == 1`) is computed. Only groups holding at least
//! `minimum_sample_size` records take part in the ratios:
//!
//! - **Disparate impact**: lowest / highest qualifying selection rate
//! - **Statistical parity difference**: highest − lowest qualifying selection rate
//!
//! Both are 0.0 when no group qualifies. Small groups never cause a failure.

use crate::error::{AbdmfError, Result};
use crate::utils::frame::{self, OUTCOME_COLUMN};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Attributes audited when no configuration is supplied
pub const DEFAULT_PROTECTED_ATTRIBUTES: [&str; 7] = [
    "gender",
    "race",
    "age",
    "education_type",
    "career_change",
    "disability_status",
    "location",
];

/// Column added to a copy of the frame for intersectional analysis
pub const INTERSECTIONAL_COLUMN: &str = "intersectional_group";

/// Configuration for bias detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasDetectorConfig {
    /// Names of protected/sensitive attributes
    pub protected_attributes: Vec<String>,
    /// Tolerated deviation: disparate impact below `1 - threshold` or
    /// statistical parity above `threshold` counts as bias
    pub threshold: f64,
    /// Minimum records a group needs to take part in the ratios
    pub minimum_sample_size: usize,
}

impl Default for BiasDetectorConfig {
    fn default() -> Self {
        Self {
            protected_attributes: DEFAULT_PROTECTED_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            threshold: 0.2,
            minimum_sample_size: 100,
        }
    }
}

impl BiasDetectorConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AbdmfError::ConfigError(format!(
                "bias threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.minimum_sample_size == 0 {
            return Err(AbdmfError::ConfigError(
                "minimum_sample_size must be at least 1".to_string(),
            ));
        }
        if self.protected_attributes.iter().any(|a| a.is_empty()) {
            return Err(AbdmfError::ConfigError(
                "protected attribute names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Selection statistics for one attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRate {
    /// Records in this group
    pub group_size: usize,
    /// Records in this group with a positive outcome
    pub selected: usize,
    /// `selected / group_size`
    pub selection_rate: f64,
    /// Whether the group met the sample-size floor
    pub qualifies: bool,
}

/// Fairness metrics for a single protected attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasMetric {
    pub disparate_impact: f64,
    pub statistical_parity: f64,
    /// Records with a non-null attribute value
    pub sample_size: usize,
    /// Distinct non-null attribute values
    pub groups_analyzed: usize,
    /// Per-group selection statistics, keyed by attribute value
    pub group_rates: BTreeMap<String, GroupRate>,
}

/// Headline numbers of a bias report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasSummary {
    pub total_records: usize,
    pub attributes_analyzed: usize,
    pub significant_bias_detected: bool,
}

/// Complete bias analysis of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasReport {
    pub summary: BiasSummary,
    pub detailed_metrics: BTreeMap<String, BiasMetric>,
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Group-fairness evaluator over historical decisions
#[derive(Debug, Clone)]
pub struct BiasDetector {
    config: BiasDetectorConfig,
}

impl Default for BiasDetector {
    fn default() -> Self {
        Self {
            config: BiasDetectorConfig::default(),
        }
    }
}

impl BiasDetector {
    /// Create a new bias detector, validating the configuration
    pub fn new(config: BiasDetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &BiasDetectorConfig {
        &self.config
    }

    /// Ratio of the lowest to the highest selection rate among qualifying groups.
    pub fn calculate_disparate_impact(&self, data: &DataFrame, attribute: &str) -> Result<f64> {
        let outcomes = self.outcomes(data)?;
        Ok(self.attribute_metric(data, attribute, &outcomes)?.disparate_impact)
    }

    /// Gap between the highest and the lowest selection rate among qualifying groups.
    pub fn calculate_statistical_parity(&self, data: &DataFrame, attribute: &str) -> Result<f64> {
        let outcomes = self.outcomes(data)?;
        Ok(self.attribute_metric(data, attribute, &outcomes)?.statistical_parity)
    }

    /// Metrics for every configured protected attribute present in the dataset.
    ///
    /// Fails on an empty dataset or one without the outcome column.
    pub fn detect_bias(&self, data: &DataFrame) -> Result<BTreeMap<String, BiasMetric>> {
        let outcomes = self.outcomes(data)?;
        let mut results = BTreeMap::new();

        for attribute in &self.config.protected_attributes {
            if !frame::has_column(data, attribute) {
                debug!(attribute = %attribute, "Protected attribute not present, skipping");
                continue;
            }

            let metric = self.attribute_metric(data, attribute, &outcomes)?;
            debug!(
                attribute = %attribute,
                disparate_impact = metric.disparate_impact,
                statistical_parity = metric.statistical_parity,
                groups = metric.groups_analyzed,
                "Computed bias metrics"
            );
            results.insert(attribute.clone(), metric);
        }

        Ok(results)
    }

    /// Metrics over the intersection of several attributes.
    ///
    /// Each record's composite group is the `_`-joined string form of its
    /// attribute values; a null in any part leaves the record ungrouped.
    pub fn analyze_intersectional_bias(
        &self,
        data: &DataFrame,
        attributes: &[&str],
    ) -> Result<BiasMetric> {
        if attributes.is_empty() {
            return Err(AbdmfError::InvalidInput(
                "intersectional analysis needs at least one attribute".to_string(),
            ));
        }
        let outcomes = self.outcomes(data)?;

        let missing: Vec<String> = attributes
            .iter()
            .filter(|a| !frame::has_column(data, a))
            .map(|a| a.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AbdmfError::MissingColumns(missing));
        }

        let parts = attributes
            .iter()
            .map(|a| frame::column_as_strings(data, a))
            .collect::<Result<Vec<_>>>()?;

        let keys: Vec<Option<String>> = (0..data.height())
            .map(|row| {
                parts
                    .iter()
                    .map(|column| column[row].as_deref())
                    .collect::<Option<Vec<&str>>>()
                    .map(|values| values.join("_"))
            })
            .collect();

        let mut composite = data.clone();
        composite.with_column(Column::new(INTERSECTIONAL_COLUMN.into(), keys))?;

        self.attribute_metric(&composite, INTERSECTIONAL_COLUMN, &outcomes)
    }

    /// Summary, per-attribute metrics and recommendations for a dataset.
    pub fn generate_bias_report(&self, data: &DataFrame) -> Result<BiasReport> {
        let detailed_metrics = self.detect_bias(data)?;
        let floor = 1.0 - self.config.threshold;

        let significant_bias_detected = detailed_metrics
            .values()
            .any(|m| m.disparate_impact < floor);

        let recommendations = self.generate_recommendations(&detailed_metrics);

        info!(
            records = data.height(),
            attributes = detailed_metrics.len(),
            significant_bias = significant_bias_detected,
            recommendations = recommendations.len(),
            "Generated bias report"
        );

        Ok(BiasReport {
            summary: BiasSummary {
                total_records: data.height(),
                attributes_analyzed: detailed_metrics.len(),
                significant_bias_detected,
            },
            detailed_metrics,
            recommendations,
            timestamp: Utc::now(),
        })
    }

    fn generate_recommendations(&self, metrics: &BTreeMap<String, BiasMetric>) -> Vec<String> {
        let threshold = self.config.threshold;
        let mut recommendations = Vec::new();

        for (attribute, values) in metrics {
            if values.disparate_impact < 1.0 - threshold {
                recommendations.push(format!(
                    "High bias detected in {}. Consider reviewing selection criteria \
                     and implementing additional controls.",
                    attribute
                ));
            }
            if values.statistical_parity > threshold {
                recommendations.push(format!(
                    "Significant selection rate differences found in {}. \
                     Review decision-making process for this attribute.",
                    attribute
                ));
            }
        }

        recommendations
    }

    fn outcomes(&self, data: &DataFrame) -> Result<Vec<bool>> {
        if data.height() == 0 {
            return Err(AbdmfError::EmptyDataset);
        }
        frame::selected_outcomes(data)
    }

    fn attribute_metric(
        &self,
        data: &DataFrame,
        attribute: &str,
        outcomes: &[bool],
    ) -> Result<BiasMetric> {
        if attribute == OUTCOME_COLUMN {
            return Err(AbdmfError::InvalidInput(format!(
                "'{}' is the outcome column, not an attribute",
                OUTCOME_COLUMN
            )));
        }
        let groups = frame::column_as_strings(data, attribute)?;
        Ok(self.metric_from_groups(&groups, outcomes))
    }

    /// Core computation over aligned group labels and outcomes.
    fn metric_from_groups(&self, groups: &[Option<String>], outcomes: &[bool]) -> BiasMetric {
        let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for (group, &selected) in groups.iter().zip(outcomes) {
            if let Some(value) = group {
                let entry = counts.entry(value.clone()).or_insert((0, 0));
                entry.0 += 1;
                if selected {
                    entry.1 += 1;
                }
            }
        }

        let min_size = self.config.minimum_sample_size;
        let group_rates: BTreeMap<String, GroupRate> = counts
            .into_iter()
            .map(|(value, (size, selected))| {
                let rate = GroupRate {
                    group_size: size,
                    selected,
                    selection_rate: selected as f64 / size as f64,
                    qualifies: size >= min_size,
                };
                (value, rate)
            })
            .collect();

        let qualifying: Vec<f64> = group_rates
            .values()
            .filter(|g| g.qualifies)
            .map(|g| g.selection_rate)
            .collect();

        let (disparate_impact, statistical_parity) = if qualifying.is_empty() {
            (0.0, 0.0)
        } else {
            let max_rate = qualifying.iter().copied().fold(f64::MIN, f64::max);
            let min_rate = qualifying.iter().copied().fold(f64::MAX, f64::min);
            let ratio = if max_rate > 0.0 { min_rate / max_rate } else { 0.0 };
            (ratio, max_rate - min_rate)
        };

        BiasMetric {
            disparate_impact,
            statistical_parity,
            sample_size: group_rates.values().map(|g| g.group_size).sum(),
            groups_analyzed: group_rates.len(),
            group_rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn detector(min_size: usize) -> BiasDetector {
        BiasDetector::new(BiasDetectorConfig {
            protected_attributes: vec!["gender".to_string(), "race".to_string()],
            threshold: 0.2,
            minimum_sample_size: min_size,
        })
        .unwrap()
    }

    /// Group A: 8/10 selected, group B: 2/10 selected
    fn skewed_frame() -> DataFrame {
        let gender: Vec<&str> = std::iter::repeat("A").take(10)
            .chain(std::iter::repeat("B").take(10))
            .collect();
        let race: Vec<&str> = (0..20).map(|i| if i % 2 == 0 { "X" } else { "Y" }).collect();
        let selected: Vec<i64> = (0..20)
            .map(|i| if (i < 10 && i < 8) || (i >= 10 && i < 12) { 1 } else { 0 })
            .collect();
        df!("gender" => gender, "race" => race, "selected" => selected).unwrap()
    }

    #[test]
    fn test_disparate_impact() {
        let di = detector(5).calculate_disparate_impact(&skewed_frame(), "gender").unwrap();
        assert!((di - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_statistical_parity() {
        let sp = detector(5).calculate_statistical_parity(&skewed_frame(), "gender").unwrap();
        assert!((sp - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_groups_below_floor_yield_zero() {
        let d = detector(11);
        let df = skewed_frame();
        assert_eq!(d.calculate_disparate_impact(&df, "gender").unwrap(), 0.0);
        assert_eq!(d.calculate_statistical_parity(&df, "gender").unwrap(), 0.0);
    }

    #[test]
    fn test_zero_max_rate_yields_zero_impact() {
        let df = df!(
            "gender" => &["A", "A", "B", "B"],
            "selected" => &[0i64, 0, 0, 0]
        )
        .unwrap();
        let d = detector(1);
        assert_eq!(d.calculate_disparate_impact(&df, "gender").unwrap(), 0.0);
        assert_eq!(d.calculate_statistical_parity(&df, "gender").unwrap(), 0.0);
    }

    #[test]
    fn test_small_group_excluded_from_ratio() {
        // C has a single record with rate 0 and must not drag the ratio to 0
        let df = df!(
            "gender" => &["A", "A", "B", "B", "C"],
            "selected" => &[1i64, 1, 1, 0, 0]
        )
        .unwrap();
        let metric = detector(2).detect_bias(&df).unwrap().remove("gender").unwrap();
        assert!((metric.disparate_impact - 0.5).abs() < 1e-12);
        assert_eq!(metric.groups_analyzed, 3);
        assert!(!metric.group_rates["C"].qualifies);
    }

    #[test]
    fn test_detect_bias_skips_absent_attributes() {
        let df = df!("gender" => &["A", "B"], "selected" => &[1i64, 0]).unwrap();
        let results = detector(1).detect_bias(&df).unwrap();
        assert!(results.contains_key("gender"));
        assert!(!results.contains_key("race"));
    }

    #[test]
    fn test_detect_bias_counts_nulls_out() {
        let df = df!(
            "gender" => &[Some("A"), None, Some("B")],
            "selected" => &[1i64, 1, 0]
        )
        .unwrap();
        let metric = detector(1).detect_bias(&df).unwrap().remove("gender").unwrap();
        assert_eq!(metric.sample_size, 2);
        assert_eq!(metric.groups_analyzed, 2);
    }

    #[test]
    fn test_detect_bias_missing_outcome() {
        let df = df!("invalid_column" => &[1i64, 2, 3]).unwrap();
        let result = BiasDetector::default().detect_bias(&df);
        assert!(matches!(result, Err(AbdmfError::MissingColumns(_))));
    }

    #[test]
    fn test_detect_bias_empty() {
        let result = BiasDetector::default().detect_bias(&DataFrame::empty());
        assert!(matches!(result, Err(AbdmfError::EmptyDataset)));
    }

    #[test]
    fn test_intersectional_bias() {
        let metric = detector(1)
            .analyze_intersectional_bias(&skewed_frame(), &["gender", "race"])
            .unwrap();
        assert_eq!(metric.groups_analyzed, 4);
        assert!(metric.group_rates.contains_key("A_X"));
        assert!((0.0..=1.0).contains(&metric.disparate_impact));
    }

    #[test]
    fn test_intersectional_null_part_leaves_record_ungrouped() {
        let df = df!(
            "gender" => &[Some("A"), Some("A"), Some("B"), None],
            "race" => &[Some("X"), None, Some("X"), Some("X")],
            "selected" => &[1i64, 1, 0, 1]
        )
        .unwrap();
        let metric = detector(1)
            .analyze_intersectional_bias(&df, &["gender", "race"])
            .unwrap();

        assert_eq!(metric.sample_size, 2);
        assert_eq!(metric.groups_analyzed, 2);
        assert!(metric.group_rates.contains_key("A_X"));
        assert!(metric.group_rates.contains_key("B_X"));
        assert!(metric.group_rates.keys().all(|k| !k.contains("null") && !k.contains("nan")));
    }

    #[test]
    fn test_intersectional_missing_attribute() {
        let result = detector(1).analyze_intersectional_bias(&skewed_frame(), &["gender", "age"]);
        match result {
            Err(AbdmfError::MissingColumns(cols)) => assert_eq!(cols, vec!["age".to_string()]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bias_report_recommendations() {
        let report = detector(5).generate_bias_report(&skewed_frame()).unwrap();
        assert_eq!(report.summary.total_records, 20);
        assert_eq!(report.summary.attributes_analyzed, 2);
        assert!(report.summary.significant_bias_detected);
        assert!(report.recommendations.iter().any(|r| r.contains("High bias detected in gender")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("Significant selection rate differences found in gender")));
    }

    #[test]
    fn test_invalid_config() {
        let config = BiasDetectorConfig { threshold: 1.5, ..Default::default() };
        assert!(matches!(BiasDetector::new(config), Err(AbdmfError::ConfigError(_))));

        let config = BiasDetectorConfig { minimum_sample_size: 0, ..Default::default() };
        assert!(BiasDetector::new(config).is_err());
    }

    #[test]
    fn test_default_config() {
        let config = BiasDetectorConfig::default();
        assert_eq!(config.protected_attributes.len(), 7);
        assert_eq!(config.threshold, 0.2);
        assert_eq!(config.minimum_sample_size, 100);
    }

    proptest! {
        #[test]
        fn prop_metrics_within_unit_interval(
            rows in proptest::collection::vec((0u8..4, any::<bool>()), 1..200),
            min_size in 1usize..30,
        ) {
            let d = detector(min_size);
            let groups: Vec<Option<String>> = rows.iter().map(|(g, _)| Some(g.to_string())).collect();
            let outcomes: Vec<bool> = rows.iter().map(|(_, s)| *s).collect();
            let metric = d.metric_from_groups(&groups, &outcomes);
            prop_assert!((0.0..=1.0).contains(&metric.disparate_impact));
            prop_assert!((0.0..=1.0).contains(&metric.statistical_parity));
            prop_assert_eq!(metric.sample_size, rows.len());
        }
    }
}
