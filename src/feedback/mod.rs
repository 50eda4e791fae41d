//! Feedback Module
//!
//! Collects validated user feedback about the hiring system and summarizes
//! satisfaction overall, per user type, per category and over time.

use crate::error::{AbdmfError, Result};
use crate::utils::sanitize_input;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Largest number of records averaged by the trend's rolling window
const TREND_WINDOW: usize = 10;
/// Smallest rolling-average change that counts as a trend
const TREND_TOLERANCE: f64 = 0.1;

/// Who is giving feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "HR")]
    Hr,
    Candidate,
    Manager,
    #[serde(rename = "DEI_Officer")]
    DeiOfficer,
}

impl UserType {
    pub const ALL: [UserType; 4] = [
        UserType::Hr,
        UserType::Candidate,
        UserType::Manager,
        UserType::DeiOfficer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Hr => "HR",
            UserType::Candidate => "Candidate",
            UserType::Manager => "Manager",
            UserType::DeiOfficer => "DEI_Officer",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = AbdmfError;

    fn from_str(s: &str) -> Result<Self> {
        UserType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AbdmfError::InvalidUserType(s.to_string()))
    }
}

/// What the feedback is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeedbackCategory {
    #[serde(rename = "System_Usability")]
    SystemUsability,
    #[serde(rename = "Decision_Fairness")]
    DecisionFairness,
    Transparency,
    #[serde(rename = "Technical_Issues")]
    TechnicalIssues,
}

impl FeedbackCategory {
    pub const ALL: [FeedbackCategory; 4] = [
        FeedbackCategory::SystemUsability,
        FeedbackCategory::DecisionFairness,
        FeedbackCategory::Transparency,
        FeedbackCategory::TechnicalIssues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::SystemUsability => "System_Usability",
            FeedbackCategory::DecisionFairness => "Decision_Fairness",
            FeedbackCategory::Transparency => "Transparency",
            FeedbackCategory::TechnicalIssues => "Technical_Issues",
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackCategory {
    type Err = AbdmfError;

    fn from_str(s: &str) -> Result<Self> {
        FeedbackCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AbdmfError::InvalidCategory(s.to_string()))
    }
}

/// Configuration for feedback collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// User types allowed to submit feedback
    pub user_types: Vec<UserType>,
    /// Categories accepted
    pub feedback_categories: Vec<FeedbackCategory>,
    /// Inclusive (min, max) satisfaction range
    pub satisfaction_scale: (f64, f64),
    /// How long feedback is meant to be kept; not enforced
    pub retention_period_days: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            user_types: UserType::ALL.to_vec(),
            feedback_categories: FeedbackCategory::ALL.to_vec(),
            satisfaction_scale: (1.0, 5.0),
            retention_period_days: 365,
        }
    }
}

impl FeedbackConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let (min, max) = self.satisfaction_scale;
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(AbdmfError::ConfigError(format!(
                "satisfaction_scale must be a finite (min, max) pair with min <= max, got ({}, {})",
                min, max
            )));
        }
        Ok(())
    }
}

/// Feedback as submitted; every field is optional so missing ones can be reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackPayload {
    pub satisfaction: Option<f64>,
    pub category: Option<String>,
    pub comments: Option<String>,
    pub issues: Option<String>,
}

impl FeedbackPayload {
    /// Payload with every required field set
    pub fn new(satisfaction: f64, category: FeedbackCategory, comments: impl Into<String>) -> Self {
        Self {
            satisfaction: Some(satisfaction),
            category: Some(category.to_string()),
            comments: Some(comments.into()),
            issues: None,
        }
    }

    /// Attach a free-text issue description
    pub fn with_issues(mut self, issues: impl Into<String>) -> Self {
        self.issues = Some(issues.into());
        self
    }
}

/// A stored, validated piece of feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_type: UserType,
    pub timestamp: DateTime<Utc>,
    pub satisfaction: f64,
    pub category: FeedbackCategory,
    pub comments: String,
    pub issues: Option<String>,
}

/// Direction of the satisfaction trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackTrend {
    pub direction: TrendDirection,
    /// Absolute change of the rolling average; 0.0 when stable
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total_feedback: usize,
    pub average_satisfaction: f64,
    /// Sample standard deviation; 0.0 for a single record
    pub satisfaction_std: f64,
    pub feedback_trend: FeedbackTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTypeAnalysis {
    pub feedback_by_user_type: BTreeMap<String, usize>,
    pub satisfaction_by_user_type: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub feedback_by_category: BTreeMap<String, usize>,
    pub satisfaction_by_category: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub overall_metrics: OverallMetrics,
    pub user_type_analysis: UserTypeAnalysis,
    pub category_analysis: CategoryAnalysis,
    pub timestamp: DateTime<Utc>,
}

/// Result of a feedback analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackAnalysis {
    /// Nothing to analyze
    NoData {
        status: String,
        timestamp: DateTime<Utc>,
    },
    Report(FeedbackReport),
}

impl FeedbackAnalysis {
    /// The report, when there was data
    pub fn report(&self) -> Option<&FeedbackReport> {
        match self {
            FeedbackAnalysis::Report(report) => Some(report),
            FeedbackAnalysis::NoData { .. } => None,
        }
    }
}

/// Append-only store of validated feedback
#[derive(Debug, Clone, Default)]
pub struct FeedbackSystem {
    config: FeedbackConfig,
    records: Vec<FeedbackRecord>,
}

impl FeedbackSystem {
    /// Create an empty feedback system, validating the configuration
    pub fn new(config: FeedbackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            records: Vec::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Stored records in submission order
    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate and store feedback stamped with the current time
    pub fn collect_feedback(&mut self, user_type: &str, payload: FeedbackPayload) -> Result<bool> {
        self.collect_feedback_at(user_type, payload, Utc::now())
    }

    /// Validate and store feedback stamped with `timestamp`.
    ///
    /// Checks run in order: user type, required fields, satisfaction range,
    /// category. Nothing is stored when any check fails.
    pub fn collect_feedback_at(
        &mut self,
        user_type: &str,
        payload: FeedbackPayload,
        timestamp: DateTime<Utc>,
    ) -> Result<bool> {
        let user_type = user_type
            .parse::<UserType>()
            .ok()
            .filter(|t| self.config.user_types.contains(t))
            .ok_or_else(|| AbdmfError::InvalidUserType(user_type.to_string()))?;

        let FeedbackPayload {
            satisfaction,
            category,
            comments,
            issues,
        } = payload;

        let (satisfaction, category, comments) = match (satisfaction, category, comments) {
            (Some(s), Some(c), Some(t)) => (s, c, t),
            (s, c, t) => {
                let missing = [
                    ("satisfaction", s.is_none()),
                    ("category", c.is_none()),
                    ("comments", t.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| name.to_string())
                .collect();
                return Err(AbdmfError::MissingFields(missing));
            }
        };

        let (min, max) = self.config.satisfaction_scale;
        if !satisfaction.is_finite() || satisfaction < min || satisfaction > max {
            return Err(AbdmfError::SatisfactionOutOfRange {
                score: satisfaction,
                min,
                max,
            });
        }

        let category = category
            .parse::<FeedbackCategory>()
            .ok()
            .filter(|c| self.config.feedback_categories.contains(c))
            .ok_or(AbdmfError::InvalidCategory(category))?;

        self.records.push(FeedbackRecord {
            user_type,
            timestamp,
            satisfaction,
            category,
            comments: sanitize_input(&comments),
            issues: issues.as_deref().map(sanitize_input),
        });

        debug!(
            user_type = %user_type,
            category = %category,
            satisfaction,
            total = self.records.len(),
            "Collected feedback"
        );
        Ok(true)
    }

    /// Analyze feedback as of now
    pub fn analyze_feedback(&self, timeframe_days: Option<u32>) -> FeedbackAnalysis {
        self.analyze_feedback_at(timeframe_days, Utc::now())
    }

    /// Analyze feedback as of `now`.
    ///
    /// With a non-zero timeframe, only records stamped at or after
    /// `now - timeframe_days` are included.
    pub fn analyze_feedback_at(
        &self,
        timeframe_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> FeedbackAnalysis {
        if self.records.is_empty() {
            return FeedbackAnalysis::NoData {
                status: "No feedback data available".to_string(),
                timestamp: now,
            };
        }

        // A zero timeframe means no filter; a cutoff before the earliest
        // representable time keeps everything.
        let cutoff = timeframe_days
            .filter(|&days| days > 0)
            .and_then(|days| now.checked_sub_signed(Duration::days(i64::from(days))));
        let selected: Vec<&FeedbackRecord> = match cutoff {
            Some(cutoff) => self.records.iter().filter(|r| r.timestamp >= cutoff).collect(),
            None => self.records.iter().collect(),
        };

        if selected.is_empty() {
            return FeedbackAnalysis::NoData {
                status: "No feedback data available for specified timeframe".to_string(),
                timestamp: now,
            };
        }

        let scores: Vec<f64> = selected.iter().map(|r| r.satisfaction).collect();
        let (average_satisfaction, satisfaction_std) = mean_and_std(&scores);

        let (feedback_by_user_type, satisfaction_by_user_type) =
            group_stats(&selected, |r| r.user_type.to_string());
        let (feedback_by_category, satisfaction_by_category) =
            group_stats(&selected, |r| r.category.to_string());

        let feedback_trend = calculate_trend(&selected);

        info!(
            total = selected.len(),
            average = average_satisfaction,
            trend = %feedback_trend.direction,
            "Analyzed feedback"
        );

        FeedbackAnalysis::Report(FeedbackReport {
            overall_metrics: OverallMetrics {
                total_feedback: selected.len(),
                average_satisfaction,
                satisfaction_std,
                feedback_trend,
            },
            user_type_analysis: UserTypeAnalysis {
                feedback_by_user_type,
                satisfaction_by_user_type,
            },
            category_analysis: CategoryAnalysis {
                feedback_by_category,
                satisfaction_by_category,
            },
            timestamp: now,
        })
    }
}

/// Mean and sample standard deviation
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, var.sqrt())
}

/// Count and mean satisfaction per key
fn group_stats(
    records: &[&FeedbackRecord],
    key: impl Fn(&FeedbackRecord) -> String,
) -> (BTreeMap<String, usize>, BTreeMap<String, f64>) {
    let mut sums: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(key(*record)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.satisfaction;
    }

    let counts = sums.iter().map(|(k, (n, _))| (k.clone(), *n)).collect();
    let means = sums
        .into_iter()
        .map(|(k, (n, total))| (k, total / n as f64))
        .collect();
    (counts, means)
}

/// Compare the first and last values of a rolling mean over time-ordered scores.
fn calculate_trend(records: &[&FeedbackRecord]) -> FeedbackTrend {
    let stable = FeedbackTrend {
        direction: TrendDirection::Stable,
        strength: 0.0,
    };
    if records.len() < 2 {
        return stable;
    }

    let mut ordered: Vec<&FeedbackRecord> = records.to_vec();
    ordered.sort_by_key(|r| r.timestamp);
    let scores: Vec<f64> = ordered.iter().map(|r| r.satisfaction).collect();

    let rolling = rolling_mean(&scores, TREND_WINDOW.min(scores.len()));
    let (Some(first), Some(last)) = (rolling.first(), rolling.last()) else {
        return stable;
    };
    let change = last - first;

    if change.abs() <= TREND_TOLERANCE {
        return stable;
    }

    FeedbackTrend {
        direction: if change > 0.0 {
            TrendDirection::Improving
        } else {
            TrendDirection::Declining
        },
        strength: change.abs(),
    }
}

/// Trailing mean over up to `window` values, averaging whatever is available
/// at the start of the series.
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}
