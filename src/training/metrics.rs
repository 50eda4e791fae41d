//! Classification quality metrics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Precision / recall / F1 for one class or one average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and averages over a labelled partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Keyed by class label rendered as text (`"0"`, `"1"`, ...)
    pub classes: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub n_samples: usize,
}

impl ClassificationReport {
    /// Compute the report over the union of labels seen in truth and predictions.
    ///
    /// Zero divisions (no predictions or no support for a class) yield 0.0.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        let n_samples = y_true.len().min(y_pred.len());

        let mut labels: Vec<f64> = y_true.iter().chain(y_pred.iter()).copied().collect();
        labels.sort_by(|a, b| a.total_cmp(b));
        labels.dedup();

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| (*t - *p).abs() < 0.5)
            .count();
        let accuracy = if n_samples > 0 {
            correct as f64 / n_samples as f64
        } else {
            0.0
        };

        let mut classes = BTreeMap::new();
        for &label in &labels {
            let (tp, fp, fn_) = Self::confusion_counts(y_true, y_pred, label);
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            classes.insert(
                format_label(label),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score,
                    support: tp + fn_,
                },
            );
        }

        let macro_avg = Self::average(&classes, |_| 1.0);
        let weighted_avg = Self::average(&classes, |m| m.support as f64);

        Self {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
            n_samples,
        }
    }

    fn average(
        classes: &BTreeMap<String, ClassMetrics>,
        weight: impl Fn(&ClassMetrics) -> f64,
    ) -> ClassMetrics {
        let total_weight: f64 = classes.values().map(&weight).sum();
        let support = classes.values().map(|m| m.support).sum();
        if total_weight <= 0.0 {
            return ClassMetrics {
                precision: 0.0,
                recall: 0.0,
                f1_score: 0.0,
                support,
            };
        }

        let mean = |field: fn(&ClassMetrics) -> f64| {
            classes.values().map(|m| weight(m) * field(m)).sum::<f64>() / total_weight
        };

        ClassMetrics {
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1_score: mean(|m| m.f1_score),
            support,
        }
    }

    /// (true positives, false positives, false negatives) treating `label` as positive
    fn confusion_counts(y_true: &[f64], y_pred: &[f64], label: f64) -> (usize, usize, usize) {
        let mut tp = 0;
        let mut fp = 0;
        let mut fn_ = 0;

        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == label, p == label) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        (tp, fp, fn_)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn format_label(label: f64) -> String {
    if label.fract() == 0.0 {
        format!("{}", label as i64)
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_report() {
        let y_true = [1.0, 1.0, 0.0, 0.0, 1.0];
        let y_pred = [1.0, 0.0, 0.0, 1.0, 1.0];

        let report = ClassificationReport::compute(&y_true, &y_pred);

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        let positive = report.classes["1"];
        assert!((positive.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((positive.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(positive.support, 3);

        let negative = report.classes["0"];
        assert!((negative.precision - 0.5).abs() < 1e-12);
        assert_eq!(negative.support, 2);

        assert_eq!(report.weighted_avg.support, 5);
        assert!((report.macro_avg.precision - (2.0 / 3.0 + 0.5) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_never_predicted() {
        let report = ClassificationReport::compute(&[0.0, 1.0], &[0.0, 0.0]);
        assert_eq!(report.classes["1"].precision, 0.0);
        assert_eq!(report.classes["1"].f1_score, 0.0);
    }

    #[test]
    fn test_empty_report() {
        let report = ClassificationReport::compute(&[], &[]);
        assert_eq!(report.accuracy, 0.0);
        assert!(report.classes.is_empty());
        assert_eq!(report.n_samples, 0);
    }
}
