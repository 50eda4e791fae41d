//! Integration test: feedback collection and analysis

use abdmf::error::AbdmfError;
use abdmf::feedback::{
    FeedbackAnalysis, FeedbackCategory, FeedbackPayload, FeedbackSystem, TrendDirection,
};
use chrono::{Duration, TimeZone, Utc};

fn payload(score: f64, category: FeedbackCategory) -> FeedbackPayload {
    FeedbackPayload::new(score, category, "comment")
}

#[test]
fn test_accepts_and_counts() {
    let mut system = FeedbackSystem::default();
    for (user, score) in [("HR", 4.5), ("Candidate", 3.0), ("Manager", 5.0), ("DEI_Officer", 2.0)] {
        assert!(system
            .collect_feedback(user, payload(score, FeedbackCategory::DecisionFairness))
            .unwrap());
    }
    assert_eq!(system.len(), 4);
}

#[test]
fn test_rejections_leave_store_unchanged() {
    let mut system = FeedbackSystem::default();

    assert!(matches!(
        system.collect_feedback("InvalidUser", payload(4.0, FeedbackCategory::Transparency)),
        Err(AbdmfError::InvalidUserType(_))
    ));
    assert!(matches!(
        system.collect_feedback("HR", payload(6.0, FeedbackCategory::Transparency)),
        Err(AbdmfError::SatisfactionOutOfRange { .. })
    ));
    assert!(matches!(
        system.collect_feedback("HR", FeedbackPayload::default()),
        Err(AbdmfError::MissingFields(ref f)) if f.len() == 3
    ));
    assert!(system.is_empty());
}

#[test]
fn test_group_breakdowns() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let mut system = FeedbackSystem::default();
    system
        .collect_feedback_at("HR", payload(4.0, FeedbackCategory::SystemUsability), now)
        .unwrap();
    system
        .collect_feedback_at("HR", payload(2.0, FeedbackCategory::Transparency), now)
        .unwrap();
    system
        .collect_feedback_at("Candidate", payload(5.0, FeedbackCategory::Transparency), now)
        .unwrap();

    let analysis = system.analyze_feedback_at(None, now);
    let report = analysis.report().unwrap();

    assert_eq!(report.user_type_analysis.feedback_by_user_type["HR"], 2);
    assert_eq!(report.user_type_analysis.satisfaction_by_user_type["HR"], 3.0);
    assert_eq!(report.category_analysis.feedback_by_category["Transparency"], 2);
    assert_eq!(report.category_analysis.satisfaction_by_category["Transparency"], 3.5);
}

#[test]
fn test_timeframe_cutoff_inclusive() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let mut system = FeedbackSystem::default();
    system
        .collect_feedback_at(
            "HR",
            payload(3.0, FeedbackCategory::SystemUsability),
            now - Duration::days(30),
        )
        .unwrap();
    system
        .collect_feedback_at(
            "HR",
            payload(5.0, FeedbackCategory::SystemUsability),
            now - Duration::days(30) - Duration::seconds(1),
        )
        .unwrap();

    let analysis = system.analyze_feedback_at(Some(30), now);
    let overall = &analysis.report().unwrap().overall_metrics;
    assert_eq!(overall.total_feedback, 1);
    assert_eq!(overall.average_satisfaction, 3.0);
}

#[test]
fn test_trend_of_alternating_scores_is_stable() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut system = FeedbackSystem::default();
    for (i, score) in [4.0, 3.0, 5.0, 4.0].into_iter().enumerate() {
        system
            .collect_feedback_at(
                "Manager",
                payload(score, FeedbackCategory::DecisionFairness),
                start + Duration::days(i as i64),
            )
            .unwrap();
    }

    let analysis = system.analyze_feedback_at(None, start + Duration::days(10));
    let trend = analysis.report().unwrap().overall_metrics.feedback_trend;
    assert_eq!(trend.direction, TrendDirection::Stable);
}

#[test]
fn test_improving_trend() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut system = FeedbackSystem::default();
    for i in 0..12 {
        let score = if i < 6 { 2.0 } else { 5.0 };
        system
            .collect_feedback_at(
                "HR",
                payload(score, FeedbackCategory::SystemUsability),
                start + Duration::hours(i),
            )
            .unwrap();
    }

    let analysis = system.analyze_feedback_at(None, start + Duration::days(1));
    let trend = analysis.report().unwrap().overall_metrics.feedback_trend;
    assert_eq!(trend.direction, TrendDirection::Improving);
    assert!(trend.strength > 0.1);
}

#[test]
fn test_no_data_serializes_status() {
    let analysis = FeedbackSystem::default().analyze_feedback(Some(7));
    assert!(matches!(analysis, FeedbackAnalysis::NoData { .. }));

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["status"], "No feedback data available");
}
