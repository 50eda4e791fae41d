//! Integration test: decision model training, explanation and persistence

use abdmf::analysis::{DecisionAnalyzer, DecisionAnalyzerConfig};
use abdmf::error::{AbdmfError, ErrorKind};
use abdmf::synthetic::HiringDataGenerator;
use abdmf::training::ModelParams;
use abdmf::utils::frame;
use polars::prelude::*;

fn config() -> DecisionAnalyzerConfig {
    DecisionAnalyzerConfig {
        model_params: ModelParams {
            n_estimators: 20,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn trained() -> (DecisionAnalyzer, DataFrame) {
    let data = HiringDataGenerator::new().with_seed(11).generate(300).unwrap();
    let decisions = frame::selected_outcomes(&data).unwrap();
    let features = data.drop("selected").unwrap();

    let mut analyzer = DecisionAnalyzer::new(config()).unwrap();
    analyzer.train(&features, &decisions, 0.2).unwrap();
    (analyzer, features)
}

fn candidate() -> DataFrame {
    df!(
        "gender" => &["F"],
        "race" => &["B"],
        "age" => &[28i64],
        "experience" => &[5i64],
        "education_level" => &["Master"],
        "education_score" => &[85.0],
        "interview_score" => &[90.0]
    )
    .unwrap()
}

#[test]
fn test_importances_cover_every_feature() {
    let (analyzer, features) = trained();
    let metrics = analyzer.performance_metrics().unwrap();

    assert_eq!(metrics.feature_importance.len(), features.width());
    for value in metrics.feature_importance.values() {
        assert!((0.0..=1.0).contains(value));
    }
    let total: f64 = metrics.feature_importance.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_validation_partition_size() {
    let (analyzer, _) = trained();
    let metrics = analyzer.performance_metrics().unwrap();
    assert_eq!(metrics.validation.n_samples, 60);
    assert_eq!(metrics.train.n_samples, 240);
}

#[test]
fn test_analysis_fields() {
    let (analyzer, _) = trained();
    let analysis = analyzer.analyze_decision(&candidate()).unwrap();

    assert!((0.5..=1.0).contains(&analysis.confidence));
    assert_eq!(analysis.all_features.len(), 7);
    assert_eq!(
        analysis.high_confidence,
        analysis.confidence >= analyzer.config().confidence_threshold
    );
    for (name, value) in &analysis.significant_features {
        assert!(*value >= analyzer.config().feature_importance_threshold);
        assert_eq!(analysis.all_features[name], *value);
    }
}

#[test]
fn test_missing_feature_is_named() {
    let (analyzer, _) = trained();
    let partial = candidate().drop("experience").unwrap();

    match analyzer.analyze_decision(&partial) {
        Err(err @ AbdmfError::MissingFeatures(_)) => {
            assert!(err.to_string().contains("experience"));
            assert_eq!(err.kind(), ErrorKind::Input);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_save_load_preserves_predictions() {
    let (analyzer, _) = trained();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");

    analyzer.save_model(&path).unwrap();
    let restored = DecisionAnalyzer::load_model(&path).unwrap();

    assert_eq!(
        analyzer.analyze_decision(&candidate()).unwrap(),
        restored.analyze_decision(&candidate()).unwrap()
    );
    assert_eq!(
        analyzer.model().unwrap().feature_names,
        restored.model().unwrap().feature_names
    );
}

#[test]
fn test_save_untrained_fails() {
    let analyzer = DecisionAnalyzer::new(config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let result = analyzer.save_model(dir.path().join("model.bin"));
    match result {
        Err(err) => assert_eq!(err.kind(), ErrorKind::State),
        Ok(()) => panic!("saving an untrained model must fail"),
    }
}

#[test]
fn test_load_garbage_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.bin");
    std::fs::write(&path, b"not a model").unwrap();
    assert!(DecisionAnalyzer::load_model(&path).is_err());
}

#[test]
fn test_training_is_deterministic() {
    let (a, _) = trained();
    let (b, _) = trained();
    assert_eq!(a.performance_metrics(), b.performance_metrics());
}
