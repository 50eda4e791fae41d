//! ABDMF CLI Module
//!
//! Command-line interface for scanning historical data, evaluating candidates,
//! analyzing feedback and generating synthetic datasets.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analysis::DecisionAnalyzer;
use crate::config::AbdmfConfig;
use crate::feedback::{FeedbackCategory, FeedbackPayload, FeedbackSystem};
use crate::framework::Abdmf;
use crate::synthetic::{HiringDataGenerator, InjectedBias};
use crate::utils::{format_timestamp, DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn alert(s: &str) -> ColoredString  { s.truecolor(240, 120, 100) }

fn kv(key: &str, val: &str) {
    println!("  {:<22} {}", muted(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_warn(msg: &str) {
    println!("  {} {}", alert("!"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "abdmf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated bias detection and decision monitoring for hiring")]
#[command(long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan historical decisions for bias and train the decision model
    Scan {
        /// Historical data file (CSV, TSV, JSON, or Parquet) with a `selected` column
        #[arg(short, long)]
        data: PathBuf,

        /// Where to save the trained model
        #[arg(short, long)]
        model_out: Option<PathBuf>,

        /// Where to write the full scan result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate candidates with a saved model
    Evaluate {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// Candidate data file; every row is evaluated separately
        #[arg(long)]
        candidate: PathBuf,
    },

    /// Validate and analyze a JSON file of feedback submissions
    Feedback {
        /// JSON array of submissions
        #[arg(short, long)]
        file: PathBuf,

        /// Only analyze feedback from the last N days
        #[arg(short, long)]
        timeframe_days: Option<u32>,
    },

    /// Write a synthetic hiring dataset to CSV
    Generate {
        /// Number of records
        #[arg(short, long, default_value = "1000")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Inject gender and age selection bias
        #[arg(long)]
        biased: bool,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run the end-to-end walk-through on synthetic data
    Demo {
        /// Number of historical records
        #[arg(short, long, default_value = "1000")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

/// One entry of a feedback file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub user_type: String,
    #[serde(flatten)]
    pub payload: FeedbackPayload,
    /// Submission time; the load time when absent
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> anyhow::Result<AbdmfConfig> {
    Ok(match path {
        Some(p) => AbdmfConfig::from_yaml_file(p)?,
        None => AbdmfConfig::default(),
    })
}

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    Ok(DataLoader::new().load_auto(path)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_scan(
    config_path: Option<&Path>,
    data_path: &Path,
    model_out: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Scan");

    step_run("Loading data");
    let start = Instant::now();
    let df = load_data(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    let mut system = Abdmf::new(load_config(config_path)?)?;

    step_run("Scanning for bias and training model");
    let start = Instant::now();
    let result = system.scan_historical_data(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    let summary = &result.bias_scan.summary;
    section("Bias");
    kv("Records", &summary.total_records.to_string());
    kv("Attributes analyzed", &summary.attributes_analyzed.to_string());
    for (attribute, metric) in &result.bias_scan.detailed_metrics {
        kv(
            attribute,
            &format!(
                "DI {:.3}  SP {:.3}  ({} groups)",
                metric.disparate_impact, metric.statistical_parity, metric.groups_analyzed
            ),
        );
    }
    if summary.significant_bias_detected {
        step_warn("Significant bias detected");
    } else {
        step_ok("No significant bias detected");
    }
    for recommendation in &result.bias_scan.recommendations {
        println!("    {} {}", dim("-"), recommendation);
    }

    section("Model");
    kv("Train accuracy", &format!("{:.4}", result.model_metrics.train.accuracy));
    kv("Validation accuracy", &format!("{:.4}", result.model_metrics.validation.accuracy));

    if let Some(path) = model_out {
        system.save_model(path)?;
        step_ok(&format!("Model saved to {}", path.display()));
    }
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&result)?)?;
        step_ok(&format!("Scan result written to {}", path.display()));
    }
    println!();

    Ok(())
}

pub fn cmd_evaluate(
    config_path: Option<&Path>,
    model_path: &Path,
    candidate_path: &Path,
) -> anyhow::Result<()> {
    let analyzer = DecisionAnalyzer::load_model(model_path)?;
    let mut system = Abdmf::new(load_config(config_path)?)?.with_decision_analyzer(analyzer);

    let candidates = load_data(candidate_path)?;
    let evaluations = (0..candidates.height())
        .map(|i| system.evaluate_candidate(&candidates.slice(i as i64, 1)))
        .collect::<crate::error::Result<Vec<_>>>()?;

    print_json(&evaluations)
}

pub fn cmd_feedback(
    config_path: Option<&Path>,
    file: &Path,
    timeframe_days: Option<u32>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut feedback = FeedbackSystem::new(config.feedback_system)?;

    let content = std::fs::read_to_string(file)?;
    let submissions: Vec<FeedbackSubmission> = serde_json::from_str(&content)?;
    let now = Utc::now();

    let mut rejected = 0usize;
    for (i, submission) in submissions.into_iter().enumerate() {
        let timestamp = submission.timestamp.unwrap_or(now);
        if let Err(e) = feedback.collect_feedback_at(&submission.user_type, submission.payload, timestamp) {
            tracing::warn!(entry = i, error = %e, "Rejected feedback submission");
            rejected += 1;
        }
    }
    tracing::info!(accepted = feedback.len(), rejected, "Loaded feedback");

    print_json(&feedback.analyze_feedback_at(timeframe_days, now))
}

pub fn cmd_generate(samples: usize, seed: u64, biased: bool, output: &Path) -> anyhow::Result<()> {
    let mut generator = HiringDataGenerator::new().with_seed(seed);
    if biased {
        generator = generator.with_bias(InjectedBias::default());
    }
    let mut df = generator.generate(samples)?;
    DataSaver::save_csv(&mut df, output)?;
    step_ok(&format!("{} records written to {}", samples, output.display()));
    Ok(())
}

pub fn cmd_demo(config_path: Option<&Path>, samples: usize, seed: u64) -> anyhow::Result<()> {
    let mut system = Abdmf::new(load_config(config_path)?)?;

    section("Historical data");
    let historical = HiringDataGenerator::new()
        .with_seed(seed)
        .with_bias(InjectedBias::default())
        .generate(samples)?;
    kv("Records", &historical.height().to_string());

    step_run("Scanning historical data");
    let scan = system.scan_historical_data(&historical)?;
    step_done("");
    for (attribute, metric) in &scan.bias_scan.detailed_metrics {
        kv(attribute, &format!("DI {:.3}  SP {:.3}", metric.disparate_impact, metric.statistical_parity));
    }
    for recommendation in &scan.bias_scan.recommendations {
        step_warn(recommendation);
    }

    section("Candidate");
    let candidate = df!(
        "gender" => &["F"],
        "race" => &["B"],
        "age" => &[28i64],
        "experience" => &[5i64],
        "education_level" => &["Master"],
        "education_score" => &[85.0],
        "interview_score" => &[90.0]
    )?;
    let evaluation = system.evaluate_candidate(&candidate)?;
    let analysis = &evaluation.decision_analysis;
    kv("Prediction", if analysis.prediction { "selected" } else { "not selected" });
    kv("Confidence", &format!("{:.3}", analysis.confidence));
    kv("High confidence", &analysis.high_confidence.to_string());
    for (feature, importance) in &analysis.significant_features {
        kv(feature, &format!("{:.3}", importance));
    }

    section("Feedback");
    system.feedback_system_mut().collect_feedback(
        "HR",
        FeedbackPayload::new(4.5, FeedbackCategory::SystemUsability, "System working well"),
    )?;
    step_ok("Collected HR feedback");

    section("System report");
    let report = system.generate_report();
    kv("Total feedback", &report.system_metrics.total_feedback.to_string());
    kv("Candidates evaluated", &report.system_metrics.candidates_evaluated.to_string());
    kv("Records scanned", &report.system_metrics.historical_records_scanned.to_string());
    kv("Generated", &format_timestamp(&report.timestamp));
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_scan() {
        let cli = Cli::try_parse_from([
            "abdmf", "scan", "--data", "history.csv", "--model-out", "model.bin", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Scan { data, model_out, output } => {
                assert_eq!(data, PathBuf::from("history.csv"));
                assert_eq!(model_out, Some(PathBuf::from("model.bin")));
                assert!(output.is_none());
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_feedback_submission_parse() {
        let json = r#"[
            {"user_type": "HR", "satisfaction": 4, "category": "Transparency", "comments": "ok"},
            {"user_type": "Candidate", "satisfaction": 2.5, "timestamp": "2024-05-01T10:00:00Z"}
        ]"#;
        let submissions: Vec<FeedbackSubmission> = serde_json::from_str(json).unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].payload.satisfaction, Some(4.0));
        assert!(submissions[1].payload.comments.is_none());
        assert!(submissions[1].timestamp.is_some());
    }

    #[test]
    fn test_generate_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hiring.csv");
        cmd_generate(25, 1, true, &path).unwrap();
        assert_eq!(load_data(&path).unwrap().height(), 25);
    }
}
