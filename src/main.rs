//! ABDMF - Main Entry Point
//!
//! Command-line front end for bias scanning, candidate evaluation and
//! feedback analysis.

use abdmf::cli::{cmd_demo, cmd_evaluate, cmd_feedback, cmd_generate, cmd_scan, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "abdmf=debug" } else { "abdmf=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Scan { data, model_out, output } => {
            cmd_scan(config, &data, model_out.as_deref(), output.as_deref())?;
        }
        Commands::Evaluate { model, candidate } => {
            cmd_evaluate(config, &model, &candidate)?;
        }
        Commands::Feedback { file, timeframe_days } => {
            cmd_feedback(config, &file, timeframe_days)?;
        }
        Commands::Generate { samples, seed, biased, output } => {
            cmd_generate(samples, seed, biased, &output)?;
        }
        Commands::Demo { samples, seed } => {
            cmd_demo(config, samples, seed)?;
        }
    }

    Ok(())
}
