//! SRLP - evaluation harness CLI for self-refining LLM planners
//!
//! ## Commands
//!
//! - `evaluate`: Run the refinement producer over catalog scenarios
//! - `simulate`: Generate a synthetic multi-provider record table
//! - `analyze`: Aggregate a record table into rankings, matrices and tiers
//! - `scenarios`: List or export the scenario catalog
//! - `providers`: List supported provider names

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use srlp_core::scenarios::SCENARIO_KINDS;
use srlp_core::simulator::DEFAULT_SEED;
use srlp_core::stats::{aggregate, pivot, GroupKey, PivotMetric};
use srlp_core::{
    get_all_scenarios, list_providers, read_records_csvs, save_scenarios, simulate, table_digest,
    write_analysis_md, write_evaluation_report_json, write_matrix_csv, write_rankings_csv,
    write_records_csv, AnalysisReport, EvaluationReport, Evaluator, ProviderSelection,
    SimulationConfig, StubRefinementProducer, METRICS,
};

#[derive(Parser)]
#[command(name = "srlp")]
#[command(author = "SRLP Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Self-Refinement for LLM Planners evaluation harness", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate refinement on one or more scenarios
    Evaluate {
        /// Single scenario to evaluate
        #[arg(long, conflicts_with = "scenarios")]
        scenario: Option<String>,

        /// Several scenarios (default: the whole catalog)
        #[arg(long, num_args = 1..)]
        scenarios: Vec<String>,

        /// Provider name (default: SRLP_LLM_PROVIDER, then mock)
        #[arg(long)]
        provider: Option<String>,

        /// Model name (default: SRLP_LLM_MODEL, then the provider default)
        #[arg(long)]
        model: Option<String>,

        /// Maximum refinement iterations
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
        iterations: u32,

        /// Export results to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Generate a synthetic multi-provider record table
    Simulate {
        /// Random seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// TOML file with provider and scenario profiles
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Analyze one or more record tables
    Analyze {
        /// Input CSV paths, concatenated in order
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Directory for the CSV and markdown outputs
        #[arg(long, default_value = "analysis")]
        output_dir: PathBuf,
    },

    /// Scenario catalog
    Scenarios {
        #[command(subcommand)]
        action: ScenarioAction,
    },

    /// List supported providers
    Providers,
}

#[derive(Subcommand)]
enum ScenarioAction {
    /// List catalog scenarios
    List,
    /// Write every catalog scenario as JSON into a directory
    Export {
        #[arg(long)]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    srlp_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Evaluate {
            scenario,
            scenarios,
            provider,
            model,
            iterations,
            export,
        } => cmd_evaluate(
            scenario,
            scenarios,
            provider.as_deref(),
            model.as_deref(),
            iterations,
            export.as_deref(),
        ),
        Commands::Simulate {
            seed,
            profiles,
            output,
        } => cmd_simulate(seed, profiles.as_deref(), &output),
        Commands::Analyze { input, output_dir } => cmd_analyze(&input, &output_dir),
        Commands::Scenarios { action } => match action {
            ScenarioAction::List => cmd_scenarios_list(),
            ScenarioAction::Export { dir } => cmd_scenarios_export(&dir),
        },
        Commands::Providers => cmd_providers(),
    };

    METRICS.flush();
    result
}

fn cmd_evaluate(
    scenario: Option<String>,
    scenarios: Vec<String>,
    provider: Option<&str>,
    model: Option<&str>,
    iterations: u32,
    export: Option<&Path>,
) -> Result<()> {
    let names: Vec<String> = match scenario {
        Some(name) => vec![name],
        None if !scenarios.is_empty() => scenarios,
        None => SCENARIO_KINDS.iter().map(|k| k.to_string()).collect(),
    };

    let selection = match provider {
        Some(provider) => ProviderSelection::resolve(provider, model),
        None => {
            let from_env = ProviderSelection::from_env();
            match model {
                Some(model) => ProviderSelection::resolve(&from_env.provider, Some(model)),
                None => from_env,
            }
        }
    };
    info!(
        provider = %selection.provider,
        model = %selection.model,
        scenarios = names.len(),
        "starting evaluation"
    );

    let evaluator = Evaluator::new(StubRefinementProducer::new(iterations), selection);
    let outcome = evaluator.evaluate_batch(&names);

    for evaluation in &outcome.evaluations {
        let r = &evaluation.record;
        println!(
            "{:<12} initial={:.3} final={:.3} improvement={:+.3} iterations={} converged={}",
            r.scenario, r.initial_quality, r.final_quality, r.improvement, r.iterations, r.converged
        );
    }
    for failure in &outcome.failures {
        println!("{:<12} FAILED: {}", failure.scenario, failure.error);
    }

    let report = EvaluationReport::from_batch(&outcome);
    println!(
        "\n{} scenario(s) with {}/{}: avg improvement {:+.3}, success rate {:.1}%",
        report.summary.total_scenarios,
        report.summary.llm_provider,
        report.summary.llm_model,
        report.summary.avg_improvement,
        report.summary.success_rate * 100.0
    );

    if let Some(path) = export {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => write_records_csv(path, &outcome.records())
                .with_context(|| format!("Failed to export records to {}", path.display()))?,
            Some("json") => write_evaluation_report_json(path, &report)
                .with_context(|| format!("Failed to export report to {}", path.display()))?,
            _ => bail!(
                "Unsupported export format for {}: use .csv or .json",
                path.display()
            ),
        }
        println!("Results exported to {}", path.display());
    }

    if outcome.evaluations.is_empty() && !outcome.failures.is_empty() {
        bail!("every scenario failed");
    }
    Ok(())
}

fn cmd_simulate(seed: u64, profiles: Option<&Path>, output: &Path) -> Result<()> {
    let config = match profiles {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("Failed to load profiles from {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    let records = simulate(&config, seed).context("Simulation failed")?;
    write_records_csv(output, &records)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    let digest = table_digest(&records)?;

    println!("Simulated {} records (seed {})", records.len(), seed);
    println!("  Output: {}", output.display());
    println!("  Digest: {}", digest);
    Ok(())
}

fn cmd_analyze(inputs: &[PathBuf], output_dir: &Path) -> Result<()> {
    let records = read_records_csvs(inputs).context("Failed to read record tables")?;
    info!(files = inputs.len(), records = records.len(), "tables loaded");
    let report = AnalysisReport::build(&records).context("Nothing to analyze")?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    write_rankings_csv(&output_dir.join("provider_rankings.csv"), &report.provider_rankings)?;
    write_rankings_csv(&output_dir.join("model_performance.csv"), &report.model_performance)?;
    write_rankings_csv(&output_dir.join("scenario_difficulty.csv"), &report.scenario_difficulty)?;
    write_rankings_csv(
        &output_dir.join("provider_scenario.csv"),
        &aggregate(&records, GroupKey::ProviderScenario),
    )?;
    write_matrix_csv(&output_dir.join("improvement_matrix.csv"), &report.improvement_matrix)?;
    write_matrix_csv(
        &output_dir.join("final_quality_matrix.csv"),
        &pivot(&records, PivotMetric::FinalQuality),
    )?;
    write_analysis_md(&output_dir.join("analysis.md"), &report)?;

    println!("Analyzed {} records", report.total_records);
    for (rank, group) in report.provider_rankings.iter().enumerate() {
        println!(
            "  {}. {:<12} overall={:.3} final={:.3} convergence={:.1}%",
            rank + 1,
            group.group,
            group.overall_score,
            group.final_quality.mean,
            group.convergence_rate * 100.0
        );
    }
    println!("Reports written to {}", output_dir.display());
    Ok(())
}

#[derive(Serialize)]
struct ScenarioRow<'a> {
    kind: &'a str,
    name: &'a str,
    complexity: f64,
    constraints: usize,
    goal: &'a str,
}

fn cmd_scenarios_list() -> Result<()> {
    let scenarios = get_all_scenarios();
    for s in &scenarios {
        let row = ScenarioRow {
            kind: &s.kind,
            name: &s.name,
            complexity: s.complexity,
            constraints: s.constraints.len(),
            goal: &s.goal,
        };
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}

fn cmd_scenarios_export(dir: &Path) -> Result<()> {
    let written = save_scenarios(dir)
        .with_context(|| format!("Failed to export scenarios to {}", dir.display()))?;
    for path in &written {
        println!("  {}", path.display());
    }
    println!("Exported {} scenarios to {}", written.len(), dir.display());
    Ok(())
}

fn cmd_providers() -> Result<()> {
    for p in list_providers() {
        let key = match &p.api_key_env_var {
            Some(var) => format!("requires {}", var),
            None => "no API key".to_string(),
        };
        println!(
            "{:<12} {:<16} {} ({})",
            p.name, p.default_model, p.description, key
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_defaults() {
        let cli = Cli::try_parse_from(["srlp", "evaluate"]).expect("parse");
        match cli.command {
            Commands::Evaluate {
                scenario,
                scenarios,
                provider,
                iterations,
                export,
                ..
            } => {
                assert!(scenario.is_none());
                assert!(scenarios.is_empty());
                assert!(provider.is_none());
                assert_eq!(iterations, 3);
                assert!(export.is_none());
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(Cli::try_parse_from(["srlp", "evaluate", "--iterations", "0"]).is_err());
    }

    #[test]
    fn scenario_and_scenarios_conflict() {
        let parsed = Cli::try_parse_from([
            "srlp",
            "evaluate",
            "--scenario",
            "travel",
            "--scenarios",
            "cooking",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn simulate_uses_default_seed() {
        let cli = Cli::try_parse_from(["srlp", "simulate", "--output", "out.csv"]).expect("parse");
        match cli.command {
            Commands::Simulate { seed, profiles, .. } => {
                assert_eq!(seed, DEFAULT_SEED);
                assert!(profiles.is_none());
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn evaluate_exports_csv_and_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = dir.path().join("results.csv");
        let json = dir.path().join("results.json");

        cmd_evaluate(None, vec!["travel".into()], Some("mock"), None, 3, Some(&csv)).expect("csv");
        cmd_evaluate(None, vec![], Some("claude"), None, 2, Some(&json)).expect("json");

        let records = read_records_csvs(&[&csv]).expect("read csv");
        assert_eq!(records.len(), 1);
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).expect("read json")).expect("json");
        assert_eq!(raw["summary"]["total_scenarios"], serde_json::json!(5));
        assert_eq!(raw["summary"]["llm_provider"], serde_json::json!("claude"));
    }

    #[test]
    fn unsupported_export_extension_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.xlsx");
        let err = cmd_evaluate(None, vec![], Some("mock"), None, 3, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Unsupported export format"));
    }

    #[test]
    fn simulate_then_analyze_writes_reports() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table = dir.path().join("sim.csv");
        let out = dir.path().join("analysis");

        cmd_simulate(7, None, &table).expect("simulate");
        cmd_analyze(&[table], &out).expect("analyze");

        for name in [
            "provider_rankings.csv",
            "model_performance.csv",
            "scenario_difficulty.csv",
            "provider_scenario.csv",
            "improvement_matrix.csv",
            "final_quality_matrix.csv",
            "analysis.md",
        ] {
            assert!(out.join(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn analyze_missing_input_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = cmd_analyze(&[dir.path().join("absent.csv")], dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("input not found"));
    }

    #[test]
    fn analyze_accepts_several_inputs() {
        let cli = Cli::try_parse_from(["srlp", "analyze", "--input", "a.csv", "b.csv"])
            .expect("parse");
        match cli.command {
            Commands::Analyze { input, .. } => {
                assert_eq!(input, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
            }
            _ => panic!("expected analyze"),
        }
        assert!(Cli::try_parse_from(["srlp", "analyze"]).is_err());
    }

    #[test]
    fn analyze_concatenates_inputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        let out = dir.path().join("analysis");
        cmd_simulate(7, None, &first).expect("simulate first");
        cmd_simulate(8, None, &second).expect("simulate second");

        cmd_analyze(&[first, second], &out).expect("analyze");

        let rankings =
            std::fs::read_to_string(out.join("provider_rankings.csv")).expect("read rankings");
        let total: usize = rankings
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(2).expect("count").parse::<usize>().expect("count"))
            .sum();
        assert_eq!(total, 90);
    }
}
