//! SRLP Core Library
//!
//! Evaluation harness for self-refining LLM planners: scenario catalog,
//! refinement producers, a seeded multi-provider result simulator,
//! statistics over evaluation records and flat-file reporting.

pub mod domain;
pub mod evaluation;
pub mod metrics;
pub mod obs;
pub mod records;
pub mod refinement;
pub mod reporting;
pub mod scenarios;
pub mod simulator;
pub mod stats;
pub mod telemetry;

pub use domain::{
    round_places, Constraint, EvaluationRecord, Feedback, PerformanceTier, Plan, PlanningProblem,
    QualityChange, RefinementIterationRecord, RefinementResult, Result, ScenarioDefinition,
    SrlpError, SUCCESS_THRESHOLD,
};

pub use evaluation::{
    list_providers, BatchOutcome, EvaluationReport, EvaluationSummary, Evaluator, ProviderInfo,
    ProviderSelection, ScenarioEvaluation, ScenarioFailure,
};

pub use records::{read_records_csv, read_records_csvs, table_digest, write_records_csv};

pub use refinement::{ProducerInfo, RefinementProducer, StubRefinementProducer};

pub use reporting::{
    render_analysis_md, write_analysis_md, write_evaluation_report_json, write_matrix_csv,
    write_rankings_csv,
};

pub use scenarios::{
    create_custom_scenario, get_all_scenarios, get_scenario_by_name, load_scenario,
    resolve_scenario, save_scenarios,
};

pub use simulator::{simulate, simulate_with_rng, ProviderProfile, ScenarioProfile, SimulationConfig};

pub use stats::{
    aggregate, pivot, quality_changes, rank_by_overall_score, success_rate, AnalysisReport,
    ChangeDistribution, GroupKey, GroupStats, PivotMetric, PivotTable,
};

pub use metrics::METRICS;
pub use telemetry::init_tracing;

/// Crate version, as recorded in reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
