//! Scenario evaluation runner.
//!
//! Resolves a provider selection and a list of scenario names, runs a
//! [`RefinementProducer`] per scenario and turns each trace into an
//! [`EvaluationRecord`]. Unknown provider and scenario names fall back to
//! defaults (logged, never an error). A failing scenario is reported in the
//! batch outcome and does not stop its siblings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    round_places, EvaluationRecord, PlanningProblem, RefinementResult, Result, SrlpError,
};
use crate::metrics::METRICS;
use crate::obs::{self, EvaluationSpan};
use crate::refinement::RefinementProducer;
use crate::scenarios::resolve_scenario;
use crate::stats::mean;

/// Provider used when the requested one is unknown.
pub const DEFAULT_PROVIDER: &str = "mock";

pub const PROVIDER_ENV: &str = "SRLP_LLM_PROVIDER";
pub const MODEL_ENV: &str = "SRLP_LLM_MODEL";

/// Static description of a supported provider name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub description: String,
    pub default_model: String,
    pub requires_api_key: bool,
    pub api_key_env_var: Option<String>,
}

fn info(name: &str, description: &str, default_model: &str, key_env: Option<&str>) -> ProviderInfo {
    ProviderInfo {
        name: name.to_string(),
        description: description.to_string(),
        default_model: default_model.to_string(),
        requires_api_key: key_env.is_some(),
        api_key_env_var: key_env.map(str::to_string),
    }
}

/// Every provider name the harness recognizes.
pub fn list_providers() -> Vec<ProviderInfo> {
    vec![
        info("openai", "OpenAI chat models", "gpt-4", Some("OPENAI_API_KEY")),
        info("claude", "Anthropic Claude models", "claude-3-sonnet", Some("ANTHROPIC_API_KEY")),
        info("llama", "Local LLaMA models served by Ollama", "llama2", None),
        info("huggingface", "Hugging Face inference models", "gpt2", Some("HUGGINGFACE_API_KEY")),
        info("mock", "Offline mock provider for testing", "mock-model", None),
    ]
}

/// Resolved provider/model pair recorded on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub provider: String,
    pub model: String,
    /// True when the requested provider was unknown.
    pub fell_back: bool,
}

impl Default for ProviderSelection {
    fn default() -> Self {
        Self::resolve(DEFAULT_PROVIDER, None)
    }
}

impl ProviderSelection {
    /// Resolve a provider name and optional model.
    ///
    /// Unknown providers become [`DEFAULT_PROVIDER`] with its default model,
    /// ignoring the requested model. A missing model uses the provider's
    /// default.
    pub fn resolve(provider: &str, model: Option<&str>) -> Self {
        let providers = list_providers();
        match providers.iter().find(|p| p.name == provider) {
            Some(found) => Self {
                provider: found.name.clone(),
                model: model
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| found.default_model.clone()),
                fell_back: false,
            },
            None => {
                METRICS.inc_fallbacks();
                obs::emit_provider_fallback(provider, DEFAULT_PROVIDER);
                let fallback = providers
                    .into_iter()
                    .find(|p| p.name == DEFAULT_PROVIDER)
                    .map(|p| p.default_model)
                    .unwrap_or_default();
                Self {
                    provider: DEFAULT_PROVIDER.to_string(),
                    model: fallback,
                    fell_back: true,
                }
            }
        }
    }

    /// Resolve from `SRLP_LLM_PROVIDER` / `SRLP_LLM_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = lookup(PROVIDER_ENV).unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let model = lookup(MODEL_ENV);
        Self::resolve(&provider, model.as_deref())
    }
}

/// One evaluated scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvaluation {
    /// Name as passed in by the caller.
    pub requested: String,
    /// True when `requested` was unknown and the default scenario ran.
    pub fell_back: bool,
    pub problem: PlanningProblem,
    pub refinement: RefinementResult,
    pub record: EvaluationRecord,
}

/// A scenario that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFailure {
    pub scenario: String,
    pub error: String,
}

/// Result of evaluating several scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub selection: ProviderSelection,
    pub evaluations: Vec<ScenarioEvaluation>,
    pub failures: Vec<ScenarioFailure>,
}

impl BatchOutcome {
    /// Flat record table for CSV export and aggregation.
    pub fn records(&self) -> Vec<EvaluationRecord> {
        self.evaluations.iter().map(|e| e.record.clone()).collect()
    }
}

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Headline numbers of an evaluation batch.
///
/// Averages are 0.0 when no scenario succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_scenarios: usize,
    pub avg_initial_quality: f64,
    pub avg_final_quality: f64,
    pub avg_improvement: f64,
    /// Share of evaluated scenarios whose refinement converged.
    pub success_rate: f64,
    pub avg_iterations: f64,
    pub llm_provider: String,
    pub llm_model: String,
}

/// JSON export of an evaluation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub schema_version: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: EvaluationSummary,
    pub detailed_results: Vec<ScenarioEvaluation>,
    pub failures: Vec<ScenarioFailure>,
}

impl EvaluationReport {
    pub fn from_batch(outcome: &BatchOutcome) -> Self {
        let records = outcome.records();
        let column = |f: fn(&EvaluationRecord) -> f64| -> Vec<f64> {
            records.iter().map(f).collect()
        };
        let converged = records.iter().filter(|r| r.converged).count();
        let success_rate = if records.is_empty() {
            0.0
        } else {
            converged as f64 / records.len() as f64
        };

        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            run_id: outcome.run_id,
            generated_at: Utc::now(),
            summary: EvaluationSummary {
                total_scenarios: outcome.evaluations.len() + outcome.failures.len(),
                avg_initial_quality: mean(&column(|r| r.initial_quality)),
                avg_final_quality: mean(&column(|r| r.final_quality)),
                avg_improvement: mean(&column(|r| r.improvement)),
                success_rate,
                avg_iterations: mean(&column(|r| f64::from(r.iterations))),
                llm_provider: outcome.selection.provider.clone(),
                llm_model: outcome.selection.model.clone(),
            },
            detailed_results: outcome.evaluations.clone(),
            failures: outcome.failures.clone(),
        }
    }
}

/// Runs a producer over catalog scenarios for one provider selection.
pub struct Evaluator<P: RefinementProducer> {
    producer: P,
    selection: ProviderSelection,
}

impl<P: RefinementProducer> Evaluator<P> {
    pub fn new(producer: P, selection: ProviderSelection) -> Self {
        Self {
            producer,
            selection,
        }
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    /// Evaluate one scenario by name.
    pub fn evaluate_scenario(&self, name: &str) -> Result<ScenarioEvaluation> {
        let resolution = resolve_scenario(name);
        let scenario = resolution.scenario;
        let problem = scenario.problem();
        let refinement = self.producer.produce(&problem);

        let (first, last) = match (refinement.initial_check(), refinement.final_check()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SrlpError::EmptyTrace(name.to_string())),
        };
        let initial_quality = round_places(first.overall_score, 6);
        let final_quality = round_places(last.overall_score, 6);

        let record = EvaluationRecord {
            scenario: scenario.kind.clone(),
            provider: self.selection.provider.clone(),
            model: self.selection.model.clone(),
            initial_quality,
            final_quality,
            improvement: round_places(final_quality - initial_quality, 6),
            converged: refinement.converged,
            iterations: refinement.iteration_count() as u32,
            time_seconds: refinement.total_time,
            scenario_complexity: scenario.complexity,
        };
        record.validate()?;

        METRICS.inc_scenarios_evaluated();
        obs::emit_scenario_evaluated(
            &record.scenario,
            record.initial_quality,
            record.final_quality,
            record.converged,
        );

        Ok(ScenarioEvaluation {
            requested: name.to_string(),
            fell_back: resolution.fell_back,
            problem,
            refinement,
            record,
        })
    }

    /// Evaluate each name in order, collecting failures instead of aborting.
    pub fn evaluate_batch<S: AsRef<str>>(&self, names: &[S]) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        let _span = EvaluationSpan::enter(&run_id.to_string(), &self.selection.provider);

        let mut evaluations = Vec::with_capacity(names.len());
        let mut failures = Vec::new();
        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();
            tracing::debug!(index = index + 1, total = names.len(), scenario = %name, "evaluating");
            match self.evaluate_scenario(name) {
                Ok(evaluation) => evaluations.push(evaluation),
                Err(e) => {
                    METRICS.inc_scenario_failures();
                    obs::emit_scenario_failed(name, &e);
                    failures.push(ScenarioFailure {
                        scenario: name.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        BatchOutcome {
            run_id,
            selection: self.selection.clone(),
            evaluations,
            failures,
        }
    }
}
