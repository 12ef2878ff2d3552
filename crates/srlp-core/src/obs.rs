//! Structured observability hooks for SRLP runs.
//!
//! This module provides:
//! - Batch-scoped tracing spans via the `EvaluationSpan` RAII guard
//! - Emission functions for key lifecycle events: simulation, scenario
//!   evaluation, fallbacks and report writes
//!
//! Events are emitted at `info!` level, fallbacks and failures at `warn!`.
//! Filtering follows `SRLP_LOG` / `RUST_LOG` (see [`crate::telemetry`]).

use std::path::Path;

use tracing::{info, warn};

/// RAII guard that enters a span for the duration of an evaluation batch.
///
/// # Example
///
/// ```ignore
/// let _span = EvaluationSpan::enter(&run_id, "mock");
/// // every event inside the batch carries run_id and provider
/// ```
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    /// Create and enter a span tagged with the run id and provider.
    pub fn enter(run_id: &str, provider: &str) -> Self {
        let span = tracing::info_span!("srlp.evaluation", run_id = %run_id, provider = %provider);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: simulator produced a table.
pub fn emit_simulation_finished(seed: u64, records: usize, providers: usize, scenarios: usize) {
    info!(
        event = "simulation.finished",
        seed = seed,
        records = records,
        providers = providers,
        scenarios = scenarios,
    );
}

/// Emit event: one scenario evaluated.
pub fn emit_scenario_evaluated(scenario: &str, initial: f64, final_quality: f64, converged: bool) {
    info!(
        event = "scenario.evaluated",
        scenario = %scenario,
        initial_quality = initial,
        final_quality = final_quality,
        converged = converged,
    );
}

/// Emit event: one scenario in a batch failed (siblings continue).
pub fn emit_scenario_failed(scenario: &str, error: &dyn std::fmt::Display) {
    warn!(event = "scenario.failed", scenario = %scenario, error = %error);
}

/// Emit event: unknown scenario name resolved to the default.
pub fn emit_scenario_fallback(requested: &str, resolved: &str) {
    warn!(
        event = "scenario.fallback",
        requested = %requested,
        resolved = %resolved,
        "unknown scenario name, using default"
    );
}

/// Emit event: unknown provider name resolved to the default.
pub fn emit_provider_fallback(requested: &str, resolved: &str) {
    warn!(
        event = "provider.fallback",
        requested = %requested,
        resolved = %resolved,
        "unknown provider name, using default"
    );
}

/// Emit event: a report artifact was written.
pub fn emit_report_written(kind: &str, path: &Path) {
    info!(event = "report.written", kind = %kind, path = %path.display());
}
