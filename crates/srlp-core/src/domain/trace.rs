//! Refinement traces: plans, per-iteration check records and the overall result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A plan produced for a planning problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "type")]
    pub plan_type: String,
    pub goal: String,
    pub steps: Vec<String>,
    pub estimated_cost: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optimizations: Vec<String>,
}

/// Feedback attached to one refinement step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub summary: String,
    pub suggestions: Vec<String>,
}

/// One step of a refinement trace.
///
/// # Invariants
///
/// Across a trace, `overall_score` is non-decreasing and `error_count` is
/// non-increasing. Producers guarantee this by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementIterationRecord {
    /// 1-based step index.
    pub iteration: u32,
    pub overall_score: f64,
    pub error_count: u32,
    pub errors: Vec<String>,
    pub constraint_violations: u32,
    pub uncertainty_scores: BTreeMap<String, f64>,
    pub semantic_consistency: f64,
    pub completeness_score: f64,
    pub feedback: Feedback,
}

/// Output of a refinement producer for one problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementResult {
    pub initial_plan: Plan,
    pub final_plan: Plan,
    pub iterations: Vec<RefinementIterationRecord>,
    pub converged: bool,
    pub improvement_score: f64,
    /// Seconds.
    pub total_time: f64,
}

impl RefinementResult {
    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    /// First check record of the trace, if any.
    pub fn initial_check(&self) -> Option<&RefinementIterationRecord> {
        self.iterations.first()
    }

    /// Last check record of the trace, if any.
    pub fn final_check(&self) -> Option<&RefinementIterationRecord> {
        self.iterations.last()
    }

    /// True when scores never drop and error counts never rise between steps.
    pub fn is_monotone(&self) -> bool {
        self.iterations.windows(2).all(|pair| {
            pair[1].overall_score >= pair[0].overall_score
                && pair[1].error_count <= pair[0].error_count
        })
    }
}
