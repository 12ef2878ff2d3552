//! Refinement producers.
//!
//! [`RefinementProducer`] is the seam a real LLM-backed refiner would plug
//! into. The only implementation shipped here is [`StubRefinementProducer`],
//! whose output does not depend on the problem it is given: the trace length
//! is `min(3, max_iterations)`, the improvement score is 0.25, the run always
//! converges and takes 2.5 seconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Feedback, Plan, PlanningProblem, RefinementIterationRecord, RefinementResult};

/// Fixed trace length cap of the stub.
pub const STUB_TRACE_LEN: u32 = 3;
/// Improvement score reported by the stub for every problem.
pub const STUB_IMPROVEMENT_SCORE: f64 = 0.25;
/// Total time reported by the stub, in seconds.
pub const STUB_TOTAL_TIME: f64 = 2.5;

pub const DEFAULT_PROBLEM_TYPE: &str = "general";
pub const DEFAULT_GOAL: &str = "No goal specified";

/// Describes a producer for reports and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerInfo {
    pub name: String,
    /// True when output does not depend on the input problem.
    pub is_stub: bool,
    pub max_iterations: u32,
}

/// Something that turns a planning problem into a refinement trace.
pub trait RefinementProducer {
    fn produce(&self, problem: &PlanningProblem) -> RefinementResult;

    fn describe(&self) -> ProducerInfo;
}

/// Fixed-outcome producer standing in for an LLM refinement loop.
#[derive(Debug, Clone, PartialEq)]
pub struct StubRefinementProducer {
    pub max_iterations: u32,
    /// Carried for callers; the stub never consults it.
    pub quality_threshold: f64,
}

impl Default for StubRefinementProducer {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            quality_threshold: 0.8,
        }
    }
}

impl StubRefinementProducer {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Number of check records every trace will contain.
    pub fn trace_len(&self) -> u32 {
        STUB_TRACE_LEN.min(self.max_iterations)
    }

    fn plan_header(problem: &PlanningProblem) -> (String, String) {
        let plan_type = problem
            .problem_type
            .clone()
            .unwrap_or_else(|| DEFAULT_PROBLEM_TYPE.to_string());
        let goal = problem
            .goal
            .clone()
            .unwrap_or_else(|| DEFAULT_GOAL.to_string());
        (plan_type, goal)
    }

    fn check_record(step: u32) -> RefinementIterationRecord {
        let i = f64::from(step);
        let error_count = 3u32.saturating_sub(step);
        let iteration = step + 1;
        RefinementIterationRecord {
            iteration,
            overall_score: 0.6 + i * 0.1,
            error_count,
            errors: (1..=error_count).map(|j| format!("Error {j}")).collect(),
            constraint_violations: 2u32.saturating_sub(step),
            uncertainty_scores: BTreeMap::from([("planning".to_string(), 0.7 + i * 0.1)]),
            semantic_consistency: 0.8 + i * 0.05,
            completeness_score: 0.7 + i * 0.1,
            feedback: Feedback {
                summary: format!(
                    "Iteration {iteration}: Improved planning details and constraint handling"
                ),
                suggestions: (1..=2)
                    .map(|j| format!("Suggestion {j} for iteration {iteration}"))
                    .collect(),
            },
        }
    }
}

impl RefinementProducer for StubRefinementProducer {
    fn produce(&self, problem: &PlanningProblem) -> RefinementResult {
        let (plan_type, goal) = Self::plan_header(problem);

        let initial_plan = Plan {
            plan_type: plan_type.clone(),
            goal: goal.clone(),
            steps: vec![
                "Step 1: Initial analysis".to_string(),
                "Step 2: Basic planning".to_string(),
                "Step 3: Resource allocation".to_string(),
            ],
            estimated_cost: "$1000".to_string(),
            duration: "3 days".to_string(),
            optimizations: Vec::new(),
        };

        let final_plan = Plan {
            plan_type,
            goal,
            steps: vec![
                "Step 1: Comprehensive analysis with constraints".to_string(),
                "Step 2: Detailed planning with optimization".to_string(),
                "Step 3: Efficient resource allocation".to_string(),
                "Step 4: Risk assessment and mitigation".to_string(),
                "Step 5: Final validation and approval".to_string(),
            ],
            estimated_cost: "$1200".to_string(),
            duration: "3 days".to_string(),
            optimizations: vec![
                "Cost reduction".to_string(),
                "Time efficiency".to_string(),
                "Quality improvement".to_string(),
            ],
        };

        let iterations = (0..self.trace_len()).map(Self::check_record).collect();

        RefinementResult {
            initial_plan,
            final_plan,
            iterations,
            converged: true,
            improvement_score: STUB_IMPROVEMENT_SCORE,
            total_time: STUB_TOTAL_TIME,
        }
    }

    fn describe(&self) -> ProducerInfo {
        ProducerInfo {
            name: "stub".to_string(),
            is_stub: true,
            max_iterations: self.max_iterations,
        }
    }
}
