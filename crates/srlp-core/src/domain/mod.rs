//! Domain models for SRLP.
//!
//! Canonical definitions for the core entities:
//! - `EvaluationRecord`: outcome row for a (provider, model, scenario) run
//! - `ScenarioDefinition`: static planning problem from the catalog
//! - `RefinementResult`: plans plus per-iteration check records

pub mod error;
pub mod record;
pub mod scenario;
pub mod trace;

// Re-export main types and errors
pub use error::{Result, SrlpError};
pub use record::{
    round_places, EvaluationRecord, PerformanceTier, QualityChange, SUCCESS_THRESHOLD,
};
pub use scenario::{Constraint, PlanningProblem, ScenarioDefinition};
pub use trace::{Feedback, Plan, RefinementIterationRecord, RefinementResult};
