//! Planning scenario and problem definitions.

use serde::{Deserialize, Serialize};

/// A single typed constraint on a planning problem, e.g. `budget = $1200`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Constraint {
    pub fn new(kind: &str, value: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }
}

/// Problem handed to a refinement producer.
///
/// Every field is optional on the wire; producers substitute defaults for
/// missing `type` and `goal` rather than rejecting the problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningProblem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

/// Static catalog entry describing a named planning problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// File-friendly name, e.g. `travel_planning`.
    pub name: String,
    /// Scenario type id, e.g. `travel`.
    pub kind: String,
    pub goal: String,
    pub description: String,
    pub constraints: Vec<Constraint>,
    pub requirements: Vec<String>,
    /// Fixed scalar in [0, 1].
    pub complexity: f64,
}

impl ScenarioDefinition {
    /// Problem view of this scenario for a refinement producer.
    pub fn problem(&self) -> PlanningProblem {
        PlanningProblem {
            problem_type: Some(self.kind.clone()),
            goal: Some(self.goal.clone()),
            description: Some(self.description.clone()),
            constraints: self.constraints.clone(),
            requirements: self.requirements.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_serializes_kind_as_type() {
        let c = Constraint::new("budget", "$1200");
        let raw = serde_json::to_value(&c).expect("serialize");
        assert_eq!(raw, serde_json::json!({"type": "budget", "value": "$1200"}));
    }

    #[test]
    fn test_problem_tolerates_missing_fields() {
        let problem: PlanningProblem =
            serde_json::from_str(r#"{"description": "no type or goal"}"#).expect("deserialize");
        assert!(problem.problem_type.is_none());
        assert!(problem.goal.is_none());
        assert!(problem.constraints.is_empty());
    }
}
