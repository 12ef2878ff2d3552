//! Static catalog of planning scenarios.
//!
//! Five fixed problems (travel, cooking, project, event, renovation). Lookup
//! by an unknown name never fails: it resolves to the travel scenario and the
//! fallback is logged so typos stay observable.

use std::path::{Path, PathBuf};

use crate::domain::{Constraint, Result, ScenarioDefinition, SrlpError};
use crate::metrics::METRICS;
use crate::obs;

/// Kind id returned for unrecognized scenario names.
pub const DEFAULT_SCENARIO: &str = "travel";

/// Catalog kind ids in catalog order.
pub const SCENARIO_KINDS: [&str; 5] = ["travel", "cooking", "project", "event", "renovation"];

/// Complexity used for custom scenarios whose kind is not in the catalog.
pub const DEFAULT_COMPLEXITY: f64 = 0.5;

/// Fixed complexity per catalog kind.
pub fn complexity_for_kind(kind: &str) -> Option<f64> {
    match kind {
        "travel" => Some(0.6),
        "cooking" => Some(0.4),
        "project" => Some(0.8),
        "event" | "renovation" => Some(0.7),
        _ => None,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn scenario(
    name: &str,
    kind: &str,
    goal: &str,
    description: &str,
    constraints: &[(&str, &str)],
    requirements: &[&str],
) -> ScenarioDefinition {
    ScenarioDefinition {
        name: name.to_string(),
        kind: kind.to_string(),
        goal: goal.to_string(),
        description: description.to_string(),
        constraints: constraints
            .iter()
            .map(|(k, v)| Constraint::new(k, v))
            .collect(),
        requirements: strings(requirements),
        complexity: complexity_for_kind(kind).unwrap_or(DEFAULT_COMPLEXITY),
    }
}

pub fn travel_scenario() -> ScenarioDefinition {
    scenario(
        "travel_planning",
        "travel",
        "Plan a 3-day trip to Paris within budget",
        "Plan a complete 3-day vacation to Paris including flights, accommodation, activities, and meals",
        &[
            ("budget", "$1200"),
            ("time", "3 days"),
            ("resource", "single traveler"),
        ],
        &[
            "Book round-trip flights",
            "Reserve accommodation for 3 nights",
            "Plan daily activities and sightseeing",
            "Include meal planning",
            "Arrange airport transportation",
            "Prepare travel documents",
        ],
    )
}

pub fn cooking_scenario() -> ScenarioDefinition {
    scenario(
        "cooking_dinner",
        "cooking",
        "Prepare a healthy dinner for 4 people in 1 hour",
        "Cook a complete healthy dinner including main course, side dish, and dessert",
        &[
            ("time", "1 hour"),
            ("dietary", "low-carb, gluten-free"),
            ("budget", "$30"),
        ],
        &[
            "Prepare main protein dish",
            "Include vegetable side dishes",
            "Prepare healthy dessert option",
            "Ensure all dietary restrictions are met",
            "Complete cooking within time limit",
        ],
    )
}

pub fn project_scenario() -> ScenarioDefinition {
    scenario(
        "software_project",
        "project",
        "Develop and deploy a web application in 8 weeks",
        "Plan and execute a complete software development project from requirements to deployment",
        &[
            ("time", "8 weeks"),
            ("budget", "$50000"),
            ("resource", "5 developers"),
            ("quality", "production-ready"),
        ],
        &[
            "Gather and document requirements",
            "Design system architecture",
            "Implement core functionality",
            "Conduct thorough testing",
            "Deploy to production environment",
            "Provide user documentation and training",
        ],
    )
}

pub fn event_scenario() -> ScenarioDefinition {
    scenario(
        "conference_planning",
        "event",
        "Organize a 2-day technical conference for 200 attendees",
        "Plan and execute a complete technical conference including venue, speakers, catering, and logistics",
        &[
            ("budget", "$25000"),
            ("time", "3 months planning time"),
            ("venue", "downtown location"),
            ("capacity", "200 people maximum"),
        ],
        &[
            "Secure appropriate venue",
            "Recruit and coordinate speakers",
            "Arrange catering for all meals",
            "Set up registration system",
            "Plan networking activities",
            "Coordinate audio/visual equipment",
            "Manage day-of logistics",
        ],
    )
}

pub fn renovation_scenario() -> ScenarioDefinition {
    scenario(
        "kitchen_renovation",
        "renovation",
        "Renovate kitchen within budget and timeline",
        "Complete kitchen renovation including design, permits, construction, and finishing",
        &[
            ("budget", "$15000"),
            ("time", "6 weeks"),
            ("permits", "required for electrical and plumbing"),
            ("living", "minimize disruption to daily life"),
        ],
        &[
            "Design new kitchen layout",
            "Obtain necessary permits",
            "Demolish existing kitchen",
            "Install new plumbing and electrical",
            "Install cabinets and countertops",
            "Complete flooring and painting",
            "Final inspection and cleanup",
        ],
    )
}

/// All catalog scenarios, in catalog order.
pub fn get_all_scenarios() -> Vec<ScenarioDefinition> {
    vec![
        travel_scenario(),
        cooking_scenario(),
        project_scenario(),
        event_scenario(),
        renovation_scenario(),
    ]
}

/// Outcome of a catalog lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResolution {
    pub scenario: ScenarioDefinition,
    /// True when the requested name was unknown and the default was returned.
    pub fell_back: bool,
}

/// Look up a scenario by kind id, reporting whether the default was used.
pub fn resolve_scenario(name: &str) -> ScenarioResolution {
    let found = match name {
        "travel" => Some(travel_scenario()),
        "cooking" => Some(cooking_scenario()),
        "project" => Some(project_scenario()),
        "event" => Some(event_scenario()),
        "renovation" => Some(renovation_scenario()),
        _ => None,
    };

    match found {
        Some(scenario) => ScenarioResolution {
            scenario,
            fell_back: false,
        },
        None => {
            METRICS.inc_fallbacks();
            obs::emit_scenario_fallback(name, DEFAULT_SCENARIO);
            ScenarioResolution {
                scenario: travel_scenario(),
                fell_back: true,
            }
        }
    }
}

/// Look up a scenario by kind id, falling back to [`DEFAULT_SCENARIO`].
pub fn get_scenario_by_name(name: &str) -> ScenarioDefinition {
    resolve_scenario(name).scenario
}

/// Build a scenario outside the catalog.
pub fn create_custom_scenario(
    name: &str,
    kind: &str,
    goal: &str,
    constraints: Vec<Constraint>,
    requirements: Vec<String>,
) -> ScenarioDefinition {
    ScenarioDefinition {
        name: name.to_string(),
        kind: kind.to_string(),
        goal: goal.to_string(),
        description: format!("Custom scenario: {goal}"),
        constraints,
        requirements,
        complexity: complexity_for_kind(kind).unwrap_or(DEFAULT_COMPLEXITY),
    }
}

/// Write every catalog scenario to `<dir>/<name>.json`.
pub fn save_scenarios(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for scenario in get_all_scenarios() {
        let path = dir.join(format!("{}.json", scenario.name));
        std::fs::write(&path, serde_json::to_string_pretty(&scenario)?)?;
        tracing::debug!(path = %path.display(), "scenario saved");
        written.push(path);
    }
    Ok(written)
}

/// Read a scenario previously written by [`save_scenarios`].
pub fn load_scenario(path: &Path) -> Result<ScenarioDefinition> {
    if !path.exists() {
        return Err(SrlpError::InputNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_five_scenarios_in_order() {
        let kinds: Vec<String> = get_all_scenarios().into_iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SCENARIO_KINDS.map(|k| k.to_string()).to_vec());
    }

    #[test]
    fn known_name_resolves_without_fallback() {
        let resolution = resolve_scenario("project");
        assert!(!resolution.fell_back);
        assert_eq!(resolution.scenario.name, "software_project");
        assert_eq!(resolution.scenario.complexity, 0.8);
    }

    #[test]
    fn unknown_name_falls_back_to_travel() {
        for name in ["", "Travel", "travle", "space_mission"] {
            let resolution = resolve_scenario(name);
            assert!(resolution.fell_back, "{name:?} should fall back");
            assert_eq!(resolution.scenario, travel_scenario());
            assert_eq!(get_scenario_by_name(name), travel_scenario());
        }
    }

    #[test]
    fn full_scenario_name_is_not_a_lookup_key() {
        assert!(resolve_scenario("cooking_dinner").fell_back);
    }

    #[test]
    fn custom_scenario_uses_kind_complexity() {
        let custom = create_custom_scenario(
            "garden",
            "renovation",
            "Redo the garden",
            vec![Constraint::new("budget", "$500")],
            vec!["Plant trees".to_string()],
        );
        assert_eq!(custom.description, "Custom scenario: Redo the garden");
        assert_eq!(custom.complexity, 0.7);

        let other = create_custom_scenario("x", "wedding", "Plan it", vec![], vec![]);
        assert_eq!(other.complexity, DEFAULT_COMPLEXITY);
    }

    #[test]
    fn save_and_load_scenarios() {
        let dir = tempfile::tempdir().expect("tempdir");
        let written = save_scenarios(dir.path()).expect("save");
        assert_eq!(written.len(), 5);

        let loaded =
            load_scenario(&dir.path().join("kitchen_renovation.json")).expect("load scenario");
        assert_eq!(loaded, renovation_scenario());
    }

    #[test]
    fn load_missing_scenario_is_input_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_scenario(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SrlpError::InputNotFound(_)));
    }
}
