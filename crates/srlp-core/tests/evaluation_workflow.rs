//! End-to-end evaluation: catalog -> producer -> records -> reports.

use srlp_core::evaluation::{
    EvaluationReport, Evaluator, ProviderSelection, DEFAULT_PROVIDER,
};
use srlp_core::refinement::{ProducerInfo, RefinementProducer, StubRefinementProducer};
use srlp_core::scenarios::{get_all_scenarios, resolve_scenario, DEFAULT_SCENARIO, SCENARIO_KINDS};
use srlp_core::stats::{aggregate, GroupKey};
use srlp_core::{PlanningProblem, RefinementResult};

/// Stub wrapper that returns an empty trace for one problem type.
struct FailsOn {
    kind: &'static str,
    inner: StubRefinementProducer,
}

impl RefinementProducer for FailsOn {
    fn produce(&self, problem: &PlanningProblem) -> RefinementResult {
        let mut result = self.inner.produce(problem);
        if problem.problem_type.as_deref() == Some(self.kind) {
            result.iterations.clear();
        }
        result
    }

    fn describe(&self) -> ProducerInfo {
        self.inner.describe()
    }
}

#[test]
fn unknown_scenario_resolves_to_default_definition() {
    for name in ["", "TRAVEL", "moon_landing", "travel "] {
        let resolution = resolve_scenario(name);
        assert!(resolution.fell_back, "{name:?}");
        assert_eq!(resolution.scenario, resolve_scenario(DEFAULT_SCENARIO).scenario);
    }
}

#[test]
fn whole_catalog_evaluates() {
    let evaluator = Evaluator::new(StubRefinementProducer::new(5), ProviderSelection::default());
    let outcome = evaluator.evaluate_batch(&SCENARIO_KINDS);

    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.evaluations.len(), get_all_scenarios().len());
    for evaluation in &outcome.evaluations {
        evaluation.record.validate().expect("valid record");
        assert!(evaluation.refinement.is_monotone());
        assert_eq!(evaluation.record.iterations, 3);
        assert_eq!(evaluation.record.provider, DEFAULT_PROVIDER);
    }

    let by_scenario = aggregate(&outcome.records(), GroupKey::Scenario);
    assert_eq!(by_scenario.len(), SCENARIO_KINDS.len());
}

#[test]
fn failing_scenario_does_not_stop_siblings() {
    let producer = FailsOn {
        kind: "cooking",
        inner: StubRefinementProducer::default(),
    };
    let evaluator = Evaluator::new(producer, ProviderSelection::resolve("llama", None));
    let outcome = evaluator.evaluate_batch(&["travel", "cooking", "event"]);

    let done: Vec<&str> = outcome
        .evaluations
        .iter()
        .map(|e| e.record.scenario.as_str())
        .collect();
    assert_eq!(done, ["travel", "event"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].scenario, "cooking");
    assert!(outcome.failures[0].error.contains("cooking"));

    let report = EvaluationReport::from_batch(&outcome);
    assert_eq!(report.summary.total_scenarios, 3);
    assert_eq!(report.summary.llm_provider, "llama");
    assert_eq!(report.failures, outcome.failures);
}

#[test]
fn unknown_provider_is_recorded_as_mock() {
    let selection = ProviderSelection::resolve("gpt-5-turbo-ultra", None);
    assert!(selection.fell_back);
    let evaluator = Evaluator::new(StubRefinementProducer::default(), selection);
    let outcome = evaluator.evaluate_batch(&["project"]);
    assert_eq!(outcome.evaluations[0].record.provider, DEFAULT_PROVIDER);
    assert_eq!(outcome.evaluations[0].record.model, "mock-model");
}

#[test]
fn report_json_uses_external_field_names() {
    let evaluator = Evaluator::new(StubRefinementProducer::default(), ProviderSelection::default());
    let report = EvaluationReport::from_batch(&evaluator.evaluate_batch(&["renovation"]));
    let raw = serde_json::to_value(&report).expect("serialize");

    let check = &raw["detailed_results"][0]["refinement"]["iterations"][0];
    assert_eq!(check["iteration"], serde_json::json!(1));
    assert!(check["uncertainty_scores"]["planning"].is_number());
    assert_eq!(
        raw["detailed_results"][0]["refinement"]["initial_plan"]["type"],
        serde_json::json!("renovation")
    );
    assert!(raw["generated_at"].as_str().expect("timestamp").ends_with('Z'));
}
