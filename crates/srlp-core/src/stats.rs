//! Group-by statistics over evaluation records.
//!
//! Groups are keyed by provider, scenario, provider x scenario or
//! provider x model and emitted in ascending key order. Standard deviations
//! are sample deviations (n - 1) and are absent for single-record groups.
//!
//! # Overall score
//!
//! ```text
//! overall = 0.4 * mean(final_quality)
//!         + 0.3 * mean(improvement) * 100
//!         + 0.2 * convergence_rate
//!         + 0.1 * success_rate
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{EvaluationRecord, PerformanceTier, QualityChange, Result, SrlpError};

pub const FINAL_QUALITY_WEIGHT: f64 = 0.4;
pub const IMPROVEMENT_WEIGHT: f64 = 0.3;
/// Improvement is scaled to percentage points before weighting.
pub const IMPROVEMENT_SCALE: f64 = 100.0;
pub const CONVERGENCE_WEIGHT: f64 = 0.2;
pub const SUCCESS_WEIGHT: f64 = 0.1;

/// Dimension(s) to group records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Provider,
    Scenario,
    ProviderScenario,
    ProviderModel,
}

impl GroupKey {
    fn id_for(self, record: &EvaluationRecord) -> GroupId {
        match self {
            Self::Provider => GroupId::single(&record.provider),
            Self::Scenario => GroupId::single(&record.scenario),
            Self::ProviderScenario => GroupId::pair(&record.provider, &record.scenario),
            Self::ProviderModel => GroupId::pair(&record.provider, &record.model),
        }
    }
}

/// Identifier of one group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId {
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl GroupId {
    pub fn single(primary: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: None,
        }
    }

    pub fn pair(primary: &str, secondary: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: Some(secondary.to_string()),
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Some(secondary) => write!(f, "{}/{}", self.primary, secondary),
            None => f.write_str(&self.primary),
        }
    }
}

/// Mean and sample standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std: Option<f64>,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std: sample_std(values),
        }
    }
}

/// Aggregate statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub group: GroupId,
    pub count: usize,
    pub initial_quality: Summary,
    pub final_quality: Summary,
    pub improvement: Summary,
    pub time_seconds: Summary,
    pub convergence_rate: f64,
    pub success_rate: f64,
    pub mean_iterations: f64,
    /// Mean of [`EvaluationRecord::improvement_percent`].
    pub mean_improvement_percent: f64,
    /// Mean final quality per second.
    pub mean_efficiency: f64,
    pub mean_improvement_per_iteration: f64,
    pub scenario_complexity: f64,
    pub overall_score: f64,
}

impl GroupStats {
    fn from_records(group: GroupId, records: &[&EvaluationRecord]) -> Self {
        let column = |f: fn(&EvaluationRecord) -> f64| -> Vec<f64> {
            records.iter().map(|r| f(r)).collect()
        };

        let initial_quality = Summary::of(&column(|r| r.initial_quality));
        let final_quality = Summary::of(&column(|r| r.final_quality));
        let improvement = Summary::of(&column(|r| r.improvement));
        let time_seconds = Summary::of(&column(|r| r.time_seconds));
        let convergence_rate = mean(&column(|r| if r.converged { 1.0 } else { 0.0 }));
        let success_rate = success_rate(records.iter().copied());

        Self {
            group,
            count: records.len(),
            initial_quality,
            final_quality,
            improvement,
            time_seconds,
            convergence_rate,
            success_rate,
            mean_iterations: mean(&column(|r| f64::from(r.iterations))),
            mean_improvement_percent: mean(&column(EvaluationRecord::improvement_percent)),
            mean_efficiency: mean(&column(EvaluationRecord::efficiency)),
            mean_improvement_per_iteration: mean(&column(
                EvaluationRecord::improvement_per_iteration,
            )),
            scenario_complexity: mean(&column(|r| r.scenario_complexity)),
            overall_score: overall_score(
                final_quality.mean,
                improvement.mean,
                convergence_rate,
                success_rate,
            ),
        }
    }
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Fraction of records whose improvement exceeds
/// [`SUCCESS_THRESHOLD`](crate::domain::SUCCESS_THRESHOLD); 0.0 when empty.
pub fn success_rate<'a>(records: impl IntoIterator<Item = &'a EvaluationRecord>) -> f64 {
    let (hits, total) = records.into_iter().fold((0usize, 0usize), |(h, t), r| {
        (h + usize::from(r.is_success()), t + 1)
    });
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Canonical composite score. See the module docs for the formula.
pub fn overall_score(
    final_quality_mean: f64,
    improvement_mean: f64,
    convergence_rate: f64,
    success_rate: f64,
) -> f64 {
    FINAL_QUALITY_WEIGHT * final_quality_mean
        + IMPROVEMENT_WEIGHT * improvement_mean * IMPROVEMENT_SCALE
        + CONVERGENCE_WEIGHT * convergence_rate
        + SUCCESS_WEIGHT * success_rate
}

fn group_records(
    records: &[EvaluationRecord],
    key: GroupKey,
) -> BTreeMap<GroupId, Vec<&EvaluationRecord>> {
    let mut groups: BTreeMap<GroupId, Vec<&EvaluationRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key.id_for(record)).or_default().push(record);
    }
    groups
}

/// Aggregate `records` by `key`, groups in ascending key order.
pub fn aggregate(records: &[EvaluationRecord], key: GroupKey) -> Vec<GroupStats> {
    group_records(records, key)
        .into_iter()
        .map(|(id, members)| GroupStats::from_records(id, &members))
        .collect()
}

/// Sort groups by overall score, highest first.
///
/// The sort is stable: equal scores keep their input order.
pub fn rank_by_overall_score(mut groups: Vec<GroupStats>) -> Vec<GroupStats> {
    groups.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    groups
}

/// Scenario groups ordered by complexity, easiest first.
pub fn scenario_difficulty(records: &[EvaluationRecord]) -> Vec<GroupStats> {
    let mut groups = aggregate(records, GroupKey::Scenario);
    groups.sort_by(|a, b| a.scenario_complexity.total_cmp(&b.scenario_complexity));
    groups
}

/// Column averaged into each pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotMetric {
    Improvement,
    FinalQuality,
}

impl PivotMetric {
    fn value(self, record: &EvaluationRecord) -> f64 {
        match self {
            Self::Improvement => record.improvement,
            Self::FinalQuality => record.final_quality,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improvement => "improvement",
            Self::FinalQuality => "final_quality",
        }
    }
}

/// Provider x scenario matrix of means.
///
/// Combinations without records are `None`, never 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub metric: PivotMetric,
    /// Provider ids, ascending.
    pub rows: Vec<String>,
    /// Scenario ids, ascending.
    pub columns: Vec<String>,
    /// Row-major cells aligned with `rows` x `columns`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        self.values[r][c]
    }
}

/// Build a provider x scenario pivot of `metric` means.
pub fn pivot(records: &[EvaluationRecord], metric: PivotMetric) -> PivotTable {
    let mut sums: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    let mut rows: BTreeSet<String> = BTreeSet::new();
    let mut columns: BTreeSet<String> = BTreeSet::new();

    for r in records {
        let cell = sums
            .entry((r.provider.clone(), r.scenario.clone()))
            .or_insert((0.0, 0));
        cell.0 += metric.value(r);
        cell.1 += 1;
        rows.insert(r.provider.clone());
        columns.insert(r.scenario.clone());
    }
    let rows: Vec<String> = rows.into_iter().collect();
    let columns: Vec<String> = columns.into_iter().collect();

    let values = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| {
                    sums.get(&(row.clone(), col.clone()))
                        .map(|(sum, n)| sum / *n as f64)
                })
                .collect()
        })
        .collect();

    PivotTable {
        metric,
        rows,
        columns,
        values,
    }
}

/// Share of a provider's records in each performance tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDistribution {
    pub provider: String,
    pub total: usize,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl TierDistribution {
    pub fn share(&self, tier: PerformanceTier) -> f64 {
        match tier {
            PerformanceTier::High => self.high,
            PerformanceTier::Medium => self.medium,
            PerformanceTier::Low => self.low,
        }
    }
}

/// Per-provider performance tier shares, providers ascending.
pub fn quality_tiers(records: &[EvaluationRecord]) -> Vec<TierDistribution> {
    group_records(records, GroupKey::Provider)
        .into_iter()
        .map(|(id, members)| {
            let total = members.len();
            let share = |tier: PerformanceTier| {
                members.iter().filter(|r| r.performance_tier() == tier).count() as f64
                    / total as f64
            };
            TierDistribution {
                provider: id.primary,
                total,
                high: share(PerformanceTier::High),
                medium: share(PerformanceTier::Medium),
                low: share(PerformanceTier::Low),
            }
        })
        .collect()
}

/// Share of a provider's records that improved, stayed flat or degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeDistribution {
    pub provider: String,
    pub total: usize,
    pub improved: f64,
    pub unchanged: f64,
    pub degraded: f64,
}

impl ChangeDistribution {
    pub fn share(&self, change: QualityChange) -> f64 {
        match change {
            QualityChange::Improved => self.improved,
            QualityChange::Unchanged => self.unchanged,
            QualityChange::Degraded => self.degraded,
        }
    }
}

/// Per-provider [`QualityChange`] shares, providers ascending.
pub fn quality_changes(records: &[EvaluationRecord]) -> Vec<ChangeDistribution> {
    group_records(records, GroupKey::Provider)
        .into_iter()
        .map(|(id, members)| {
            let total = members.len();
            let share = |change: QualityChange| {
                members.iter().filter(|r| r.quality_change() == change).count() as f64
                    / total as f64
            };
            ChangeDistribution {
                provider: id.primary,
                total,
                improved: share(QualityChange::Improved),
                unchanged: share(QualityChange::Unchanged),
                degraded: share(QualityChange::Degraded),
            }
        })
        .collect()
}

/// Every summary the analysis command reports, built in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_records: usize,
    pub provider_rankings: Vec<GroupStats>,
    pub model_performance: Vec<GroupStats>,
    pub scenario_difficulty: Vec<GroupStats>,
    pub improvement_matrix: PivotTable,
    pub quality_tiers: Vec<TierDistribution>,
    pub quality_changes: Vec<ChangeDistribution>,
}

impl AnalysisReport {
    pub fn build(records: &[EvaluationRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(SrlpError::EmptyTable);
        }
        Ok(Self {
            total_records: records.len(),
            provider_rankings: rank_by_overall_score(aggregate(records, GroupKey::Provider)),
            model_performance: aggregate(records, GroupKey::ProviderModel),
            scenario_difficulty: scenario_difficulty(records),
            improvement_matrix: pivot(records, PivotMetric::Improvement),
            quality_tiers: quality_tiers(records),
            quality_changes: quality_changes(records),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::round_places;

    fn rec(provider: &str, scenario: &str, initial: f64, final_q: f64) -> EvaluationRecord {
        EvaluationRecord {
            scenario: scenario.to_string(),
            provider: provider.to_string(),
            model: format!("{provider}-model"),
            initial_quality: initial,
            final_quality: final_q,
            improvement: round_places(final_q - initial, 6),
            converged: final_q > initial,
            iterations: 2,
            time_seconds: 1.0,
            scenario_complexity: 0.5,
        }
    }

    fn with_improvement(improvement: f64) -> EvaluationRecord {
        rec("a", "x", 0.5, 0.5 + improvement)
    }

    #[test]
    fn success_rate_uses_strict_threshold() {
        let records: Vec<_> = [0.01, 0.004, -0.01, 0.006]
            .into_iter()
            .map(with_improvement)
            .collect();
        assert_eq!(success_rate(&records), 0.5);
    }

    #[test]
    fn success_rate_of_empty_table_is_zero() {
        assert_eq!(success_rate(std::iter::empty()), 0.0);
    }

    #[test]
    fn sample_std_needs_two_values() {
        assert_eq!(sample_std(&[0.5]), None);
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0]).expect("std");
        assert!((std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn groups_come_out_in_key_order() {
        let records = vec![
            rec("b", "y", 0.5, 0.6),
            rec("a", "x", 0.5, 0.6),
            rec("b", "x", 0.5, 0.6),
        ];
        let ids: Vec<String> = aggregate(&records, GroupKey::ProviderScenario)
            .iter()
            .map(|g| g.group.to_string())
            .collect();
        assert_eq!(ids, vec!["a/x", "b/x", "b/y"]);
    }

    #[test]
    fn overall_score_matches_formula() {
        let records = vec![rec("a", "x", 0.5, 0.6), rec("a", "y", 0.5, 0.5)];
        let stats = &aggregate(&records, GroupKey::Provider)[0];
        // final mean 0.55, improvement mean 0.05, converged 0.5, success 0.5
        let expected = 0.4 * 0.55 + 0.3 * 0.05 * 100.0 + 0.2 * 0.5 + 0.1 * 0.5;
        assert!((stats.overall_score - expected).abs() < 1e-9);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let records = vec![
            rec("low", "x", 0.5, 0.4),
            rec("tie_a", "x", 0.5, 0.6),
            rec("tie_b", "x", 0.5, 0.6),
            rec("high", "x", 0.3, 0.9),
        ];
        let ranked = rank_by_overall_score(aggregate(&records, GroupKey::Provider));
        let order: Vec<&str> = ranked.iter().map(|g| g.group.primary.as_str()).collect();
        assert_eq!(order, vec!["high", "tie_a", "tie_b", "low"]);
    }

    #[test]
    fn pivot_reports_missing_cell_as_none() {
        let records = vec![
            rec("A", "X", 0.5, 0.6),
            rec("A", "Y", 0.5, 0.7),
            rec("B", "X", 0.5, 0.55),
        ];
        let table = pivot(&records, PivotMetric::Improvement);
        assert_eq!(table.rows, vec!["A", "B"]);
        assert_eq!(table.columns, vec!["X", "Y"]);
        assert_eq!(table.get("B", "Y"), None);
        assert!((table.get("A", "Y").expect("cell") - 0.2).abs() < 1e-9);
        assert!((table.get("B", "X").expect("cell") - 0.05).abs() < 1e-9);
    }

    #[test]
    fn pivot_averages_duplicates() {
        let records = vec![rec("A", "X", 0.5, 0.6), rec("A", "X", 0.5, 0.8)];
        let table = pivot(&records, PivotMetric::FinalQuality);
        assert!((table.get("A", "X").expect("cell") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn tiers_sum_to_one() {
        let records = vec![
            rec("A", "X", 0.5, 0.8),
            rec("A", "Y", 0.5, 0.6),
            rec("A", "Z", 0.5, 0.3),
            rec("A", "W", 0.5, 0.9),
        ];
        let tiers = quality_tiers(&records);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].high, 0.5);
        assert_eq!(tiers[0].medium, 0.25);
        assert_eq!(tiers[0].low, 0.25);
    }

    #[test]
    fn pivot_axes_are_unique_for_repeated_rows() {
        let records: Vec<EvaluationRecord> = (0..50)
            .flat_map(|_| [rec("B", "Y", 0.5, 0.6), rec("A", "X", 0.5, 0.7)])
            .collect();
        let table = pivot(&records, PivotMetric::FinalQuality);
        assert_eq!(table.rows, vec!["A", "B"]);
        assert_eq!(table.columns, vec!["X", "Y"]);
        assert_eq!(table.values.len(), 2);
        assert!(table.values.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn group_stats_carry_per_record_views() {
        let mut slow = rec("A", "X", 0.5, 0.6);
        slow.time_seconds = 2.0;
        slow.iterations = 4;
        let fast = rec("A", "Y", 0.4, 0.4);
        let stats = &aggregate(&[slow, fast], GroupKey::Provider)[0];

        // efficiency: 0.6 / 2.0 and 0.4 / 1.0
        assert!((stats.mean_efficiency - 0.35).abs() < 1e-9);
        // per iteration: 0.1 / 4 and 0.0 / 2
        assert!((stats.mean_improvement_per_iteration - 0.0125).abs() < 1e-9);
        // percent: 0.1 / 0.5 * 100 and 0
        assert!((stats.mean_improvement_percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn report_includes_quality_change_distribution() {
        let records = vec![
            rec("A", "X", 0.5, 0.6),
            rec("A", "Y", 0.5, 0.502),
            rec("A", "Z", 0.5, 0.4),
            rec("A", "W", 0.5, 0.7),
            rec("B", "X", 0.5, 0.5),
        ];
        let report = AnalysisReport::build(&records).expect("build");
        assert_eq!(report.quality_changes.len(), 2);
        let a = &report.quality_changes[0];
        assert_eq!(a.provider, "A");
        assert_eq!(a.total, 4);
        assert_eq!(a.share(QualityChange::Improved), 0.5);
        assert_eq!(a.share(QualityChange::Unchanged), 0.25);
        assert_eq!(a.share(QualityChange::Degraded), 0.25);
        assert_eq!(report.quality_changes[1].unchanged, 1.0);

        let ranked_a = report
            .provider_rankings
            .iter()
            .find(|g| g.group.primary == "A")
            .expect("provider A");
        assert!(ranked_a.mean_efficiency > 0.0);
    }

    #[test]
    fn analysis_of_empty_table_fails() {
        assert!(matches!(
            AnalysisReport::build(&[]),
            Err(SrlpError::EmptyTable)
        ));
    }
}
