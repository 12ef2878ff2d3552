use std::fmt::Write as _;
use std::path::Path;

use crate::domain::{PerformanceTier, QualityChange, Result};
use crate::evaluation::EvaluationReport;
use crate::obs;
use crate::stats::{AnalysisReport, GroupStats, PivotTable, Summary};

/// Columns of the rankings CSV, in write order.
pub const RANKING_COLUMNS: [&str; 18] = [
    "rank",
    "group",
    "count",
    "mean_initial_quality",
    "mean_final_quality",
    "std_final_quality",
    "mean_improvement",
    "std_improvement",
    "mean_time_seconds",
    "std_time_seconds",
    "convergence_rate",
    "success_rate",
    "mean_iterations",
    "mean_improvement_percent",
    "mean_efficiency",
    "mean_improvement_per_iteration",
    "scenario_complexity",
    "overall_score",
];

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn num(value: f64) -> String {
    format!("{value:.6}")
}

fn opt(value: Option<f64>) -> String {
    value.map(num).unwrap_or_default()
}

/// Write an evaluation batch as pretty JSON.
pub fn write_evaluation_report_json(path: &Path, report: &EvaluationReport) -> Result<()> {
    ensure_parent(path)?;
    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(path, content)?;
    obs::emit_report_written("evaluation_json", path);
    Ok(())
}

fn ranking_row(rank: usize, g: &GroupStats) -> Vec<String> {
    let Summary { mean: final_mean, std: final_std } = g.final_quality;
    vec![
        rank.to_string(),
        g.group.to_string(),
        g.count.to_string(),
        num(g.initial_quality.mean),
        num(final_mean),
        opt(final_std),
        num(g.improvement.mean),
        opt(g.improvement.std),
        num(g.time_seconds.mean),
        opt(g.time_seconds.std),
        num(g.convergence_rate),
        num(g.success_rate),
        num(g.mean_iterations),
        num(g.mean_improvement_percent),
        num(g.mean_efficiency),
        num(g.mean_improvement_per_iteration),
        num(g.scenario_complexity),
        num(g.overall_score),
    ]
}

/// Write group statistics in the given order, numbered from 1.
///
/// Standard deviations of single-record groups are left empty.
pub fn write_rankings_csv(path: &Path, groups: &[GroupStats]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(RANKING_COLUMNS)?;
    for (index, group) in groups.iter().enumerate() {
        wtr.write_record(ranking_row(index + 1, group))?;
    }
    wtr.flush()?;
    obs::emit_report_written("rankings_csv", path);
    Ok(())
}

/// Write a pivot as CSV: one row per provider, one column per scenario.
///
/// Combinations without records are written as empty cells.
pub fn write_matrix_csv(path: &Path, table: &PivotTable) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["provider".to_string()];
    header.extend(table.columns.iter().cloned());
    wtr.write_record(&header)?;
    for (row, cells) in table.rows.iter().zip(&table.values) {
        let mut line = vec![row.clone()];
        line.extend(cells.iter().map(|c| opt(*c)));
        wtr.write_record(&line)?;
    }
    wtr.flush()?;
    obs::emit_report_written("matrix_csv", path);
    Ok(())
}

fn push_group_table(out: &mut String, groups: &[GroupStats]) {
    out.push_str("| # | group | n | final quality | improvement | convergence | success | overall |\n");
    out.push_str("|---|---|---|---|---|---|---|---|\n");
    for (index, g) in groups.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.3} | {:+.3} | {:.1}% | {:.1}% | {:.3} |",
            index + 1,
            g.group,
            g.count,
            g.final_quality.mean,
            g.improvement.mean,
            g.convergence_rate * 100.0,
            g.success_rate * 100.0,
            g.overall_score,
        );
    }
    out.push('\n');
}

/// Render the analysis summary as markdown.
pub fn render_analysis_md(report: &AnalysisReport) -> String {
    let mut out = String::new();
    out.push_str("# Multi-Provider Analysis\n\n");
    let _ = writeln!(out, "- records: {}\n", report.total_records);

    out.push_str("## Provider Rankings\n");
    push_group_table(&mut out, &report.provider_rankings);

    out.push_str("## Model Performance\n");
    push_group_table(&mut out, &report.model_performance);

    out.push_str("## Scenario Difficulty\n");
    out.push_str("| scenario | complexity | final quality | improvement | convergence |\n");
    out.push_str("|---|---|---|---|---|\n");
    for g in &report.scenario_difficulty {
        let _ = writeln!(
            out,
            "| {} | {:.2} | {:.3} | {:+.3} | {:.1}% |",
            g.group,
            g.scenario_complexity,
            g.final_quality.mean,
            g.improvement.mean,
            g.convergence_rate * 100.0,
        );
    }
    out.push('\n');

    let matrix = &report.improvement_matrix;
    let _ = writeln!(out, "## Matrix ({})", matrix.metric.as_str());
    let _ = writeln!(out, "| provider | {} |", matrix.columns.join(" | "));
    let _ = writeln!(out, "|---|{}", "---|".repeat(matrix.columns.len()));
    for (row, cells) in matrix.rows.iter().zip(&matrix.values) {
        let cells: Vec<String> = cells
            .iter()
            .map(|c| c.map(|v| format!("{v:+.4}")).unwrap_or_else(|| "-".to_string()))
            .collect();
        let _ = writeln!(out, "| {} | {} |", row, cells.join(" | "));
    }
    out.push('\n');

    out.push_str("## Quality Tiers\n");
    out.push_str("| provider | n | High | Medium | Low |\n");
    out.push_str("|---|---|---|---|---|\n");
    for tiers in &report.quality_tiers {
        let shares: Vec<String> = PerformanceTier::ALL
            .iter()
            .map(|tier| format!("{:.1}%", tiers.share(*tier) * 100.0))
            .collect();
        let _ = writeln!(out, "| {} | {} | {} |", tiers.provider, tiers.total, shares.join(" | "));
    }
    out.push('\n');

    out.push_str("## Quality Change\n");
    out.push_str("| provider | n | improved | unchanged | degraded |\n");
    out.push_str("|---|---|---|---|---|\n");
    for changes in &report.quality_changes {
        let shares: Vec<String> = [
            QualityChange::Improved,
            QualityChange::Unchanged,
            QualityChange::Degraded,
        ]
        .iter()
        .map(|change| format!("{:.1}%", changes.share(*change) * 100.0))
        .collect();
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            changes.provider,
            changes.total,
            shares.join(" | ")
        );
    }
    out
}

/// Write the markdown analysis summary.
pub fn write_analysis_md(path: &Path, report: &AnalysisReport) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, render_analysis_md(report))?;
    obs::emit_report_written("analysis_md", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{round_places, EvaluationRecord};
    use crate::evaluation::{Evaluator, ProviderSelection};
    use crate::refinement::StubRefinementProducer;
    use crate::stats::{aggregate, pivot, GroupKey, PivotMetric};

    fn rec(provider: &str, scenario: &str, initial: f64, final_q: f64) -> EvaluationRecord {
        EvaluationRecord {
            scenario: scenario.to_string(),
            provider: provider.to_string(),
            model: format!("{provider}-model"),
            initial_quality: initial,
            final_quality: final_q,
            improvement: round_places(final_q - initial, 6),
            converged: true,
            iterations: 2,
            time_seconds: 1.5,
            scenario_complexity: 0.6,
        }
    }

    fn table() -> Vec<EvaluationRecord> {
        vec![
            rec("claude", "travel", 0.6, 0.8),
            rec("claude", "cooking", 0.6, 0.7),
            rec("mock", "travel", 0.5, 0.5),
        ]
    }

    #[test]
    fn evaluation_report_schema_has_expected_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("evaluation.json");
        let evaluator = Evaluator::new(StubRefinementProducer::default(), ProviderSelection::default());
        let report = EvaluationReport::from_batch(&evaluator.evaluate_batch(&["travel"]));

        write_evaluation_report_json(&path, &report).expect("write report");
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        let obj = raw.as_object().expect("report object");
        for key in [
            "schema_version",
            "run_id",
            "generated_at",
            "summary",
            "detailed_results",
            "failures",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(raw["summary"]["total_scenarios"], json!(1));
        assert_eq!(raw["summary"]["llm_model"], json!("mock-model"));
        assert_eq!(raw["detailed_results"][0]["record"]["scenario"], json!("travel"));
    }

    #[test]
    fn matrix_csv_leaves_missing_cells_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("matrix.csv");
        write_matrix_csv(&path, &pivot(&table(), PivotMetric::Improvement)).expect("write");

        let text = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "provider,cooking,travel");
        assert_eq!(lines[1], "claude,0.100000,0.200000");
        assert_eq!(lines[2], "mock,,0.000000");
    }

    #[test]
    fn rankings_csv_has_header_and_ranks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rankings.csv");
        let groups = aggregate(&table(), GroupKey::Provider);
        write_rankings_csv(&path, &groups).expect("write");

        let mut rdr = csv::Reader::from_path(&path).expect("open");
        let header: Vec<String> = rdr.headers().expect("header").iter().map(String::from).collect();
        assert_eq!(header, RANKING_COLUMNS);
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.expect("row")).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[1][1], "mock");
        // single-record group has no sample deviation
        assert_eq!(&rows[1][5], "");

        let column = |name: &str| {
            RANKING_COLUMNS
                .iter()
                .position(|c| *c == name)
                .expect("known column")
        };
        // claude: (0.8 + 0.7) / 1.5 / 2 and (0.2 + 0.1) / 2 / 2
        assert_eq!(&rows[0][column("mean_efficiency")], "0.500000");
        assert_eq!(&rows[0][column("mean_improvement_per_iteration")], "0.075000");
        assert_eq!(&rows[1][column("mean_improvement_percent")], "0.000000");
    }

    #[test]
    fn analysis_markdown_lists_every_section() {
        let report = AnalysisReport::build(&table()).expect("build");
        let md = render_analysis_md(&report);
        for heading in [
            "## Provider Rankings",
            "## Model Performance",
            "## Scenario Difficulty",
            "## Matrix (improvement)",
            "## Quality Tiers",
            "## Quality Change",
        ] {
            assert!(md.contains(heading), "missing {heading}");
        }
        assert!(md.contains("| mock | - | +0.0000 |"));
        assert!(md.contains("| claude | 2 | 100.0% | 0.0% | 0.0% |"));
        assert!(md.contains("| mock | 1 | 0.0% | 100.0% | 0.0% |"));
    }
}
