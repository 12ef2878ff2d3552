//! Evaluation records: one row of outcome data per (provider, model, scenario).

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use super::error::{Result, SrlpError};

/// Improvement above which a record counts as a success.
///
/// The comparison is strict: a record with exactly this improvement is not a
/// success.
pub const SUCCESS_THRESHOLD: f64 = 0.005;

/// Final quality above which a record lands in the `High` tier.
pub const HIGH_TIER_THRESHOLD: f64 = 0.75;

/// Final quality above which a record lands in the `Medium` tier.
pub const MEDIUM_TIER_THRESHOLD: f64 = 0.55;

/// Tolerance used when checking `improvement == final - initial`.
pub const IMPROVEMENT_TOLERANCE: f64 = 1e-6;

/// Round `value` to `places` decimal places.
pub fn round_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Outcome of one (provider, model, scenario) evaluation.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub scenario: String,
    #[serde(alias = "llm_provider")]
    pub provider: String,
    #[serde(alias = "llm_model")]
    pub model: String,
    pub initial_quality: f64,
    pub final_quality: f64,
    /// `final_quality - initial_quality`, rounded to 6 places. May be negative.
    pub improvement: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub converged: bool,
    pub iterations: u32,
    pub time_seconds: f64,
    pub scenario_complexity: f64,
}

struct FlagVisitor;

impl<'de> Visitor<'de> for FlagVisitor {
    type Value = bool;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean (true/false, True/False or 1/0)")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<bool, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<bool, E> {
        match v {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<bool, E> {
        match v {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<bool, E> {
        match v.trim() {
            "true" | "True" | "TRUE" | "1" => Ok(true),
            "false" | "False" | "FALSE" | "0" => Ok(false),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

/// Booleans as written by this crate (`true`) or by pandas (`True`).
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(FlagVisitor)
}

/// Direction of the quality change in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityChange {
    Improved,
    Unchanged,
    Degraded,
}

/// Bucket for the final quality of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    High,
    Medium,
    Low,
}

impl PerformanceTier {
    pub const ALL: [PerformanceTier; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl EvaluationRecord {
    /// Check the record invariants.
    ///
    /// Used by the CSV reader so a corrupt row never reaches aggregation.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(SrlpError::InvalidRecord(reason));

        if self.scenario.trim().is_empty() {
            return fail("scenario must not be empty".to_string());
        }
        if self.provider.trim().is_empty() {
            return fail("provider must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return fail("model must not be empty".to_string());
        }
        for (name, value) in [
            ("initial_quality", self.initial_quality),
            ("final_quality", self.final_quality),
            ("scenario_complexity", self.scenario_complexity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("{name} {value} outside [0, 1]"));
            }
        }
        let expected = self.final_quality - self.initial_quality;
        if !self.improvement.is_finite()
            || (self.improvement - expected).abs() > IMPROVEMENT_TOLERANCE
        {
            return fail(format!(
                "improvement {} does not match final - initial ({expected:.6})",
                self.improvement
            ));
        }
        if self.iterations < 1 {
            return fail("iterations must be at least 1".to_string());
        }
        if !(self.time_seconds.is_finite() && self.time_seconds > 0.0) {
            return fail(format!("time_seconds {} must be positive", self.time_seconds));
        }
        Ok(())
    }

    /// Improvement relative to the initial quality, in percent.
    pub fn improvement_percent(&self) -> f64 {
        self.improvement / self.initial_quality.abs().max(0.001) * 100.0
    }

    pub fn quality_change(&self) -> QualityChange {
        if self.improvement > SUCCESS_THRESHOLD {
            QualityChange::Improved
        } else if self.improvement < -SUCCESS_THRESHOLD {
            QualityChange::Degraded
        } else {
            QualityChange::Unchanged
        }
    }

    pub fn performance_tier(&self) -> PerformanceTier {
        if self.final_quality > HIGH_TIER_THRESHOLD {
            PerformanceTier::High
        } else if self.final_quality > MEDIUM_TIER_THRESHOLD {
            PerformanceTier::Medium
        } else {
            PerformanceTier::Low
        }
    }

    /// Final quality per second of processing time.
    pub fn efficiency(&self) -> f64 {
        self.final_quality / self.time_seconds
    }

    pub fn improvement_per_iteration(&self) -> f64 {
        self.improvement / f64::from(self.iterations.max(1))
    }

    /// Whether this record clears [`SUCCESS_THRESHOLD`].
    pub fn is_success(&self) -> bool {
        self.improvement > SUCCESS_THRESHOLD
    }
}
