//! Synthetic multi-provider result simulator.
//!
//! Fabricates one [`EvaluationRecord`] per (provider, model, scenario) from
//! per-provider random distributions. Nothing here measures a real system.
//!
//! # Draw order
//!
//! Providers are visited in declaration order, then each provider's models,
//! then scenarios. Per combination the generator is consumed in this order:
//!
//! 1. initial-quality noise `N(0, 0.02)`
//! 2. improvement coin `U[0, 1)`
//! 3. either `Exp` / `N(0.01, 0.005)` (improving branch) or `N(-0.005, 0.01)`
//! 4. time noise `N(0, 0.3 * speed_variance)`
//! 5. convergence coin `U[0, 1)`
//! 6. iteration count, uniform in `[2, 4]` or `[1, 3]`
//!
//! Keeping this order fixed is what makes a seed reproduce a table.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::{round_places, EvaluationRecord, Result, SrlpError};
use crate::metrics::METRICS;
use crate::obs;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// Quality base of the reference (mock) provider; boosts are relative to it.
pub const REFERENCE_QUALITY_BASE: f64 = 0.55;
const PROVIDER_BOOST_FACTOR: f64 = 0.3;
const INITIAL_NOISE_STD: f64 = 0.02;
const INITIAL_QUALITY_RANGE: (f64, f64) = (0.1, 0.95);
const FINAL_QUALITY_RANGE: (f64, f64) = (0.1, 0.98);
const HEADROOM_FACTOR: f64 = 0.4;
const EXP_SCALE_FACTOR: f64 = 0.3;
const EXP_MIN_SCALE: f64 = 0.01;
const NO_HEADROOM_GAIN: (f64, f64) = (0.01, 0.005);
const REGRESSION: (f64, f64) = (-0.005, 0.01);
const TIME_NOISE_FACTOR: f64 = 0.3;
const MIN_TIME_SECONDS: f64 = 0.1;

/// Parameter set standing in for an LLM backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub name: String,
    pub models: Vec<String>,
    pub quality_base: f64,
    /// Recorded for reference; the draw sequence does not consult it.
    pub quality_variance: f64,
    /// Seconds.
    pub speed_base: f64,
    pub speed_variance: f64,
    /// Probability of taking the improving branch.
    pub improvement_rate: f64,
    /// Probability of a converged record.
    pub convergence_rate: f64,
}

/// Per-scenario simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProfile {
    pub name: String,
    pub complexity: f64,
    pub base_quality: f64,
}

/// Full simulator input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub providers: Vec<ProviderProfile>,
    pub scenarios: Vec<ScenarioProfile>,
}

#[allow(clippy::too_many_arguments)]
fn provider(
    name: &str,
    models: &[&str],
    quality_base: f64,
    quality_variance: f64,
    speed_base: f64,
    speed_variance: f64,
    improvement_rate: f64,
    convergence_rate: f64,
) -> ProviderProfile {
    ProviderProfile {
        name: name.to_string(),
        models: models.iter().map(|m| m.to_string()).collect(),
        quality_base,
        quality_variance,
        speed_base,
        speed_variance,
        improvement_rate,
        convergence_rate,
    }
}

fn scenario(name: &str, complexity: f64, base_quality: f64) -> ScenarioProfile {
    ScenarioProfile {
        name: name.to_string(),
        complexity,
        base_quality,
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                provider("openai", &["gpt-4", "gpt-3.5-turbo"], 0.85, 0.08, 2.5, 0.8, 0.75, 0.60),
                provider("claude", &["claude-3-opus", "claude-3-sonnet"], 0.82, 0.06, 2.8, 0.7, 0.70, 0.55),
                provider("llama", &["llama-2-70b", "llama-2-13b"], 0.75, 0.10, 1.2, 0.4, 0.60, 0.40),
                provider("huggingface", &["mistral-7b", "codellama-34b"], 0.68, 0.12, 0.8, 0.3, 0.50, 0.30),
                provider("mock", &["mock-model"], 0.55, 0.05, 0.1, 0.02, 0.40, 0.00),
            ],
            scenarios: vec![
                scenario("travel", 0.6, 0.48),
                scenario("cooking", 0.4, 0.48),
                scenario("project", 0.8, 0.66),
                scenario("event", 0.7, 0.56),
                scenario("renovation", 0.7, 0.56),
            ],
        }
    }
}

fn check_unit(owner: &str, field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SrlpError::InvalidProfile {
            name: owner.to_string(),
            reason: format!("{field} {value} outside [0, 1]"),
        })
    }
}

fn check_non_negative(owner: &str, field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SrlpError::InvalidProfile {
            name: owner.to_string(),
            reason: format!("{field} {value} must be non-negative"),
        })
    }
}

impl ProviderProfile {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| SrlpError::InvalidProfile {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("provider name must not be empty"));
        }
        if self.models.is_empty() {
            return Err(invalid("at least one model is required"));
        }
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(invalid("model names must not be empty"));
        }
        check_unit(&self.name, "quality_base", self.quality_base)?;
        check_unit(&self.name, "improvement_rate", self.improvement_rate)?;
        check_unit(&self.name, "convergence_rate", self.convergence_rate)?;
        check_non_negative(&self.name, "quality_variance", self.quality_variance)?;
        check_non_negative(&self.name, "speed_variance", self.speed_variance)?;
        if !(self.speed_base.is_finite() && self.speed_base > 0.0) {
            return Err(invalid("speed_base must be positive"));
        }
        Ok(())
    }

    /// Initial-quality offset relative to the reference provider.
    pub fn quality_boost(&self) -> f64 {
        (self.quality_base - REFERENCE_QUALITY_BASE) * PROVIDER_BOOST_FACTOR
    }
}

impl ScenarioProfile {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SrlpError::InvalidProfile {
                name: self.name.clone(),
                reason: "scenario name must not be empty".to_string(),
            });
        }
        check_unit(&self.name, "complexity", self.complexity)?;
        check_unit(&self.name, "base_quality", self.base_quality)
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() || self.scenarios.is_empty() {
            return Err(SrlpError::InvalidProfile {
                name: "simulation".to_string(),
                reason: "at least one provider and one scenario are required".to_string(),
            });
        }
        for p in &self.providers {
            p.validate()?;
        }
        for s in &self.scenarios {
            s.validate()?;
        }
        Ok(())
    }

    /// Parse `[[providers]]` / `[[scenarios]]` tables and validate them.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load profiles from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SrlpError::InputNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderProfile> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Number of records one simulation produces.
    pub fn combination_count(&self) -> usize {
        self.providers.iter().map(|p| p.models.len()).sum::<usize>() * self.scenarios.len()
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|e| SrlpError::Distribution(e.to_string()))
}

/// Fixed distributions shared by every combination.
struct SharedDraws {
    initial_noise: Normal<f64>,
    no_headroom_gain: Normal<f64>,
    regression: Normal<f64>,
}

impl SharedDraws {
    fn new() -> Result<Self> {
        Ok(Self {
            initial_noise: normal(0.0, INITIAL_NOISE_STD)?,
            no_headroom_gain: normal(NO_HEADROOM_GAIN.0, NO_HEADROOM_GAIN.1)?,
            regression: normal(REGRESSION.0, REGRESSION.1)?,
        })
    }
}

fn draw_improvement<R: Rng + ?Sized>(
    rng: &mut R,
    draws: &SharedDraws,
    profile: &ProviderProfile,
    initial: f64,
) -> Result<f64> {
    if rng.gen::<f64>() < profile.improvement_rate {
        let headroom = (profile.quality_base - initial) * HEADROOM_FACTOR;
        if headroom > 0.0 {
            let scale = (headroom * EXP_SCALE_FACTOR).max(EXP_MIN_SCALE);
            let exp = Exp::new(1.0 / scale).map_err(|e| SrlpError::Distribution(e.to_string()))?;
            Ok(exp.sample(rng).min(headroom))
        } else {
            Ok(draws.no_headroom_gain.sample(rng).max(0.0))
        }
    } else {
        Ok(draws.regression.sample(rng))
    }
}

fn simulate_one<R: Rng + ?Sized>(
    rng: &mut R,
    draws: &SharedDraws,
    profile: &ProviderProfile,
    time_noise: &Normal<f64>,
    model: &str,
    scenario: &ScenarioProfile,
) -> Result<EvaluationRecord> {
    let raw_initial =
        scenario.base_quality + profile.quality_boost() + draws.initial_noise.sample(rng);
    // draws see unrounded values; rounding happens only on the record
    let initial = raw_initial.clamp(INITIAL_QUALITY_RANGE.0, INITIAL_QUALITY_RANGE.1);
    let improvement = draw_improvement(rng, draws, profile, initial)?;
    let final_raw = (initial + improvement).clamp(FINAL_QUALITY_RANGE.0, FINAL_QUALITY_RANGE.1);

    let initial_quality = round_places(initial, 6);
    let final_quality = round_places(final_raw, 6);

    let raw_time = profile.speed_base * (0.8 + 0.4 * scenario.complexity) + time_noise.sample(rng);
    let time_seconds = round_places(raw_time.max(MIN_TIME_SECONDS), 3);

    let converged = rng.gen::<f64>() < profile.convergence_rate;
    let iterations = if converged {
        rng.gen_range(2..=4u32)
    } else {
        rng.gen_range(1..=3u32)
    };

    Ok(EvaluationRecord {
        scenario: scenario.name.clone(),
        provider: profile.name.clone(),
        model: model.to_string(),
        initial_quality,
        final_quality,
        improvement: round_places(final_quality - initial_quality, 6),
        converged,
        iterations,
        time_seconds,
        scenario_complexity: scenario.complexity,
    })
}

/// Simulate a table with a caller-owned generator.
///
/// Two calls with generators in the same state yield identical tables.
pub fn simulate_with_rng<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<Vec<EvaluationRecord>> {
    config.validate()?;
    let draws = SharedDraws::new()?;
    let mut records = Vec::with_capacity(config.combination_count());

    for profile in &config.providers {
        let time_noise = normal(0.0, profile.speed_variance * TIME_NOISE_FACTOR)?;
        for model in &profile.models {
            for scenario in &config.scenarios {
                records.push(simulate_one(rng, &draws, profile, &time_noise, model, scenario)?);
            }
        }
    }

    Ok(records)
}

/// Simulate a table from a seed.
pub fn simulate(config: &SimulationConfig, seed: u64) -> Result<Vec<EvaluationRecord>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let records = simulate_with_rng(config, &mut rng)?;

    METRICS.add_records_simulated(records.len() as u64);
    obs::emit_simulation_finished(
        seed,
        records.len(),
        config.providers.len(),
        config.scenarios.len(),
    );
    Ok(records)
}
