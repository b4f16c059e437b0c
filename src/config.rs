use serde::Deserialize;
use std::fs;
use thiserror::Error;

use crate::year::DEFAULT_PIVOT_YEAR;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Scoring weights and acceptance thresholds. The values are empirically
/// tuned; keeping them in one named block makes the heuristic auditable and
/// overridable from the config file instead of buried in the resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Base minimum combined score a top candidate must exceed.
    pub min_match_score: f64,
    /// Admission floor: a candidate whose model score does not exceed this is
    /// discarded outright, so year or fuel agreement alone can never carry a
    /// cross-model match.
    pub min_model_score: f64,

    // Weights when the make matched exactly.
    pub model_weight: f64,
    pub year_weight: f64,
    pub year_weight_with_fuel: f64,
    pub fuel_weight: f64,
    pub fuel_weight_without_year: f64,
    pub model_weight_fuel_only: f64,

    // Weights on the fuzzy-make fallback path.
    pub fuzzy_make_floor: f64,
    pub fuzzy_model_weight: f64,
    pub fuzzy_make_weight: f64,
    pub fuzzy_make_weight_alone: f64,
    pub fuzzy_year_weight: f64,
    pub fuzzy_fuel_weight: f64,
    pub fuzzy_admission_score: f64,

    pub exact_make_bonus: f64,
    pub high_tier_score: f64,

    // Threshold-lowering rules, applied to the top candidate in this order;
    // the first rule whose trigger fires determines the final floor.
    pub excellent_year_trigger: f64,
    pub excellent_year_drop: f64,
    pub excellent_year_floor: f64,
    pub good_model_trigger: f64,
    pub year_fuel_model_drop: f64,
    pub year_fuel_model_floor: f64,
    pub excellent_fuel_trigger: f64,
    pub excellent_fuel_drop: f64,
    pub excellent_fuel_floor: f64,
    pub excellent_model_trigger: f64,
    pub excellent_model_drop: f64,
    pub excellent_model_floor: f64,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            min_match_score: 0.6,
            min_model_score: 0.4,

            model_weight: 0.6,
            year_weight: 0.4,
            year_weight_with_fuel: 0.3,
            fuel_weight: 0.1,
            fuel_weight_without_year: 0.2,
            model_weight_fuel_only: 0.8,

            fuzzy_make_floor: 0.7,
            fuzzy_model_weight: 0.4,
            fuzzy_make_weight: 0.3,
            fuzzy_make_weight_alone: 0.4,
            fuzzy_year_weight: 0.2,
            fuzzy_fuel_weight: 0.1,
            fuzzy_admission_score: 0.6,

            exact_make_bonus: 1.1,
            high_tier_score: 0.7,

            excellent_year_trigger: 0.9,
            excellent_year_drop: 0.25,
            excellent_year_floor: 0.25,
            good_model_trigger: 0.7,
            year_fuel_model_drop: 0.2,
            year_fuel_model_floor: 0.35,
            excellent_fuel_trigger: 0.9,
            excellent_fuel_drop: 0.15,
            excellent_fuel_floor: 0.4,
            excellent_model_trigger: 0.85,
            excellent_model_drop: 0.2,
            excellent_model_floor: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub repair_times_dir: String,
    pub tech_specs_dir: String,
    pub bulletins_dir: String,
    /// Two-digit years below the pivot are 2000s, the rest 1900s.
    pub pivot_year: i32,
    pub tuning: MatchTuning,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repair_times_dir: "data/labour_times".to_string(),
            tech_specs_dir: "data/tech_specs".to_string(),
            bulletins_dir: "data/bulletins".to_string(),
            pivot_year: DEFAULT_PIVOT_YEAR,
            tuning: MatchTuning::default(),
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let tuning = MatchTuning::default();
        assert_eq!(tuning.min_match_score, 0.6);
        assert_eq!(tuning.min_model_score, 0.4);
        assert_eq!(tuning.model_weight, 0.6);
        assert_eq!(tuning.excellent_year_floor, 0.25);
        assert_eq!(tuning.excellent_model_floor, 0.3);
        assert_eq!(tuning.excellent_fuel_floor, 0.4);
        assert_eq!(tuning.year_fuel_model_floor, 0.35);

        let config = AppConfig::default();
        assert_eq!(config.pivot_year, 50);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"tech_specs_dir":"/srv/specs","tuning":{"min_match_score":0.5}}"#,
        )
        .expect("valid config");
        assert_eq!(config.tech_specs_dir, "/srv/specs");
        assert_eq!(config.tuning.min_match_score, 0.5);
        assert_eq!(config.tuning.min_model_score, 0.4);
        assert_eq!(config.repair_times_dir, "data/labour_times");
    }
}
