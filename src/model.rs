// Core structs: VehicleRecord, IndexEntry, query and resolution types
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::year::YearRange;

/// Which corpus a record was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    RepairTimes,
    TechSpecs,
    Bulletins,
}

impl DataCategory {
    /// Only tech-spec sheets carry the engine sections the fuel detector can
    /// classify, so only that corpus gets fuel-suffixed lookup keys.
    pub fn fuel_bearing(self) -> bool {
        matches!(self, DataCategory::TechSpecs)
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataCategory::RepairTimes => "repair_times",
            DataCategory::TechSpecs => "tech_specs",
            DataCategory::Bulletins => "bulletins",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Unknown,
}

impl FuelType {
    /// Maps a free-text fuel label onto the canonical enum. Callers send
    /// things like "Gasoline" or "DERV"; anything unrecognized is Unknown.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "petrol" | "gasoline" | "unleaded" | "gas" => FuelType::Petrol,
            "diesel" | "gasoil" | "derv" => FuelType::Diesel,
            _ => FuelType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingested vehicle document. The identification block is lifted out of
/// the payload at load time; the rest of the document is carried opaquely and
/// never interpreted by the resolver.
#[derive(Debug, Clone)]
pub struct VehicleRecord {
    pub make: String,
    pub model: String,
    pub model_type: String,
    pub title: String,
    pub fuel_type: FuelType,
    pub category: DataCategory,
    pub source_file: String,
    pub payload: serde_json::Value,
}

/// Per-vehicle metadata used for fuzzy candidate generation, distinct from
/// the raw source document. Several entries may describe the same model
/// family at different trims; scoring disambiguates at query time.
#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub key: String,
    pub make: String,
    pub model: String,
    pub base_model: String,
    pub normalized_model: String,
    pub model_type: String,
    pub title: String,
    pub years: Option<YearRange>,
    pub fuel_type: FuelType,
    pub categories: BTreeSet<DataCategory>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleQuery {
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub data_category: Option<DataCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Exact,
    High,
    Fuzzy,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfidenceTier::Exact => "exact",
            ConfidenceTier::High => "high",
            ConfidenceTier::Fuzzy => "fuzzy",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMatch {
    pub key: String,
    pub tier: ConfidenceTier,
    pub score: f64,
}

/// Outcome of a resolution call. NotFound means nothing cleared the
/// acceptance threshold, which callers must distinguish from an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Resolution {
    Match(ResolvedMatch),
    NotFound,
}

impl Resolution {
    pub fn as_match(&self) -> Option<&ResolvedMatch> {
        match self {
            Resolution::Match(m) => Some(m),
            Resolution::NotFound => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read corpus directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
