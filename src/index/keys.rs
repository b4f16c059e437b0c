//! Lookup-key synthesis.
//!
//! Every record is reachable under a family of string keys so the common
//! queries resolve with a single table probe: plain make+model, the base and
//! normalized model spellings, fuel-suffixed variants for fuel-bearing
//! corpora, and a dense per-year alias for every year a sheet covers.

use crate::model::FuelType;
use crate::year::YearRange;

/// Joins key parts into the canonical table form: lowercase, spaces as
/// underscores.
pub fn lookup_key(parts: &[&str]) -> String {
    parts.join("_").to_lowercase().replace(' ', "_")
}

/// All key aliases for one record. `model_variants` holds the distinct model
/// spellings (raw, base, normalized); `fuel` is set for fuel-bearing
/// corpora. A bounded year range produces an alias for every covered year,
/// so "make+model+2012" hits directly even when the sheet spans 2007-2014.
pub fn synthesize_keys(
    make: &str,
    model_variants: &[&str],
    fuel: Option<FuelType>,
    years: Option<YearRange>,
) -> Vec<String> {
    let mut keys: Vec<String> = model_variants
        .iter()
        .map(|variant| lookup_key(&[make, variant]))
        .collect();

    if let Some(fuel) = fuel {
        let fuel_keys: Vec<String> = model_variants
            .iter()
            .map(|variant| lookup_key(&[make, variant, fuel.as_str()]))
            .collect();
        keys.extend(fuel_keys);
    }

    if let Some(range) = years {
        let last = match range.end {
            Some(end) if end > range.start => end,
            _ => range.start,
        };
        let yearless = keys.clone();
        for year in range.start..=last {
            for key in &yearless {
                keys.push(format!("{key}_{year}"));
            }
        }
    }

    keys
}
