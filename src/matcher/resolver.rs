//! Query resolution: direct key ladder first, scored candidates second.

use std::cmp::Ordering;

use strsim::normalized_levenshtein;
use tracing::{debug, info};

use crate::config::MatchTuning;
use crate::index::ResolverStore;
use crate::index::keys::lookup_key;
use crate::model::{
    ConfidenceTier, DataCategory, FuelType, IndexEntry, Resolution, ResolvedMatch, VehicleQuery,
};
use crate::normalize::{extract_base_model, normalize_model};
use crate::year::{YearRange, parse_year_range};

use super::scoring::score_model;

/// Resolves a query against the store. The direct key ladder is always
/// preferred; fuzzy candidate scoring only runs when no key hits.
pub fn resolve(store: &ResolverStore, query: &VehicleQuery, tuning: &MatchTuning) -> Resolution {
    let make = query.make.trim().to_lowercase();
    let model = query.model.trim().to_lowercase();
    if make.is_empty() || model.is_empty() {
        return Resolution::NotFound;
    }

    let fuel = query.fuel_type.as_deref().map(FuelType::from_label);

    if let Some(key) = direct_lookup(store, &make, &model, query.year, fuel, query.data_category) {
        info!(%key, "direct key match");
        return Resolution::Match(ResolvedMatch {
            key,
            tier: ConfidenceTier::Exact,
            score: 1.0,
        });
    }

    fuzzy_resolve(store, query, &make, &model, fuel, tuning)
}

/// Probes the key table from the most specific key shape down. A
/// year-agnostic hit is only accepted for a year-carrying query when the
/// stored record's own range covers that year.
fn direct_lookup(
    store: &ResolverStore,
    make: &str,
    model: &str,
    year: Option<i32>,
    fuel: Option<FuelType>,
    category: Option<DataCategory>,
) -> Option<String> {
    let base = extract_base_model(model);
    let norm = normalize_model(model);
    let mut variants: Vec<&str> = vec![model];
    if base != model {
        variants.push(&base);
    }
    if norm != model && norm != base {
        variants.push(&norm);
    }

    let year_text = year.map(|y| y.to_string());
    let known_fuel = fuel.filter(|f| *f != FuelType::Unknown);

    if let (Some(year), Some(fuel)) = (year_text.as_deref(), known_fuel) {
        for variant in &variants {
            let key = lookup_key(&[make, variant, fuel.as_str(), year]);
            if store.lookup(&key, category).is_some() {
                return Some(key);
            }
        }
    }

    if let Some(year) = year_text.as_deref() {
        for variant in &variants {
            let key = lookup_key(&[make, variant, year]);
            if store.lookup(&key, category).is_some() {
                return Some(key);
            }
        }
    }

    if let Some(fuel) = known_fuel {
        for variant in &variants {
            let key = lookup_key(&[make, variant, fuel.as_str()]);
            if store.lookup(&key, category).is_some() {
                return Some(key);
            }
        }
    }

    for variant in &variants {
        let key = lookup_key(&[make, variant]);
        let Some(record_id) = store.lookup(&key, category) else {
            continue;
        };
        match year {
            None => return Some(key),
            Some(requested) => {
                let record = store.record(record_id);
                let range = parse_year_range(&record.model_type, store.pivot_year());
                if range.is_some_and(|r| r.contains(requested)) {
                    debug!(%key, year = requested, "year-agnostic key verified against record range");
                    return Some(key);
                }
            }
        }
    }

    None
}

struct Candidate<'a> {
    entry: &'a IndexEntry,
    combined: f64,
    model_score: f64,
    year_score: f64,
    fuel_score: f64,
}

fn fuzzy_resolve(
    store: &ResolverStore,
    query: &VehicleQuery,
    make: &str,
    model: &str,
    fuel: Option<FuelType>,
    tuning: &MatchTuning,
) -> Resolution {
    let mut candidates = exact_make_candidates(store, query, make, model, fuel, tuning);

    if candidates.is_empty() {
        debug!(%make, "no exact-make candidates, trying fuzzy make matching");
        candidates = fuzzy_make_candidates(store, query, make, model, fuel, tuning);
    }

    // Stable sort: ties keep index insertion order, so the earliest-indexed
    // vehicle wins.
    candidates.sort_by(|a, b| b.combined.partial_cmp(&a.combined).unwrap_or(Ordering::Equal));

    for candidate in candidates.iter().take(3) {
        debug!(
            key = %candidate.entry.key,
            score = candidate.combined,
            model_score = candidate.model_score,
            year_score = candidate.year_score,
            fuel_score = candidate.fuel_score,
            "candidate"
        );
    }

    let Some(top) = candidates.first() else {
        info!(%make, %model, "no match candidates");
        return Resolution::NotFound;
    };

    let floor = acceptance_floor(top, query.year.is_some(), fuel.is_some(), tuning);
    if top.combined > floor {
        let tier = if top.combined > tuning.high_tier_score {
            ConfidenceTier::High
        } else {
            ConfidenceTier::Fuzzy
        };
        info!(
            key = %top.entry.key,
            score = top.combined,
            %tier,
            "fuzzy match selected"
        );
        Resolution::Match(ResolvedMatch {
            key: top.entry.key.clone(),
            tier,
            score: top.combined,
        })
    } else {
        info!(
            %make,
            %model,
            best = top.combined,
            floor,
            "best candidate below acceptance floor"
        );
        Resolution::NotFound
    }
}

fn exact_make_candidates<'a>(
    store: &'a ResolverStore,
    query: &VehicleQuery,
    make: &str,
    model: &str,
    fuel: Option<FuelType>,
    tuning: &MatchTuning,
) -> Vec<Candidate<'a>> {
    let mut candidates = Vec::new();
    for entry in store.entries() {
        if entry.make.trim().to_lowercase() != make {
            continue;
        }
        if !category_allows(entry, query.data_category) {
            continue;
        }

        let model_score = score_model(model, &entry.model, &entry.base_model);
        if model_score <= tuning.min_model_score {
            continue;
        }

        let year_score = year_agreement(query.year, entry.years);
        let fuel_score = fuel.map_or(0.0, |f| fuel_agreement(f, entry.fuel_type));

        let (model_weight, year_weight, fuel_weight) = match (query.year.is_some(), fuel.is_some())
        {
            (true, true) => (tuning.model_weight, tuning.year_weight_with_fuel, tuning.fuel_weight),
            (true, false) => (tuning.model_weight, tuning.year_weight, 0.0),
            (false, true) => (tuning.model_weight_fuel_only, 0.0, tuning.fuel_weight_without_year),
            (false, false) => (tuning.model_weight, 0.0, 0.0),
        };

        let mut combined =
            model_score * model_weight + year_score * year_weight + fuel_score * fuel_weight;
        // Exact make always holds on this path.
        combined = (combined * tuning.exact_make_bonus).min(1.0);

        candidates.push(Candidate { entry, combined, model_score, year_score, fuel_score });
    }
    candidates
}

fn fuzzy_make_candidates<'a>(
    store: &'a ResolverStore,
    query: &VehicleQuery,
    make: &str,
    model: &str,
    fuel: Option<FuelType>,
    tuning: &MatchTuning,
) -> Vec<Candidate<'a>> {
    let mut candidates = Vec::new();
    for entry in store.entries() {
        if !category_allows(entry, query.data_category) {
            continue;
        }

        let entry_make = entry.make.trim().to_lowercase();
        let make_score = normalized_levenshtein(make, &entry_make);
        if make_score < tuning.fuzzy_make_floor {
            continue;
        }

        let model_score = score_model(model, &entry.model, &entry.base_model);
        if model_score <= tuning.min_model_score {
            continue;
        }

        let year_score = year_agreement(query.year, entry.years);
        let fuel_score = fuel.map_or(0.0, |f| fuel_agreement(f, entry.fuel_type));

        // Make similarity carries real weight here; with no year or fuel to
        // lean on it carries even more.
        let (model_weight, make_weight) = if query.year.is_none() && fuel.is_none() {
            (tuning.model_weight, tuning.fuzzy_make_weight_alone)
        } else {
            (tuning.fuzzy_model_weight, tuning.fuzzy_make_weight)
        };
        let year_weight = if query.year.is_some() { tuning.fuzzy_year_weight } else { 0.0 };
        let fuel_weight = if fuel.is_some() { tuning.fuzzy_fuel_weight } else { 0.0 };

        let mut combined = model_score * model_weight
            + make_score * make_weight
            + year_score * year_weight
            + fuel_score * fuel_weight;
        if entry_make == make {
            combined = (combined * tuning.exact_make_bonus).min(1.0);
        }

        if combined <= tuning.fuzzy_admission_score {
            continue;
        }

        candidates.push(Candidate { entry, combined, model_score, year_score, fuel_score });
    }
    candidates
}

fn category_allows(entry: &IndexEntry, category: Option<DataCategory>) -> bool {
    category.is_none_or(|c| entry.categories.contains(&c))
}

/// 1.0 inside the range, decaying by 0.1 per year outside it. A candidate
/// with no known range scores 0 against a year-carrying query.
fn year_agreement(requested: Option<i32>, range: Option<YearRange>) -> f64 {
    let (Some(year), Some(range)) = (requested, range) else {
        return 0.0;
    };
    if range.contains(year) {
        return 1.0;
    }
    let distance = if year < range.start {
        range.start - year
    } else {
        // Past a bounded range; ongoing ranges contain everything later.
        year - range.end.unwrap_or(year)
    };
    (1.0 - 0.1 * distance as f64).max(0.0)
}

/// 1.0 on an exact fuel match, 0.4 on an explicit mismatch, 0.5 when either
/// side is unknown.
fn fuel_agreement(requested: FuelType, candidate: FuelType) -> f64 {
    if requested == FuelType::Unknown || candidate == FuelType::Unknown {
        0.5
    } else if requested == candidate {
        1.0
    } else {
        0.4
    }
}

/// Lowers the base acceptance threshold for the top candidate. Rules fire in
/// a fixed priority order; the first triggered rule decides the floor.
fn acceptance_floor(
    top: &Candidate<'_>,
    year_supplied: bool,
    fuel_supplied: bool,
    tuning: &MatchTuning,
) -> f64 {
    let base = tuning.min_match_score;

    if year_supplied && top.year_score > tuning.excellent_year_trigger {
        return (base - tuning.excellent_year_drop).max(tuning.excellent_year_floor);
    }
    if year_supplied && fuel_supplied && top.model_score > tuning.good_model_trigger {
        return (base - tuning.year_fuel_model_drop).max(tuning.year_fuel_model_floor);
    }
    if fuel_supplied && top.fuel_score > tuning.excellent_fuel_trigger {
        return (base - tuning.excellent_fuel_drop).max(tuning.excellent_fuel_floor);
    }
    if top.model_score > tuning.excellent_model_trigger {
        return (base - tuning.excellent_model_drop).max(tuning.excellent_model_floor);
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VehicleRecord;
    use serde_json::json;

    fn record(
        make: &str,
        model: &str,
        model_type: &str,
        category: DataCategory,
        fuel_type: FuelType,
    ) -> VehicleRecord {
        VehicleRecord {
            make: make.to_string(),
            model: model.to_string(),
            model_type: model_type.to_string(),
            title: String::new(),
            fuel_type,
            category,
            source_file: format!("{make}_{model}.json"),
            payload: json!({}),
        }
    }

    fn crv_store() -> ResolverStore {
        ResolverStore::build(
            vec![record(
                "Honda",
                "CR-V",
                "N22A2/2.2 (07-12)",
                DataCategory::TechSpecs,
                FuelType::Diesel,
            )],
            50,
        )
    }

    fn query(make: &str, model: &str, year: Option<i32>) -> VehicleQuery {
        VehicleQuery {
            make: make.to_string(),
            model: model.to_string(),
            year,
            fuel_type: None,
            data_category: None,
        }
    }

    #[test]
    fn exact_key_is_preferred_over_fuzzy() {
        let store = crv_store();
        let tuning = MatchTuning::default();

        let result = resolve(&store, &query("Honda", "CR-V", Some(2009)), &tuning);
        let matched = result.as_match().expect("should match");
        assert_eq!(matched.tier, ConfidenceTier::Exact);
        assert_eq!(matched.key, "honda_cr-v_2009");

        let result = resolve(&store, &query("honda", "cr-v", None), &tuning);
        assert_eq!(result.as_match().expect("should match").tier, ConfidenceTier::Exact);
    }

    #[test]
    fn normalized_spelling_resolves_with_high_confidence() {
        let store = crv_store();
        let tuning = MatchTuning::default();

        let result = resolve(&store, &query("Honda", "CRV", Some(2009)), &tuning);
        let matched = result.as_match().expect("CRV should resolve to CR-V");
        assert_eq!(matched.key, "honda_cr-v");
        assert!(matches!(matched.tier, ConfidenceTier::High | ConfidenceTier::Exact));
    }

    #[test]
    fn cross_model_query_is_not_found_despite_year_match() {
        let store = crv_store();
        let tuning = MatchTuning::default();

        let result = resolve(&store, &query("Honda", "Civic", Some(2009)), &tuning);
        assert_eq!(result, Resolution::NotFound);
    }

    #[test]
    fn year_outside_range_degrades_the_score() {
        let store = crv_store();
        let tuning = MatchTuning::default();

        let inside = resolve(&store, &query("Honda", "CRV", Some(2010)), &tuning);
        let outside = resolve(&store, &query("Honda", "CRV", Some(2018)), &tuning);

        let inside = inside.as_match().expect("in-range year matches");
        let outside = outside.as_match().expect("near-range year still matches");
        assert!(outside.score < inside.score);
    }

    #[test]
    fn plain_key_hit_requires_year_agreement() {
        let store = crv_store();
        let tuning = MatchTuning::default();

        // 2018 is past the 07-12 sheet: the plain key must not be accepted
        // directly, but fuzzy matching may still pick the record up.
        let result = resolve(&store, &query("Honda", "CR-V", Some(2018)), &tuning);
        if let Some(matched) = result.as_match() {
            assert_ne!(matched.tier, ConfidenceTier::Exact);
        }
    }

    #[test]
    fn fuel_type_disambiguates_between_trims() {
        let store = ResolverStore::build(
            vec![
                record("Ford", "Focus", "1.6 (05-11)", DataCategory::TechSpecs, FuelType::Petrol),
                record("Ford", "Focus TDCi", "1.8 (05-11)", DataCategory::TechSpecs, FuelType::Diesel),
            ],
            50,
        );
        let tuning = MatchTuning::default();

        let q = VehicleQuery {
            make: "Ford".into(),
            model: "Focus".into(),
            year: None,
            fuel_type: Some("diesel".into()),
            data_category: None,
        };
        let matched = resolve(&store, &q, &tuning);
        let matched = matched.as_match().expect("diesel focus resolves");
        // The diesel-suffixed alias synthesized from the TDCi sheet's base
        // model wins over the petrol sheet's plain key.
        assert_eq!(matched.key, "ford_focus_diesel");
        assert_eq!(matched.tier, ConfidenceTier::Exact);
        assert_eq!(
            store.lookup(&matched.key, None).map(|id| store.record(id).fuel_type),
            Some(FuelType::Diesel)
        );
    }

    #[test]
    fn category_filter_restricts_candidates() {
        let store = ResolverStore::build(
            vec![record("Honda", "CR-V", "(07-12)", DataCategory::RepairTimes, FuelType::Unknown)],
            50,
        );
        let tuning = MatchTuning::default();

        let mut q = query("Honda", "CRV", None);
        q.data_category = Some(DataCategory::TechSpecs);
        assert_eq!(resolve(&store, &q, &tuning), Resolution::NotFound);

        q.data_category = Some(DataCategory::RepairTimes);
        assert!(resolve(&store, &q, &tuning).as_match().is_some());
    }

    #[test]
    fn fuzzy_make_fallback_tolerates_misspelled_makes() {
        let store = ResolverStore::build(
            vec![record(
                "Volkswagen",
                "Golf",
                "(13-20)",
                DataCategory::RepairTimes,
                FuelType::Unknown,
            )],
            50,
        );
        let tuning = MatchTuning::default();

        let result = resolve(&store, &query("Volkswagon", "Golf", None), &tuning);
        let matched = result.as_match().expect("misspelled make resolves");
        assert_eq!(matched.key, "volkswagen_golf");
    }

    #[test]
    fn empty_store_never_matches() {
        let store = ResolverStore::build(Vec::new(), 50);
        let tuning = MatchTuning::default();
        assert_eq!(store.index_size(), 0);
        assert_eq!(resolve(&store, &query("Honda", "CR-V", Some(2009)), &tuning), Resolution::NotFound);
    }

    #[test]
    fn empty_query_fields_are_not_found() {
        let store = crv_store();
        let tuning = MatchTuning::default();
        assert_eq!(resolve(&store, &query("", "CR-V", None), &tuning), Resolution::NotFound);
        assert_eq!(resolve(&store, &query("Honda", "  ", None), &tuning), Resolution::NotFound);
    }

    #[test]
    fn year_agreement_decays_outside_the_range() {
        let range = Some(YearRange::bounded(2007, 2012));
        assert_eq!(year_agreement(Some(2009), range), 1.0);
        assert_eq!(year_agreement(Some(2012), range), 1.0);
        assert!((year_agreement(Some(2015), range) - 0.7).abs() < 1e-9);
        assert!((year_agreement(Some(2018), range) - 0.4).abs() < 1e-9);
        assert_eq!(year_agreement(Some(2030), range), 0.0);
        assert_eq!(year_agreement(Some(2009), None), 0.0);
        assert_eq!(year_agreement(None, range), 0.0);
    }

    #[test]
    fn fuel_agreement_scores() {
        assert_eq!(fuel_agreement(FuelType::Diesel, FuelType::Diesel), 1.0);
        assert_eq!(fuel_agreement(FuelType::Diesel, FuelType::Petrol), 0.4);
        assert_eq!(fuel_agreement(FuelType::Diesel, FuelType::Unknown), 0.5);
        assert_eq!(fuel_agreement(FuelType::Unknown, FuelType::Petrol), 0.5);
    }

    #[test]
    fn acceptance_floor_rules_fire_in_priority_order() {
        let tuning = MatchTuning::default();
        let entry_store = crv_store();
        let entry = &entry_store.entries()[0];
        let candidate = |model_score: f64, year_score: f64, fuel_score: f64| Candidate {
            entry,
            combined: 0.5,
            model_score,
            year_score,
            fuel_score,
        };

        // Excellent year wins even when the model is also excellent.
        let floor = acceptance_floor(&candidate(0.95, 1.0, 0.0), true, false, &tuning);
        assert!((floor - 0.35).abs() < 1e-9);

        // Good model with year and fuel supplied.
        let floor = acceptance_floor(&candidate(0.75, 0.5, 0.5), true, true, &tuning);
        assert!((floor - 0.4).abs() < 1e-9);

        // Excellent fuel match.
        let floor = acceptance_floor(&candidate(0.5, 0.0, 1.0), false, true, &tuning);
        assert!((floor - 0.45).abs() < 1e-9);

        // Excellent model match alone.
        let floor = acceptance_floor(&candidate(0.9, 0.0, 0.0), false, false, &tuning);
        assert!((floor - 0.4).abs() < 1e-9);

        // Nothing fires: base threshold.
        let floor = acceptance_floor(&candidate(0.5, 0.0, 0.0), false, false, &tuning);
        assert!((floor - 0.6).abs() < 1e-9);
    }
}
