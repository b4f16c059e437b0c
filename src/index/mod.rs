// Corpus indexing: builds the key table and per-vehicle metadata entries.
pub mod keys;

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::{DataCategory, FuelType, IndexEntry, VehicleRecord};
use crate::normalize::{extract_base_model, normalize_model};
use crate::year::parse_year_range;
use keys::{lookup_key, synthesize_keys};

/// Immutable resolution index over one corpus generation. Built once from
/// the ingested records and replaced wholesale on reload; queries only ever
/// see a fully built store.
#[derive(Debug)]
pub struct ResolverStore {
    records: Vec<VehicleRecord>,
    /// Synthesized key -> record indices. Distinct records landing on the
    /// same key are kept in insertion order and disambiguated at lookup time
    /// instead of silently overwriting each other.
    key_table: HashMap<String, Vec<usize>>,
    entries: Vec<IndexEntry>,
    entry_ids: HashMap<String, usize>,
    pivot_year: i32,
    bucketed_keys: usize,
    skipped_records: usize,
    built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub records: usize,
    pub lookup_keys: usize,
    pub vehicles: usize,
    pub bucketed_keys: usize,
    pub skipped_records: usize,
    pub repair_times: usize,
    pub tech_specs: usize,
    pub bulletins: usize,
    pub built_at: DateTime<Utc>,
}

impl ResolverStore {
    /// Indexes the given records. A record without make or model is skipped
    /// with a warning, never a build failure.
    pub fn build(records: Vec<VehicleRecord>, pivot_year: i32) -> Self {
        let mut store = Self {
            records: Vec::with_capacity(records.len()),
            key_table: HashMap::new(),
            entries: Vec::new(),
            entry_ids: HashMap::new(),
            pivot_year,
            bucketed_keys: 0,
            skipped_records: 0,
            built_at: Utc::now(),
        };

        for record in records {
            store.index_record(record);
        }

        info!(
            records = store.records.len(),
            lookup_keys = store.key_table.len(),
            vehicles = store.entries.len(),
            bucketed_keys = store.bucketed_keys,
            skipped = store.skipped_records,
            "built resolver index"
        );
        store
    }

    fn index_record(&mut self, record: VehicleRecord) {
        if record.make.is_empty() || record.model.is_empty() {
            warn!(
                file = %record.source_file,
                category = %record.category,
                "skipping record without make or model"
            );
            self.skipped_records += 1;
            return;
        }

        let model = record.model.trim().to_lowercase();
        let base_model = extract_base_model(&record.model);
        let normalized_model = normalize_model(&record.model);

        let mut variants: Vec<&str> = vec![&model];
        if base_model != model {
            variants.push(&base_model);
        }
        if normalized_model != model && normalized_model != base_model {
            variants.push(&normalized_model);
        }

        // Year range comes from the model type, falling back to the title
        // and then the source filename.
        let year_source = [&record.model_type, &record.title, &record.source_file]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or_default();
        let years = parse_year_range(year_source, self.pivot_year);

        let fuel = record.category.fuel_bearing().then_some(record.fuel_type);

        let record_id = self.records.len();
        for key in synthesize_keys(&record.make, &variants, fuel, years) {
            self.insert_key(key, record_id);
        }

        let canonical = lookup_key(&[&record.make, &record.model]);
        match self.entry_ids.get(&canonical) {
            Some(&entry_id) => {
                let entry = &mut self.entries[entry_id];
                entry.categories.insert(record.category);
                if entry.fuel_type == FuelType::Unknown && record.fuel_type != FuelType::Unknown {
                    entry.fuel_type = record.fuel_type;
                }
                if entry.years.is_none() {
                    entry.years = years;
                }
            }
            None => {
                self.entry_ids.insert(canonical.clone(), self.entries.len());
                self.entries.push(IndexEntry {
                    key: canonical,
                    make: record.make.clone(),
                    model: record.model.clone(),
                    base_model,
                    normalized_model,
                    model_type: record.model_type.clone(),
                    title: record.title.clone(),
                    years,
                    fuel_type: record.fuel_type,
                    categories: BTreeSet::from([record.category]),
                });
            }
        }

        self.records.push(record);
    }

    fn insert_key(&mut self, key: String, record_id: usize) {
        let bucket = self.key_table.entry(key).or_default();
        if bucket.contains(&record_id) {
            return;
        }
        if bucket.len() == 1 {
            self.bucketed_keys += 1;
            debug!(records = bucket.len() + 1, "lookup key now aliases multiple records");
        }
        bucket.push(record_id);
    }

    /// Direct key probe. When a category is requested, the first record in
    /// the bucket from that corpus wins; otherwise the first writer wins.
    pub fn lookup(&self, key: &str, category: Option<DataCategory>) -> Option<usize> {
        self.key_table.get(key).and_then(|bucket| {
            bucket
                .iter()
                .copied()
                .find(|&id| category.is_none_or(|c| self.records[id].category == c))
        })
    }

    pub fn record(&self, record_id: usize) -> &VehicleRecord {
        &self.records[record_id]
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn pivot_year(&self) -> i32 {
        self.pivot_year
    }

    pub fn index_size(&self) -> usize {
        self.key_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn corpus_stats(&self) -> CorpusStats {
        let count = |category: DataCategory| {
            self.records
                .iter()
                .filter(|r| r.category == category)
                .count()
        };
        CorpusStats {
            records: self.records.len(),
            lookup_keys: self.key_table.len(),
            vehicles: self.entries.len(),
            bucketed_keys: self.bucketed_keys,
            skipped_records: self.skipped_records,
            repair_times: count(DataCategory::RepairTimes),
            tech_specs: count(DataCategory::TechSpecs),
            bulletins: count(DataCategory::Bulletins),
            built_at: self.built_at,
        }
    }
}
