// Corpus loading: reads vehicle JSON documents from disk into records.
pub mod fuel;

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::model::{DataCategory, FuelType, IngestError, VehicleRecord};
use fuel::detect_fuel_type;

/// Loads every `*.json` document in a corpus directory. A file that fails to
/// read or parse is logged and skipped; a missing directory is treated as an
/// empty corpus so one absent data set never blocks startup.
pub fn load_corpus_dir(dir: &Path, category: DataCategory) -> Result<Vec<VehicleRecord>, IngestError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), %category, "corpus directory missing, treating as empty");
        return Ok(Vec::new());
    }

    let dir_entries = fs::read_dir(dir).map_err(|source| IngestError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for dir_entry in dir_entries {
        let dir_entry = dir_entry.map_err(|source| IngestError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir_entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        match load_record(&path, category) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(err) => warn!(file = %path.display(), error = %err, "skipping unreadable corpus file"),
        }
    }

    info!(count = records.len(), %category, dir = %dir.display(), "loaded corpus directory");
    Ok(records)
}

/// Reads a single document. Returns `Ok(None)` for documents without a
/// vehicle identification block, which are warned about and dropped.
fn load_record(path: &Path, category: DataCategory) -> Result<Option<VehicleRecord>, IngestError> {
    let raw = fs::read_to_string(path).map_err(|source| IngestError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let payload: Value = serde_json::from_str(&raw).map_err(|source| IngestError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(ident) = payload.get("vehicleIdentification") else {
        warn!(file = %path.display(), "skipping document without vehicleIdentification");
        return Ok(None);
    };

    let fuel_type = if category.fuel_bearing() {
        detect_fuel_type(&payload)
    } else {
        FuelType::Unknown
    };

    let source_file = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(Some(VehicleRecord {
        make: ident_field(ident, "make"),
        model: ident_field(ident, "model"),
        model_type: ident_field(ident, "modelType"),
        title: ident_field(ident, "title"),
        fuel_type,
        category,
        source_file,
        payload,
    }))
}

fn ident_field(ident: &Value, name: &str) -> String {
    ident
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}
