//! Fuel-type classification for technical-specification documents.
//!
//! The source sheets never state the fuel type directly; it has to be read
//! off the document structure. Checks run from the strongest marker to the
//! weakest: a spark-plug section is definitive petrol, glow plugs and
//! common-rail injection are definitive diesel, and the diesel badge codes in
//! the model name settle most of the rest.

use serde_json::Value;

use crate::model::FuelType;

const DIESEL_BADGES: [&str; 8] = ["cdi", "tdi", "hdi", "dci", "crdi", "d4d", "jtd", "tdci"];
const DIESEL_INJECTION_TERMS: [&str; 5] = ["diesel", "cdi", "tdi", "hdi", "crdi"];

pub fn detect_fuel_type(doc: &Value) -> FuelType {
    if doc.get("spark_plugs").is_some() {
        return FuelType::Petrol;
    }

    if let Some(injection) = doc.get("injectionSystem") {
        let text = injection.to_string().to_lowercase();
        if DIESEL_INJECTION_TERMS.iter().any(|term| text.contains(term)) {
            return FuelType::Diesel;
        }
    }

    if doc.get("glow_plugs").is_some() {
        return FuelType::Diesel;
    }

    if let Some(fuel_system) = doc.get("fuel_system") {
        let text = fuel_system.to_string().to_lowercase();
        if text.contains("common rail") || text.contains("injection pump") {
            return FuelType::Diesel;
        }
    }

    if let Some(ident) = doc.get("vehicleIdentification") {
        let model = text_field(ident, "model");
        let title = text_field(ident, "title");
        if DIESEL_BADGES
            .iter()
            .any(|badge| model.contains(badge) || title.contains(badge))
        {
            return FuelType::Diesel;
        }
    }

    // Last resort: scan the whole document text.
    let text = doc.to_string().to_lowercase();
    if text.contains("diesel") && !text.contains("spark plug") {
        FuelType::Diesel
    } else if text.contains("spark plug") {
        FuelType::Petrol
    } else {
        FuelType::Unknown
    }
}

fn text_field(ident: &Value, name: &str) -> String {
    ident
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spark_plugs_mean_petrol() {
        let doc = json!({"spark_plugs": {"gap": "0.9mm"}});
        assert_eq!(detect_fuel_type(&doc), FuelType::Petrol);
    }

    #[test]
    fn glow_plugs_mean_diesel() {
        let doc = json!({"glow_plugs": {"count": 4}});
        assert_eq!(detect_fuel_type(&doc), FuelType::Diesel);
    }

    #[test]
    fn spark_plugs_win_over_badge_codes() {
        // A petrol sheet whose title happens to mention a diesel trim.
        let doc = json!({
            "spark_plugs": {},
            "vehicleIdentification": {"model": "Golf", "title": "Golf TDI comparison"}
        });
        assert_eq!(detect_fuel_type(&doc), FuelType::Petrol);
    }

    #[test]
    fn injection_system_text_classifies_diesel() {
        let doc = json!({"injectionSystem": {"type": "Bosch CRDI common rail"}});
        assert_eq!(detect_fuel_type(&doc), FuelType::Diesel);
    }

    #[test]
    fn badge_code_in_model_name_classifies_diesel() {
        let doc = json!({"vehicleIdentification": {"model": "C220 CDI", "title": ""}});
        assert_eq!(detect_fuel_type(&doc), FuelType::Diesel);
    }

    #[test]
    fn unmarked_documents_stay_unknown() {
        let doc = json!({"vehicleIdentification": {"make": "Honda", "model": "Jazz"}});
        assert_eq!(detect_fuel_type(&doc), FuelType::Unknown);
    }
}
