//! Model-name cleanup shared by the indexer and the resolver.
//!
//! Source model strings embed trims, engine codes and year suffixes
//! ("Golf GTI 2.0", "CR-V N22A2/2.2"), so the same vehicle arrives under
//! several spellings. Both functions here are applied symmetrically at index
//! time and query time.

use regex::Regex;
use std::sync::LazyLock;

/// Trailing variant/engine-code token: a separator, then an alphanumeric
/// character, then at least one more token character ("2.0", "n22a2/2.2",
/// "gti"). The match must be preceded by a word character so a bare token is
/// never treated as a suffix of nothing.
static TRAILING_VARIANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-][a-z0-9][a-z0-9_./]+$").expect("valid regex"));

/// Ordered rules locating where the core model name ends: before an
/// engine-size token, before a letter variant of length >= 2, before an
/// alphanumeric technical code, or (fallback) the leading alphanumeric run.
static BASE_MODEL_RULES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"^([a-z0-9\-\s]+?)[\s\-]+\d+\.?\d*\w*").expect("valid regex"),
        Regex::new(r"^([a-z0-9\-\s]+?)[\s\-]+[a-z]{2,}").expect("valid regex"),
        Regex::new(r"^([a-z0-9\-]+?)[\s\-]?[a-z]?\d+[\w/]").expect("valid regex"),
        Regex::new(r"^([a-z0-9\-]+)").expect("valid regex"),
    ]
});

/// Lightly cleaned form of a model string: lower-cased, trimmed, with one
/// trailing variant suffix stripped. The strip is rejected when it would
/// remove more than 40% of the string, so short names survive intact.
pub fn normalize_model(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return lowered;
    }

    if let Some(found) = TRAILING_VARIANT_RE.find(&lowered) {
        let preceded_by_word = lowered[..found.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        if preceded_by_word {
            let stripped = &lowered[..found.start()];
            if chars(stripped) as f64 >= chars(&lowered) as f64 * 0.6 {
                return stripped.to_string();
            }
        }
    }

    lowered
}

/// Extracts the base model from a full model name ("golf" from "Golf GTI").
/// The first rule whose captured prefix is at least min(3, half the input)
/// characters wins; if none qualifies the input is returned unchanged.
pub fn extract_base_model(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return lowered;
    }

    let min_len = 3.0_f64.min(chars(&lowered) as f64 * 0.5);
    for rule in BASE_MODEL_RULES.iter() {
        if let Some(caps) = rule.captures(&lowered) {
            let base = caps[1].trim().to_string();
            if chars(&base) as f64 >= min_len {
                return base;
            }
        }
    }

    lowered
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_engine_code() {
        assert_eq!(normalize_model("Golf GTI 2.0"), "golf gti");
        assert_eq!(normalize_model("Transit Connect 1.8"), "transit connect");
        assert_eq!(normalize_model("  Carisma 1.8 GDI "), "carisma 1.8");
    }

    #[test]
    fn normalize_refuses_to_overstrip_short_names() {
        // "golf" would only keep half of "golf gti"; the guard keeps it whole.
        assert_eq!(normalize_model("Golf GTI"), "golf gti");
        assert_eq!(normalize_model("CR-V N22A2/2.2"), "cr-v n22a2/2.2");
        assert_eq!(normalize_model("CR-V"), "cr-v");
        assert_eq!(normalize_model("106"), "106");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["Golf GTI 2.0", "CR-V", "Octavia 1.9tdi", "3 Series", ""] {
            let once = normalize_model(input);
            assert_eq!(normalize_model(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn base_model_stops_before_variant_tokens() {
        assert_eq!(extract_base_model("Golf GTI"), "golf");
        assert_eq!(extract_base_model("golf gti 2.0"), "golf gti");
        assert_eq!(extract_base_model("Astra 1.7 CDTi"), "astra");
        assert_eq!(extract_base_model("Transit Custom"), "transit");
    }

    #[test]
    fn base_model_keeps_short_or_unsplittable_names() {
        assert_eq!(extract_base_model("CR-V"), "cr-v");
        assert_eq!(extract_base_model("3 Series"), "3 series");
        assert_eq!(extract_base_model("106"), "106");
        assert_eq!(extract_base_model(""), "");
    }

    #[test]
    fn base_model_is_idempotent() {
        for input in ["Golf GTI", "CR-V", "Astra 1.7 CDTi", "106", "Transit Custom"] {
            let once = extract_base_model(input);
            assert_eq!(extract_base_model(&once), once, "input {input:?}");
        }
    }
}
