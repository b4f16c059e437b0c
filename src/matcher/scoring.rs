//! Model-name similarity scoring.
//!
//! A requested model is compared against a candidate's full and base model
//! strings with several independent techniques; the best signal wins. Each
//! technique is capped below the one that subsumes it (an exact match always
//! beats a containment, a containment beats the edit-distance fallback).

use std::collections::HashSet;

use strsim::normalized_levenshtein;

/// Downweight applied to the edit-distance fallback so it cannot dominate
/// the more specific signals.
const EDIT_DISTANCE_WEIGHT: f64 = 0.7;

/// Scores how well `requested` names the candidate vehicle, in [0, 1].
/// Case-insensitive, total, and 0 for empty inputs.
pub fn score_model(requested: &str, candidate_model: &str, candidate_base: &str) -> f64 {
    let requested = requested.trim().to_lowercase();
    let candidate = candidate_model.trim().to_lowercase();
    let base = candidate_base.trim().to_lowercase();

    if requested.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    if requested == candidate {
        return 1.0;
    }

    let mut best: f64 = 0.0;

    if !base.is_empty() && requested == base {
        best = best.max(0.95);
    }

    // Requested contained in the candidate: better at the start, better the
    // more of the candidate it covers.
    if candidate.contains(&requested) {
        let position = if candidate.starts_with(&requested) { 1.0 } else { 0.8 };
        let coverage = chars(&requested) as f64 / chars(&candidate) as f64;
        let significance = (coverage * 2.0).min(1.0);
        best = best.max(0.9 * position * significance);
    }

    // Candidate contained in the requested string.
    if requested.contains(&candidate) {
        let coverage = chars(&candidate) as f64 / chars(&requested) as f64;
        best = best.max(0.7 * coverage);
    }

    // Punctuation-blind comparison: "crv" should find "cr-v".
    let cleaned_requested = word_chars(&requested);
    let cleaned_candidate = word_chars(&candidate);
    if !cleaned_requested.is_empty() {
        if cleaned_requested == cleaned_candidate {
            best = best.max(0.95);
        } else if cleaned_candidate.starts_with(&cleaned_requested) {
            let coverage = chars(&cleaned_requested) as f64 / chars(&cleaned_candidate) as f64;
            best = best.max(0.8 * coverage);
        }
    }

    // Token overlap for multi-word names.
    if requested.contains(' ') || candidate.contains(' ') {
        let requested_tokens: HashSet<&str> = requested.split_whitespace().collect();
        let candidate_tokens: HashSet<&str> = candidate.split_whitespace().collect();
        let common = requested_tokens.intersection(&candidate_tokens).count();
        if common > 0 {
            let requested_coverage = common as f64 / requested_tokens.len() as f64;
            let candidate_coverage = common as f64 / candidate_tokens.len() as f64;
            best = best.max(0.85 * (requested_coverage + candidate_coverage) / 2.0);
        }
    }

    best.max(EDIT_DISTANCE_WEIGHT * normalized_levenshtein(&requested, &candidate))
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

fn word_chars(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}
