use std::collections::BTreeSet;

use super::model::RawGenreField;

// ---------------------------------------------------------------------------
// Canonicalization tables
// ---------------------------------------------------------------------------

/// Phrase-level synonym replacements, applied to the whole lowercased field
/// *before* splitting so that multi-word raw tokens collapse to their
/// canonical form even when they span a delimiter.
///
/// Ordered longest-pattern-first: "sci-fi fantasy" must win over "sci-fi",
/// otherwise the shorter pattern rewrites the prefix and the longer one can
/// never match.
const SYNONYMS: &[(&str, &str)] = &[
    ("science-fiction", "science fiction"),
    ("action-adventure", "action"),
    ("action adventure", "action"),
    ("sci-fi fantasy", "science fiction"),
    ("sci fi fantasy", "science fiction"),
    ("reality-tv", "reality"),
    ("talk-show", "talk show"),
    ("game-show", "game show"),
    ("tv movie", "movie"),
    ("sci-fi", "science fiction"),
    ("sci fi", "science fiction"),
];

/// Pairwise consolidation rules: when both labels of a pair survive
/// tokenization, the subordinate one is dropped. A lone subordinate with no
/// partner present is kept as-is.
const CONSOLIDATION_PAIRS: &[(&str, &str)] = &[
    // (dominant, subordinate)
    ("action", "adventure"),
    ("science fiction", "fantasy"),
];

/// Characters separating genre tokens inside one raw field.
const DELIMITERS: &[char] = &[',', '/', '&', ';'];

/// List-encoding artifacts stripped before any other processing. These show
/// up when the source column was serialized from a Python list, e.g.
/// `"['drama', 'comedy']"`.
const NOISE_CHARS: &[char] = &['[', ']', '\'', '"'];

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Map a raw genre field to its canonical, sorted, deduplicated label
/// sequence.
///
/// Total function: missing input, noise-only input, and empty input all
/// yield an empty sequence — callers must treat that as "ungenred", never
/// as an error. Every surviving label is title-cased, unique within the
/// output, and the output is sorted case-insensitively, so two records with
/// the same genre *set* always serialize identically.
pub fn normalize(raw: &RawGenreField) -> Vec<String> {
    let text = match raw {
        RawGenreField::Present(s) => s.as_str(),
        RawGenreField::Missing => return Vec::new(),
    };

    let mut lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !NOISE_CHARS.contains(c))
        .collect();

    for (pattern, replacement) in SYNONYMS {
        if lowered.contains(pattern) {
            lowered = lowered.replace(pattern, replacement);
        }
    }

    // BTreeSet merges duplicates; the explicit sort below stays authoritative
    // for output order.
    let mut labels: BTreeSet<String> = lowered
        .split(DELIMITERS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    for (dominant, subordinate) in CONSOLIDATION_PAIRS {
        if labels.contains(*dominant) && labels.contains(*subordinate) {
            labels.remove(*subordinate);
        }
    }

    let mut out: Vec<String> = labels.iter().map(|label| title_case(label)).collect();
    out.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    out.dedup();
    out
}

/// Convenience wrapper for callers holding a plain string (CLI arguments,
/// re-feeding serialized output).
pub fn normalize_text(raw: &str) -> Vec<String> {
    normalize(&RawGenreField::Present(raw.to_string()))
}

/// Capitalize the first letter of every word, lowercasing the rest.
/// A word boundary is any non-alphabetic character, so "talk show" becomes
/// "Talk Show" and "film-noir" becomes "Film-Noir".
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_boundary = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_boundary = false;
        } else {
            out.push(c);
            at_boundary = true;
        }
    }
    out
}
