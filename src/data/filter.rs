use std::collections::BTreeSet;

use super::model::{CatalogRecord, CatalogTable};

// ---------------------------------------------------------------------------
// Filter criteria: one user-selected query over the catalog
// ---------------------------------------------------------------------------

/// Media-type restriction: either every type passes, or exactly one does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSelection {
    All,
    Only(String),
}

impl TypeSelection {
    /// Parse a user-facing selection; the literal "All" (any case) lifts the
    /// restriction.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("all") {
            TypeSelection::All
        } else {
            TypeSelection::Only(value.trim().to_string())
        }
    }
}

/// One immutable query: conjunctive across categories, disjunctive within
/// the genre set. Constructed fresh per interaction and discarded after
/// producing a view.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive release-year range.
    pub years: (i32, i32),
    /// Inclusive rating range.
    pub ratings: (f64, f64),
    pub media_type: TypeSelection,
    /// Canonical labels to match; empty means no genre restriction.
    pub genres: BTreeSet<String>,
}

impl Default for FilterCriteria {
    /// Unrestricted criteria: every record passes.
    fn default() -> Self {
        FilterCriteria {
            years: (i32::MIN, i32::MAX),
            ratings: (f64::NEG_INFINITY, f64::INFINITY),
            media_type: TypeSelection::All,
            genres: BTreeSet::new(),
        }
    }
}

impl FilterCriteria {
    /// Criteria whose numeric bounds are the table's observed spans, the
    /// same defaults an interactive caller would present as slider limits.
    pub fn for_table(table: &CatalogTable) -> Self {
        let mut criteria = FilterCriteria::default();
        if let Some(span) = table.year_span() {
            criteria.years = span;
        }
        if let Some(span) = table.rating_span() {
            criteria.ratings = span;
        }
        criteria
    }
}

// ---------------------------------------------------------------------------
// Filter application
// ---------------------------------------------------------------------------

/// Return indices of records that pass all criteria, preserving the table's
/// original order.
///
/// A record passes when:
/// * its release year lies in `years` (inclusive) and
/// * its rating lies in `ratings` (inclusive) and
/// * its media type equals the selection, unless `TypeSelection::All` and
/// * `genres` is empty, or at least one of its labels is in `genres`.
///
/// Inverted ranges and unknown media types simply produce an empty view.
pub fn filtered_indices(table: &CatalogTable, criteria: &FilterCriteria) -> Vec<usize> {
    table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| passes(record, criteria))
        .map(|(i, _)| i)
        .collect()
}

fn passes(record: &CatalogRecord, criteria: &FilterCriteria) -> bool {
    // Cheap numeric predicates first; the genre set intersection last.
    let (year_lo, year_hi) = criteria.years;
    if record.release_year < year_lo || record.release_year > year_hi {
        return false;
    }
    let (rating_lo, rating_hi) = criteria.ratings;
    if record.rating < rating_lo || record.rating > rating_hi {
        return false;
    }
    if let TypeSelection::Only(wanted) = &criteria.media_type {
        if record.media_type != *wanted {
            return false;
        }
    }
    criteria.genres.is_empty() || record.genres.iter().any(|g| criteria.genres.contains(g))
}
