use std::collections::BTreeSet;

use super::genres;

// ---------------------------------------------------------------------------
// RawGenreField – the genres cell as it arrives from the source table
// ---------------------------------------------------------------------------

/// The genres column at the ingestion boundary. Sources routinely leave the
/// cell blank or null; making that explicit here keeps the normalizer total
/// — `Missing` always maps to an empty label sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawGenreField {
    Present(String),
    Missing,
}

impl RawGenreField {
    /// Build from a raw cell value. Blank/whitespace-only cells count as
    /// missing.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().is_empty() {
            RawGenreField::Missing
        } else {
            RawGenreField::Present(cell.to_string())
        }
    }
}

impl From<Option<String>> for RawGenreField {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => RawGenreField::from_cell(&s),
            None => RawGenreField::Missing,
        }
    }
}

// ---------------------------------------------------------------------------
// RawRecord – one parsed source row, before imputation
// ---------------------------------------------------------------------------

/// A source row as parsed from file, numeric fields still optional.
/// An imputation step fills the holes before table construction; rows that
/// remain unresolved afterwards are dropped.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub title: String,
    pub media_type: String,
    pub genres: RawGenreField,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub votes: Option<f64>,
}

// ---------------------------------------------------------------------------
// CatalogRecord – one title in the normalized catalog
// ---------------------------------------------------------------------------

/// A single catalog entry after genre normalization and imputation.
///
/// `genres` holds canonical labels: title-cased, unique, sorted
/// case-insensitively. `media_type` is an opaque category whose values are
/// discovered from the data, not an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    pub title: String,
    pub media_type: String,
    pub release_year: i32,
    /// IMDb average rating, nominally in [0, 10]; may be imputed.
    pub rating: f64,
    /// IMDb vote count; fractional values are possible after imputation.
    pub votes: f64,
    pub genres: Vec<String>,
}

impl CatalogRecord {
    /// Whether the record carries the given canonical label.
    pub fn has_genre(&self, label: &str) -> bool {
        self.genres.iter().any(|g| g == label)
    }
}

// ---------------------------------------------------------------------------
// CatalogTable – the complete loaded catalog
// ---------------------------------------------------------------------------

/// The full normalized catalog, insertion order = source file order.
/// Immutable after construction: filtering produces index views, never
/// in-place mutation.
#[derive(Debug, Clone)]
pub struct CatalogTable {
    records: Vec<CatalogRecord>,
}

impl CatalogTable {
    /// Build the table from parsed rows. Genre normalization runs per row;
    /// rows whose numeric fields are still unresolved (or non-finite) after
    /// the upstream imputation step are dropped with a warning.
    pub fn from_raw(rows: Vec<RawRecord>) -> Self {
        let total = rows.len();
        let mut records = Vec::with_capacity(total);

        for row in rows {
            let (Some(release_year), Some(rating), Some(votes)) =
                (row.release_year, row.rating, row.votes)
            else {
                continue;
            };
            if !rating.is_finite() || !votes.is_finite() {
                continue;
            }
            records.push(CatalogRecord {
                title: row.title,
                media_type: row.media_type,
                release_year,
                rating,
                votes,
                genres: genres::normalize(&row.genres),
            });
        }

        let dropped = total - records.len();
        if dropped > 0 {
            log::warn!("dropped {dropped} of {total} rows with unresolved numeric fields");
        }
        CatalogTable { records }
    }

    /// Build directly from finished records (tests, synthetic tables).
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        CatalogTable { records }
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// Number of titles.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct canonical genre labels across the table. Derived on demand,
    /// never stored.
    pub fn genre_vocabulary(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .flat_map(|r| r.genres.iter().cloned())
            .collect()
    }

    /// Distinct media type values across the table.
    pub fn media_types(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .map(|r| r.media_type.clone())
            .collect()
    }

    /// (min, max) release year over the table, `None` when empty.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let years = self.records.iter().map(|r| r.release_year);
        let min = years.clone().min()?;
        let max = years.max()?;
        Some((min, max))
    }

    /// (min, max) rating over the table, `None` when empty.
    pub fn rating_span(&self) -> Option<(f64, f64)> {
        let mut ratings = self.records.iter().map(|r| r.rating);
        let first = ratings.next()?;
        let (min, max) = ratings.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, year: Option<i32>, rating: Option<f64>, votes: Option<f64>) -> RawRecord {
        RawRecord {
            title: title.to_string(),
            media_type: "movie".to_string(),
            genres: RawGenreField::from_cell("drama, comedy"),
            release_year: year,
            rating,
            votes,
        }
    }

    #[test]
    fn blank_cell_counts_as_missing() {
        assert_eq!(RawGenreField::from_cell("   "), RawGenreField::Missing);
        assert_eq!(
            RawGenreField::from_cell("drama"),
            RawGenreField::Present("drama".to_string())
        );
        assert_eq!(RawGenreField::from(None), RawGenreField::Missing);
    }

    #[test]
    fn from_raw_normalizes_genres_per_row() {
        let mut row = raw("t", Some(2000), Some(7.0), Some(100.0));
        row.genres = RawGenreField::from_cell("Sci-Fi, Fantasy");
        let table = CatalogTable::from_raw(vec![row]);
        assert_eq!(table.records()[0].genres, vec!["Science Fiction"]);
    }

    #[test]
    fn from_raw_drops_unresolved_rows() {
        let rows = vec![
            raw("keep", Some(2001), Some(6.5), Some(50.0)),
            raw("no year", None, Some(6.5), Some(50.0)),
            raw("no rating", Some(2001), None, Some(50.0)),
            raw("nan votes", Some(2001), Some(6.5), Some(f64::NAN)),
        ];
        let table = CatalogTable::from_raw(rows);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].title, "keep");
    }

    #[test]
    fn vocabularies_are_derived_from_records() {
        let rows = vec![
            RawRecord {
                title: "a".into(),
                media_type: "movie".into(),
                genres: RawGenreField::from_cell("action, adventure"),
                release_year: Some(1999),
                rating: Some(7.1),
                votes: Some(10.0),
            },
            RawRecord {
                title: "b".into(),
                media_type: "series".into(),
                genres: RawGenreField::from_cell("drama"),
                release_year: Some(2005),
                rating: Some(8.3),
                votes: Some(20.0),
            },
        ];
        let table = CatalogTable::from_raw(rows);
        let vocab: Vec<String> = table.genre_vocabulary().into_iter().collect();
        assert_eq!(vocab, vec!["Action", "Drama"]);
        let types: Vec<String> = table.media_types().into_iter().collect();
        assert_eq!(types, vec!["movie", "series"]);
        assert_eq!(table.year_span(), Some((1999, 2005)));
        assert_eq!(table.rating_span(), Some((7.1, 8.3)));
    }

    #[test]
    fn spans_are_none_for_empty_table() {
        let table = CatalogTable::from_records(Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.year_span(), None);
        assert_eq!(table.rating_span(), None);
    }
}
