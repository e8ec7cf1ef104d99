use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::data::filter::{filtered_indices, FilterCriteria, TypeSelection};
use crate::data::loader::{self, Imputer};
use crate::data::model::CatalogTable;

// ---------------------------------------------------------------------------
// CatalogStore – keyed table cache owned by the loading side
// ---------------------------------------------------------------------------

/// Owns loaded tables, keyed by source path. Reloading the same path is a
/// cache hit until the entry is explicitly invalidated; invalidation is
/// wholesale per key since tables never mutate in place.
#[derive(Default)]
pub struct CatalogStore {
    cache: BTreeMap<PathBuf, Arc<CatalogTable>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        CatalogStore::default()
    }

    pub fn load(&mut self, path: &Path, imputer: &dyn Imputer) -> Result<Arc<CatalogTable>> {
        if let Some(table) = self.cache.get(path) {
            log::debug!("table cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(loader::load_file(path, imputer)?);
        self.cache.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table for one path; the next `load` re-reads it.
    pub fn invalidate(&mut self, path: &Path) {
        self.cache.remove(path);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

// ---------------------------------------------------------------------------
// Session – one table, current criteria, cached view
// ---------------------------------------------------------------------------

/// Interactive query state over one loaded table: the current criteria and
/// the indices passing them. Every criteria mutation refilters eagerly, so
/// `visible` is always consistent with `criteria`.
pub struct Session {
    table: Arc<CatalogTable>,
    criteria: FilterCriteria,
    visible: Vec<usize>,
}

impl Session {
    pub fn new(table: Arc<CatalogTable>) -> Self {
        let visible = (0..table.len()).collect();
        Session {
            table,
            criteria: FilterCriteria::default(),
            visible,
        }
    }

    pub fn table(&self) -> &CatalogTable {
        &self.table
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Indices of records passing the current criteria (cached).
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    pub fn set_years(&mut self, min: i32, max: i32) {
        self.criteria.years = (min, max);
        self.refilter();
    }

    pub fn set_ratings(&mut self, min: f64, max: f64) {
        self.criteria.ratings = (min, max);
        self.refilter();
    }

    pub fn set_media_type(&mut self, selection: TypeSelection) {
        self.criteria.media_type = selection;
        self.refilter();
    }

    /// Toggle a single canonical label in the genre restriction.
    pub fn toggle_genre(&mut self, label: &str) {
        if !self.criteria.genres.remove(label) {
            self.criteria.genres.insert(label.to_string());
        }
        self.refilter();
    }

    pub fn clear_genres(&mut self) {
        self.criteria.genres.clear();
        self.refilter();
    }

    /// Swap in a reloaded table; criteria reset and the view recomputes.
    pub fn replace_table(&mut self, table: Arc<CatalogTable>) {
        self.table = table;
        self.criteria = FilterCriteria::default();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.visible = filtered_indices(&self.table, &self.criteria);
        log::debug!(
            "filter pass kept {} of {} records",
            self.visible.len(),
            self.table.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::MedianImputer;
    use crate::data::model::CatalogRecord;
    use std::io::Write as _;

    fn sample_table() -> Arc<CatalogTable> {
        Arc::new(CatalogTable::from_records(vec![
            CatalogRecord {
                title: "t1".to_string(),
                media_type: "movie".to_string(),
                release_year: 2019,
                rating: 7.5,
                votes: 1000.0,
                genres: vec!["Action".to_string(), "Comedy".to_string()],
            },
            CatalogRecord {
                title: "t2".to_string(),
                media_type: "series".to_string(),
                release_year: 2020,
                rating: 8.2,
                votes: 500.0,
                genres: vec!["Drama".to_string()],
            },
        ]))
    }

    #[test]
    fn new_session_shows_everything() {
        let session = Session::new(sample_table());
        assert_eq!(session.visible(), &[0, 1]);
    }

    #[test]
    fn mutators_refilter_eagerly() {
        let mut session = Session::new(sample_table());
        session.set_media_type(TypeSelection::Only("series".to_string()));
        assert_eq!(session.visible(), &[1]);

        session.set_media_type(TypeSelection::All);
        session.toggle_genre("Comedy");
        assert_eq!(session.visible(), &[0]);

        // Toggling the same label off lifts the restriction.
        session.toggle_genre("Comedy");
        assert_eq!(session.visible(), &[0, 1]);
    }

    #[test]
    fn replace_table_resets_criteria() {
        let mut session = Session::new(sample_table());
        session.set_years(2020, 2020);
        assert_eq!(session.visible(), &[1]);

        session.replace_table(sample_table());
        assert_eq!(session.criteria(), &FilterCriteria::default());
        assert_eq!(session.visible(), &[0, 1]);
    }

    #[test]
    fn store_caches_by_path_until_invalidated() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("creating temp file");
        writeln!(
            file,
            "title,type,genres,releaseYear,imdbAverageRating,imdbNumVotes"
        )
        .unwrap();
        writeln!(file, "t1,movie,Drama,2019,7.5,1000").unwrap();
        file.flush().unwrap();

        let mut store = CatalogStore::new();
        let first = store.load(file.path(), &MedianImputer).expect("first load");
        let second = store.load(file.path(), &MedianImputer).expect("cached load");
        assert!(Arc::ptr_eq(&first, &second));

        store.invalidate(file.path());
        let third = store.load(file.path(), &MedianImputer).expect("reload");
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 1);

        store.clear();
        let fourth = store.load(file.path(), &MedianImputer).expect("post-clear load");
        assert!(!Arc::ptr_eq(&third, &fourth));
    }
}
