use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::CatalogTable;

/// Header row for exported views, matching the input contract's column
/// names.
pub const EXPORT_HEADER: [&str; 6] = [
    "title",
    "type",
    "genres",
    "releaseYear",
    "imdbAverageRating",
    "imdbNumVotes",
];

/// Serialize a view as UTF-8 delimited text. The genre field is the
/// comma-joined canonical sequence, so equal genre sets export
/// byte-identically.
pub fn write_csv<W: Write>(table: &CatalogTable, view: &[usize], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(EXPORT_HEADER).context("writing CSV header")?;

    for &idx in view {
        let record = &table.records()[idx];
        let genres = record.genres.join(",");
        let year = record.release_year.to_string();
        let rating = record.rating.to_string();
        let votes = record.votes.to_string();
        out.write_record([
            record.title.as_str(),
            record.media_type.as_str(),
            genres.as_str(),
            year.as_str(),
            rating.as_str(),
            votes.as_str(),
        ])
        .with_context(|| format!("writing CSV row for record {idx}"))?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn to_csv_string(table: &CatalogTable, view: &[usize]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(table, view, &mut buffer)?;
    String::from_utf8(buffer).context("CSV output was not valid UTF-8")
}

pub fn write_csv_file(table: &CatalogTable, view: &[usize], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(table, view, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CatalogRecord;

    fn sample_table() -> CatalogTable {
        CatalogTable::from_records(vec![
            CatalogRecord {
                title: "First".to_string(),
                media_type: "movie".to_string(),
                release_year: 2019,
                rating: 7.5,
                votes: 1000.0,
                genres: vec!["Action".to_string(), "Comedy".to_string()],
            },
            CatalogRecord {
                title: "Second, The".to_string(),
                media_type: "series".to_string(),
                release_year: 2020,
                rating: 8.2,
                votes: 500.0,
                genres: vec!["Drama".to_string()],
            },
        ])
    }

    #[test]
    fn genres_serialize_as_the_comma_joined_canonical_sequence() {
        let table = sample_table();
        let csv = to_csv_string(&table, &[0, 1]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,type,genres,releaseYear,imdbAverageRating,imdbNumVotes"
        );
        // Multi-genre field is quoted because it contains the delimiter.
        assert_eq!(lines.next().unwrap(), "First,movie,\"Action,Comedy\",2019,7.5,1000");
        assert_eq!(lines.next().unwrap(), "\"Second, The\",series,Drama,2020,8.2,500");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn view_selection_and_order_are_respected() {
        let table = sample_table();
        let csv = to_csv_string(&table, &[1]).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().starts_with("\"Second, The\""));
    }

    #[test]
    fn empty_view_exports_header_only() {
        let table = sample_table();
        let csv = to_csv_string(&table, &[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn export_parses_back_with_a_csv_reader() {
        let table = sample_table();
        let csv_text = to_csv_string(&table, &[0, 1]).unwrap();
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let rows: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(2), Some("Action,Comedy"));
        assert_eq!(rows[1].get(0), Some("Second, The"));
    }
}
