use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CatalogTable, RawGenreField, RawRecord};

/// Columns every catalog source must provide.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "title",
    "type",
    "genres",
    "releaseYear",
    "imdbAverageRating",
    "imdbNumVotes",
];

/// Structural load failure: the source table is missing required columns.
/// Fatal and reported once — there is no partial load.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// ---------------------------------------------------------------------------
// Imputation seam
// ---------------------------------------------------------------------------

/// Fills missing numeric fields between parsing and table construction.
/// The strategy is pluggable; rows still unresolved afterwards are dropped
/// by [`CatalogTable::from_raw`].
pub trait Imputer {
    fn impute(&self, rows: &mut [RawRecord]);
}

/// Column-median fill for release year, rating and vote count.
pub struct MedianImputer;

impl Imputer for MedianImputer {
    fn impute(&self, rows: &mut [RawRecord]) {
        let year_median = median(
            rows.iter()
                .filter_map(|r| r.release_year.map(f64::from))
                .collect(),
        );
        let rating_median = median(rows.iter().filter_map(|r| r.rating).collect());
        let votes_median = median(rows.iter().filter_map(|r| r.votes).collect());

        for row in rows.iter_mut() {
            if row.release_year.is_none() {
                row.release_year = year_median.map(|m| m as i32);
            }
            if row.rating.is_none() {
                row.rating = rating_median;
            }
            if row.votes.is_none() {
                row.votes = votes_median;
            }
        }
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a catalog from a file: parse, impute, normalize. Dispatch by
/// extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required column names
/// * `.json`    – records-oriented array of objects
/// * `.parquet` – flat columnar table with the required column names
pub fn load_file(path: &Path, imputer: &dyn Imputer) -> Result<CatalogTable> {
    let mut rows = read_raw(path)?;
    imputer.impute(&mut rows);
    let table = CatalogTable::from_raw(rows);
    log::info!("loaded {} records from {}", table.len(), path.display());
    Ok(table)
}

/// Parse a catalog file into raw rows, without imputation.
pub fn read_raw(path: &Path) -> Result<Vec<RawRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

struct ColumnIndex {
    title: usize,
    media_type: usize,
    genres: usize,
    year: usize,
    rating: usize,
    votes: usize,
}

fn locate_columns(headers: &[String]) -> Result<ColumnIndex, SchemaError> {
    let mut missing = Vec::new();
    let mut find = |name: &'static str| match headers.iter().position(|h| h == name) {
        Some(idx) => idx,
        None => {
            missing.push(name.to_string());
            0
        }
    };
    let index = ColumnIndex {
        title: find("title"),
        media_type: find("type"),
        genres: find("genres"),
        year: find("releaseYear"),
        rating: find("imdbAverageRating"),
        votes: find("imdbNumVotes"),
    };
    if missing.is_empty() {
        Ok(index)
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

fn read_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let columns = locate_columns(&headers)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        rows.push(RawRecord {
            title: cell(columns.title).to_string(),
            media_type: cell(columns.media_type).trim().to_string(),
            genres: RawGenreField::from_cell(cell(columns.genres)),
            release_year: parse_year(cell(columns.year)),
            rating: parse_f64(cell(columns.rating)),
            votes: parse_f64(cell(columns.votes)),
        });
    }
    Ok(rows)
}

/// Parse a year cell. Accepts plain integers and float renderings like
/// "2019.0" that show up when the column passed through a float dtype.
fn parse_year(s: &str) -> Option<i32> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i32>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v as i32)
    })
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "title": "Example",
///     "type": "movie",
///     "genres": "Action, Comedy",
///     "releaseYear": 2019,
///     "imdbAverageRating": 7.5,
///     "imdbNumVotes": 1000
///   },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<Vec<RawRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    if let Some(first) = records.first() {
        let obj = first.as_object().context("Row 0 is not a JSON object")?;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !obj.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing).into());
        }
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        rows.push(RawRecord {
            title: json_string(obj.get("title")),
            media_type: json_string(obj.get("type")),
            genres: json_genres(obj.get("genres")),
            release_year: json_year(obj.get("releaseYear")),
            rating: json_f64(obj.get("imdbAverageRating")),
            votes: json_f64(obj.get("imdbNumVotes")),
        });
    }
    Ok(rows)
}

fn json_string(value: Option<&JsonValue>) -> String {
    value.and_then(JsonValue::as_str).unwrap_or("").to_string()
}

fn json_genres(value: Option<&JsonValue>) -> RawGenreField {
    match value {
        Some(JsonValue::String(s)) => RawGenreField::from_cell(s),
        // Some exports keep the genre list as an actual array.
        Some(JsonValue::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(JsonValue::as_str)
                .collect::<Vec<_>>()
                .join(",");
            RawGenreField::from_cell(&joined)
        }
        _ => RawGenreField::Missing,
    }
}

fn json_year(value: Option<&JsonValue>) -> Option<i32> {
    let v = value?;
    if let Some(i) = v.as_i64() {
        return Some(i as i32);
    }
    v.as_f64().filter(|f| f.is_finite()).map(|f| f as i32)
}

fn json_f64(value: Option<&JsonValue>) -> Option<f64> {
    value.and_then(JsonValue::as_f64).filter(|f| f.is_finite())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Load a Parquet catalog. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`): string columns
/// may be Utf8 or LargeUtf8, numeric columns any of Int32/Int64/Float32/
/// Float64, with nulls mapping to missing values.
fn read_parquet(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| schema.index_of(name).is_err())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing).into());
    }

    let title_idx = schema.index_of("title")?;
    let type_idx = schema.index_of("type")?;
    let genres_idx = schema.index_of("genres")?;
    let year_idx = schema.index_of("releaseYear")?;
    let rating_idx = schema.index_of("imdbAverageRating")?;
    let votes_idx = schema.index_of("imdbNumVotes")?;

    let reader = builder.build().context("building parquet reader")?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(RawRecord {
                title: string_at(batch.column(title_idx), row).unwrap_or_default(),
                media_type: string_at(batch.column(type_idx), row).unwrap_or_default(),
                genres: match string_at(batch.column(genres_idx), row) {
                    Some(s) => RawGenreField::from_cell(&s),
                    None => RawGenreField::Missing,
                },
                release_year: f64_at(batch.column(year_idx), row).map(|v| v as i32),
                rating: f64_at(batch.column(rating_idx), row),
                votes: f64_at(batch.column(votes_idx), row),
            });
        }
    }
    Ok(rows)
}

// -- Arrow helpers --

fn string_at(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| arr.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

fn f64_at(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    let value = match col.data_type() {
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|arr| f64::from(arr.value(row))),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|arr| arr.value(row) as f64),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|arr| f64::from(arr.value(row))),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|arr| arr.value(row)),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn temp_with(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("creating temp file");
        file.write_all(content.as_bytes()).expect("writing temp file");
        file
    }

    #[test]
    fn csv_load_normalizes_and_imputes() {
        let file = temp_with(
            ".csv",
            "title,type,genres,releaseYear,imdbAverageRating,imdbNumVotes\n\
             First,movie,\"Sci-Fi, Fantasy\",2019,7.5,1000\n\
             Second,series,Drama,,8.2,500\n\
             Third,movie,\"['action', 'adventure']\",2021,6.1,200\n",
        );
        let table = load_file(file.path(), &MedianImputer).expect("loading CSV");
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[0].genres, vec!["Science Fiction"]);
        assert_eq!(table.records()[2].genres, vec!["Action"]);
        // Missing year filled with the median of 2019 and 2021.
        assert_eq!(table.records()[1].release_year, 2020);
    }

    #[test]
    fn csv_missing_columns_is_a_schema_error() {
        let file = temp_with(".csv", "title,genres\nFirst,Drama\n");
        let err = load_file(file.path(), &MedianImputer).unwrap_err();
        let schema_err = err
            .downcast_ref::<SchemaError>()
            .expect("expected SchemaError");
        let SchemaError::MissingColumns(missing) = schema_err;
        assert_eq!(
            missing,
            &["type", "releaseYear", "imdbAverageRating", "imdbNumVotes"]
        );
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = temp_with(".xlsx", "not a table");
        assert!(read_raw(file.path()).is_err());
    }

    #[test]
    fn json_load_accepts_records_orientation() {
        let file = temp_with(
            ".json",
            r#"[
                {"title": "First", "type": "movie", "genres": "Action, Comedy",
                 "releaseYear": 2019, "imdbAverageRating": 7.5, "imdbNumVotes": 1000},
                {"title": "Second", "type": "series", "genres": ["drama", "crime"],
                 "releaseYear": 2020.0, "imdbAverageRating": null, "imdbNumVotes": 500}
            ]"#,
        );
        let rows = read_raw(file.path()).expect("reading JSON");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].release_year, Some(2020));
        assert_eq!(rows[1].rating, None);
        assert_eq!(
            rows[1].genres,
            RawGenreField::Present("drama,crime".to_string())
        );
    }

    #[test]
    fn json_missing_keys_is_a_schema_error() {
        let file = temp_with(".json", r#"[{"title": "First", "genres": "Drama"}]"#);
        let err = read_raw(file.path()).unwrap_err();
        assert!(err.downcast_ref::<SchemaError>().is_some());
    }

    #[test]
    fn parquet_round_trip_preserves_values_and_nulls() {
        use arrow::array::{Float64Array, Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("title", DataType::Utf8, false),
            Field::new("type", DataType::Utf8, false),
            Field::new("genres", DataType::Utf8, true),
            Field::new("releaseYear", DataType::Int64, true),
            Field::new("imdbAverageRating", DataType::Float64, true),
            Field::new("imdbNumVotes", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["First", "Second"])),
                Arc::new(StringArray::from(vec!["movie", "series"])),
                Arc::new(StringArray::from(vec![Some("Sci-Fi, Fantasy"), None])),
                Arc::new(Int64Array::from(vec![Some(2019), None])),
                Arc::new(Float64Array::from(vec![Some(7.5), Some(8.2)])),
                Arc::new(Int64Array::from(vec![Some(1000), Some(500)])),
            ],
        )
        .expect("building record batch");

        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .expect("creating temp file");
        let mut writer = ArrowWriter::try_new(
            file.reopen().expect("reopening temp file"),
            schema,
            None,
        )
        .expect("creating parquet writer");
        writer.write(&batch).expect("writing batch");
        writer.close().expect("closing writer");

        let rows = read_raw(file.path()).expect("reading parquet");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].release_year, Some(2019));
        assert_eq!(rows[1].release_year, None);
        assert_eq!(rows[1].genres, RawGenreField::Missing);
        assert_eq!(rows[1].votes, Some(500.0));
    }

    #[test]
    fn median_imputer_fills_each_column_independently() {
        let mut rows = vec![
            RawRecord {
                title: "a".into(),
                media_type: "movie".into(),
                genres: RawGenreField::Missing,
                release_year: Some(2000),
                rating: Some(6.0),
                votes: None,
            },
            RawRecord {
                title: "b".into(),
                media_type: "movie".into(),
                genres: RawGenreField::Missing,
                release_year: None,
                rating: Some(8.0),
                votes: Some(100.0),
            },
            RawRecord {
                title: "c".into(),
                media_type: "movie".into(),
                genres: RawGenreField::Missing,
                release_year: Some(2010),
                rating: None,
                votes: Some(300.0),
            },
        ];
        MedianImputer.impute(&mut rows);
        assert_eq!(rows[1].release_year, Some(2005));
        assert_eq!(rows[2].rating, Some(7.0));
        assert_eq!(rows[0].votes, Some(200.0));
    }

    #[test]
    fn median_of_odd_and_even_sets() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(Vec::new()), None);
    }
}
