use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::CatalogTable;

// ---------------------------------------------------------------------------
// Genre frequency
// ---------------------------------------------------------------------------

/// One genre with its title count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: u64,
}

/// Count titles per genre label over a view.
///
/// Multi-label expansion: a record contributes +1 to every label it carries,
/// so the counts generally sum to more than the record count.
pub fn genre_frequency(table: &CatalogTable, view: &[usize]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for &idx in view {
        for label in &table.records()[idx].genres {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Top `k` genres by count descending; ties break by lexicographic label
/// order so the listing is deterministic.
pub fn top_genres(frequency: &BTreeMap<String, u64>, k: usize) -> Vec<GenreCount> {
    let mut ranked: Vec<GenreCount> = frequency
        .iter()
        .map(|(genre, &count)| GenreCount {
            genre: genre.clone(),
            count,
        })
        .collect();
    // Stable sort on a map already ordered by label keeps ties lexicographic.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(k);
    ranked
}

// ---------------------------------------------------------------------------
// Rating distribution for one genre
// ---------------------------------------------------------------------------

/// The sub-view of records carrying one genre label, with the raw rating
/// values exposed for downstream bucketing.
#[derive(Debug, Clone)]
pub struct RatingDistribution {
    pub genre: String,
    /// Member indices into the table, original order preserved.
    pub members: Vec<usize>,
    /// Ratings parallel to `members`.
    pub ratings: Vec<f64>,
    /// Up to `top_n` member indices sorted by rating descending.
    pub top_titles: Vec<usize>,
}

pub fn rating_distribution(
    table: &CatalogTable,
    view: &[usize],
    genre: &str,
    top_n: usize,
) -> RatingDistribution {
    let members: Vec<usize> = view
        .iter()
        .copied()
        .filter(|&idx| table.records()[idx].has_genre(genre))
        .collect();
    let ratings: Vec<f64> = members
        .iter()
        .map(|&idx| table.records()[idx].rating)
        .collect();

    let mut top_titles = members.clone();
    top_titles.sort_by(|&a, &b| {
        table.records()[b]
            .rating
            .total_cmp(&table.records()[a].rating)
    });
    top_titles.truncate(top_n);

    RatingDistribution {
        genre: genre.to_string(),
        members,
        ratings,
        top_titles,
    }
}

// ---------------------------------------------------------------------------
// Grouped mean rating
// ---------------------------------------------------------------------------

/// Mean rating for one (genre, media type) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedMeanRow {
    pub genre: String,
    pub media_type: String,
    pub mean_rating: f64,
    pub titles: u64,
}

/// Mean rating grouped by (genre, media type), restricted to the given
/// labels. Multi-label expansion again: a record enters once per matching
/// label. Groups with zero members are omitted, never reported as NaN.
pub fn mean_rating_by_genre_and_type(
    table: &CatalogTable,
    view: &[usize],
    genres: &BTreeSet<String>,
) -> Vec<GroupedMeanRow> {
    let mut groups: BTreeMap<(String, String), (f64, u64)> = BTreeMap::new();
    for &idx in view {
        let record = &table.records()[idx];
        for label in &record.genres {
            if genres.contains(label) {
                let entry = groups
                    .entry((label.clone(), record.media_type.clone()))
                    .or_insert((0.0, 0));
                entry.0 += record.rating;
                entry.1 += 1;
            }
        }
    }
    groups
        .into_iter()
        .map(|((genre, media_type), (sum, n))| GroupedMeanRow {
            genre,
            media_type,
            mean_rating: sum / n as f64,
            titles: n,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Temporal aggregation
// ---------------------------------------------------------------------------

/// Mean rating per release year. One value per record, no genre expansion.
pub fn mean_rating_by_year(table: &CatalogTable, view: &[usize]) -> BTreeMap<i32, f64> {
    let mut groups: BTreeMap<i32, (f64, u64)> = BTreeMap::new();
    for &idx in view {
        let record = &table.records()[idx];
        let entry = groups.entry(record.release_year).or_insert((0.0, 0));
        entry.0 += record.rating;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(year, (sum, n))| (year, sum / n as f64))
        .collect()
}

/// Title count per release year.
pub fn releases_by_year(table: &CatalogTable, view: &[usize]) -> BTreeMap<i32, u64> {
    let mut counts = BTreeMap::new();
    for &idx in view {
        *counts
            .entry(table.records()[idx].release_year)
            .or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Column labels for [`CorrelationMatrix`], in matrix order.
pub const CORRELATION_VARIABLES: [&str; 3] =
    ["releaseYear", "imdbAverageRating", "imdbNumVotes"];

/// Pearson correlation matrix over the numeric columns of a view.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub variables: [&'static str; 3],
    /// `coefficients[i][j]` correlates `variables[i]` with `variables[j]`.
    pub coefficients: [[f64; 3]; 3],
}

/// Pearson correlation across {release year, rating, votes}. Returns `None`
/// for views with fewer than two rows; zero-variance columns correlate as
/// 0.0 rather than NaN.
pub fn correlation_matrix(table: &CatalogTable, view: &[usize]) -> Option<CorrelationMatrix> {
    if view.len() < 2 {
        return None;
    }
    let columns: [Vec<f64>; 3] = [
        view.iter()
            .map(|&idx| f64::from(table.records()[idx].release_year))
            .collect(),
        view.iter().map(|&idx| table.records()[idx].rating).collect(),
        view.iter().map(|&idx| table.records()[idx].votes).collect(),
    ];

    let mut coefficients = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            coefficients[i][j] = pearson(&columns[i], &columns[j]);
        }
    }
    Some(CorrelationMatrix {
        variables: CORRELATION_VARIABLES,
        coefficients,
    })
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        covariance / denominator
    }
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

/// Headline metrics over a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub titles: u64,
    pub mean_rating: f64,
    pub total_votes: f64,
    pub mean_year: f64,
    pub mean_votes: f64,
    /// Sample standard deviation of ratings; 0.0 for a single-row view.
    pub rating_std_dev: f64,
}

pub fn summary_metrics(table: &CatalogTable, view: &[usize]) -> Option<SummaryMetrics> {
    if view.is_empty() {
        return None;
    }
    let n = view.len() as f64;
    let mut rating_sum = 0.0;
    let mut votes_sum = 0.0;
    let mut year_sum = 0.0;
    for &idx in view {
        let record = &table.records()[idx];
        rating_sum += record.rating;
        votes_sum += record.votes;
        year_sum += f64::from(record.release_year);
    }
    let mean_rating = rating_sum / n;

    let rating_std_dev = if view.len() < 2 {
        0.0
    } else {
        let squared_deviations: f64 = view
            .iter()
            .map(|&idx| {
                let d = table.records()[idx].rating - mean_rating;
                d * d
            })
            .sum();
        (squared_deviations / (n - 1.0)).sqrt()
    };

    Some(SummaryMetrics {
        titles: view.len() as u64,
        mean_rating,
        total_votes: votes_sum,
        mean_year: year_sum / n,
        mean_votes: votes_sum / n,
        rating_std_dev,
    })
}
