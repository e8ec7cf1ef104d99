use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::Serialize;

use crate::data::aggregate::{
    self, CorrelationMatrix, GenreCount, GroupedMeanRow, SummaryMetrics,
};
use crate::data::model::CatalogTable;

// ---------------------------------------------------------------------------
// Report structure
// ---------------------------------------------------------------------------

/// One title resolved out of a view for display.
#[derive(Debug, Clone, Serialize)]
pub struct TitleRow {
    pub title: String,
    pub media_type: String,
    pub release_year: i32,
    pub rating: f64,
    pub votes: f64,
}

/// Rating distribution detail for one genre.
#[derive(Debug, Clone, Serialize)]
pub struct FocusSection {
    pub genre: String,
    pub titles: u64,
    pub ratings: Vec<f64>,
    pub top_titles: Vec<TitleRow>,
}

/// Every aggregation over the current view, bundled for rendering or JSON
/// output. Plain data, no presentation concerns embedded.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: Option<SummaryMetrics>,
    pub top_genres: Vec<GenreCount>,
    pub focus: Option<FocusSection>,
    pub mean_rating_by_genre_and_type: Vec<GroupedMeanRow>,
    pub mean_rating_by_year: BTreeMap<i32, f64>,
    pub releases_by_year: BTreeMap<i32, u64>,
    pub correlation: Option<CorrelationMatrix>,
}

/// Knobs the caller picks per report.
pub struct ReportOptions {
    /// How many genres the popularity ranking lists.
    pub top: usize,
    /// Genre to detail; defaults to the most frequent one in the view.
    pub focus: Option<String>,
    /// Canonical labels for the grouped-mean comparison; defaults to the
    /// three most frequent.
    pub compare: Vec<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            top: 10,
            focus: None,
            compare: Vec::new(),
        }
    }
}

const TOP_TITLES: usize = 10;

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

pub fn build(table: &CatalogTable, view: &[usize], options: &ReportOptions) -> AnalysisReport {
    let frequency = aggregate::genre_frequency(table, view);
    let top_genres = aggregate::top_genres(&frequency, options.top);

    let focus_label = options
        .focus
        .clone()
        .or_else(|| top_genres.first().map(|g| g.genre.clone()));
    let focus = focus_label.map(|label| {
        let distribution = aggregate::rating_distribution(table, view, &label, TOP_TITLES);
        FocusSection {
            genre: label,
            titles: distribution.members.len() as u64,
            ratings: distribution.ratings,
            top_titles: distribution
                .top_titles
                .iter()
                .map(|&idx| resolve_title(table, idx))
                .collect(),
        }
    });

    let compare: BTreeSet<String> = if options.compare.is_empty() {
        top_genres.iter().take(3).map(|g| g.genre.clone()).collect()
    } else {
        options.compare.iter().cloned().collect()
    };

    AnalysisReport {
        summary: aggregate::summary_metrics(table, view),
        top_genres,
        focus,
        mean_rating_by_genre_and_type: aggregate::mean_rating_by_genre_and_type(
            table, view, &compare,
        ),
        mean_rating_by_year: aggregate::mean_rating_by_year(table, view),
        releases_by_year: aggregate::releases_by_year(table, view),
        correlation: aggregate::correlation_matrix(table, view),
    }
}

fn resolve_title(table: &CatalogTable, idx: usize) -> TitleRow {
    let record = &table.records()[idx];
    TitleRow {
        title: record.title.clone(),
        media_type: record.media_type.clone(),
        release_year: record.release_year,
        rating: record.rating,
        votes: record.votes,
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Render the report as plain text for the terminal.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    match &report.summary {
        Some(summary) => {
            let _ = writeln!(out, "== Summary ==");
            let _ = writeln!(out, "titles:           {}", summary.titles);
            let _ = writeln!(out, "mean rating:      {:.2}", summary.mean_rating);
            let _ = writeln!(out, "total votes:      {:.0}", summary.total_votes);
            let _ = writeln!(out, "mean year:        {:.0}", summary.mean_year);
            let _ = writeln!(out, "mean votes/title: {:.0}", summary.mean_votes);
            let _ = writeln!(out, "rating std dev:   {:.2}", summary.rating_std_dev);
        }
        None => {
            let _ = writeln!(out, "No records match the current filters.");
            let _ = writeln!(out, "Consider widening the year or rating ranges.");
            return out;
        }
    }

    let _ = writeln!(out, "\n== Top genres ==");
    for entry in &report.top_genres {
        let _ = writeln!(out, "{:<20} {}", entry.genre, entry.count);
    }

    if let Some(focus) = &report.focus {
        let _ = writeln!(out, "\n== Rating distribution: {} ==", focus.genre);
        let _ = writeln!(out, "{} titles", focus.titles);
        for row in &focus.top_titles {
            let _ = writeln!(
                out,
                "{:<40} {:>4.1}  ({}, {}, {:.0} votes)",
                row.title, row.rating, row.media_type, row.release_year, row.votes
            );
        }
    }

    if !report.mean_rating_by_genre_and_type.is_empty() {
        let _ = writeln!(out, "\n== Mean rating by genre and type ==");
        for row in &report.mean_rating_by_genre_and_type {
            let _ = writeln!(
                out,
                "{:<20} {:<10} {:.2}  ({} titles)",
                row.genre, row.media_type, row.mean_rating, row.titles
            );
        }
    }

    if !report.mean_rating_by_year.is_empty() {
        let _ = writeln!(out, "\n== Mean rating by year ==");
        for (year, mean) in &report.mean_rating_by_year {
            let releases = report.releases_by_year.get(year).copied().unwrap_or(0);
            let _ = writeln!(out, "{year}  {mean:.2}  ({releases} releases)");
        }
    }

    if let Some(correlation) = &report.correlation {
        let _ = writeln!(out, "\n== Correlation ==");
        let _ = write!(out, "{:<20}", "");
        for name in correlation.variables {
            let _ = write!(out, "{name:>20}");
        }
        let _ = writeln!(out);
        for (name, row) in correlation.variables.iter().zip(&correlation.coefficients) {
            let _ = write!(out, "{name:<20}");
            for value in row {
                let _ = write!(out, "{value:>20.3}");
            }
            let _ = writeln!(out);
        }
    }

    out
}
