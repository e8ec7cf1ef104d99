mod data;
mod report;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use data::export;
use data::filter::{FilterCriteria, TypeSelection};
use data::genres;
use data::loader::MedianImputer;
use data::model::CatalogTable;
use report::ReportOptions;
use state::{CatalogStore, Session};

/// Explore a media title catalog: normalize genres, filter, aggregate.
#[derive(Parser)]
#[command(name = "genrescope", version, about)]
struct Cli {
    /// Catalog file (.csv, .json or .parquet)
    file: PathBuf,

    /// Lowest release year to keep (defaults to the oldest in the data)
    #[arg(long)]
    year_min: Option<i32>,

    /// Highest release year to keep
    #[arg(long)]
    year_max: Option<i32>,

    /// Lowest rating to keep (defaults to the lowest in the data)
    #[arg(long)]
    rating_min: Option<f64>,

    /// Highest rating to keep
    #[arg(long)]
    rating_max: Option<f64>,

    /// Media type to keep, or "All"
    #[arg(long, default_value = "All")]
    media_type: String,

    /// Genres to match (any-of); raw spellings are normalized
    #[arg(long, value_delimiter = ',')]
    genres: Vec<String>,

    /// How many genres the popularity ranking lists
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Genre to detail in the rating-distribution section
    #[arg(long)]
    focus: Option<String>,

    /// Genres for the mean-rating comparison
    #[arg(long, value_delimiter = ',')]
    compare: Vec<String>,

    /// Write the filtered view as CSV to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut store = CatalogStore::new();
    let table = store.load(&cli.file, &MedianImputer)?;

    let mut session = Session::new(Arc::clone(&table));
    session.set_criteria(criteria_from(&cli, &table));

    let options = ReportOptions {
        top: cli.top,
        focus: cli
            .focus
            .as_deref()
            .and_then(|raw| genres::normalize_text(raw).into_iter().next()),
        compare: genres::normalize_text(&cli.compare.join(",")),
    };
    let analysis = report::build(session.table(), session.visible(), &options);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", report::render_text(&analysis));
        if session.visible().is_empty() && !table.is_empty() {
            print_catalog_hints(&table);
        }
    }

    if let Some(path) = &cli.export {
        export::write_csv_file(session.table(), session.visible(), path)?;
        eprintln!(
            "Wrote {} filtered records to {}",
            session.visible().len(),
            path.display()
        );
    }
    Ok(())
}

/// What the catalog actually contains, to help the user widen an
/// over-restrictive query.
fn print_catalog_hints(table: &CatalogTable) {
    if let (Some((year_lo, year_hi)), Some((rating_lo, rating_hi))) =
        (table.year_span(), table.rating_span())
    {
        eprintln!("Catalog spans years {year_lo}-{year_hi} and ratings {rating_lo:.1}-{rating_hi:.1}.");
    }
    let types: Vec<String> = table.media_types().into_iter().collect();
    eprintln!("Available types: {}", types.join(", "));
    let genres: Vec<String> = table.genre_vocabulary().into_iter().take(10).collect();
    eprintln!("Known genres include: {}", genres.join(", "));
}

/// Criteria from CLI flags; unset bounds fall back to the table's observed
/// spans, the same way interactive sliders default to the data range.
fn criteria_from(cli: &Cli, table: &CatalogTable) -> FilterCriteria {
    let mut criteria = FilterCriteria::for_table(table);
    if let Some(min) = cli.year_min {
        criteria.years.0 = min;
    }
    if let Some(max) = cli.year_max {
        criteria.years.1 = max;
    }
    if let Some(min) = cli.rating_min {
        criteria.ratings.0 = min;
    }
    if let Some(max) = cli.rating_max {
        criteria.ratings.1 = max;
    }
    criteria.media_type = TypeSelection::parse(&cli.media_type);
    criteria.genres = genres::normalize_text(&cli.genres.join(","))
        .into_iter()
        .collect();
    criteria
}
