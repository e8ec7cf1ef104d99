use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const ADJECTIVES: &[&str] = &[
    "Silent", "Broken", "Golden", "Hidden", "Electric", "Crimson", "Forgotten", "Midnight",
    "Savage", "Quiet", "Burning", "Distant",
];

const NOUNS: &[&str] = &[
    "Horizon", "Empire", "Garden", "Signal", "Harbor", "Winter", "Promise", "Road",
    "Kingdom", "Echo", "Covenant", "Frontier",
];

/// Raw genre spellings, deliberately inconsistent: synonym variants,
/// list-bracket artifacts and duplicate casings the normalizer has to
/// clean up.
const RAW_GENRES: &[&str] = &[
    "Drama",
    "comedy",
    "Action",
    "Adventure",
    "Sci-Fi",
    "sci-fi fantasy",
    "Science Fiction",
    "Thriller",
    "Romance",
    "Documentary",
    "Horror",
    "Reality-TV",
    "Talk-Show",
    "Crime",
    "Fantasy",
    "Animation",
    "Family",
    "Mystery",
    "Western",
    "music & musical",
];

struct SampleRow {
    title: String,
    media_type: &'static str,
    genres: Option<String>,
    release_year: Option<i64>,
    rating: Option<f64>,
    votes: Option<i64>,
}

fn generate_row(rng: &mut SimpleRng, row_id: usize) -> SampleRow {
    let title = format!(
        "The {} {} {}",
        ADJECTIVES[rng.pick(ADJECTIVES.len())],
        NOUNS[rng.pick(NOUNS.len())],
        row_id
    );
    let media_type = if rng.chance(0.6) { "movie" } else { "series" };

    let genres = if rng.chance(0.05) {
        None
    } else {
        let count = 1 + rng.pick(3);
        let mut picked: Vec<&str> = Vec::new();
        while picked.len() < count {
            let candidate = RAW_GENRES[rng.pick(RAW_GENRES.len())];
            if !picked.contains(&candidate) {
                picked.push(candidate);
            }
        }
        if rng.chance(0.15) {
            // Python-list style cell: ['drama', 'comedy']
            let quoted: Vec<String> = picked
                .iter()
                .map(|g| format!("'{}'", g.to_lowercase()))
                .collect();
            Some(format!("[{}]", quoted.join(", ")))
        } else {
            Some(picked.join(", "))
        }
    };

    let release_year = if rng.chance(0.03) {
        None
    } else {
        Some(1980 + rng.pick(44) as i64)
    };
    let rating = if rng.chance(0.05) {
        None
    } else {
        let value = rng.gauss(6.5, 1.2).clamp(1.0, 10.0);
        Some((value * 10.0).round() / 10.0)
    };
    let votes = if rng.chance(0.05) {
        None
    } else {
        Some(10f64.powf(2.0 + 3.0 * rng.next_f64()) as i64)
    };

    SampleRow {
        title,
        media_type,
        genres,
        release_year,
        rating,
        votes,
    }
}

fn write_csv(rows: &[SampleRow], path: &str) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    writer
        .write_record([
            "title",
            "type",
            "genres",
            "releaseYear",
            "imdbAverageRating",
            "imdbNumVotes",
        ])
        .expect("Failed to write CSV header");
    for row in rows {
        let year = row.release_year.map(|y| y.to_string()).unwrap_or_default();
        let rating = row.rating.map(|r| r.to_string()).unwrap_or_default();
        let votes = row.votes.map(|v| v.to_string()).unwrap_or_default();
        writer
            .write_record([
                row.title.as_str(),
                row.media_type,
                row.genres.as_deref().unwrap_or(""),
                year.as_str(),
                rating.as_str(),
                votes.as_str(),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV file");
}

fn write_parquet(rows: &[SampleRow], path: &str) {
    let title_array = StringArray::from(
        rows.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
    );
    let type_array =
        StringArray::from(rows.iter().map(|r| r.media_type).collect::<Vec<_>>());
    let genres_array = StringArray::from(
        rows.iter().map(|r| r.genres.as_deref()).collect::<Vec<_>>(),
    );
    let year_array =
        Int64Array::from(rows.iter().map(|r| r.release_year).collect::<Vec<_>>());
    let rating_array =
        Float64Array::from(rows.iter().map(|r| r.rating).collect::<Vec<_>>());
    let votes_array = Int64Array::from(rows.iter().map(|r| r.votes).collect::<Vec<_>>());

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
            Arc::new(title_array),
            Arc::new(type_array),
            Arc::new(genres_array),
            Arc::new(year_array),
            Arc::new(rating_array),
            Arc::new(votes_array),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let rows: Vec<SampleRow> = (0..300).map(|i| generate_row(&mut rng, i)).collect();

    write_csv(&rows, "sample_catalog.csv");
    write_parquet(&rows, "sample_catalog.parquet");

    println!(
        "Wrote {} catalog rows to sample_catalog.csv and sample_catalog.parquet",
        rows.len()
    );
}
