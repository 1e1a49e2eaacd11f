use std::path::Path;
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

struct Event {
    iso: &'static str,
    disaster_type: &'static str,
    start_year: Option<i64>,
    event_name: String,
    total_deaths: i64,
    total_affected: i64,
}

/// Square "boundary" around a rough country centroid.
fn boundary(iso: &str, name: &str, lon: f64, lat: f64) -> serde_json::Value {
    let d = 2.0;
    json!({
        "type": "Feature",
        "id": iso,
        "properties": { "name": name },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [lon - d, lat - d], [lon + d, lat - d],
                [lon + d, lat + d], [lon - d, lat + d],
                [lon - d, lat - d],
            ]],
        },
    })
}

fn main() {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "public".to_string());
    let out_dir = Path::new(&out_dir);
    std::fs::create_dir_all(out_dir.join("geojson")).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);

    let countries = [
        ("FRA", "France", 2.2, 46.2),
        ("JPN", "Japan", 138.3, 36.2),
        ("IND", "India", 78.9, 20.6),
        ("USA", "United States of America", -98.6, 39.8),
        ("BRA", "Brazil", -51.9, -14.2),
    ];
    let disaster_types = ["Flood", "Storm", "Earthquake", "Drought", "Wildfire"];

    let mut events = Vec::new();
    for &(iso, _, _, _) in &countries {
        for _ in 0..40 {
            let disaster_type = disaster_types[rng.below(disaster_types.len() as u64) as usize];
            // Roughly one in twenty rows has no start year, as in real exports.
            let start_year = if rng.below(20) == 0 {
                None
            } else {
                Some(1990 + rng.below(34) as i64)
            };
            let n = events.len();
            events.push(Event {
                iso,
                disaster_type,
                start_year,
                event_name: format!("{disaster_type} {iso}-{n:04}"),
                total_deaths: rng.below(500) as i64,
                total_affected: rng.below(1_000_000) as i64,
            });
        }
    }

    // CSV
    let csv_path = out_dir.join("data.csv");
    let mut writer = csv::Writer::from_path(&csv_path).expect("Failed to create CSV file");
    writer
        .write_record([
            "ISO",
            "Disaster Type",
            "Start Year",
            "Event Name",
            "Total Deaths",
            "Total Affected",
        ])
        .expect("Failed to write CSV header");
    for e in &events {
        writer
            .write_record([
                e.iso.to_string(),
                e.disaster_type.to_string(),
                e.start_year.map(|y| y.to_string()).unwrap_or_default(),
                e.event_name.clone(),
                e.total_deaths.to_string(),
                e.total_affected.to_string(),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");

    // Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("ISO", DataType::Utf8, false),
        Field::new("Disaster Type", DataType::Utf8, false),
        Field::new("Start Year", DataType::Int64, true),
        Field::new("Event Name", DataType::Utf8, false),
        Field::new("Total Deaths", DataType::Int64, false),
        Field::new("Total Affected", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(events.iter().map(|e| e.iso))),
            Arc::new(StringArray::from_iter_values(
                events.iter().map(|e| e.disaster_type),
            )),
            Arc::new(Int64Array::from(
                events.iter().map(|e| e.start_year).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from_iter_values(
                events.iter().map(|e| e.event_name.as_str()),
            )),
            Arc::new(Int64Array::from_iter_values(
                events.iter().map(|e| e.total_deaths),
            )),
            Arc::new(Int64Array::from_iter_values(
                events.iter().map(|e| e.total_affected),
            )),
        ],
    )
    .expect("Failed to create RecordBatch");

    let parquet_path = out_dir.join("data.parquet");
    let file = std::fs::File::create(&parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    // GeoJSON
    let features: Vec<_> = countries
        .iter()
        .map(|(iso, name, lon, lat)| boundary(iso, name, *lon, *lat))
        .collect();
    let collection = json!({ "type": "FeatureCollection", "features": features });
    let geojson_path = out_dir.join("geojson").join("countries.geo.json");
    let text = serde_json::to_string_pretty(&collection).expect("Failed to encode GeoJSON");
    std::fs::write(&geojson_path, text).expect("Failed to write GeoJSON");

    println!(
        "Wrote {} events to {} and {}, {} boundaries to {}",
        events.len(),
        csv_path.display(),
        parquet_path.display(),
        countries.len(),
        geojson_path.display()
    );
}
