//! Writes a synthetic `cities_temperatures` dataset (CSV and Parquet) so the
//! dashboard can run without the Kaggle download.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;

/// (city, annual mean °F, seasonal amplitude °F, southern hemisphere)
const CITIES: [(&str, f64, f64, bool); 10] = [
    ("Buenos Aires", 64.0, 11.0, true),
    ("Dakar", 78.0, 5.0, false),
    ("Moscow", 42.0, 22.0, false),
    ("Sydney", 65.0, 8.0, true),
    ("Tokyo", 61.0, 15.0, false),
    ("Cairo", 72.0, 12.0, false),
    ("Lima", 67.0, 5.0, true),
    ("Toronto", 48.0, 22.0, false),
    ("Mumbai", 82.0, 4.0, false),
    ("Helsinki", 42.0, 20.0, false),
];

/// splitmix64: small, deterministic, good enough for plot noise.
struct NoiseSource(u64);

impl NoiseSource {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [-1, 1).
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    /// Roughly normal via the sum of four uniforms.
    fn jitter(&mut self, spread: f64) -> f64 {
        (0..4).map(|_| self.unit()).sum::<f64>() / 2.0 * spread
    }
}

struct Row {
    city: &'static str,
    date: NaiveDate,
    fahrenheit: f64,
}

fn generate(start: NaiveDate, end: NaiveDate, noise: &mut NoiseSource) -> Vec<Row> {
    let mut rows = Vec::new();
    for &(city, mean, amplitude, southern) in &CITIES {
        let phase = if southern { 0.0 } else { std::f64::consts::PI };
        for date in start.iter_days().take_while(|d| *d <= end) {
            let angle = 2.0 * std::f64::consts::PI * date.ordinal0() as f64 / 365.25;
            let season = (angle + phase).cos();
            let fahrenheit = mean + amplitude * season + noise.jitter(4.0);
            rows.push(Row {
                city,
                date,
                fahrenheit: (fahrenheit * 10.0).round() / 10.0,
            });
        }
    }
    rows
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    // Leading unnamed index column, like `DataFrame.to_csv`.
    writer.write_record(["", "City", "Date", "AvgTemperatureFahrenheit"])?;
    for (i, row) in rows.iter().enumerate() {
        writer.write_record([
            i.to_string(),
            row.city.to_string(),
            row.date.to_string(),
            format!("{:.1}", row.fahrenheit),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn to_batch(rows: &[Row]) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch date")?;
    let schema = Arc::new(Schema::new(vec![
        Field::new("City", DataType::Utf8, false),
        Field::new("Date", DataType::Date32, false),
        Field::new("AvgTemperatureFahrenheit", DataType::Float64, false),
    ]));

    let cities = StringArray::from(rows.iter().map(|r| r.city).collect::<Vec<_>>());
    let dates = Date32Array::from(
        rows.iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    );
    let temps = Float64Array::from(rows.iter().map(|r| r.fahrenheit).collect::<Vec<_>>());

    RecordBatch::try_new(schema, vec![Arc::new(cities), Arc::new(dates), Arc::new(temps)])
        .context("building record batch")
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).context("creating Parquet file")?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let start = NaiveDate::from_ymd_opt(1995, 1, 1).context("start date")?;
    let end = NaiveDate::from_ymd_opt(2019, 12, 31).context("end date")?;
    let mut noise = NoiseSource(42);
    let rows = generate(start, end, &mut noise);

    let dir = Path::new("data");
    std::fs::create_dir_all(dir).context("creating data directory")?;

    let csv_path = dir.join("cities_temperatures.csv");
    write_csv(&rows, &csv_path)?;

    let batch = to_batch(&rows)?;
    let parquet_path = dir.join("cities_temperatures.parquet");
    write_parquet(&batch, &parquet_path)?;

    log::debug!("Preview:\n{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {} rows for {} cities to {} and {}",
        rows.len(),
        CITIES.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
