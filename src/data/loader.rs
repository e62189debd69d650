use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type};
use arrow::temporal_conversions::date32_to_datetime;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value as JsonValue;

use super::model::{
    CITY_COLUMN, DATE_COLUMN, FAHRENHEIT_COLUMN, TemperatureRecord, TemperatureTable,
};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a temperature table, reporting any failure as
/// [`DashboardError::DataUnavailable`].
pub fn load(path: &Path) -> crate::error::Result<TemperatureTable> {
    load_file(path).map_err(|e| DashboardError::DataUnavailable {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    })
}

/// Load a temperature table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `City`, `Date`, `AvgTemperatureFahrenheit`
/// * `.json`    – `[{ "City": ..., "Date": ..., "AvgTemperatureFahrenheit": ... }, ...]`
/// * `.parquet` – the same three columns, any string / temporal / numeric encoding
///
/// Other columns are ignored.  When a column name appears more than once only
/// the first occurrence is kept.
pub fn load_file(path: &Path) -> Result<TemperatureTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    if !table.dropped_columns().is_empty() {
        log::warn!(
            "Dropped duplicate columns {:?} from {}",
            table.dropped_columns(),
            path.display()
        );
    }
    log::info!(
        "Loaded {} temperature records for {} cities from {}",
        table.len(),
        table.cities().len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

/// Loads the dataset at most once and hands out the same shared table on
/// every later call.  A failed load is not cached.
#[derive(Debug)]
pub struct TableCache {
    path: PathBuf,
    table: Option<Arc<TemperatureTable>>,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    pub fn get_or_load(&mut self) -> crate::error::Result<Arc<TemperatureTable>> {
        if let Some(table) = &self.table {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load(&self.path)?);
        self.table = Some(Arc::clone(&table));
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Column handling shared by all formats
// ---------------------------------------------------------------------------

/// Split headers into the first occurrence of each name (with its source
/// position) and the names of later duplicates.
fn dedupe_columns(headers: &[String]) -> (Vec<(usize, String)>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if seen.insert(name.as_str()) {
            kept.push((idx, name.clone()));
        } else {
            dropped.push(name.clone());
        }
    }
    (kept, dropped)
}

/// Source positions of the three required columns.
#[derive(Debug, Clone, Copy)]
struct RequiredColumns {
    city: usize,
    date: usize,
    fahrenheit: usize,
}

impl RequiredColumns {
    fn resolve(kept: &[(usize, String)]) -> Result<Self> {
        let find = |name: &str| {
            kept.iter()
                .find(|(_, n)| n == name)
                .map(|(i, _)| *i)
                .with_context(|| format!("missing required column '{name}'"))
        };
        Ok(Self {
            city: find(CITY_COLUMN)?,
            date: find(DATE_COLUMN)?,
            fahrenheit: find(FAHRENHEIT_COLUMN)?,
        })
    }
}

fn kept_names(kept: Vec<(usize, String)>) -> Vec<String> {
    kept.into_iter().map(|(_, n)| n).collect()
}

/// Parse a calendar date, discarding any time-of-day component.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn build_record(
    row: usize,
    city: &str,
    date: NaiveDate,
    fahrenheit: f64,
) -> Result<TemperatureRecord> {
    let city = city.trim();
    if city.is_empty() {
        bail!("Row {row}: empty '{CITY_COLUMN}'");
    }
    if !fahrenheit.is_finite() {
        bail!("Row {row}: '{FAHRENHEIT_COLUMN}' is not a finite number");
    }
    Ok(TemperatureRecord::new(city, date, fahrenheit))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one observation per row.
/// A leading unnamed index column (as written by `DataFrame.to_csv`) is
/// ignored like any other extra column.
fn load_csv(path: &Path) -> Result<TemperatureTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let (kept, dropped) = dedupe_columns(&headers);
    let cols = RequiredColumns::resolve(&kept)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let city = row.get(cols.city).unwrap_or("");
        let date_text = row.get(cols.date).unwrap_or("");
        let date = parse_date(date_text)
            .with_context(|| format!("Row {row_no}: '{date_text}' is not a date"))?;
        let temp_text = row.get(cols.fahrenheit).unwrap_or("").trim();
        let fahrenheit: f64 = temp_text
            .parse()
            .with_context(|| format!("Row {row_no}: '{temp_text}' is not a number"))?;

        records.push(build_record(row_no, city, date, fahrenheit)?);
    }

    Ok(TemperatureTable::with_columns(records, kept_names(kept), dropped))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "City": "Dakar", "Date": "2000-01-01", "AvgTemperatureFahrenheit": 75.2 },
///   ...
/// ]
/// ```
///
/// `Date` may also be an integer of milliseconds since the Unix epoch, which
/// is what pandas writes by default.  A key repeated inside one object keeps
/// its first value, like a repeated CSV header.
fn load_json(path: &Path) -> Result<TemperatureTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<JsonRow> = serde_json::from_str(&text).context("parsing JSON records")?;

    let headers: Vec<String> = rows
        .first()
        .map(|row| row.fields.iter().map(|(k, _)| k.clone()).collect())
        .unwrap_or_default();
    let mut dropped: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        for name in &row.dropped {
            if !dropped.contains(name) {
                dropped.push(name.clone());
            }
        }

        let city = row
            .get(CITY_COLUMN)
            .and_then(|v| v.as_str())
            .with_context(|| format!("Row {i}: missing or invalid '{CITY_COLUMN}'"))?;
        let date = row
            .get(DATE_COLUMN)
            .and_then(json_to_date)
            .with_context(|| format!("Row {i}: missing or invalid '{DATE_COLUMN}'"))?;
        let fahrenheit = row
            .get(FAHRENHEIT_COLUMN)
            .and_then(|v| v.as_f64())
            .with_context(|| format!("Row {i}: missing or invalid '{FAHRENHEIT_COLUMN}'"))?;

        records.push(build_record(i, city, date, fahrenheit)?);
    }

    Ok(TemperatureTable::with_columns(records, headers, dropped))
}

/// One JSON object with its keys in source order.  Repeated keys keep the
/// first value; later names land in `dropped`.
#[derive(Debug, Default)]
struct JsonRow {
    fields: Vec<(String, JsonValue)>,
    dropped: Vec<String>,
}

impl JsonRow {
    fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<'de> Deserialize<'de> for JsonRow {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(JsonRowVisitor)
    }
}

struct JsonRowVisitor;

impl<'de> Visitor<'de> for JsonRowVisitor {
    type Value = JsonRow;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object per row")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<JsonRow, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut row = JsonRow::default();
        while let Some((key, value)) = map.next_entry::<String, JsonValue>()? {
            if row.get(&key).is_some() {
                row.dropped.push(key);
            } else {
                row.fields.push((key, value));
            }
        }
        Ok(row)
    }
}

fn json_to_date(val: &JsonValue) -> Option<NaiveDate> {
    match val {
        JsonValue::String(s) => parse_date(s),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the three required columns.
///
/// * `City`: Utf8 / LargeUtf8 (anything castable to Utf8)
/// * `Date`: Date32, Date64, Timestamp, or a string column
/// * `AvgTemperatureFahrenheit`: any numeric type
///
/// Works with files written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<TemperatureTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let (kept, dropped) = dedupe_columns(&headers);
    let cols = RequiredColumns::resolve(&kept)?;

    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let offset = records.len();

        let cities = cast(batch.column(cols.city), &DataType::Utf8)
            .with_context(|| format!("casting '{CITY_COLUMN}' to string"))?;
        let cities = cities.as_string::<i32>();
        let dates = date_column(batch.column(cols.date))?;
        let temps = cast(batch.column(cols.fahrenheit), &DataType::Float64)
            .with_context(|| format!("casting '{FAHRENHEIT_COLUMN}' to float"))?;
        let temps = temps.as_primitive::<Float64Type>();

        for i in 0..batch.num_rows() {
            let row = offset + i;
            if cities.is_null(i) || temps.is_null(i) {
                bail!("Row {row}: null value in a required column");
            }
            let date = dates[i].with_context(|| format!("Row {row}: missing or invalid date"))?;
            records.push(build_record(row, cities.value(i), date, temps.value(i))?);
        }
    }

    Ok(TemperatureTable::with_columns(records, kept_names(kept), dropped))
}

/// Decode a date column into calendar dates; `None` marks null or unparseable
/// cells.
fn date_column(col: &ArrayRef) -> Result<Vec<Option<NaiveDate>>> {
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = cast(col, &DataType::Utf8).context("casting 'Date' to string")?;
            let text = text.as_string::<i32>();
            Ok(text.iter().map(|v| v.and_then(parse_date)).collect())
        }
        _ => {
            let days = cast(col, &DataType::Date32).context("casting 'Date' to Date32")?;
            let days = days.as_primitive::<Date32Type>();
            Ok(days
                .iter()
                .map(|v| v.and_then(date32_to_datetime).map(|dt| dt.date()))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Date32Array, Float64Array, StringArray, TimestampMillisecondArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_csv_with_index_column_and_timestamps() {
        let file = write_temp(
            ".csv",
            ",City,Date,AvgTemperatureFahrenheit\n\
             0,Dakar,2000-01-01 00:00:00,30.0\n\
             1,Dakar,2000-01-02,32\n\
             2,Buenos Aires,2000-01-01T12:30:00,77.5\n",
        );

        let table = load(file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.cities(), ["Dakar", "Buenos Aires"]);

        let first = &table.records()[0];
        assert_eq!(first.date(), date(2000, 1, 1));
        assert!((first.celsius() - (-10.0 / 9.0)).abs() < 1e-9);
        assert_eq!(table.records()[2].date(), date(2000, 1, 1));
        assert!(table.dropped_columns().is_empty());
    }

    #[test]
    fn duplicate_columns_keep_first_occurrence() {
        let file = write_temp(
            ".csv",
            "City,Date,AvgTemperatureFahrenheit,City,AvgTemperatureFahrenheit\n\
             Dakar,2000-01-01,50,Paris,-100\n",
        );

        let table = load(file.path()).unwrap();
        let rec = &table.records()[0];
        assert_eq!(rec.city(), "Dakar");
        assert_eq!(rec.fahrenheit(), 50.0);
        assert_eq!(table.dropped_columns(), ["City", "AvgTemperatureFahrenheit"]);
        assert_eq!(
            table.columns(),
            ["City", "Date", "AvgTemperatureFahrenheit", "AvgTemperatureCelsius"]
        );
    }

    #[test]
    fn missing_required_column_is_data_unavailable() {
        let file = write_temp(".csv", "City,Date\nDakar,2000-01-01\n");
        let err = load(file.path()).unwrap_err();
        match err {
            DashboardError::DataUnavailable { reason, .. } => {
                assert!(reason.contains("AvgTemperatureFahrenheit"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_rows_are_data_unavailable() {
        let bad_date = write_temp(
            ".csv",
            "City,Date,AvgTemperatureFahrenheit\nDakar,yesterday,50\n",
        );
        assert!(matches!(
            load(bad_date.path()),
            Err(DashboardError::DataUnavailable { .. })
        ));

        let empty_temp = write_temp(
            ".csv",
            "City,Date,AvgTemperatureFahrenheit\nDakar,2000-01-01,\n",
        );
        assert!(matches!(
            load(empty_temp.path()),
            Err(DashboardError::DataUnavailable { .. })
        ));

        let empty_city = write_temp(".csv", "City,Date,AvgTemperatureFahrenheit\n,2000-01-01,50\n");
        assert!(matches!(
            load(empty_city.path()),
            Err(DashboardError::DataUnavailable { .. })
        ));

        let nan = write_temp(".csv", "City,Date,AvgTemperatureFahrenheit\nDakar,2000-01-01,NaN\n");
        assert!(matches!(
            load(nan.path()),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn missing_file_and_unknown_extension_are_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(matches!(
            load(&missing),
            Err(DashboardError::DataUnavailable { .. })
        ));

        let txt = write_temp(".txt", "City,Date,AvgTemperatureFahrenheit\n");
        let err = load(txt.path()).unwrap_err().to_string();
        assert!(err.contains("Unsupported file extension"), "{err}");
    }

    #[test]
    fn header_only_csv_loads_as_empty_table() {
        let file = write_temp(".csv", "City,Date,AvgTemperatureFahrenheit\n");
        let table = load(file.path()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn loads_json_records_with_string_and_epoch_dates() {
        let file = write_temp(
            ".json",
            r#"[
                {"City": "Dakar", "Date": "2000-01-01", "AvgTemperatureFahrenheit": 30.0},
                {"City": "Dakar", "Date": 946771200000, "AvgTemperatureFahrenheit": 32}
            ]"#,
        );

        let table = load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].date(), date(2000, 1, 2));
        assert!(table.records()[1].celsius().abs() < 1e-12);
    }

    #[test]
    fn json_row_without_temperature_fails() {
        let file = write_temp(".json", r#"[{"City": "Dakar", "Date": "2000-01-01"}]"#);
        assert!(matches!(
            load(file.path()),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn json_repeated_keys_keep_first_value_in_source_order() {
        let file = write_temp(
            ".json",
            r#"[{"City": "Dakar", "Date": "2000-01-01", "AvgTemperatureFahrenheit": 50,
                 "City": "Paris", "AvgTemperatureFahrenheit": -100}]"#,
        );

        let table = load(file.path()).unwrap();
        let rec = &table.records()[0];
        assert_eq!(rec.city(), "Dakar");
        assert_eq!(rec.fahrenheit(), 50.0);
        assert_eq!(table.dropped_columns(), ["City", "AvgTemperatureFahrenheit"]);
        assert_eq!(
            table.columns(),
            ["City", "Date", "AvgTemperatureFahrenheit", "AvgTemperatureCelsius"]
        );
    }

    #[test]
    fn json_non_object_row_fails() {
        let file = write_temp(".json", r#"[["Dakar", "2000-01-01", 50]]"#);
        assert!(matches!(
            load(file.path()),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    /// Write a two-row Parquet file whose `Date` column has the given type.
    fn write_parquet(date_type: DataType, dates: ArrayRef) -> NamedTempFile {
        let schema = Arc::new(Schema::new(vec![
            Field::new("City", DataType::Utf8, false),
            Field::new("Date", date_type, false),
            Field::new("AvgTemperatureFahrenheit", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Dakar", "Lima"])),
                dates,
                Arc::new(Float64Array::from(vec![30.0, 212.0])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        file
    }

    fn assert_two_parquet_days(file: &NamedTempFile) {
        let table = load(file.path()).unwrap();
        assert_eq!(table.cities(), ["Dakar", "Lima"]);
        assert_eq!(table.records()[0].date(), date(2000, 1, 1));
        assert_eq!(table.records()[1].date(), date(2000, 1, 2));
        assert!((table.records()[1].celsius() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn loads_parquet_with_date32_column() {
        // 10957 days after the epoch is 2000-01-01.
        let file = write_parquet(
            DataType::Date32,
            Arc::new(Date32Array::from(vec![10957, 10958])),
        );
        assert_two_parquet_days(&file);
    }

    #[test]
    fn loads_parquet_with_timestamp_column() {
        // Midday, so the time-of-day has to be discarded.
        let file = write_parquet(
            DataType::Timestamp(TimeUnit::Millisecond, None),
            Arc::new(TimestampMillisecondArray::from(vec![
                946_728_000_000,
                946_814_400_000,
            ])),
        );
        assert_two_parquet_days(&file);
    }

    #[test]
    fn loads_parquet_with_string_dates() {
        let file = write_parquet(
            DataType::Utf8,
            Arc::new(StringArray::from(vec!["2000-01-01 00:00:00", "2000-01-02"])),
        );
        assert_two_parquet_days(&file);
    }

    #[test]
    fn parquet_with_unparseable_string_date_fails() {
        let file = write_parquet(
            DataType::Utf8,
            Arc::new(StringArray::from(vec!["2000-01-01", "someday"])),
        );
        assert!(matches!(
            load(file.path()),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn cache_loads_once_per_session() {
        let file = write_temp(".csv", "City,Date,AvgTemperatureFahrenheit\nDakar,2000-01-01,50\n");
        let mut cache = TableCache::new(file.path());
        assert!(!cache.is_loaded());

        let first = cache.get_or_load().unwrap();
        // The cached table survives the file going away.
        std::fs::remove_file(file.path()).unwrap();
        let second = cache.get_or_load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_loaded());
    }

    #[test]
    fn failed_load_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.csv");
        let mut cache = TableCache::new(&path);
        assert!(cache.get_or_load().is_err());

        std::fs::write(&path, "City,Date,AvgTemperatureFahrenheit\nDakar,2000-01-01,50\n").unwrap();
        assert_eq!(cache.get_or_load().unwrap().len(), 1);
    }

    #[test]
    fn parse_date_accepts_common_layouts() {
        let expected = Some(date(2005, 6, 1));
        assert_eq!(parse_date("2005-06-01"), expected);
        assert_eq!(parse_date(" 2005-06-01 "), expected);
        assert_eq!(parse_date("2005/06/01"), expected);
        assert_eq!(parse_date("06/01/2005"), expected);
        assert_eq!(parse_date("2005-06-01 23:59:59"), expected);
        assert_eq!(parse_date("2005-06-01T08:00:00.250"), expected);
        assert_eq!(parse_date("2005-06-01T08:00:00+02:00"), expected);
        assert_eq!(parse_date("June first"), None);
    }
}
