use std::collections::HashSet;

use chrono::NaiveDate;

/// Column holding the city name.
pub const CITY_COLUMN: &str = "City";
/// Column holding the observation date.
pub const DATE_COLUMN: &str = "Date";
/// Column holding the daily average temperature in °F.
pub const FAHRENHEIT_COLUMN: &str = "AvgTemperatureFahrenheit";
/// Derived column added at load time.
pub const CELSIUS_COLUMN: &str = "AvgTemperatureCelsius";

/// Convert a Fahrenheit reading to Celsius.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

// ---------------------------------------------------------------------------
// TemperatureRecord – one row of the table
// ---------------------------------------------------------------------------

/// A single daily observation for one city.
///
/// Celsius is derived in the constructor so the two temperature fields can
/// never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureRecord {
    city: String,
    date: NaiveDate,
    fahrenheit: f64,
    celsius: f64,
}

impl TemperatureRecord {
    pub fn new(city: impl Into<String>, date: NaiveDate, fahrenheit: f64) -> Self {
        Self {
            city: city.into(),
            date,
            fahrenheit,
            celsius: fahrenheit_to_celsius(fahrenheit),
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn fahrenheit(&self) -> f64 {
        self.fahrenheit
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }
}

// ---------------------------------------------------------------------------
// TemperatureTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All records in source row order, plus the column bookkeeping done by the
/// loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureTable {
    records: Vec<TemperatureRecord>,
    /// Source column names after duplicate-collapse, plus the derived column.
    columns: Vec<String>,
    /// Names of duplicate columns the loader dropped.
    dropped_columns: Vec<String>,
    /// Distinct cities in first-appearance order.
    cities: Vec<String>,
}

impl TemperatureTable {
    /// Build a table from records with the canonical column layout.
    pub fn from_records(records: Vec<TemperatureRecord>) -> Self {
        let columns = [CITY_COLUMN, DATE_COLUMN, FAHRENHEIT_COLUMN]
            .iter()
            .map(|c| c.to_string())
            .collect();
        Self::with_columns(records, columns, Vec::new())
    }

    /// Build a table, recording the (deduplicated) source columns and the
    /// duplicates that were dropped on the way in.
    pub fn with_columns(
        records: Vec<TemperatureRecord>,
        mut columns: Vec<String>,
        dropped_columns: Vec<String>,
    ) -> Self {
        if !columns.iter().any(|c| c == CELSIUS_COLUMN) {
            columns.push(CELSIUS_COLUMN.to_string());
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut cities = Vec::new();
        for rec in &records {
            if seen.insert(rec.city()) {
                cities.push(rec.city().to_string());
            }
        }

        TemperatureTable {
            records,
            columns,
            dropped_columns,
            cities,
        }
    }

    pub fn records(&self) -> &[TemperatureRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    /// Distinct city names, in the order they first appear in the file.
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
