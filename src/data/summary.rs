use chrono::NaiveDate;

use super::model::{TemperatureRecord, TemperatureTable};
use crate::error::{DashboardError, Result};

/// Dataset-wide aggregates shown in the "Basic Information" section.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    /// Distinct cities in first-appearance order.
    pub cities: Vec<String>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// Coldest record; the first one in table order on ties.
    pub min_temp: TemperatureRecord,
    /// Hottest record; the first one in table order on ties.
    pub max_temp: TemperatureRecord,
}

/// Compute the summary in a single pass over the table.
///
/// Strict comparisons mean a later record with the same extreme Celsius
/// value never replaces an earlier one.
pub fn summarize(table: &TemperatureTable) -> Result<SummaryMetrics> {
    let mut records = table.records().iter();
    let first = records.next().ok_or(DashboardError::EmptyDataset)?;

    let mut min_date = first.date();
    let mut max_date = first.date();
    let mut coldest = first;
    let mut hottest = first;

    for rec in records {
        min_date = min_date.min(rec.date());
        max_date = max_date.max(rec.date());
        if rec.celsius() < coldest.celsius() {
            coldest = rec;
        }
        if rec.celsius() > hottest.celsius() {
            hottest = rec;
        }
    }

    Ok(SummaryMetrics {
        cities: table.cities().to_vec(),
        min_date,
        max_date,
        min_temp: coldest.clone(),
        max_temp: hottest.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> TemperatureTable {
        TemperatureTable::from_records(vec![
            TemperatureRecord::new("Buenos Aires", date(2003, 5, 2), 55.0),
            TemperatureRecord::new("Dakar", date(1999, 12, 31), 88.0),
            TemperatureRecord::new("Moscow", date(2001, 1, 15), -12.5),
            TemperatureRecord::new("Dakar", date(2010, 7, 4), 91.5),
            TemperatureRecord::new("Moscow", date(2006, 2, 3), 2.0),
        ])
    }

    #[test]
    fn summarizes_dates_cities_and_extremes() {
        let summary = summarize(&sample_table()).unwrap();

        assert_eq!(summary.cities, ["Buenos Aires", "Dakar", "Moscow"]);
        assert_eq!(summary.min_date, date(1999, 12, 31));
        assert_eq!(summary.max_date, date(2010, 7, 4));
        assert_eq!(summary.min_temp.city(), "Moscow");
        assert_eq!(summary.min_temp.date(), date(2001, 1, 15));
        assert_eq!(summary.max_temp.city(), "Dakar");
        assert_eq!(summary.max_temp.date(), date(2010, 7, 4));
    }

    #[test]
    fn extremes_bound_every_record() {
        let table = sample_table();
        let summary = summarize(&table).unwrap();
        for rec in table.records() {
            assert!(summary.min_temp.celsius() <= rec.celsius());
            assert!(summary.max_temp.celsius() >= rec.celsius());
        }
    }

    #[test]
    fn ties_pick_first_record_in_table_order() {
        let table = TemperatureTable::from_records(vec![
            TemperatureRecord::new("Lima", date(2000, 3, 1), 60.0),
            TemperatureRecord::new("Oslo", date(2000, 1, 9), 10.0),
            TemperatureRecord::new("Dakar", date(2000, 6, 1), 95.0),
            TemperatureRecord::new("Helsinki", date(2000, 1, 2), 10.0),
            TemperatureRecord::new("Cairo", date(2000, 6, 2), 95.0),
        ]);

        for _ in 0..3 {
            let summary = summarize(&table).unwrap();
            assert_eq!(summary.min_temp.city(), "Oslo");
            assert_eq!(summary.max_temp.city(), "Dakar");
        }
    }

    #[test]
    fn single_record_is_both_extremes() {
        let table = TemperatureTable::from_records(vec![TemperatureRecord::new(
            "Dakar",
            date(2000, 1, 1),
            70.0,
        )]);
        let summary = summarize(&table).unwrap();
        assert_eq!(summary.min_temp, summary.max_temp);
        assert_eq!(summary.min_date, summary.max_date);
    }

    #[test]
    fn empty_table_is_an_error() {
        let table = TemperatureTable::from_records(Vec::new());
        assert_eq!(summarize(&table), Err(DashboardError::EmptyDataset));
    }
}
