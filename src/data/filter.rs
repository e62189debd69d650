use chrono::NaiveDate;

use super::model::{TemperatureRecord, TemperatureTable};

/// Largest number of cities the UI lets a user compare at once.
///
/// [`query`] does not check it; callers enforce it when building the
/// selection (see `state::Selection`).
pub const MAX_SELECTED_CITIES: usize = 4;

// ---------------------------------------------------------------------------
// Filter predicate: selected cities plus an inclusive date interval
// ---------------------------------------------------------------------------

/// One user interaction's worth of filter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub cities: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A recoverable condition corrected while running a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryNotice {
    /// The start date was after the end date; the bounds were swapped.
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

impl QueryNotice {
    pub fn message(&self) -> String {
        match self {
            QueryNotice::InvertedDateRange { .. } => {
                "Start date is after end date. Swapping automatically.".to_string()
            }
        }
    }
}

impl FilterQuery {
    pub fn new(cities: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            cities,
            start_date,
            end_date,
        }
    }

    /// Return the query with ordered bounds, plus a notice when they had to
    /// be swapped.
    pub fn normalized(&self) -> (FilterQuery, Option<QueryNotice>) {
        let (start, end, notice) = order_bounds(self.start_date, self.end_date);
        (FilterQuery::new(self.cities.clone(), start, end), notice)
    }
}

fn order_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate, Option<QueryNotice>) {
    if start > end {
        (end, start, Some(QueryNotice::InvertedDateRange { start, end }))
    } else {
        (start, end, None)
    }
}

/// Filtered records for one city, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySeries<'a> {
    pub city: String,
    pub records: Vec<&'a TemperatureRecord>,
}

/// Per-city slices in selection order, with the effective (ordered) bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub series: Vec<CitySeries<'a>>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notice: Option<QueryNotice>,
}

impl QueryResult<'_> {
    /// Look up the records for a city.
    pub fn get(&self, city: &str) -> Option<&[&TemperatureRecord]> {
        self.series
            .iter()
            .find(|s| s.city == city)
            .map(|s| s.records.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Slice the table per city and clip to `[start_date, end_date]`, both ends
/// inclusive.
///
/// Inverted bounds are swapped and reported through
/// [`QueryResult::notice`].  A city with nothing in range gets an empty
/// series; an empty selection gives an empty result.  Repeated selections of
/// the same city are collapsed to the first.
pub fn query<'a>(
    table: &'a TemperatureTable,
    cities: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> QueryResult<'a> {
    let (start, end, notice) = order_bounds(start_date, end_date);
    if notice.is_some() {
        log::warn!("Inverted date range {start_date}..{end_date}; swapping bounds");
    }

    let mut series: Vec<CitySeries<'a>> = Vec::with_capacity(cities.len());
    for city in cities {
        if series.iter().any(|s| &s.city == city) {
            continue;
        }
        let records = table
            .records()
            .iter()
            .filter(|r| r.city() == city && r.date() >= start && r.date() <= end)
            .collect();
        series.push(CitySeries {
            city: city.clone(),
            records,
        });
    }

    QueryResult {
        series,
        start_date: start,
        end_date: end,
        notice,
    }
}

/// Run a [`FilterQuery`] against the table.
pub fn run<'a>(table: &'a TemperatureTable, filter: &FilterQuery) -> QueryResult<'a> {
    query(table, &filter.cities, filter.start_date, filter.end_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cities(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn dakar_table() -> TemperatureTable {
        TemperatureTable::from_records(vec![
            TemperatureRecord::new("Dakar", date(2000, 1, 1), 30.0),
            TemperatureRecord::new("Dakar", date(2000, 1, 2), 32.0),
            TemperatureRecord::new("Dakar", date(2000, 1, 3), 34.0),
        ])
    }

    fn mixed_table() -> TemperatureTable {
        TemperatureTable::from_records(vec![
            TemperatureRecord::new("Dakar", date(2004, 12, 31), 80.0),
            TemperatureRecord::new("Buenos Aires", date(2005, 1, 1), 75.0),
            TemperatureRecord::new("Dakar", date(2005, 1, 1), 81.0),
            TemperatureRecord::new("Dakar", date(2005, 3, 15), 84.0),
            TemperatureRecord::new("Buenos Aires", date(2005, 6, 1), 50.0),
            TemperatureRecord::new("Dakar", date(2005, 6, 1), 86.0),
            TemperatureRecord::new("Dakar", date(2005, 6, 2), 87.0),
        ])
    }

    #[test]
    fn dakar_scenario_keeps_two_records() {
        let table = dakar_table();
        let result = query(&table, &cities(&["Dakar"]), date(2000, 1, 1), date(2000, 1, 2));

        let dakar = result.get("Dakar").unwrap();
        assert_eq!(dakar.len(), 2);
        assert!((dakar[0].celsius() - (-1.11)).abs() < 0.01);
        assert!(dakar[1].celsius().abs() < 1e-12);
        assert_eq!(result.notice, None);
    }

    #[test]
    fn bounds_are_inclusive() {
        let table = mixed_table();
        let result = query(&table, &cities(&["Dakar"]), date(2005, 1, 1), date(2005, 6, 1));

        let dates: Vec<NaiveDate> = result.get("Dakar").unwrap().iter().map(|r| r.date()).collect();
        assert_eq!(dates, vec![date(2005, 1, 1), date(2005, 3, 15), date(2005, 6, 1)]);
    }

    #[test]
    fn inverted_range_matches_ordered_range_and_raises_notice() {
        let table = mixed_table();
        let sel = cities(&["Dakar", "Buenos Aires"]);

        let ordered = query(&table, &sel, date(2005, 1, 1), date(2005, 6, 1));
        let inverted = query(&table, &sel, date(2005, 6, 1), date(2005, 1, 1));

        assert_eq!(inverted.series, ordered.series);
        assert_eq!(inverted.start_date, date(2005, 1, 1));
        assert_eq!(inverted.end_date, date(2005, 6, 1));
        assert_eq!(
            inverted.notice,
            Some(QueryNotice::InvertedDateRange {
                start: date(2005, 6, 1),
                end: date(2005, 1, 1),
            })
        );
        assert_eq!(ordered.notice, None);
    }

    #[test]
    fn empty_selection_gives_empty_mapping() {
        let table = mixed_table();
        let result = query(&table, &[], date(1990, 1, 1), date(2020, 1, 1));
        assert!(result.is_empty());
        assert_eq!(result.notice, None);
    }

    #[test]
    fn city_without_records_in_range_gets_empty_series() {
        let table = mixed_table();
        let result = query(
            &table,
            &cities(&["Buenos Aires", "Dakar"]),
            date(2005, 6, 2),
            date(2005, 12, 31),
        );

        assert_eq!(result.series.len(), 2);
        assert_eq!(result.series[0].city, "Buenos Aires");
        assert!(result.series[0].records.is_empty());
        assert_eq!(result.series[1].records.len(), 1);
    }

    #[test]
    fn selection_order_is_preserved_and_duplicates_collapse() {
        let table = mixed_table();
        let result = query(
            &table,
            &cities(&["Buenos Aires", "Dakar", "Buenos Aires"]),
            date(2000, 1, 1),
            date(2010, 12, 31),
        );
        let order: Vec<&str> = result.series.iter().map(|s| s.city.as_str()).collect();
        assert_eq!(order, vec!["Buenos Aires", "Dakar"]);
    }

    #[test]
    fn query_is_idempotent() {
        let table = mixed_table();
        let sel = cities(&["Dakar", "Buenos Aires"]);
        let a = query(&table, &sel, date(2005, 1, 1), date(2005, 6, 1));
        let b = query(&table, &sel, date(2005, 1, 1), date(2005, 6, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn filter_query_normalizes_inverted_bounds() {
        let filter = FilterQuery::new(cities(&["Dakar"]), date(2010, 1, 1), date(2000, 1, 1));
        let (fixed, notice) = filter.normalized();
        assert_eq!(fixed.start_date, date(2000, 1, 1));
        assert_eq!(fixed.end_date, date(2010, 1, 1));
        assert!(notice.is_some());

        let (same, none) = fixed.normalized();
        assert_eq!(same, fixed);
        assert_eq!(none, None);
    }

    #[test]
    fn run_uses_filter_values() {
        let table = dakar_table();
        let filter = FilterQuery::new(cities(&["Dakar"]), date(2000, 1, 3), date(2000, 1, 2));
        let result = run(&table, &filter);
        assert_eq!(result.get("Dakar").unwrap().len(), 2);
        assert!(result.notice.is_some());
    }
}
