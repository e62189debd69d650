//! Presentation adapter: turns query results into chart-ready shapes and the
//! summary strings.  Nothing in here filters or aggregates the table.

use chrono::NaiveDate;

use crate::data::filter::{self, CitySeries, FilterQuery, QueryNotice};
use crate::data::model::{TemperatureRecord, TemperatureTable};
use crate::data::summary::SummaryMetrics;

/// Number of equal-width histogram bins.
pub const HISTOGRAM_BINS: usize = 20;
/// Fill opacity of overlaid histogram series.
pub const HISTOGRAM_OPACITY: f32 = 0.5;

/// Knobs for the chart projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub histogram_bins: usize,
    pub histogram_opacity: f32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            histogram_bins: HISTOGRAM_BINS,
            histogram_opacity: HISTOGRAM_OPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Chart shapes
// ---------------------------------------------------------------------------

/// (date, °C) points for one line of the "Temperature Over Time" chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub city: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// One histogram bar.  Bins are half-open except the last, which also
/// holds the upper edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// One city's distribution in the "Temperature Distribution" chart.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub city: String,
    pub bins: Vec<HistogramBin>,
    pub opacity: f32,
}

/// A headline plus a "{city} on {date}" caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryText {
    pub headline: String,
    pub caption: String,
}

/// Everything the comparison section draws for one interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notice: Option<QueryNotice>,
    pub lines: Vec<LineSeries>,
    pub histograms: Vec<HistogramSeries>,
    /// Selected cities with no records in the interval.
    pub empty_cities: Vec<String>,
}

/// The whole page for one interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub cities: Vec<String>,
    pub min_text: SummaryText,
    pub max_text: SummaryText,
    /// `None` until at least one city is selected.
    pub comparison: Option<Comparison>,
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

pub fn line_series(series: &CitySeries<'_>) -> LineSeries {
    LineSeries {
        city: series.city.clone(),
        points: series
            .records
            .iter()
            .map(|r| (r.date(), r.celsius()))
            .collect(),
    }
}

/// Bucket values into `bins` equal-width bins spanning their own min..max.
///
/// A zero-width range `v..v` is widened to `v-0.5..v+0.5`.  Empty input
/// gives no bins.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let bins = bins.max(1);

    let (mut lo, mut hi) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

pub fn histogram_series(series: &CitySeries<'_>, options: &ChartOptions) -> HistogramSeries {
    let values: Vec<f64> = series.records.iter().map(|r| r.celsius()).collect();
    HistogramSeries {
        city: series.city.clone(),
        bins: histogram(&values, options.histogram_bins),
        opacity: options.histogram_opacity,
    }
}

/// Min and max temperature strings, one decimal place.
pub fn summary_texts(summary: &SummaryMetrics) -> (SummaryText, SummaryText) {
    let text = |label: &str, rec: &TemperatureRecord| SummaryText {
        headline: format!("{label} Temperature: {:.1}°C", rec.celsius()),
        caption: format!("{} on {}", rec.city(), rec.date()),
    };
    (text("Min", &summary.min_temp), text("Max", &summary.max_temp))
}

/// Build the full view for the current filter values.
pub fn render(
    table: &TemperatureTable,
    summary: &SummaryMetrics,
    filter: &FilterQuery,
    options: &ChartOptions,
) -> RenderedView {
    let (min_text, max_text) = summary_texts(summary);

    let comparison = if filter.cities.is_empty() {
        None
    } else {
        let result = filter::run(table, filter);
        let (filled, empty): (Vec<_>, Vec<_>) =
            result.series.iter().partition(|s| !s.records.is_empty());

        Some(Comparison {
            start_date: result.start_date,
            end_date: result.end_date,
            notice: result.notice,
            lines: filled.iter().map(|s| line_series(s)).collect(),
            histograms: filled.iter().map(|s| histogram_series(s, options)).collect(),
            empty_cities: empty.iter().map(|s| s.city.clone()).collect(),
        })
    };

    RenderedView {
        cities: summary.cities.clone(),
        min_text,
        max_text,
        comparison,
    }
}
