use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};

use crate::color::CityColors;
use crate::present::{HistogramSeries, LineSeries};

const PLOT_HEIGHT: f32 = 320.0;

/// Dates are plotted as day numbers counted from 0001-01-01.
fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn format_date_mark(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    x_to_date(mark.value)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Temperature over time
// ---------------------------------------------------------------------------

/// One line per city, x = date, y = °C.
pub fn temperature_lines(ui: &mut Ui, lines: &[LineSeries], colors: &CityColors) {
    ui.strong("Temperature Over Time");
    Plot::new("temperature_lines")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Avg Temperature (°C)")
        .x_axis_formatter(format_date_mark)
        .label_formatter(|name, value| {
            let day = x_to_date(value.x)
                .map(|d| d.to_string())
                .unwrap_or_default();
            if name.is_empty() {
                format!("{day}\n{:.1}°C", value.y)
            } else {
                format!("{name}\n{day}\n{:.1}°C", value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in lines {
                let points: PlotPoints = series
                    .points
                    .iter()
                    .map(|&(date, celsius)| [date_to_x(date), celsius])
                    .collect();

                let line = Line::new(points)
                    .name(&series.city)
                    .color(colors.color_for(&series.city))
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Temperature distribution
// ---------------------------------------------------------------------------

/// Overlaid translucent histograms, one per city.
pub fn temperature_histograms(ui: &mut Ui, histograms: &[HistogramSeries], colors: &CityColors) {
    ui.strong("Temperature Distribution");
    Plot::new("temperature_histograms")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Avg Temperature (°C)")
        .y_axis_label("Frequency")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in histograms {
                let bars: Vec<Bar> = series
                    .bins
                    .iter()
                    .map(|bin| Bar::new(bin.center(), bin.count as f64).width(bin.width()))
                    .collect();

                let chart = BarChart::new(bars)
                    .name(&series.city)
                    .color(colors.translucent(&series.city, series.opacity));

                plot_ui.bar_chart(chart);
            }
        });
}
