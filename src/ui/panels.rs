use eframe::egui::{self, Align, Color32, Layout, RichText, ScrollArea, Ui};
use egui_extras::{Column, DatePickerButton, TableBuilder};

use crate::data::model::{CELSIUS_COLUMN, CITY_COLUMN, DATE_COLUMN, FAHRENHEIT_COLUMN};
use crate::session::Session;
use crate::state::AppState;
use crate::ui::plot;

const WARNING_COLOR: Color32 = Color32::from_rgb(230, 160, 0);

/// Data columns of the dataset view, after the row index.
const DATASET_COLUMNS: [&str; 4] = [CITY_COLUMN, DATE_COLUMN, FAHRENHEIT_COLUMN, CELSIUS_COLUMN];

// ---------------------------------------------------------------------------
// Left side panel – about
// ---------------------------------------------------------------------------

/// Render the left "about" panel.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("About");
    ui.separator();
    ui.label(
        "Interactive dashboard over the daily temperatures of major cities around \
         the world: pick up to four cities and a date range to compare them.",
    );
    ui.add_space(8.0);
    ui.label(
        "Data: Daily Temperature of Major Cities (Kaggle, sudalairajkumar), cleaned.",
    );
    ui.add_space(8.0);
    ui.separator();
    ui.label(RichText::new(format!("Source: {}", state.cache.path().display())).small());
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload default dataset").clicked() {
                let path = state.config.data_path.clone();
                state.open_path(&path);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!(
                "{} records, {} cities",
                session.table().len(),
                session.summary().cities.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – the dashboard page
// ---------------------------------------------------------------------------

/// Render the dashboard page: dataset preview, basic information and the
/// comparison section.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    ui.heading(RichText::new("Temperatures Dashboard").size(26.0));
    ui.separator();

    let Some(session) = state.session.clone() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            let msg = state
                .status_message
                .as_deref()
                .unwrap_or("Open a dataset to begin  (File → Open…)");
            ui.heading(msg);
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new("Check the complete dataset:")
                .default_open(false)
                .show(ui, |ui: &mut Ui| dataset_table(ui, &session));

            ui.add_space(12.0);
            basic_information(ui, state);

            ui.add_space(12.0);
            comparison(ui, state);
        });
}

fn dataset_table(ui: &mut Ui, session: &Session) {
    let table = session.table();
    if !table.dropped_columns().is_empty() {
        ui.label(
            RichText::new(format!(
                "Duplicate columns dropped: {}",
                table.dropped_columns().join(", ")
            ))
            .small(),
        );
    }

    let records = table.records();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(Layout::left_to_right(Align::Center))
        .columns(Column::auto().at_least(90.0), 5)
        .max_scroll_height(300.0)
        .header(20.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("#");
            });
            for name in DATASET_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, records.len(), |mut row| {
                let rec = &records[row.index()];
                let idx = row.index();
                row.col(|ui: &mut Ui| {
                    ui.label(idx.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.city());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.date().to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.1}", rec.fahrenheit()));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.2}", rec.celsius()));
                });
            });
        });
}

fn basic_information(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.view else {
        return;
    };

    ui.heading("Basic Information");
    ui.separator();

    ui.horizontal_top(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.strong("Cities");
            for city in &view.cities {
                let mut text = RichText::new(city);
                if let Some(colors) = &state.colors {
                    text = text.color(colors.color_for(city));
                }
                ui.label(text);
            }
        });

        ui.add_space(48.0);

        ui.vertical(|ui: &mut Ui| {
            for text in [&view.min_text, &view.max_text] {
                ui.add_space(8.0);
                ui.label(RichText::new(&text.headline).size(20.0).strong());
                ui.label(RichText::new(&text.caption).italics());
            }
        });
    });
}

fn comparison(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Comparing the Temperatures of the Cities");
    ui.separator();

    let cities = state
        .session
        .as_ref()
        .map(|s| s.summary().cities.clone())
        .unwrap_or_default();

    ui.label(format!(
        "Select the cities to compare (up to {}):",
        state.selection.limit()
    ));
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for city in &cities {
            let mut checked = state.selection.contains(city);
            let mut text = RichText::new(city);
            if let Some(colors) = &state.colors {
                text = text.color(colors.color_for(city));
            }
            if ui.checkbox(&mut checked, text).changed() {
                state.toggle_city(city);
            }
        }
    });
    if let Some(msg) = &state.selection_notice {
        ui.label(RichText::new(msg).color(WARNING_COLOR));
    }

    if state.selection.cities().is_empty() {
        return;
    }

    let mut start = state.start_date;
    let mut end = state.end_date;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Select the start date:");
        ui.add(DatePickerButton::new(&mut start).id_salt("start_date"));
        ui.add_space(16.0);
        ui.label("Select the end date:");
        ui.add(DatePickerButton::new(&mut end).id_salt("end_date"));
    });
    state.set_dates(start, end);

    let (Some(view), Some(colors)) = (&state.view, &state.colors) else {
        return;
    };
    let Some(comparison) = &view.comparison else {
        return;
    };

    if let Some(notice) = &comparison.notice {
        ui.label(RichText::new(notice.message()).color(WARNING_COLOR));
    }
    if !comparison.empty_cities.is_empty() {
        ui.label(format!(
            "No records between {} and {} for: {}",
            comparison.start_date,
            comparison.end_date,
            comparison.empty_cities.join(", ")
        ));
    }

    ui.add_space(8.0);
    plot::temperature_lines(ui, &comparison.lines, colors);
    ui.add_space(12.0);
    plot::temperature_histograms(ui, &comparison.histograms, colors);
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open temperature data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
