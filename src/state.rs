use std::path::Path;

use chrono::NaiveDate;

use crate::color::CityColors;
use crate::config::DashboardConfig;
use crate::data::filter::FilterQuery;
use crate::data::loader::TableCache;
use crate::error::Result;
use crate::present::RenderedView;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Selection – the admission-limited city multi-select
// ---------------------------------------------------------------------------

/// Selected cities in the order they were picked, never more than `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    cities: Vec<String>,
    limit: usize,
}

impl Selection {
    pub fn new(limit: usize) -> Self {
        Self {
            cities: Vec::new(),
            limit,
        }
    }

    /// Start from `cities`, dropping repeats and anything past the limit.
    pub fn with_cities(cities: Vec<String>, limit: usize) -> Self {
        let mut selection = Self::new(limit);
        for city in cities {
            selection.select(&city);
        }
        selection
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn contains(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    pub fn is_full(&self) -> bool {
        self.cities.len() >= self.limit
    }

    /// Add a city.  Returns `false` when the limit refuses it.
    pub fn select(&mut self, city: &str) -> bool {
        if self.contains(city) {
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.cities.push(city.to_string());
        true
    }

    pub fn deselect(&mut self, city: &str) {
        self.cities.retain(|c| c != city);
    }

    /// Flip a city's membership.  Returns `false` when selecting it would
    /// exceed the limit.
    pub fn toggle(&mut self, city: &str) -> bool {
        if self.contains(city) {
            self.deselect(city);
            true
        } else {
            self.select(city)
        }
    }

    pub fn clear(&mut self) {
        self.cities.clear();
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Load-once cache for the current data file.
    pub cache: TableCache,

    /// Open dataset (None until a load succeeds).
    pub session: Option<Session>,

    /// One colour per city of the open dataset.
    pub colors: Option<CityColors>,

    pub selection: Selection,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Output of the last render, rebuilt on every change.
    pub view: Option<RenderedView>,

    /// Load / empty-dataset message shown instead of the data view.
    pub status_message: Option<String>,

    /// Shown when the selection limit refuses a city.
    pub selection_notice: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            cache: TableCache::new(config.data_path.clone()),
            session: None,
            colors: None,
            selection: Selection::new(config.max_selected_cities),
            start_date: config.default_start,
            end_date: config.default_end,
            view: None,
            status_message: None,
            selection_notice: None,
            config,
        }
    }

    /// Open the dataset named in the config (reusing the cache).
    pub fn load_configured(&mut self) {
        let result = Session::open(&mut self.cache);
        self.apply_session(result);
    }

    /// Replace the session with a different data file.
    pub fn open_path(&mut self, path: &Path) {
        self.cache = TableCache::new(path);
        self.load_configured();
    }

    fn apply_session(&mut self, result: Result<Session>) {
        match result {
            Ok(session) => {
                let summary = session.summary();
                log::info!(
                    "Opened {} ({} cities, {} .. {})",
                    session.source().display(),
                    summary.cities.len(),
                    summary.min_date,
                    summary.max_date
                );
                self.colors = Some(CityColors::new(&summary.cities));
                self.selection = Selection::with_cities(
                    session.initial_selection(
                        &self.config.default_cities,
                        self.config.max_selected_cities,
                    ),
                    self.config.max_selected_cities,
                );
                self.start_date = self.config.default_start;
                self.end_date = self.config.default_end;
                self.session = Some(session);
                self.status_message = None;
                self.selection_notice = None;
            }
            Err(e) => {
                log::error!("Failed to open dataset: {e}");
                self.session = None;
                self.colors = None;
                self.selection.clear();
                self.status_message = Some(e.to_string());
            }
        }
        self.refresh();
    }

    /// Current filter values.
    pub fn filter(&self) -> FilterQuery {
        FilterQuery::new(self.selection.cities().to_vec(), self.start_date, self.end_date)
    }

    /// Re-run query and presentation for the current filter.
    pub fn refresh(&mut self) {
        let options = self.config.chart_options();
        self.view = self
            .session
            .as_ref()
            .map(|s| s.render(&self.filter(), &options));
    }

    /// Toggle a city in the comparison.
    pub fn toggle_city(&mut self, city: &str) {
        if self.selection.toggle(city) {
            self.selection_notice = None;
        } else {
            self.selection_notice = Some(format!(
                "You can compare at most {} cities at a time.",
                self.selection.limit()
            ));
        }
        self.refresh();
    }

    pub fn set_dates(&mut self, start: NaiveDate, end: NaiveDate) {
        if (start, end) != (self.start_date, self.end_date) {
            self.start_date = start;
            self.end_date = end;
            self.refresh();
        }
    }
}
