use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::filter::FilterQuery;
use crate::data::loader::TableCache;
use crate::data::model::TemperatureTable;
use crate::data::summary::{SummaryMetrics, summarize};
use crate::error::Result;
use crate::present::{self, ChartOptions, RenderedView};

// ---------------------------------------------------------------------------
// Session – the loaded table and its summary, shared read-only
// ---------------------------------------------------------------------------

/// Immutable handle passed to every interaction for as long as one dataset
/// stays open.
#[derive(Debug, Clone)]
pub struct Session {
    source: PathBuf,
    table: Arc<TemperatureTable>,
    summary: SummaryMetrics,
}

impl Session {
    /// Wrap an already loaded table.  Fails with `EmptyDataset` when there is
    /// nothing to summarize.
    pub fn new(source: impl Into<PathBuf>, table: Arc<TemperatureTable>) -> Result<Self> {
        let summary = summarize(&table)?;
        Ok(Self {
            source: source.into(),
            table,
            summary,
        })
    }

    /// Load (or reuse) the cached table and summarize it.
    pub fn open(cache: &mut TableCache) -> Result<Self> {
        let table = cache.get_or_load()?;
        Self::new(cache.path(), table)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn table(&self) -> &TemperatureTable {
        &self.table
    }

    pub fn summary(&self) -> &SummaryMetrics {
        &self.summary
    }

    /// The preferred cities that exist in the dataset, capped at `limit`.
    pub fn initial_selection(&self, preferred: &[String], limit: usize) -> Vec<String> {
        preferred
            .iter()
            .filter(|c| self.summary.cities.contains(c))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Render the page for one interaction.
    pub fn render(&self, filter: &FilterQuery, options: &ChartOptions) -> RenderedView {
        present::render(&self.table, &self.summary, filter, options)
    }
}
