use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Failures that stop the dashboard from showing a data view.
///
/// Recoverable query conditions (an inverted date range, an empty
/// selection) are not errors; see [`crate::data::filter::QueryNotice`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("Dataset unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    #[error("The dataset contains no rows")]
    EmptyDataset,

    #[error("Invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}
