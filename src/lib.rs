//! Daily city temperatures dashboard.
//!
//! The data core (`data`, `present`, `session`) has no UI dependency; the
//! egui shell (`app`, `state`, `ui`, `color`) drives it once per interaction.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod present;
pub mod session;
pub mod state;
pub mod ui;
