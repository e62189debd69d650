//! Data layer: core types, loading, summary, and filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → TemperatureTable (once per session)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────────┐
//!   │ TemperatureTable │  Vec<TemperatureRecord>, city index
//!   └──────────────────┘
//!        │                         │
//!        ▼                         ▼
//!   ┌──────────┐             ┌──────────┐
//!   │ summary   │ min / max   │  filter   │ cities × [start, end] → series
//!   └──────────┘             └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
