/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + validate file → TreatmentDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  store    │  process-wide memoized snapshot (Arc)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply rating/teeth predicates → view indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  pure per-chart aggregates over the view
///   └──────────┘
/// ```
///
/// The pipeline is re-run in full on every predicate change; each stage is a
/// pure function of the previous one.
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod store;

use thiserror::Error;

/// Failures the data layer can report.
#[derive(Debug, Error)]
pub enum DataError {
    /// The data source could not be read, parsed, or validated.
    /// Fatal at session startup; there is no degraded mode.
    #[error("treatment data unavailable: {0:#}")]
    Unavailable(anyhow::Error),

    /// The requested treatment id is not part of the current filtered view
    /// (e.g. a filter change removed the selected record).
    #[error("treatment '{0}' not found in the filtered view")]
    NotFound(String),
}
