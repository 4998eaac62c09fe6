//! Local persistence for geolocated cell-tower measurements.
//!
//! This crate provides SQLite-based storage for measurements and for the
//! location samples staged while their cells are being collected.
//!
//! # Features
//!
//! - Content-hash deduplication enforced by a unique constraint, so it holds
//!   across threads and connections
//! - Indexed bounding-box queries, optionally cancellable per row
//! - A staging table for locations awaiting cell data
//! - CSV export
//!
//! # Example
//!
//! ```no_run
//! use towermap_store::{AreaQuery, Store};
//! use towermap_types::Boundaries;
//!
//! let store = Store::open_default()?;
//!
//! let query = AreaQuery::new(Boundaries::new(52.0, 21.0, 52.2, 21.2)?).limit(100);
//! for m in store.query_area(&query)? {
//!     println!("{} {:.5},{:.5}", m.id, m.latitude(), m.longitude());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod export;
mod models;
mod queries;
mod schema;
mod staging;
mod store;

pub use error::{Error, Result};
pub use export::CSV_HEADER;
pub use models::{ImportResult, InsertOutcome, StoredMeasurement, StoredTemporaryLocation};
pub use queries::AreaQuery;
pub use store::{Store, StoreOptions};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/towermap/measurements.db`
/// - macOS: `~/Library/Application Support/towermap/measurements.db`
/// - Windows: `C:\Users\<user>\AppData\Local\towermap\measurements.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("towermap")
        .join("measurements.db")
}
