//! Error types for towermap-loader.

/// Why a load produced no result set.
///
/// A cancelled load is not an error and never reaches the display.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The store failed the query.
    #[error(transparent)]
    Store(#[from] towermap_store::Error),

    /// The background query task panicked or was aborted.
    #[error("Load task failed: {0}")]
    Task(String),
}
