//! Validation errors for measurement records.

use thiserror::Error;
use time::OffsetDateTime;

/// A record or query parameter that cannot be accepted.
///
/// Validation happens before anything touches storage, so a record that
/// produces one of these is never partially written.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new checks
/// without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A required numeric field is NaN or infinite.
    #[error("{field} must be a finite number")]
    NonFinite {
        /// Field name.
        field: &'static str,
    },

    /// A coordinate lies outside its valid range.
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A measurement must carry one or two cells.
    #[error("measurement requires 1 or 2 cells, got {0}")]
    CellCount(usize),

    /// The content hash is not 40 lowercase hex characters.
    #[error("invalid content hash: {0:?}")]
    ContentHash(String),

    /// `min_lat` is greater than `max_lat`.
    #[error("inverted latitude bounds: min {min} > max {max}")]
    InvertedLatitude {
        /// Southern bound.
        min: f64,
        /// Northern bound.
        max: f64,
    },

    /// `measured_at` carries precision finer than a millisecond.
    #[error("measured_at has sub-millisecond precision: {0}")]
    SubMillisecond(OffsetDateTime),

    /// Boundary scale factors must be finite and at least 1.
    #[error("invalid scale factor: {0}")]
    ScaleFactor(f64),
}

/// Result type alias using [`ValidationError`].
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Reject NaN and infinities.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

/// Reject non-finite values and values outside `[min, max]`.
pub(crate) fn ensure_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> ValidationResult<()> {
    ensure_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, value })
    }
}
