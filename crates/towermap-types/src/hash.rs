//! Content hashing for deduplication.
//!
//! A record's hash is a SHA-256 digest over a canonical text form of its
//! defining fields, hex-encoded and cut to [`CONTENT_HASH_LEN`] characters:
//!
//! - latitude and longitude, rounded to whole 1e-7 degree steps (about 1 cm)
//! - `measured_at`, bucketed to whole seconds
//! - for measurements, the identity of every cell, sorted so that the order
//!   the radio reported them in does not matter
//!
//! Accuracy, speed, bearing, altitude, unit and signal strength are not part
//! of the hash: two samples of the same cells at the same place and second
//! are the same measurement.

use sha2::{Digest, Sha256};

use crate::error::{ValidationError, ValidationResult};
use crate::types::{Cell, Fix};

/// Length of a content hash in hex characters.
pub const CONTENT_HASH_LEN: usize = 40;

/// Hash of a staged location.
#[must_use]
pub fn location_hash(fix: &Fix) -> String {
    digest(&canonical_fix(fix))
}

/// Hash of a measurement.
///
/// # Examples
///
/// ```
/// use towermap_types::{Cell, Fix, Radio, measurement_hash};
/// use time::macros::datetime;
///
/// let fix = Fix::new(52.1, 21.0, datetime!(2024-05-01 12:00 UTC));
/// let a = Cell::new(Radio::Gsm, 260, 1, 100, 1);
/// let b = Cell::new(Radio::Lte, 260, 1, 200, 2);
///
/// assert_eq!(
///     measurement_hash(&fix, &[a.clone(), b.clone()]),
///     measurement_hash(&fix, &[b, a]),
/// );
/// ```
#[must_use]
pub fn measurement_hash(fix: &Fix, cells: &[Cell]) -> String {
    let mut identities: Vec<String> = cells.iter().map(Cell::identity).collect();
    identities.sort_unstable();

    let mut canonical = canonical_fix(fix);
    canonical.push('|');
    canonical.push_str(&identities.join(";"));
    digest(&canonical)
}

/// Check that `hash` looks like something [`measurement_hash`] produced.
pub fn validate_content_hash(hash: &str) -> ValidationResult<()> {
    let well_formed = hash.len() == CONTENT_HASH_LEN
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::ContentHash(hash.to_string()))
    }
}

fn canonical_fix(fix: &Fix) -> String {
    format!(
        "{}|{}|{}",
        to_bucket(fix.latitude),
        to_bucket(fix.longitude),
        fix.measured_at.unix_timestamp()
    )
}

/// Degrees as a whole number of 1e-7 steps. Anything that rounds to zero,
/// from either side, lands in bucket 0.
fn to_bucket(degrees: f64) -> i64 {
    (degrees * 1e7).round() as i64
}

fn digest(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(CONTENT_HASH_LEN);
    encoded
}
