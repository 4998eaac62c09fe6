//! Geographic bounding boxes for area queries.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{ValidationError, ValidationResult, ensure_range};

/// A latitude/longitude rectangle, inclusive on every edge.
///
/// Always satisfies `min_lat <= max_lat` and `min_lon <= max_lon`. Boxes
/// whose west edge lies east of their east edge (a view crossing the date
/// line) are normalized by swapping the longitudes, which turns them into
/// the complementary box. Callers that need the true wrapped area should
/// query each part returned by [`Boundaries::split_at_antimeridian`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Boundaries {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

impl Boundaries {
    /// The whole globe.
    pub const WORLD: Boundaries = Boundaries {
        min_lat: -90.0,
        min_lon: -180.0,
        max_lat: 90.0,
        max_lon: 180.0,
    };

    /// Build a box from its south, west, north and east edges.
    ///
    /// Longitudes are swapped when `min_lon > max_lon`. Inverted latitudes
    /// are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use towermap_types::Boundaries;
    ///
    /// let b = Boundaries::new(52.0, 21.2, 52.2, 21.0).unwrap();
    /// assert_eq!(b.min_lon(), 21.0);
    /// assert_eq!(b.max_lon(), 21.2);
    ///
    /// assert!(Boundaries::new(53.0, 21.0, 52.0, 22.0).is_err());
    /// ```
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> ValidationResult<Self> {
        ensure_range("min_lat", min_lat, -90.0, 90.0)?;
        ensure_range("max_lat", max_lat, -90.0, 90.0)?;
        ensure_range("min_lon", min_lon, -180.0, 180.0)?;
        ensure_range("max_lon", max_lon, -180.0, 180.0)?;

        if min_lat > max_lat {
            return Err(ValidationError::InvertedLatitude {
                min: min_lat,
                max: max_lat,
            });
        }

        let (min_lon, max_lon) = if max_lon < min_lon {
            (max_lon, min_lon)
        } else {
            (min_lon, max_lon)
        };

        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Split a view that may cross the date line into the boxes covering it.
    ///
    /// Returns one box when `west <= east`, otherwise the part east of
    /// `west` up to 180° and the part from -180° up to `east`.
    pub fn split_at_antimeridian(
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    ) -> ValidationResult<Vec<Self>> {
        if west <= east {
            return Ok(vec![Self::new(south, west, north, east)?]);
        }
        Ok(vec![
            Self::new(south, west, north, 180.0)?,
            Self::new(south, -180.0, north, east)?,
        ])
    }

    /// Southern edge.
    #[must_use]
    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Western edge.
    #[must_use]
    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Northern edge.
    #[must_use]
    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Eastern edge.
    #[must_use]
    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Whether a point lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }

    /// Enlarge the box around its centre.
    ///
    /// A factor of 1.2 adds 10% of the span on each side. The result is
    /// clamped to valid coordinates.
    pub fn scaled(&self, factor: f64) -> ValidationResult<Self> {
        if !factor.is_finite() || factor < 1.0 {
            return Err(ValidationError::ScaleFactor(factor));
        }

        let half_lat = (self.max_lat - self.min_lat) * factor / 2.0;
        let half_lon = (self.max_lon - self.min_lon) * factor / 2.0;
        let center_lat = (self.max_lat + self.min_lat) / 2.0;
        let center_lon = (self.max_lon + self.min_lon) / 2.0;

        Ok(Self {
            min_lat: (center_lat - half_lat).max(-90.0),
            min_lon: (center_lon - half_lon).max(-180.0),
            max_lat: (center_lat + half_lat).min(90.0),
            max_lon: (center_lon + half_lon).min(180.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_line_swap() {
        let b = Boundaries::new(-10.0, 170.0, 10.0, -170.0).unwrap();
        assert_eq!(b.min_lon(), -170.0);
        assert_eq!(b.max_lon(), 170.0);
        assert!(b.min_lon() <= b.max_lon());
    }

    #[test]
    fn test_inverted_latitude_rejected() {
        assert_eq!(
            Boundaries::new(10.0, 0.0, -10.0, 1.0),
            Err(ValidationError::InvertedLatitude {
                min: 10.0,
                max: -10.0
            })
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Boundaries::new(-91.0, 0.0, 0.0, 1.0).is_err());
        assert!(Boundaries::new(0.0, 0.0, 1.0, 181.0).is_err());
        assert!(Boundaries::new(0.0, f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_degenerate_box_allowed() {
        let b = Boundaries::new(52.1, 21.05, 52.1, 21.05).unwrap();
        assert!(b.contains(52.1, 21.05));
        assert!(!b.contains(52.1, 21.06));
    }

    #[test]
    fn test_contains_inclusive() {
        let b = Boundaries::new(52.0, 21.0, 52.2, 21.2).unwrap();
        assert!(b.contains(52.0, 21.0));
        assert!(b.contains(52.2, 21.2));
        assert!(b.contains(52.1, 21.05));
        assert!(!b.contains(10.0, 10.0));
    }

    #[test]
    fn test_split_at_antimeridian() {
        let parts = Boundaries::split_at_antimeridian(-10.0, 170.0, 10.0, -170.0).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].contains(0.0, 175.0));
        assert!(parts[1].contains(0.0, -175.0));
        assert!(!parts.iter().any(|b| b.contains(0.0, 0.0)));

        let single = Boundaries::split_at_antimeridian(0.0, 10.0, 1.0, 20.0).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_scaled_adds_reserve() {
        let b = Boundaries::new(50.0, 20.0, 52.0, 22.0).unwrap();
        let s = b.scaled(1.2).unwrap();
        assert!((s.min_lat() - 49.8).abs() < 1e-9);
        assert!((s.max_lat() - 52.2).abs() < 1e-9);
        assert!((s.min_lon() - 19.8).abs() < 1e-9);
        assert!((s.max_lon() - 22.2).abs() < 1e-9);
    }

    #[test]
    fn test_scaled_clamps_and_validates() {
        let s = Boundaries::WORLD.scaled(2.0).unwrap();
        assert_eq!(s, Boundaries::WORLD);
        assert!(Boundaries::WORLD.scaled(0.5).is_err());
        assert!(Boundaries::WORLD.scaled(f64::INFINITY).is_err());
    }
}
