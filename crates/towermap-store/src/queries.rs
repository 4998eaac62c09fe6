//! Query builder for bounding-box reads.
//!
//! [`AreaQuery`] wraps a [`Boundaries`] with the optional time window and
//! row limit used by exports. Results carry no ordering guarantee.
//!
//! # Example
//!
//! ```
//! use towermap_store::{AreaQuery, Store};
//! use towermap_types::Boundaries;
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let last_week = OffsetDateTime::now_utc() - Duration::days(7);
//!
//! let query = AreaQuery::new(Boundaries::new(52.0, 21.0, 52.2, 21.2)?)
//!     .since(last_week)
//!     .limit(1000);
//!
//! let rows = store.query_area(&query)?;
//! assert!(rows.is_empty());
//! # Ok::<(), towermap_store::Error>(())
//! ```

use time::OffsetDateTime;

use towermap_types::Boundaries;

/// Columns selected for a measurement row, in the order rows are read back.
pub(crate) const MEASUREMENT_COLUMNS: &str =
    "id, hashcode, latitude, longitude, accuracy, speed, bearing, altitude, measured_at";

/// Fluent query builder for measurements inside a box.
#[derive(Debug, Clone)]
pub struct AreaQuery {
    /// Box to search, edges inclusive.
    pub boundaries: Boundaries,
    /// Include only measurements taken at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Include only measurements taken at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Maximum number of rows.
    pub limit: Option<u32>,
}

impl AreaQuery {
    /// Query every measurement inside `boundaries`.
    pub fn new(boundaries: Boundaries) -> Self {
        Self {
            boundaries,
            since: None,
            until: None,
            limit: None,
        }
    }

    /// Query the whole table.
    pub fn world() -> Self {
        Self::new(Boundaries::WORLD)
    }

    /// Filter to measurements taken at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to measurements taken at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the number of rows returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let b = &self.boundaries;
        let mut conditions = vec![
            "latitude BETWEEN ? AND ?".to_string(),
            "longitude BETWEEN ? AND ?".to_string(),
        ];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(b.min_lat()),
            Box::new(b.max_lat()),
            Box::new(b.min_lon()),
            Box::new(b.max_lon()),
        ];

        if let Some(since) = self.since {
            conditions.push("measured_at >= ?".to_string());
            params.push(Box::new(unix_millis(since)));
        }

        if let Some(until) = self.until {
            conditions.push("measured_at <= ?".to_string());
            params.push(Box::new(unix_millis(until)));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let mut sql = format!(
            "SELECT {} FROM measurements {}",
            MEASUREMENT_COLUMNS, where_clause
        );

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }
}

/// Unix milliseconds, the on-disk timestamp format.
pub(crate) fn unix_millis(time: OffsetDateTime) -> i64 {
    (time.unix_timestamp_nanos() / 1_000_000) as i64
}
