//! Loader settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for [`IncrementalLoader`](crate::IncrementalLoader) and
/// [`ViewportFeed`](crate::ViewportFeed).
///
/// Deserializes from the `[loader]` table of the application config; missing
/// keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Measurements appended to the displayed set one by one before the
    /// loader falls back to a full reload.
    pub max_incremental_appends: usize,
    /// Factor a viewport is enlarged by before it is queried.
    pub boundary_scale: f64,
    /// Quiet period after the last viewport change before a load starts.
    pub debounce_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_incremental_appends: 500,
            boundary_scale: 1.2,
            debounce_ms: 200,
        }
    }
}

impl LoaderConfig {
    /// Debounce period as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check every field and return all problems found.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if !self.boundary_scale.is_finite() || self.boundary_scale < 1.0 {
            errors.push(FieldError {
                field: "loader.boundary_scale".to_string(),
                message: format!(
                    "scale {} must be a finite number of at least 1.0",
                    self.boundary_scale
                ),
            });
        } else if self.boundary_scale > 10.0 {
            errors.push(FieldError {
                field: "loader.boundary_scale".to_string(),
                message: format!("scale {} is too large (maximum 10.0)", self.boundary_scale),
            });
        }

        if self.debounce_ms > 60_000 {
            errors.push(FieldError {
                field: "loader.debounce_ms".to_string(),
                message: format!(
                    "debounce {}ms is too long (maximum 60000ms)",
                    self.debounce_ms
                ),
            });
        }

        errors
    }
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The field path (e.g., `loader.boundary_scale`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.max_incremental_appends, 500);
        assert_eq!(config.boundary_scale, 1.2);
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: LoaderConfig = toml::from_str("max_incremental_appends = 50").unwrap();
        assert_eq!(config.max_incremental_appends, 50);
        assert_eq!(config.debounce_ms, 200);
    }

    #[test]
    fn test_invalid_fields_all_reported() {
        let config = LoaderConfig {
            max_incremental_appends: 0,
            boundary_scale: 0.5,
            debounce_ms: 120_000,
        };

        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "loader.boundary_scale");
        assert!(errors[1].to_string().starts_with("loader.debounce_ms: "));
    }

    #[test]
    fn test_nan_scale_rejected() {
        let config = LoaderConfig {
            boundary_scale: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.validate().len(), 1);
    }
}
