//! Viewer tuning: zoom range, double-tap threshold and fling physics.

use crate::decoder::PixelFormat;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum zoom relative to the fit-to-width scale.
pub const DEFAULT_MAX_ZOOM: f32 = 3.0;

/// Double-tap zooms in below this multiple of the fit scale, out above it.
pub const DEFAULT_DOUBLE_TAP_THRESHOLD: f32 = 1.5;

/// Exponential velocity decay rate for flings, per second.
pub const DEFAULT_FRICTION: f32 = 4.0;

/// Fling speed (source pixels per second) under which motion stops.
pub const DEFAULT_MIN_FLING_VELOCITY: f32 = 20.0;

/// Tuning knobs for a [`BigImageView`](crate::BigImageView).
///
/// Every field is optional in the RON file, e.g.:
///
/// ```text
/// (max_zoom: 4.0, pixel_format: Rgb565)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub max_zoom: f32,
    pub double_tap_threshold: f32,
    pub friction: f32,
    pub min_fling_velocity: f32,
    pub pixel_format: PixelFormat,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_zoom: DEFAULT_MAX_ZOOM,
            double_tap_threshold: DEFAULT_DOUBLE_TAP_THRESHOLD,
            friction: DEFAULT_FRICTION,
            min_fling_velocity: DEFAULT_MIN_FLING_VELOCITY,
            pixel_format: PixelFormat::default(),
        }
    }
}

impl ViewConfig {
    /// Parses and validates a RON config.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a RON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_zoom.is_finite() && self.max_zoom >= 1.0) {
            return Err(invalid("max_zoom", "must be a finite value >= 1.0"));
        }
        let threshold = self.double_tap_threshold;
        if !(threshold.is_finite() && threshold > 1.0 && threshold <= self.max_zoom) {
            return Err(invalid(
                "double_tap_threshold",
                "must be greater than 1.0 and at most max_zoom",
            ));
        }
        if !(self.friction.is_finite() && self.friction > 0.0) {
            return Err(invalid("friction", "must be positive"));
        }
        if !(self.min_fling_velocity.is_finite() && self.min_fling_velocity >= 0.0) {
            return Err(invalid("min_fling_velocity", "must not be negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_fields_use_defaults() {
        let config = ViewConfig::from_ron_str("(friction: 4.0)").unwrap();
        assert_eq!(config, ViewConfig::default());
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = ViewConfig::from_ron_str("(max_zoom: 4.0, pixel_format: Rgb565)").unwrap();
        assert_eq!(config.max_zoom, 4.0);
        assert_eq!(config.pixel_format, PixelFormat::Rgb565);
        assert_eq!(config.friction, DEFAULT_FRICTION);
    }

    #[test]
    fn rejects_zoom_below_one() {
        let err = ViewConfig::from_ron_str("(max_zoom: 0.5)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_zoom", .. }));
    }

    #[test]
    fn rejects_double_tap_threshold_above_max_zoom() {
        let err = ViewConfig::from_ron_str("(double_tap_threshold: 5.0)").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "double_tap_threshold",
                ..
            }
        ));

        let config = ViewConfig::from_ron_str("(max_zoom: 6.0, double_tap_threshold: 5.0)");
        assert!(config.is_ok());
    }

    #[test]
    fn rejects_double_tap_threshold_at_or_below_fit() {
        for source in ["(double_tap_threshold: 1.0)", "(double_tap_threshold: 0.5)"] {
            let err = ViewConfig::from_ron_str(source).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    field: "double_tap_threshold",
                    ..
                }
            ));
        }
    }

    #[test]
    fn reports_parse_errors() {
        let err = ViewConfig::from_ron_str("(max_zoom: \"big\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(friction: 2.5)").unwrap();

        let config = ViewConfig::load(&path).unwrap();
        assert_eq!(config.friction, 2.5);

        let missing = ViewConfig::load(&dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
