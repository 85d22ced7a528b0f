//! Engine configuration.
//!
//! Built from defaults, a JSON document supplied by the host page, or
//! `GEOEDIT_*` environment variables. Unparseable environment values fall
//! back to their defaults; out-of-range values are rejected by `validate`.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    LABEL_NUDGE_X_PX, LABEL_NUDGE_Y_PX, LABEL_OVERLAP_PX, ROTATION_HANDLE_MIN_RADIUS, ROTATION_HANDLE_SCALE,
    SNAP_THRESHOLD_PX,
};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pixel radius around the first drawn vertex that closes a loop.
    pub snap_threshold_px: f64,
    /// Pixel distance below which a segment label is nudged away from the title.
    pub label_overlap_px: f64,
    /// Nudge applied to an overlapping segment label, in pixels.
    pub label_nudge_px: (f64, f64),
    /// Rotation ring radius relative to the object's bounding radius.
    pub rotation_handle_scale: f64,
    /// Smallest rotation ring radius in world units.
    pub rotation_handle_min_radius: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: SNAP_THRESHOLD_PX,
            label_overlap_px: LABEL_OVERLAP_PX,
            label_nudge_px: (LABEL_NUDGE_X_PX, LABEL_NUDGE_Y_PX),
            rotation_handle_scale: ROTATION_HANDLE_SCALE,
            rotation_handle_min_radius: ROTATION_HANDLE_MIN_RADIUS,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON object; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and
    /// `ConfigError::OutOfRange` for invalid values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build from environment variables.
    ///
    /// Optional:
    /// - `GEOEDIT_SNAP_THRESHOLD_PX`: default 10
    /// - `GEOEDIT_LABEL_OVERLAP_PX`: default 24
    /// - `GEOEDIT_LABEL_NUDGE_X_PX`: default 0
    /// - `GEOEDIT_LABEL_NUDGE_Y_PX`: default 18
    /// - `GEOEDIT_ROTATION_HANDLE_SCALE`: default 1.5
    /// - `GEOEDIT_ROTATION_HANDLE_MIN_RADIUS`: default 5
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutOfRange` for invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, using the same keys as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutOfRange` for invalid values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let cfg = Self {
            snap_threshold_px: parse_or(&lookup, "GEOEDIT_SNAP_THRESHOLD_PX", d.snap_threshold_px),
            label_overlap_px: parse_or(&lookup, "GEOEDIT_LABEL_OVERLAP_PX", d.label_overlap_px),
            label_nudge_px: (
                parse_or(&lookup, "GEOEDIT_LABEL_NUDGE_X_PX", d.label_nudge_px.0),
                parse_or(&lookup, "GEOEDIT_LABEL_NUDGE_Y_PX", d.label_nudge_px.1),
            ),
            rotation_handle_scale: parse_or(&lookup, "GEOEDIT_ROTATION_HANDLE_SCALE", d.rotation_handle_scale),
            rotation_handle_min_radius: parse_or(
                &lookup,
                "GEOEDIT_ROTATION_HANDLE_MIN_RADIUS",
                d.rotation_handle_min_radius,
            ),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject non-finite or negative values. Nudge offsets may be negative.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as `ConfigError::OutOfRange`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("snap_threshold_px", self.snap_threshold_px),
            ("label_overlap_px", self.label_overlap_px),
            ("rotation_handle_scale", self.rotation_handle_scale),
            ("rotation_handle_min_radius", self.rotation_handle_min_radius),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        for (field, value) in [("label_nudge_px.0", self.label_nudge_px.0), ("label_nudge_px.1", self.label_nudge_px.1)] {
            if !value.is_finite() {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}
