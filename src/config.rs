//! Binding engine configuration with environment overrides.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ROTATION_SNAP_DEGREES, DEFAULT_SNAP_TO_MID_TOLERANCE, DEFAULT_SUGGESTION_SELECTION_LIMIT};
use crate::error::ConfigError;

pub const ENV_SUGGESTION_LIMIT: &str = "TETHER_SUGGESTION_LIMIT";
pub const ENV_SNAP_TO_MID_TOLERANCE: &str = "TETHER_SNAP_TO_MID_TOLERANCE";
pub const ENV_ROTATION_SNAP_DEGREES: &str = "TETHER_ROTATION_SNAP_DEGREES";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BindingConfig {
    /// Selections larger than this get no binding suggestions at all.
    pub suggestion_selection_limit: usize,
    /// Fraction of a shape dimension within which elbow endpoints snap to a side midpoint.
    pub snap_to_mid_tolerance: f64,
    /// Rotation step, in degrees, used while the snap modifier is held.
    pub rotation_snap_degrees: f64,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            suggestion_selection_limit: DEFAULT_SUGGESTION_SELECTION_LIMIT,
            snap_to_mid_tolerance: DEFAULT_SNAP_TO_MID_TOLERANCE,
            rotation_snap_degrees: DEFAULT_ROTATION_SNAP_DEGREES,
        }
    }
}

impl BindingConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `TETHER_SUGGESTION_LIMIT`: default 50
    /// - `TETHER_SNAP_TO_MID_TOLERANCE`: default 0.05
    /// - `TETHER_ROTATION_SNAP_DEGREES`: default 15
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build config from an arbitrary key lookup; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a present value does not parse or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let suggestion_selection_limit = match lookup(ENV_SUGGESTION_LIMIT) {
            Some(raw) => parse_value::<usize>(ENV_SUGGESTION_LIMIT, &raw)?,
            None => defaults.suggestion_selection_limit,
        };
        let snap_to_mid_tolerance = match lookup(ENV_SNAP_TO_MID_TOLERANCE) {
            Some(raw) => parse_finite(ENV_SNAP_TO_MID_TOLERANCE, &raw)?,
            None => defaults.snap_to_mid_tolerance,
        };
        let rotation_snap_degrees = match lookup(ENV_ROTATION_SNAP_DEGREES) {
            Some(raw) => parse_finite(ENV_ROTATION_SNAP_DEGREES, &raw)?,
            None => defaults.rotation_snap_degrees,
        };
        Ok(Self { suggestion_selection_limit, snap_to_mid_tolerance, rotation_snap_degrees })
    }

    /// Rotation snap step in radians.
    #[must_use]
    pub fn rotation_snap_radians(&self) -> f64 {
        self.rotation_snap_degrees.to_radians()
    }
}

fn parse_value<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { var: var.to_string(), value: raw.to_string() })
}

fn parse_finite(var: &str, raw: &str) -> Result<f64, ConfigError> {
    let value = parse_value::<f64>(var, raw)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid { var: var.to_string(), value: raw.to_string() })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
