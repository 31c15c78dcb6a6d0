use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::autoscroll::{AutoScrollConfig, AutoScroller};
use crate::collision::{CollisionDetector, DEFAULT_COLLISION_PADDING};
use crate::error::ConfigError;
use crate::gesture::DragGestureController;
use crate::virtual_list::RowMetrics;

/// Tunables for the grouped drag list. Every field is optional in JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupedDndConfig {
    /// Edge padding applied by the collision test.
    pub collision_padding: f32,
    pub autoscroll: AutoScrollConfig,
    pub metrics: RowMetrics,
    /// Extra rows mounted above and below the viewport.
    pub overscan: usize,
}

impl Default for GroupedDndConfig {
    fn default() -> Self {
        Self {
            collision_padding: DEFAULT_COLLISION_PADDING,
            autoscroll: AutoScrollConfig::default(),
            metrics: RowMetrics::default(),
            overscan: 2,
        }
    }
}

impl GroupedDndConfig {
    /// Environment variable holding an optional path to a JSON config file.
    pub const ENV_VAR: &'static str = "GROUPED_DND_CONFIG";

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load from the file named by [`Self::ENV_VAR`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(Self::ENV_VAR) {
            Some(path) if !path.is_empty() => Self::from_path(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let metrics = &self.metrics;
        if !metrics.row_height.is_finite() || metrics.row_height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "metrics.row_height must be positive, got {}",
                metrics.row_height
            )));
        }
        if !(metrics.group_padding_y >= 0.0 && metrics.group_border >= 0.0) {
            return Err(ConfigError::Invalid(
                "metrics.group_padding_y and metrics.group_border must not be negative".into(),
            ));
        }

        let band = self.autoscroll.band_fraction;
        if !(band > 0.0 && band <= 0.5) {
            return Err(ConfigError::Invalid(format!(
                "autoscroll.band_fraction must be in (0, 0.5], got {band}"
            )));
        }
        if !(self.autoscroll.max_step_fraction >= 0.0 && self.autoscroll.max_step_fraction <= 1.0)
        {
            return Err(ConfigError::Invalid(format!(
                "autoscroll.max_step_fraction must be in [0, 1], got {}",
                self.autoscroll.max_step_fraction
            )));
        }
        if !(self.collision_padding.is_finite() && self.collision_padding >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "collision_padding must not be negative, got {}",
                self.collision_padding
            )));
        }
        Ok(())
    }

    pub fn gesture_controller(&self) -> DragGestureController {
        DragGestureController::new(
            CollisionDetector::new(self.collision_padding),
            AutoScroller::new(self.autoscroll),
        )
    }
}
