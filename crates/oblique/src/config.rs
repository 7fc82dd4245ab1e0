//! Engine configuration.
//!
//! Every section has defaults, so an empty JSON object is a valid config.
//! Camera rig tables (sector lookup, up axes) are dataset specific and have
//! no meaningful defaults beyond "empty".

use std::collections::BTreeMap;

use foundation::math::{ProjectionError, TransverseMercator};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::exterior::UpAxis;
use crate::navigation::Easing;
use crate::record::{DEFAULT_ID_DELIMITER, SectorLookupTable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub siblings: SiblingConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub rig: CameraRigConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
}

impl EngineConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.search.position_rounding_m.is_finite() && self.search.position_rounding_m > 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "search.position_rounding_m must be positive, got {}",
                self.search.position_rounding_m
            )));
        }
        if !(self.siblings.max_distance.is_finite() && self.siblings.max_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "siblings.max_distance must be positive, got {}",
                self.siblings.max_distance
            )));
        }
        if !(self.protocol.fly_duration_s.is_finite() && self.protocol.fly_duration_s >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "protocol.fly_duration_s must be non-negative, got {}",
                self.protocol.fly_duration_s
            )));
        }
        if !self.rig.heading_offset_deg.is_finite() {
            return Err(ConfigError::Invalid(
                "rig.heading_offset_deg must be finite".to_string(),
            ));
        }
        for (camera, axis) in self
            .rig
            .up_axes
            .iter()
            .map(|(c, a)| (c.as_str(), a))
            .chain(std::iter::once(("<default>", &self.rig.default_up_axis)))
        {
            if UpAxis::new(axis.row, axis.negate).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "up axis row {} for camera {camera} out of range",
                    axis.row
                )));
            }
        }
        if let Err(e) = self.projection.converter() {
            return Err(ConfigError::Invalid(e.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Candidates requested from the spatial index per search.
    #[serde(default = "default_k")]
    pub default_k: usize,
    /// Minimum interval between non-immediate searches.
    #[serde(default = "default_search_debounce_ms")]
    pub debounce_ms: u64,
    /// Grid used to quantize positions into frame-cache keys (meters).
    #[serde(default = "default_position_rounding_m")]
    pub position_rounding_m: f64,
}

fn default_k() -> usize {
    200
}

fn default_search_debounce_ms() -> u64 {
    250
}

fn default_position_rounding_m() -> f64 {
    1.0
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            debounce_ms: default_search_debounce_ms(),
            position_rounding_m: default_position_rounding_m(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiblingConfig {
    /// Beyond this projected distance there is no sibling in a direction.
    #[serde(default = "default_max_sibling_distance")]
    pub max_distance: f64,
}

fn default_max_sibling_distance() -> f64 {
    350.0
}

impl Default for SiblingConfig {
    fn default() -> Self {
        Self {
            max_distance: default_max_sibling_distance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "default_sibling_debounce_ms")]
    pub sibling_debounce_ms: u64,
    #[serde(default = "default_fly_duration_s")]
    pub fly_duration_s: f64,
    #[serde(default = "default_rotate_duration_s")]
    pub rotate_duration_s: f64,
    #[serde(default)]
    pub easing: Easing,
}

fn default_sibling_debounce_ms() -> u64 {
    200
}

fn default_fly_duration_s() -> f64 {
    1.5
}

fn default_rotate_duration_s() -> f64 {
    0.8
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            sibling_debounce_ms: default_sibling_debounce_ms(),
            fly_duration_s: default_fly_duration_s(),
            rotate_duration_s: default_rotate_duration_s(),
            easing: Easing::default(),
        }
    }
}

/// Physical camera mounting: which sector each camera faces and which
/// rotation-matrix row is its image "up".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRigConfig {
    /// Added to the sector heading to form an image's fallback heading.
    #[serde(default)]
    pub heading_offset_deg: f64,
    #[serde(default = "default_id_delimiter")]
    pub id_delimiter: char,
    #[serde(default)]
    pub sectors: SectorLookupTable,
    #[serde(default)]
    pub up_axes: BTreeMap<String, UpAxis>,
    #[serde(default)]
    pub default_up_axis: UpAxis,
}

fn default_id_delimiter() -> char {
    DEFAULT_ID_DELIMITER
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            heading_offset_deg: 0.0,
            id_delimiter: DEFAULT_ID_DELIMITER,
            sectors: SectorLookupTable::default(),
            up_axes: BTreeMap::new(),
            default_up_axis: UpAxis::default(),
        }
    }
}

impl CameraRigConfig {
    pub fn up_axis_for(&self, camera_id: &str) -> UpAxis {
        self.up_axes
            .get(camera_id)
            .copied()
            .unwrap_or(self.default_up_axis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_utm_zone")]
    pub utm_zone: u8,
    #[serde(default)]
    pub southern_hemisphere: bool,
}

fn default_utm_zone() -> u8 {
    32
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            utm_zone: default_utm_zone(),
            southern_hemisphere: false,
        }
    }
}

impl ProjectionConfig {
    pub fn converter(&self) -> Result<TransverseMercator, ProjectionError> {
        TransverseMercator::utm(self.utm_zone, self.southern_hemisphere)
    }
}
