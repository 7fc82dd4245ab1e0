//! Exterior orientation transform.
//!
//! Turns a record's rotation matrix and projected position into camera
//! direction/up vectors in three frames:
//! - source-CRS ENU (grid north, as delivered),
//! - true-north ENU (grid convergence removed),
//! - ECEF (what the renderer flies to).
//!
//! [`compute`] is pure; [`ExteriorOrientationCache`] memoizes it per record.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use foundation::math::{
    Ecef, Enu, Geodetic, ProjectionConverter, Vec3, enu_vector_to_ecef, geodetic_to_ecef,
    meridian_convergence_rad, rotate_horizontal,
};
use serde::{Deserialize, Serialize};

use crate::dataset::ImageKey;
use crate::error::ExteriorOrientationError;
use crate::record::ImageRecord;

/// Rotation-matrix row holding a camera's image "up", per mounting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpAxis {
    pub row: usize,
    #[serde(default)]
    pub negate: bool,
}

impl Default for UpAxis {
    fn default() -> Self {
        Self {
            row: 1,
            negate: false,
        }
    }
}

impl UpAxis {
    pub fn new(row: usize, negate: bool) -> Result<Self, ExteriorOrientationError> {
        if row >= 3 {
            return Err(ExteriorOrientationError::InvalidUpAxis { row });
        }
        Ok(Self { row, negate })
    }
}

/// Camera direction and up, both unit-free vectors in one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Orientation {
    pub direction: Vec3,
    pub up: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExteriorPosition {
    pub source_crs: Vec3,
    pub wgs84: Geodetic,
    pub ecef: Ecef,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EnuOrientations {
    /// Grid-north ENU, straight from the source data (sign-corrected).
    pub source_crs: Orientation,
    /// True-north ENU.
    pub wgs84: Orientation,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExteriorRotation {
    pub enu: EnuOrientations,
    pub ecef: Orientation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedExteriorOrientation {
    pub position: ExteriorPosition,
    pub rotation: ExteriorRotation,
    /// Convergence at the capture position; the vectors were rotated by its
    /// negative.
    pub utm_convergence_rad: f64,
    pub source_crs: String,
}

/// Derives camera-ready orientation vectors for `record`.
///
/// 1. project the capture position to geodetic,
/// 2. direction is matrix row 2, up is the mounting's row (optionally negated),
/// 3. both are negated to match the source data's sign convention,
/// 4. both are rotated in the horizontal plane by minus the meridian convergence,
/// 5. the true-north ENU vectors are rotated into ECEF at the capture position.
pub fn compute(
    record: &ImageRecord,
    converter: &dyn ProjectionConverter,
    up_axis: UpAxis,
) -> Result<DerivedExteriorOrientation, ExteriorOrientationError> {
    let up_axis = UpAxis::new(up_axis.row, up_axis.negate)?;

    let wgs84 = converter
        .forward(record.position)
        .map_err(|source| ExteriorOrientationError::Projection {
            id: record.id.clone(),
            source,
        })?;

    let direction = record.rotation.row(2);
    let mut up = record.rotation.row(up_axis.row);
    if up_axis.negate {
        up = -up;
    }
    if !direction.is_finite() || !up.is_finite() {
        return Err(ExteriorOrientationError::DegenerateRotation {
            id: record.id.clone(),
        });
    }

    let grid = Orientation {
        direction: -direction,
        up: -up,
    };

    let convergence = meridian_convergence_rad(wgs84.lon_rad, wgs84.lat_rad);
    let true_north = Orientation {
        direction: rotate_horizontal(Enu::from_grid(grid.direction), -convergence).as_vec3(),
        up: rotate_horizontal(Enu::from_grid(grid.up), -convergence).as_vec3(),
    };

    let ecef = Orientation {
        direction: enu_vector_to_ecef(Enu::from_grid(true_north.direction), wgs84),
        up: enu_vector_to_ecef(Enu::from_grid(true_north.up), wgs84),
    };

    Ok(DerivedExteriorOrientation {
        position: ExteriorPosition {
            source_crs: record.position,
            wgs84,
            ecef: geodetic_to_ecef(wgs84),
        },
        rotation: ExteriorRotation {
            enu: EnuOrientations {
                source_crs: grid,
                wgs84: true_north,
            },
            ecef,
        },
        utm_convergence_rad: convergence,
        source_crs: converter.crs_name(),
    })
}

/// Memoized [`compute`] results keyed by record.
///
/// Only successes are stored; a failed projection is retried on the next
/// request. Entries are never invalidated because records are immutable for
/// the lifetime of a dataset; drop the cache together with the dataset.
#[derive(Debug, Default)]
pub struct ExteriorOrientationCache {
    entries: HashMap<ImageKey, DerivedExteriorOrientation>,
}

impl ExteriorOrientationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: ImageKey) -> Option<&DerivedExteriorOrientation> {
        self.entries.get(&key)
    }

    pub fn get_or_compute(
        &mut self,
        key: ImageKey,
        record: &ImageRecord,
        converter: &dyn ProjectionConverter,
        up_axis: UpAxis,
    ) -> Result<&DerivedExteriorOrientation, ExteriorOrientationError> {
        match self.entries.entry(key) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let derived = compute(record, converter, up_axis)?;
                Ok(e.insert(derived))
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
