//! Shared test doubles.

use foundation::math::{Geodetic, ProjectionConverter, ProjectionError, Vec3};

use crate::cardinal::Cardinal;
use crate::dataset::ImageDataset;
use crate::footprint::FootprintCenterpoint;
use crate::record::{ImageId, ImageRecord, RotationMatrix};

/// Linear projection around (9°E, 60°N): one projected unit is 1e-5 degrees.
///
/// Good enough to keep tests readable while still exercising the converter
/// seam; not a real map projection.
#[derive(Debug, Copy, Clone, Default)]
pub struct FlatEarth;

const FLAT_ORIGIN_LON_DEG: f64 = 9.0;
const FLAT_ORIGIN_LAT_DEG: f64 = 60.0;
const FLAT_DEG_PER_UNIT: f64 = 1e-5;

impl ProjectionConverter for FlatEarth {
    fn forward(&self, projected: Vec3) -> Result<Geodetic, ProjectionError> {
        if !projected.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        Ok(Geodetic::from_lon_lat_deg(
            FLAT_ORIGIN_LON_DEG + projected.x * FLAT_DEG_PER_UNIT,
            FLAT_ORIGIN_LAT_DEG + projected.y * FLAT_DEG_PER_UNIT,
            projected.z,
        ))
    }

    fn inverse(&self, geo: Geodetic) -> Result<Vec3, ProjectionError> {
        if !geo.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        Ok(Vec3::new(
            (geo.lon_deg() - FLAT_ORIGIN_LON_DEG) / FLAT_DEG_PER_UNIT,
            (geo.lat_deg() - FLAT_ORIGIN_LAT_DEG) / FLAT_DEG_PER_UNIT,
            geo.alt_m,
        ))
    }

    fn crs_name(&self) -> String {
        "FLAT".to_string()
    }
}

/// Converter that rejects everything.
#[derive(Debug, Copy, Clone, Default)]
pub struct FailingProjection;

impl ProjectionConverter for FailingProjection {
    fn forward(&self, _projected: Vec3) -> Result<Geodetic, ProjectionError> {
        Err(ProjectionError::NonFinite)
    }

    fn inverse(&self, _geo: Geodetic) -> Result<Vec3, ProjectionError> {
        Err(ProjectionError::NonFinite)
    }

    fn crs_name(&self) -> String {
        "NONE".to_string()
    }
}

/// An identity-rotation record captured at `(x, y, 0)`.
pub fn record_at(id: &str, x: f64, y: f64, sector: Cardinal) -> ImageRecord {
    let image_id = ImageId::parse(id, '_').unwrap();
    let position = Vec3::new(x, y, 0.0);
    ImageRecord {
        id: id.to_string(),
        station_id: image_id.station_id(),
        camera_id: image_id.camera_id,
        photo_index: image_id.photo_index,
        line_index: image_id.line_index,
        waypoint_index: image_id.waypoint_index,
        position,
        rotation: RotationMatrix::IDENTITY,
        center_wgs84: FlatEarth.forward(position).unwrap(),
        sector,
        fallback_heading_deg: sector.heading_deg(),
    }
}

/// Footprint centre directly below the capture position.
pub fn centerpoint_below(record: &ImageRecord) -> FootprintCenterpoint {
    let geo = FlatEarth.forward(record.position).unwrap();
    FootprintCenterpoint {
        id: record.id.clone(),
        x: record.position.x,
        y: record.position.y,
        longitude: geo.lon_deg(),
        latitude: geo.lat_deg(),
        cardinal: record.sector,
    }
}

/// Dataset whose footprint centres sit directly below each capture.
pub fn dataset_of(records: Vec<ImageRecord>) -> ImageDataset {
    let centerpoints: Vec<_> = records.iter().map(centerpoint_below).collect();
    let mut dataset = ImageDataset::from_records(records);
    for cp in centerpoints {
        assert!(dataset.set_centerpoint(cp));
    }
    dataset
}
