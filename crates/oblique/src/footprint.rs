//! Footprint centerpoints.
//!
//! Each oblique image covers a ground quadrilateral. Its centerpoint (the
//! intersection of the two diagonals) is what the spatial index stores.

use std::path::Path;

use foundation::math::{ProjectionConverter, Vec2, Vec3};
use serde_json::Value;

use crate::cardinal::Cardinal;
use crate::error::FootprintError;

/// A closed quadrilateral ring has its first vertex repeated at the end.
pub const FOOTPRINT_RING_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct FootprintCenterpoint {
    pub id: String,
    /// Projected CRS.
    pub x: f64,
    pub y: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// Sector the image was captured facing.
    pub cardinal: Cardinal,
}

impl FootprintCenterpoint {
    pub fn ground(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// One footprint feature, in projected coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintPolygon {
    pub id: String,
    pub ring: [Vec2; FOOTPRINT_RING_LEN],
}

impl FootprintPolygon {
    pub fn centerpoint(
        &self,
        cardinal: Cardinal,
        converter: &dyn ProjectionConverter,
    ) -> Result<FootprintCenterpoint, FootprintError> {
        let center = diagonal_intersection(&self.ring).ok_or_else(|| {
            FootprintError::DegenerateQuad {
                id: self.id.clone(),
            }
        })?;
        let geo = converter
            .forward(Vec3::new(center.x, center.y, 0.0))
            .map_err(|source| FootprintError::Projection {
                id: self.id.clone(),
                source,
            })?;

        Ok(FootprintCenterpoint {
            id: self.id.clone(),
            x: center.x,
            y: center.y,
            longitude: geo.lon_deg(),
            latitude: geo.lat_deg(),
            cardinal,
        })
    }
}

/// Intersection of the diagonals `ring[0]–ring[2]` and `ring[1]–ring[3]`.
///
/// Returns `None` when the diagonals are parallel (degenerate quad).
pub fn diagonal_intersection(ring: &[Vec2; FOOTPRINT_RING_LEN]) -> Option<Vec2> {
    let (p0, p1, p2, p3) = (ring[0], ring[1], ring[2], ring[3]);
    let d1 = p2 - p0;
    let d2 = p3 - p1;
    let denom = d1.cross(d2);
    if !denom.is_finite() || denom.abs() <= f64::EPSILON * d1.length() * d2.length() {
        return None;
    }
    let t = (p1 - p0).cross(d2) / denom;
    let center = p0 + d1.scale(t);
    center.is_finite().then_some(center)
}

/// Image id for a `FILENAME` property: directory and extension are dropped.
pub fn image_id_from_filename(filename: &str) -> Option<String> {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads footprint polygons from an already-decoded FeatureCollection.
///
/// The outer error means the payload is unusable as a whole; per-feature
/// failures are returned in place so the caller can drop and report them.
pub fn footprints_from_geojson(
    collection: &Value,
) -> Result<Vec<Result<FootprintPolygon, FootprintError>>, FootprintError> {
    if collection.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(FootprintError::NotAFeatureCollection);
    }
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or(FootprintError::NotAFeatureCollection)?;

    Ok(features
        .iter()
        .enumerate()
        .map(|(index, feature)| parse_feature(index, feature))
        .collect())
}

fn parse_feature(index: usize, feature: &Value) -> Result<FootprintPolygon, FootprintError> {
    let invalid = |reason: &str| FootprintError::InvalidFeature {
        index,
        reason: reason.to_string(),
    };

    let id = feature
        .get("properties")
        .and_then(|p| p.get("FILENAME"))
        .and_then(Value::as_str)
        .and_then(image_id_from_filename)
        .ok_or_else(|| invalid("missing FILENAME property"))?;

    let geometry = feature
        .get("geometry")
        .ok_or_else(|| invalid("missing geometry"))?;
    let coordinates = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing coordinates"))?;

    let outer = match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => coordinates.first(),
        Some("MultiPolygon") => coordinates
            .first()
            .and_then(Value::as_array)
            .and_then(|poly| poly.first()),
        _ => return Err(invalid("geometry is not a Polygon")),
    }
    .and_then(Value::as_array)
    .ok_or_else(|| invalid("polygon has no outer ring"))?;

    if outer.len() != FOOTPRINT_RING_LEN {
        return Err(FootprintError::WrongRingLength {
            id,
            len: outer.len(),
        });
    }

    let mut ring = [Vec2::new(0.0, 0.0); FOOTPRINT_RING_LEN];
    for (slot, position) in ring.iter_mut().zip(outer) {
        let xy = position.as_array().and_then(|p| {
            let x = p.first()?.as_f64()?;
            let y = p.get(1)?.as_f64()?;
            Some(Vec2::new(x, y))
        });
        *slot = xy.ok_or_else(|| invalid("non-numeric coordinate"))?;
    }

    Ok(FootprintPolygon { id, ring })
}
