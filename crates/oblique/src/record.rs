//! Orientation record builder.
//!
//! Raw exterior orientations arrive as `id -> [x, y, z, row0, row1, row2]`.
//! Parsing yields a [`BasicRecord`]; [`extend`] enriches it with geographic
//! position, cardinal sector and fallback heading into an [`ImageRecord`].

use std::collections::BTreeMap;

use foundation::math::{Geodetic, ProjectionConverter, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cardinal::{Cardinal, normalize_heading_deg};
use crate::error::{ExtendError, ParseError};

pub const DEFAULT_ID_DELIMITER: char = '_';
/// Camera ids are the first three characters of the last id field.
pub const CAMERA_ID_LEN: usize = 3;

/// Identity encoded in an image id: `line_waypoint_CAMphoto`.
///
/// Example: `"12_0345_CBM0001"` is line 12, waypoint 345, camera `CBM`,
/// photo 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId {
    pub line_index: u32,
    pub waypoint_index: u32,
    pub camera_id: String,
    pub photo_index: u32,
}

impl ImageId {
    pub fn parse(id: &str, delimiter: char) -> Result<Self, ParseError> {
        let malformed = |reason| ParseError::MalformedId {
            id: id.to_string(),
            reason,
        };

        let mut fields = id.split(delimiter);
        let (Some(line), Some(waypoint), Some(tail), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed("expected three delimited fields"));
        };

        let line_index = parse_index(line).ok_or_else(|| malformed("line index is not a number"))?;
        let waypoint_index =
            parse_index(waypoint).ok_or_else(|| malformed("waypoint index is not a number"))?;

        let (Some(camera_id), Some(photo)) = (tail.get(..CAMERA_ID_LEN), tail.get(CAMERA_ID_LEN..))
        else {
            return Err(malformed("camera field shorter than camera id"));
        };
        let photo_index = parse_index(photo).ok_or_else(|| malformed("photo index is not a number"))?;

        Ok(Self {
            line_index,
            waypoint_index,
            camera_id: camera_id.to_string(),
            photo_index,
        })
    }

    /// Capture station shared by all cameras fired at one waypoint.
    pub fn station_id(&self) -> String {
        format!("{}_{}", self.line_index, self.waypoint_index)
    }

    pub fn is_odd_line(&self) -> bool {
        self.line_index % 2 == 1
    }
}

fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Row-major 3×3 rotation from the exterior orientation file.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationMatrix {
    pub rows: [[f64; 3]; 3],
}

impl RotationMatrix {
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn new(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    /// `index` must be below 3.
    pub fn row(&self, index: usize) -> Vec3 {
        Vec3::from_array(self.rows[index])
    }
}

/// A parsed pose entry before projection and sector assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicRecord {
    pub id: String,
    pub image_id: ImageId,
    /// Capture position in the projected source CRS.
    pub position: Vec3,
    pub rotation: RotationMatrix,
}

impl BasicRecord {
    /// Parses one entry of the orientation payload, which must be an array.
    pub fn from_value(id: &str, value: &Value, delimiter: char) -> Result<Self, ParseError> {
        let raw = value.as_array().ok_or_else(|| ParseError::NotAnArray {
            id: id.to_string(),
        })?;
        Self::parse(id, raw, delimiter)
    }

    /// Parses `[x, y, z, [r00, r01, r02], [r10, ..], [r20, ..]]`, also
    /// accepting the flattened 12-number form.
    pub fn parse(id: &str, raw: &[Value], delimiter: char) -> Result<Self, ParseError> {
        if raw.len() != 6 && raw.len() != 12 {
            return Err(ParseError::WrongLength {
                id: id.to_string(),
                len: raw.len(),
            });
        }

        let mut position = [0.0; 3];
        for (axis, slot) in position.iter_mut().enumerate() {
            *slot = raw[axis]
                .as_f64()
                .ok_or_else(|| ParseError::NonNumericPosition {
                    id: id.to_string(),
                    axis,
                })?;
        }

        let mut rows = [[0.0; 3]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, slot) in row.iter_mut().enumerate() {
                let value = if raw.len() == 6 {
                    raw[3 + r].as_array().and_then(|a| match a.len() {
                        3 => a[c].as_f64(),
                        _ => None,
                    })
                } else {
                    raw[3 + r * 3 + c].as_f64()
                };
                *slot = value.ok_or_else(|| ParseError::NonNumericMatrix {
                    id: id.to_string(),
                    row: r,
                    col: c,
                })?;
            }
        }

        let image_id = ImageId::parse(id, delimiter)?;

        Ok(Self {
            id: id.to_string(),
            image_id,
            position: Vec3::from_array(position),
            rotation: RotationMatrix::new(rows),
        })
    }
}

/// Camera id to sector, split by flight-line parity.
///
/// Aircraft fly alternate lines in opposite directions, so the same physical
/// camera faces opposite sectors on odd and even lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorLookupTable {
    #[serde(default)]
    pub odd_lines: BTreeMap<String, Cardinal>,
    #[serde(default)]
    pub even_lines: BTreeMap<String, Cardinal>,
}

impl SectorLookupTable {
    pub fn lookup(&self, line_index: u32, camera_id: &str) -> Option<Cardinal> {
        let table = if line_index % 2 == 1 {
            &self.odd_lines
        } else {
            &self.even_lines
        };
        table.get(camera_id).copied()
    }

    /// Registers `camera_id` for both parities: `odd` on odd lines, its
    /// opposite on even lines.
    pub fn with_camera(mut self, camera_id: &str, odd: Cardinal) -> Self {
        self.odd_lines.insert(camera_id.to_string(), odd);
        self.even_lines.insert(camera_id.to_string(), odd.opposite());
        self
    }
}

/// Enriched, immutable image record.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: String,
    pub camera_id: String,
    pub photo_index: u32,
    pub line_index: u32,
    pub waypoint_index: u32,
    pub station_id: String,
    /// Capture position in the projected source CRS.
    pub position: Vec3,
    pub rotation: RotationMatrix,
    pub center_wgs84: Geodetic,
    pub sector: Cardinal,
    /// Sector heading plus the rig's heading offset, in `[0, 360)`.
    pub fallback_heading_deg: f64,
}

/// Enriches `basic` into an [`ImageRecord`].
///
/// Sector assignment comes from the rig table, never from the rotation
/// matrix.
pub fn extend(
    basic: BasicRecord,
    converter: &dyn ProjectionConverter,
    heading_offset_deg: f64,
    sectors: &SectorLookupTable,
) -> Result<ImageRecord, ExtendError> {
    let image_id = basic.image_id;
    let Some(sector) = sectors.lookup(image_id.line_index, &image_id.camera_id) else {
        return Err(ExtendError::UnknownCamera {
            odd_line: image_id.is_odd_line(),
            camera_id: image_id.camera_id,
            id: basic.id,
        });
    };

    let center_wgs84 = converter
        .forward(basic.position)
        .map_err(|source| ExtendError::Projection {
            id: basic.id.clone(),
            source,
        })?;

    Ok(ImageRecord {
        station_id: image_id.station_id(),
        camera_id: image_id.camera_id,
        photo_index: image_id.photo_index,
        line_index: image_id.line_index,
        waypoint_index: image_id.waypoint_index,
        id: basic.id,
        position: basic.position,
        rotation: basic.rotation,
        center_wgs84,
        sector,
        fallback_heading_deg: normalize_heading_deg(sector.heading_deg() + heading_offset_deg),
    })
}
