//! Dataset ingestion.
//!
//! Builds the immutable record set from already-decoded exterior
//! orientations and footprints. Defective entries are dropped and counted;
//! ingestion itself never fails.

use std::collections::{BTreeMap, HashMap};

use foundation::math::ProjectionConverter;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::CameraRigConfig;
use crate::error::{ExtendError, FootprintError};
use crate::footprint::{FootprintCenterpoint, footprints_from_geojson};
use crate::record::{BasicRecord, ImageRecord, extend};

/// Dense handle of a record inside one [`ImageDataset`].
///
/// Keys follow sorted-id order and are only meaningful for the dataset that
/// issued them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey(u32);

impl ImageKey {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-cause tallies of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub orientation_entries: usize,
    pub records: usize,
    pub parse_failures: usize,
    pub unknown_cameras: usize,
    pub projection_failures: usize,
    pub footprint_features: usize,
    pub centerpoints: usize,
    pub footprint_failures: usize,
    pub orphan_footprints: usize,
    pub records_without_footprint: usize,
    /// Set when the footprint payload was unusable as a whole.
    pub footprint_payload_error: Option<FootprintError>,
}

impl IngestReport {
    pub fn dropped_records(&self) -> usize {
        self.parse_failures + self.unknown_cameras + self.projection_failures
    }

    pub fn dropped_footprints(&self) -> usize {
        self.footprint_failures + self.orphan_footprints
    }

    /// True when inputs and outputs disagree in count for any reason.
    pub fn has_mismatch(&self) -> bool {
        self.dropped_records() > 0
            || self.dropped_footprints() > 0
            || self.records_without_footprint > 0
            || self.footprint_payload_error.is_some()
    }
}

/// Immutable set of image records plus their footprint centerpoints.
#[derive(Debug, Clone, Default)]
pub struct ImageDataset {
    records: Vec<ImageRecord>,
    centerpoints: Vec<Option<FootprintCenterpoint>>,
    by_id: HashMap<String, ImageKey>,
}

impl ImageDataset {
    /// Records are stored in id order; a repeated id keeps the last record.
    pub fn from_records(records: impl IntoIterator<Item = ImageRecord>) -> Self {
        let sorted: BTreeMap<String, ImageRecord> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();

        let mut dataset = Self::default();
        for (i, (id, record)) in sorted.into_iter().enumerate() {
            dataset.by_id.insert(id, ImageKey(i as u32));
            dataset.records.push(record);
            dataset.centerpoints.push(None);
        }
        dataset
    }

    pub fn ingest(
        orientations: &Map<String, Value>,
        footprints: &Value,
        converter: &dyn ProjectionConverter,
        rig: &CameraRigConfig,
    ) -> (Self, IngestReport) {
        let mut report = IngestReport {
            orientation_entries: orientations.len(),
            ..IngestReport::default()
        };

        let mut entries: Vec<(&String, &Value)> = orientations.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut records = Vec::with_capacity(entries.len());
        for (id, entry) in entries {
            let basic = match BasicRecord::from_value(id, entry, rig.id_delimiter) {
                Ok(basic) => basic,
                Err(err) => {
                    warn!("dropping orientation: {err}");
                    report.parse_failures += 1;
                    continue;
                }
            };
            match extend(basic, converter, rig.heading_offset_deg, &rig.sectors) {
                Ok(record) => records.push(record),
                Err(err @ ExtendError::UnknownCamera { .. }) => {
                    warn!("dropping orientation: {err}");
                    report.unknown_cameras += 1;
                }
                Err(err @ ExtendError::Projection { .. }) => {
                    warn!("dropping orientation: {err}");
                    report.projection_failures += 1;
                }
            }
        }

        let mut dataset = Self::from_records(records);
        report.records = dataset.len();

        match footprints_from_geojson(footprints) {
            Ok(features) => {
                report.footprint_features = features.len();
                for feature in features {
                    let polygon = match feature {
                        Ok(polygon) => polygon,
                        Err(err) => {
                            warn!("dropping footprint: {err}");
                            report.footprint_failures += 1;
                            continue;
                        }
                    };
                    let Some(key) = dataset.key_of(&polygon.id) else {
                        warn!(id = %polygon.id, "dropping footprint without orientation record");
                        report.orphan_footprints += 1;
                        continue;
                    };
                    let cardinal = dataset.records[key.index()].sector;
                    match polygon.centerpoint(cardinal, converter) {
                        Ok(cp) => {
                            dataset.centerpoints[key.index()] = Some(cp);
                        }
                        Err(err) => {
                            warn!("dropping footprint: {err}");
                            report.footprint_failures += 1;
                        }
                    }
                }
            }
            Err(err) => {
                warn!("ignoring footprint payload: {err}");
                report.footprint_payload_error = Some(err);
            }
        }

        report.centerpoints = dataset.centerpoints.iter().flatten().count();
        report.records_without_footprint = report.records - report.centerpoints;

        if report.has_mismatch() {
            warn!(
                dropped_records = report.dropped_records(),
                dropped_footprints = report.dropped_footprints(),
                without_footprint = report.records_without_footprint,
                "ingestion count mismatch: {} orientations, {} footprints -> {} records, {} centerpoints",
                report.orientation_entries,
                report.footprint_features,
                report.records,
                report.centerpoints
            );
        }
        info!(
            records = report.records,
            centerpoints = report.centerpoints,
            "image dataset ingested"
        );

        (dataset, report)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: ImageKey) -> Option<&ImageRecord> {
        self.records.get(key.index())
    }

    pub fn key_of(&self, id: &str) -> Option<ImageKey> {
        self.by_id.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&ImageRecord> {
        self.key_of(id).and_then(|key| self.get(key))
    }

    /// Records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (ImageKey, &ImageRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (ImageKey(i as u32), r))
    }

    /// Attaches a centerpoint to the record with the same id.
    ///
    /// Returns `false` (and stores nothing) when no such record exists.
    pub fn set_centerpoint(&mut self, centerpoint: FootprintCenterpoint) -> bool {
        let Some(key) = self.key_of(&centerpoint.id) else {
            return false;
        };
        self.centerpoints[key.index()] = Some(centerpoint);
        true
    }

    pub fn centerpoint(&self, key: ImageKey) -> Option<&FootprintCenterpoint> {
        self.centerpoints.get(key.index()).and_then(Option::as_ref)
    }

    /// Records that have a footprint centerpoint, in key order.
    pub fn centerpoints(&self) -> impl Iterator<Item = (ImageKey, &FootprintCenterpoint)> {
        self.centerpoints
            .iter()
            .enumerate()
            .filter_map(|(i, cp)| cp.as_ref().map(|cp| (ImageKey(i as u32), cp)))
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageDataset, ImageKey};
    use crate::cardinal::Cardinal;
    use crate::config::CameraRigConfig;
    use crate::record::SectorLookupTable;
    use crate::testing::{FlatEarth, record_at};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn rig() -> CameraRigConfig {
        CameraRigConfig {
            sectors: SectorLookupTable::default()
                .with_camera("CAM", Cardinal::North)
                .with_camera("CBM", Cardinal::East),
            ..CameraRigConfig::default()
        }
    }

    fn square(filename: &str, x: f64, y: f64) -> Value {
        json!({
            "type": "Feature",
            "properties": { "FILENAME": filename },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [x - 10.0, y - 10.0],
                    [x + 10.0, y - 10.0],
                    [x + 10.0, y + 10.0],
                    [x - 10.0, y + 10.0],
                    [x - 10.0, y - 10.0]
                ]]
            }
        })
    }

    #[test]
    fn ingest_builds_sorted_records_and_centerpoints() {
        let orientations = json!({
            "1_2_CBM1": [10.0, 0.0, 100.0, [1, 0, 0], [0, 1, 0], [0, 0, 1]],
            "1_1_CAM1": [0.0, 0.0, 100.0, [1, 0, 0], [0, 1, 0], [0, 0, 1]]
        });
        let footprints = json!({
            "type": "FeatureCollection",
            "features": [square("1_1_CAM1.jpg", 0.0, 50.0), square("1_2_CBM1.jpg", 60.0, 0.0)]
        });

        let (dataset, report) = ImageDataset::ingest(
            orientations.as_object().unwrap(),
            &footprints,
            &FlatEarth,
            &rig(),
        );

        assert!(!report.has_mismatch(), "{report:?}");
        assert_eq!(dataset.len(), 2);
        let ids: Vec<_> = dataset.iter().map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1_1_CAM1", "1_2_CBM1"]);

        let key = dataset.key_of("1_2_CBM1").unwrap();
        assert_eq!(key, ImageKey::new(1));
        let cp = dataset.centerpoint(key).unwrap();
        assert_eq!(cp.cardinal, Cardinal::East);
        assert!((cp.x - 60.0).abs() < 1e-9);
        assert_eq!(dataset.by_id("1_1_CAM1").unwrap().sector, Cardinal::North);
    }

    #[test]
    fn ingest_drops_defects_and_reports_mismatch() {
        let orientations = json!({
            "1_1_CAM1": [0.0, 0.0, 100.0, [1, 0, 0], [0, 1, 0], [0, 0, 1]],
            "1_2_CAM1": ["x", 0.0, 100.0, [1, 0, 0], [0, 1, 0], [0, 0, 1]],
            "1_3_ZZZ1": [0.0, 0.0, 100.0, [1, 0, 0], [0, 1, 0], [0, 0, 1]],
            "bad-id": [0.0, 0.0, 100.0, [1, 0, 0], [0, 1, 0], [0, 0, 1]],
            "1_4_CAM1": 7
        });
        let footprints = json!({
            "type": "FeatureCollection",
            "features": [square("1_9_CAM1.jpg", 0.0, 0.0)]
        });

        let (dataset, report) = ImageDataset::ingest(
            orientations.as_object().unwrap(),
            &footprints,
            &FlatEarth,
            &rig(),
        );

        assert_eq!(dataset.len(), 1);
        assert_eq!(report.orientation_entries, 5);
        assert_eq!(report.parse_failures, 3);
        assert_eq!(report.unknown_cameras, 1);
        assert_eq!(report.orphan_footprints, 1);
        assert_eq!(report.records_without_footprint, 1);
        assert!(report.has_mismatch());
    }

    #[test]
    fn unusable_footprint_payload_keeps_records() {
        let orientations = json!({
            "1_1_CAM1": [0.0, 0.0, 100.0, [1, 0, 0], [0, 1, 0], [0, 0, 1]]
        });
        let (dataset, report) = ImageDataset::ingest(
            orientations.as_object().unwrap(),
            &json!(null),
            &FlatEarth,
            &rig(),
        );
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.centerpoints().count(), 0);
        assert!(report.footprint_payload_error.is_some());
        assert!(report.has_mismatch());
    }

    #[test]
    fn from_records_sorts_and_keeps_last_duplicate() {
        let mut second = record_at("1_1_CAM1", 5.0, 5.0, Cardinal::South);
        second.photo_index = 9;
        let dataset = ImageDataset::from_records(vec![
            record_at("2_1_CAM1", 0.0, 0.0, Cardinal::North),
            record_at("1_1_CAM1", 0.0, 0.0, Cardinal::North),
            second,
        ]);
        assert_eq!(dataset.len(), 2);
        let first = dataset.get(ImageKey::new(0)).unwrap();
        assert_eq!(first.id, "1_1_CAM1");
        assert_eq!(first.photo_index, 9);
        assert!(dataset.get(ImageKey::new(2)).is_none());
    }
}
