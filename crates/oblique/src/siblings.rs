//! Directional neighbours between captures.
//!
//! For a current record, finds at most one neighbour per cardinal direction
//! among records of the same sector:
//! 1. same flight line: every candidate nominates the slot its bearing falls
//!    in; a waypoint exactly one step away beats any other candidate for that
//!    slot and is accepted at any distance, others must lie within
//!    `max_distance`;
//! 2. adjacent flight lines: the closest candidate north (`Δy < 0`, with
//!    `Δy = current.y - candidate.y`) and south (`Δy > 0`) within
//!    `max_distance`, forced into the North/South slots;
//! 3. when both phases fill a slot the closer candidate wins.
//!
//! Linear in dataset size per call.

use std::cmp::Ordering;

use foundation::math::stable_total_cmp_f64;
use tracing::debug;

use crate::cardinal::{Cardinal, bearing_deg};
use crate::config::SiblingConfig;
use crate::dataset::{ImageDataset, ImageKey};
use crate::record::ImageRecord;

/// One optional neighbour per cardinal direction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SiblingMap {
    pub north: Option<ImageKey>,
    pub east: Option<ImageKey>,
    pub south: Option<ImageKey>,
    pub west: Option<ImageKey>,
}

impl SiblingMap {
    pub fn get(&self, direction: Cardinal) -> Option<ImageKey> {
        match direction {
            Cardinal::North => self.north,
            Cardinal::East => self.east,
            Cardinal::South => self.south,
            Cardinal::West => self.west,
        }
    }

    fn slot_mut(&mut self, direction: Cardinal) -> &mut Option<ImageKey> {
        match direction {
            Cardinal::North => &mut self.north,
            Cardinal::East => &mut self.east,
            Cardinal::South => &mut self.south,
            Cardinal::West => &mut self.west,
        }
    }

    /// All four directions in clockwise order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Cardinal, Option<ImageKey>)> + '_ {
        Cardinal::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, key)| key.is_none())
    }

    pub fn available(&self) -> impl Iterator<Item = Cardinal> + '_ {
        self.iter().filter_map(|(c, key)| key.map(|_| c))
    }
}

#[derive(Debug, Copy, Clone)]
struct Candidate {
    key: ImageKey,
    distance: f64,
    exact: bool,
}

impl Candidate {
    /// Exact waypoint neighbours first, then distance. Equal candidates keep
    /// the earlier (lower key) one.
    fn beats(&self, other: &Candidate) -> bool {
        match (self.exact, other.exact) {
            (true, false) => true,
            (false, true) => false,
            _ => stable_total_cmp_f64(self.distance, other.distance) == Ordering::Less,
        }
    }
}

fn offer(slot: &mut Option<Candidate>, candidate: Candidate) {
    match slot {
        Some(current) if !candidate.beats(current) => {}
        _ => *slot = Some(candidate),
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SiblingResolver {
    pub max_distance: f64,
}

impl Default for SiblingResolver {
    fn default() -> Self {
        Self::from_config(&SiblingConfig::default())
    }
}

impl SiblingResolver {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    pub fn from_config(config: &SiblingConfig) -> Self {
        Self::new(config.max_distance)
    }

    /// Neighbours of `current`; an unknown key yields an empty map.
    pub fn resolve(&self, current: ImageKey, dataset: &ImageDataset) -> SiblingMap {
        let Some(origin) = dataset.get(current) else {
            return SiblingMap::default();
        };

        let mut same_line: [Option<Candidate>; 4] = [None; 4];
        let mut adjacent_north: Option<Candidate> = None;
        let mut adjacent_south: Option<Candidate> = None;

        for (key, record) in dataset.iter() {
            if key == current || record.sector != origin.sector {
                continue;
            }
            let dx = record.position.x - origin.position.x;
            let dy = record.position.y - origin.position.y;
            let distance = dx.hypot(dy);
            if !distance.is_finite() {
                continue;
            }

            if record.line_index == origin.line_index {
                let exact = record.waypoint_index.abs_diff(origin.waypoint_index) == 1;
                if !exact && distance > self.max_distance {
                    continue;
                }
                let slot = Cardinal::from_heading_deg(bearing_deg(dx, dy));
                offer(
                    &mut same_line[slot.index()],
                    Candidate {
                        key,
                        distance,
                        exact,
                    },
                );
            } else if record.line_index.abs_diff(origin.line_index) == 1 {
                if distance > self.max_distance {
                    continue;
                }
                let candidate = Candidate {
                    key,
                    distance,
                    exact: false,
                };
                let delta_y = origin.position.y - record.position.y;
                if delta_y < 0.0 {
                    offer(&mut adjacent_north, candidate);
                } else if delta_y > 0.0 {
                    offer(&mut adjacent_south, candidate);
                }
            }
        }

        let mut map = SiblingMap::default();
        for direction in Cardinal::ALL {
            let adjacent = match direction {
                Cardinal::North => adjacent_north,
                Cardinal::South => adjacent_south,
                Cardinal::East | Cardinal::West => None,
            };
            let winner = match (same_line[direction.index()], adjacent) {
                (Some(a), Some(b)) => Some(match stable_total_cmp_f64(b.distance, a.distance) {
                    Ordering::Less => b,
                    _ => a,
                }),
                (a, b) => a.or(b),
            };
            *map.slot_mut(direction) = winner.map(|c| c.key);
        }

        debug!(
            id = %origin.id,
            north = map.north.is_some(),
            east = map.east.is_some(),
            south = map.south.is_some(),
            west = map.west.is_some(),
            "resolved siblings"
        );
        map
    }

    /// Convenience wrapper resolving by record.
    pub fn resolve_record(&self, current: &ImageRecord, dataset: &ImageDataset) -> SiblingMap {
        dataset
            .key_of(&current.id)
            .map(|key| self.resolve(key, dataset))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{SiblingMap, SiblingResolver};
    use crate::cardinal::Cardinal;
    use crate::dataset::{ImageDataset, ImageKey};
    use crate::testing::{dataset_of, record_at};
    use pretty_assertions::assert_eq;

    fn key(dataset: &ImageDataset, id: &str) -> Option<ImageKey> {
        dataset.key_of(id)
    }

    #[test]
    fn plus_shape_fills_all_four_slots() {
        let dataset = dataset_of(vec![
            record_at("1_3_CAM1", 0.0, 0.0, Cardinal::North),
            record_at("1_1_CAM1", 0.0, 90.0, Cardinal::North),
            record_at("1_2_CAM1", 60.0, 0.0, Cardinal::North),
            record_at("1_4_CAM1", -60.0, 0.0, Cardinal::North),
            record_at("1_5_CAM1", 0.0, -90.0, Cardinal::North),
        ]);
        let center = key(&dataset, "1_3_CAM1").unwrap();
        let map = SiblingResolver::default().resolve(center, &dataset);

        assert_eq!(
            map,
            SiblingMap {
                north: key(&dataset, "1_1_CAM1"),
                east: key(&dataset, "1_2_CAM1"),
                south: key(&dataset, "1_5_CAM1"),
                west: key(&dataset, "1_4_CAM1"),
            }
        );
        assert!(!map.is_empty());
        assert_eq!(map.available().count(), 4);
    }

    #[test]
    fn exact_same_line_neighbours_are_symmetric() {
        let records: Vec<_> = (1..=6)
            .map(|w| record_at(&format!("2_{w}_CAM1"), 100.0 * w as f64, 0.0, Cardinal::East))
            .collect();
        let dataset = dataset_of(records);
        let resolver = SiblingResolver::default();

        for w in 1..6 {
            let a = key(&dataset, &format!("2_{w}_CAM1")).unwrap();
            let b = key(&dataset, &format!("2_{}_CAM1", w + 1)).unwrap();
            assert_eq!(resolver.resolve(a, &dataset).east, Some(b));
            assert_eq!(resolver.resolve(b, &dataset).west, Some(a));
        }
    }

    #[test]
    fn exact_waypoint_beats_closer_non_exact() {
        let dataset = dataset_of(vec![
            record_at("1_5_CAM1", 0.0, 0.0, Cardinal::North),
            record_at("1_6_CAM1", 200.0, 0.0, Cardinal::North),
            record_at("1_9_CAM1", 50.0, 0.0, Cardinal::North),
        ]);
        let map = SiblingResolver::default().resolve(key(&dataset, "1_5_CAM1").unwrap(), &dataset);
        assert_eq!(map.east, key(&dataset, "1_6_CAM1"));
    }

    #[test]
    fn threshold_applies_except_to_exact_matches() {
        let dataset = dataset_of(vec![
            record_at("1_5_CAM1", 0.0, 0.0, Cardinal::North),
            // Exact neighbour far away: kept.
            record_at("1_6_CAM1", 1_000.0, 0.0, Cardinal::North),
            // Non-exact beyond the threshold: dropped.
            record_at("1_2_CAM1", -400.0, 0.0, Cardinal::North),
            // Same waypoint on the adjacent line is still capped.
            record_at("2_5_CAM1", 0.0, 1_000.0, Cardinal::North),
        ]);
        let map = SiblingResolver::default().resolve(key(&dataset, "1_5_CAM1").unwrap(), &dataset);
        assert_eq!(map.east, key(&dataset, "1_6_CAM1"));
        assert_eq!(map.west, None);
        assert_eq!(map.north, None);

        let tight = SiblingResolver::new(300.0);
        let near = dataset_of(vec![
            record_at("1_5_CAM1", 0.0, 0.0, Cardinal::North),
            record_at("1_2_CAM1", -299.0, 0.0, Cardinal::North),
        ]);
        let map = tight.resolve(key(&near, "1_5_CAM1").unwrap(), &near);
        assert_eq!(map.west, key(&near, "1_2_CAM1"));
    }

    #[test]
    fn adjacent_lines_fill_north_and_south_by_delta_y() {
        let dataset = dataset_of(vec![
            record_at("2_5_CAM1", 0.0, 0.0, Cardinal::West),
            record_at("1_5_CAM1", 150.0, 250.0, Cardinal::West),
            record_at("1_6_CAM1", 0.0, 250.0, Cardinal::West),
            record_at("3_5_CAM1", 10.0, -150.0, Cardinal::West),
            record_at("3_6_CAM1", 0.0, -400.0, Cardinal::West),
            // Two lines away, and another sector: never considered.
            record_at("4_5_CAM1", 0.0, -20.0, Cardinal::West),
            record_at("1_7_CAM1", 0.0, 10.0, Cardinal::East),
        ]);
        let map = SiblingResolver::default().resolve(key(&dataset, "2_5_CAM1").unwrap(), &dataset);

        assert_eq!(map.north, key(&dataset, "1_6_CAM1"));
        assert_eq!(map.south, key(&dataset, "3_5_CAM1"));
        assert_eq!(map.east, None);
        assert_eq!(map.west, None);
    }

    #[test]
    fn closer_candidate_wins_slot_conflicts() {
        let dataset = dataset_of(vec![
            record_at("2_5_CAM1", 0.0, 0.0, Cardinal::North),
            // Same line, bearing north, non-exact.
            record_at("2_9_CAM1", 0.0, 300.0, Cardinal::North),
            // Adjacent line north, closer.
            record_at("1_1_CAM1", 20.0, 100.0, Cardinal::North),
            // Same line, bearing south, non-exact and closer than the
            // adjacent-line southern candidate.
            record_at("2_1_CAM1", 0.0, -50.0, Cardinal::North),
            record_at("3_1_CAM1", 0.0, -200.0, Cardinal::North),
        ]);
        let map = SiblingResolver::default().resolve(key(&dataset, "2_5_CAM1").unwrap(), &dataset);

        assert_eq!(map.north, key(&dataset, "1_1_CAM1"));
        assert_eq!(map.south, key(&dataset, "2_1_CAM1"));
    }

    #[test]
    fn unknown_or_isolated_records_have_no_siblings() {
        let dataset = dataset_of(vec![record_at("1_1_CAM1", 0.0, 0.0, Cardinal::North)]);
        let resolver = SiblingResolver::default();
        assert!(resolver.resolve(ImageKey::new(7), &dataset).is_empty());
        let map = resolver.resolve(ImageKey::new(0), &dataset);
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 4);

        let record = dataset.get(ImageKey::new(0)).unwrap().clone();
        assert_eq!(resolver.resolve_record(&record, &dataset), map);
    }
}
