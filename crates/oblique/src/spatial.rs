//! Sector-partitioned spatial index over footprint centerpoints.
//!
//! Four independent R-trees, one per [`Cardinal`]. A centerpoint lives in the
//! tree of the sector its image was captured facing, so a query for "facing
//! north" only ever sees north-facing captures.

use foundation::math::stable_total_cmp_f64;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::cardinal::Cardinal;
use crate::dataset::{ImageDataset, ImageKey};
use crate::footprint::FootprintCenterpoint;

/// A centerpoint as stored in a sector tree.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedCenterpoint {
    pub key: ImageKey,
    /// Projected CRS.
    pub x: f64,
    pub y: f64,
    /// Insertion order within the sector; breaks distance ties.
    pub seq: usize,
}

impl IndexedCenterpoint {
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        self.distance_2(&[x, y]).sqrt()
    }
}

impl RTreeObject for IndexedCenterpoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedCenterpoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// k-nearest lookup scoped to one sector.
///
/// Implemented by [`SpatialIndexBySector`]; tests substitute spies.
pub trait CenterpointIndex {
    /// Up to `k` centerpoints of `sector`, nearest first, ties in insertion
    /// order. Empty for `k == 0`, an empty sector or a non-finite query.
    fn nearest(&self, sector: Cardinal, x: f64, y: f64, k: usize) -> Vec<IndexedCenterpoint>;

    fn len(&self, sector: Cardinal) -> usize;
}

#[derive(Debug, Clone)]
pub struct SpatialIndexBySector {
    trees: [RTree<IndexedCenterpoint>; 4],
}

impl Default for SpatialIndexBySector {
    fn default() -> Self {
        Self {
            trees: std::array::from_fn(|_| RTree::new()),
        }
    }
}

impl SpatialIndexBySector {
    /// Bulk loads `(key, centerpoint)` pairs; each goes to its own cardinal's
    /// tree. Input order defines tie-breaking.
    pub fn build<'a>(
        centerpoints: impl IntoIterator<Item = (ImageKey, &'a FootprintCenterpoint)>,
    ) -> Self {
        let mut buckets: [Vec<IndexedCenterpoint>; 4] = Default::default();
        for (key, cp) in centerpoints {
            if !(cp.x.is_finite() && cp.y.is_finite()) {
                continue;
            }
            let bucket = &mut buckets[cp.cardinal.index()];
            bucket.push(IndexedCenterpoint {
                key,
                x: cp.x,
                y: cp.y,
                seq: bucket.len(),
            });
        }
        Self {
            trees: buckets.map(RTree::bulk_load),
        }
    }

    pub fn from_dataset(dataset: &ImageDataset) -> Self {
        Self::build(dataset.centerpoints())
    }

    pub fn total_len(&self) -> usize {
        self.trees.iter().map(RTree::size).sum()
    }

    /// Every indexed centerpoint of `sector`, in no particular order.
    pub fn iter_sector(&self, sector: Cardinal) -> impl Iterator<Item = &IndexedCenterpoint> {
        self.trees[sector.index()].iter()
    }
}

impl CenterpointIndex for SpatialIndexBySector {
    fn nearest(&self, sector: Cardinal, x: f64, y: f64, k: usize) -> Vec<IndexedCenterpoint> {
        let tree = &self.trees[sector.index()];
        if k == 0 || tree.size() == 0 || !(x.is_finite() && y.is_finite()) {
            return Vec::new();
        }

        // Gather the k nearest plus anything tied with the k-th, then order
        // ties by insertion before cutting back to k.
        let mut found: Vec<(&IndexedCenterpoint, f64)> = Vec::with_capacity(k.min(tree.size()));
        for (item, d2) in tree.nearest_neighbor_iter_with_distance_2(&[x, y]) {
            if found.len() >= k && found.last().is_some_and(|(_, last)| d2 > *last) {
                break;
            }
            found.push((item, d2));
        }
        found.sort_by(|(a, da), (b, db)| stable_total_cmp_f64(*da, *db).then(a.seq.cmp(&b.seq)));
        found.truncate(k);
        found.into_iter().map(|(item, _)| item.clone()).collect()
    }

    fn len(&self, sector: Cardinal) -> usize {
        self.trees[sector.index()].size()
    }
}

#[cfg(test)]
mod tests {
    use super::{CenterpointIndex, SpatialIndexBySector};
    use crate::cardinal::Cardinal;
    use crate::dataset::ImageKey;
    use crate::footprint::FootprintCenterpoint;
    use pretty_assertions::assert_eq;

    fn cp(id: &str, x: f64, y: f64, cardinal: Cardinal) -> FootprintCenterpoint {
        FootprintCenterpoint {
            id: id.to_string(),
            x,
            y,
            longitude: 0.0,
            latitude: 0.0,
            cardinal,
        }
    }

    fn keyed(points: &[FootprintCenterpoint]) -> Vec<(ImageKey, &FootprintCenterpoint)> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (ImageKey::new(i as u32), p))
            .collect()
    }

    #[test]
    fn every_centerpoint_lands_in_its_own_sector() {
        let points: Vec<_> = (0..40)
            .map(|i| cp(&format!("p{i}"), i as f64, -(i as f64), Cardinal::ALL[i % 4]))
            .collect();
        let index = SpatialIndexBySector::build(keyed(&points));

        assert_eq!(index.total_len(), points.len());
        for sector in Cardinal::ALL {
            assert_eq!(index.len(sector), 10);
            for item in index.iter_sector(sector) {
                assert_eq!(points[item.key.index()].cardinal, sector);
            }
        }
    }

    #[test]
    fn returns_k_nearest_ascending() {
        let coords = [
            (10.0, 0.0),
            (-3.0, 0.0),
            (0.0, 7.0),
            (1.0, 1.0),
            (50.0, 50.0),
            (0.0, -5.0),
        ];
        let points: Vec<_> = coords
            .iter()
            .enumerate()
            .map(|(i, (x, y))| cp(&format!("p{i}"), *x, *y, Cardinal::North))
            .collect();
        let index = SpatialIndexBySector::build(keyed(&points));

        let got: Vec<u32> = index
            .nearest(Cardinal::North, 0.0, 0.0, 4)
            .iter()
            .map(|c| c.key.index() as u32)
            .collect();
        assert_eq!(got, vec![3, 1, 5, 2]);

        // Brute-force agreement for every k.
        let mut by_distance: Vec<usize> = (0..coords.len()).collect();
        by_distance.sort_by(|a, b| {
            let da = coords[*a].0.hypot(coords[*a].1);
            let db = coords[*b].0.hypot(coords[*b].1);
            da.total_cmp(&db)
        });
        for k in 1..=coords.len() + 2 {
            let got: Vec<usize> = index
                .nearest(Cardinal::North, 0.0, 0.0, k)
                .iter()
                .map(|c| c.key.index())
                .collect();
            let expected: Vec<usize> = by_distance.iter().copied().take(k).collect();
            assert_eq!(got, expected, "k = {k}");
        }
    }

    #[test]
    fn ties_follow_insertion_order() {
        let points = vec![
            cp("a", 0.0, 5.0, Cardinal::East),
            cp("b", 5.0, 0.0, Cardinal::East),
            cp("c", -5.0, 0.0, Cardinal::East),
            cp("d", 0.0, -5.0, Cardinal::East),
        ];
        let index = SpatialIndexBySector::build(keyed(&points));
        for k in 1..=4 {
            let got: Vec<usize> = index
                .nearest(Cardinal::East, 0.0, 0.0, k)
                .iter()
                .map(|c| c.key.index())
                .collect();
            let expected: Vec<usize> = (0..k).collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn empty_results_instead_of_errors() {
        let points = vec![cp("a", 0.0, 0.0, Cardinal::South)];
        let index = SpatialIndexBySector::build(keyed(&points));

        assert!(index.nearest(Cardinal::South, 0.0, 0.0, 0).is_empty());
        assert!(index.nearest(Cardinal::North, 0.0, 0.0, 10).is_empty());
        assert!(index.nearest(Cardinal::South, f64::NAN, 0.0, 10).is_empty());
        assert_eq!(index.nearest(Cardinal::South, 3.0, 4.0, 10).len(), 1);
        assert_eq!(
            index.nearest(Cardinal::South, 3.0, 4.0, 1)[0].distance_to(3.0, 4.0),
            5.0
        );
        assert!(SpatialIndexBySector::default().nearest(Cardinal::South, 0.0, 0.0, 1).is_empty());
    }
}
