//! Nearest-image search inputs, results and the per-frame memo.

use std::collections::HashMap;
use std::sync::Arc;

use foundation::math::{Geodetic, quantize};
use runtime::Frame;

use crate::cardinal::Cardinal;
use crate::dataset::ImageKey;
use crate::footprint::FootprintCenterpoint;

/// Explicit viewpoint replacing the host camera for one search.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewpoint {
    pub position: Geodetic,
    pub heading_deg: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// Defaults to the host camera.
    pub viewpoint: Option<Viewpoint>,
    /// Heading used for this search only; bypasses the debounce gate.
    pub heading_override_deg: Option<f64>,
    /// Defaults to `SearchConfig::default_k`.
    pub k: Option<usize>,
    /// Bypasses the debounce gate.
    pub immediate: bool,
    /// Query without touching selection or the debounce clock.
    pub compute_only: bool,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    pub fn compute_only(mut self) -> Self {
        self.compute_only = true;
        self
    }

    pub fn with_viewpoint(mut self, viewpoint: Viewpoint) -> Self {
        self.viewpoint = Some(viewpoint);
        self
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_override_deg = Some(heading_deg);
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }
}

/// Structural identity of a search within one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    /// Position in multiples of the rounding step.
    pub x: i64,
    pub y: i64,
    pub sector: Cardinal,
    pub k: usize,
    /// Override heading in hundredths of a degree, when one was used.
    pub override_centideg: Option<i64>,
    pub compute_only: bool,
}

impl SearchKey {
    pub fn new(
        x: f64,
        y: f64,
        rounding_m: f64,
        sector: Cardinal,
        k: usize,
        override_heading_deg: Option<f64>,
        compute_only: bool,
    ) -> Self {
        Self {
            x: quantize(x, rounding_m),
            y: quantize(y, rounding_m),
            sector,
            k,
            override_centideg: override_heading_deg.map(|h| quantize(h, 0.01)),
            compute_only,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearestImageResult {
    pub key: ImageKey,
    /// Query point to footprint centre, projected units.
    pub distance_on_ground: f64,
    /// Query point (with camera height) to capture position.
    pub distance_to_camera: f64,
    pub image_center: FootprintCenterpoint,
}

pub type SearchResults = Arc<[NearestImageResult]>;

/// Search results memoized for the duration of one render frame.
#[derive(Debug, Default)]
pub struct FrameCache {
    frame_index: Option<u64>,
    entries: HashMap<SearchKey, SearchResults>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn roll(&mut self, frame: Frame) {
        if self.frame_index != Some(frame.index) {
            self.entries.clear();
            self.frame_index = Some(frame.index);
        }
    }

    pub fn get(&mut self, frame: Frame, key: &SearchKey) -> Option<SearchResults> {
        self.roll(frame);
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, frame: Frame, key: SearchKey, results: SearchResults) {
        self.roll(frame);
        self.entries.insert(key, results);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
