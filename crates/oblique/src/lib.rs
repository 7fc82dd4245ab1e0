//! Oblique aerial image navigation.
//!
//! Turns per-image exterior orientations into queryable records, indexes
//! their footprints per cardinal sector, resolves directional neighbours
//! between captures, and coordinates nearest-image search plus the
//! rotate / fly-to-sibling protocols against a render host.

pub mod cardinal;
pub mod config;
pub mod dataset;
pub mod error;
pub mod exterior;
pub mod footprint;
pub mod navigation;
pub mod record;
pub mod siblings;
pub mod spatial;

#[cfg(test)]
pub(crate) mod testing;

pub use cardinal::*;
pub use config::EngineConfig;
pub use dataset::{ImageDataset, ImageKey, IngestReport};
pub use error::*;
pub use exterior::{DerivedExteriorOrientation, ExteriorOrientationCache, UpAxis};
pub use footprint::FootprintCenterpoint;
pub use navigation::NavigationCoordinator;
pub use record::{ImageId, ImageRecord, SectorLookupTable};
pub use siblings::{SiblingMap, SiblingResolver};
pub use spatial::{CenterpointIndex, SpatialIndexBySector};
