//! Navigation session state.
//!
//! The coordinator owns everything one viewer session mutates: the current
//! selection, per-frame search memo, debounce clock, protocol state, event
//! bus and observables. Everything it reads (dataset, index, converter) is
//! built once and never changes for the session.

use foundation::math::{Geodetic, ProjectionConverter, Vec3};
use foundation::time::Time;
use runtime::{Counters, Event, EventBus, Frame, Observable};
use tracing::{debug, info, warn};

use crate::cardinal::Cardinal;
use crate::config::EngineConfig;
use crate::dataset::{ImageDataset, ImageKey};
use crate::exterior::{DerivedExteriorOrientation, ExteriorOrientationCache};
use crate::navigation::events::{NavigationEvent, PreviewVisibility};
use crate::navigation::host::{FlightId, FlyToRequest, RenderHost};
use crate::navigation::protocol::{InputKind, InputOutcome, ProtocolState};
use crate::navigation::search::{
    FrameCache, NearestImageResult, SearchKey, SearchRequest, SearchResults, Viewpoint,
};
use crate::siblings::{SiblingMap, SiblingResolver};
use crate::spatial::{CenterpointIndex, SpatialIndexBySector};

const SEARCH_INDEX_QUERIES: &str = "search.index_queries";
const SEARCH_FRAME_CACHE_HITS: &str = "search.frame_cache_hits";
const SEARCH_DEBOUNCED: &str = "search.debounced";
const SEARCH_NO_VIEWPOINT: &str = "search.no_viewpoint";
const SELECTION_CHANGES: &str = "selection.changes";
const FLIGHT_STARTED: &str = "flight.started";
const FLIGHT_COMPLETED: &str = "flight.completed";
const INPUT_IGNORED: &str = "input.ignored";

pub struct NavigationCoordinator<I: CenterpointIndex = SpatialIndexBySector> {
    dataset: ImageDataset,
    index: I,
    converter: Box<dyn ProjectionConverter>,
    config: EngineConfig,
    resolver: SiblingResolver,
    exterior: ExteriorOrientationCache,

    selected: Option<ImageKey>,
    siblings: SiblingMap,
    frame_cache: FrameCache,
    last_search: Option<(Time, SearchResults)>,
    heading_override_deg: Option<f64>,
    preview_mode: bool,
    selection_suspended: bool,
    protocol: ProtocolState,
    next_flight: u64,
    last_frame: Frame,

    counters: Counters,
    events: EventBus<NavigationEvent>,
    orbit_point: Observable<Option<Geodetic>>,
    preview_visibility: Observable<PreviewVisibility>,
}

impl NavigationCoordinator<SpatialIndexBySector> {
    /// Builds the sector index from the dataset's centerpoints.
    pub fn from_dataset(
        dataset: ImageDataset,
        converter: Box<dyn ProjectionConverter>,
        config: EngineConfig,
    ) -> Self {
        let index = SpatialIndexBySector::from_dataset(&dataset);
        Self::new(dataset, index, converter, config)
    }
}

impl<I: CenterpointIndex> NavigationCoordinator<I> {
    pub fn new(
        dataset: ImageDataset,
        index: I,
        converter: Box<dyn ProjectionConverter>,
        config: EngineConfig,
    ) -> Self {
        let resolver = SiblingResolver::from_config(&config.siblings);
        Self {
            dataset,
            index,
            converter,
            config,
            resolver,
            exterior: ExteriorOrientationCache::new(),
            selected: None,
            siblings: SiblingMap::default(),
            frame_cache: FrameCache::new(),
            last_search: None,
            heading_override_deg: None,
            preview_mode: false,
            selection_suspended: false,
            protocol: ProtocolState::Idle,
            next_flight: 0,
            last_frame: Frame::new(0, Time::default()),
            counters: Counters::new(),
            events: EventBus::new(),
            orbit_point: Observable::new(None),
            preview_visibility: Observable::new(PreviewVisibility::VISIBLE),
        }
    }

    pub fn dataset(&self) -> &ImageDataset {
        &self.dataset
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn state(&self) -> ProtocolState {
        self.protocol
    }

    pub fn preview_mode(&self) -> bool {
        self.preview_mode
    }

    pub fn is_selection_suspended(&self) -> bool {
        self.selection_suspended
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn drain_events(&mut self) -> Vec<Event<NavigationEvent>> {
        self.events.drain()
    }

    /// Footprint centre of the selection (ground level), for orbit controls.
    pub fn orbit_point(&self) -> &Observable<Option<Geodetic>> {
        &self.orbit_point
    }

    pub fn orbit_point_mut(&mut self) -> &mut Observable<Option<Geodetic>> {
        &mut self.orbit_point
    }

    pub fn preview_visibility(&self) -> &Observable<PreviewVisibility> {
        &self.preview_visibility
    }

    pub fn preview_visibility_mut(&mut self) -> &mut Observable<PreviewVisibility> {
        &mut self.preview_visibility
    }

    /// Heading used by the next mutating search only, bypassing the debounce
    /// gate once.
    pub fn set_heading_override(&mut self, heading_deg: f64) {
        if heading_deg.is_finite() {
            self.heading_override_deg = Some(heading_deg);
        }
    }

    pub fn selected(&self) -> Option<ImageKey> {
        self.selected
    }

    pub fn selected_record(&self) -> Option<&crate::record::ImageRecord> {
        self.selected.and_then(|key| self.dataset.get(key))
    }

    /// Neighbour per direction of the current selection.
    pub fn sibling_availability(&self) -> SiblingMap {
        self.siblings
    }

    /// Replaces the selection. Returns `true` if it changed.
    ///
    /// Keys unknown to the dataset are rejected.
    pub fn select(&mut self, key: Option<ImageKey>) -> bool {
        if let Some(k) = key {
            if self.dataset.get(k).is_none() {
                warn!("ignoring selection of unknown image {k}");
                return false;
            }
        }
        if self.selected == key {
            return false;
        }

        let previous = std::mem::replace(&mut self.selected, key);
        self.siblings = key
            .map(|k| self.resolver.resolve(k, &self.dataset))
            .unwrap_or_default();

        let orbit = key
            .and_then(|k| self.dataset.centerpoint(k))
            .map(|cp| Geodetic::from_lon_lat_deg(cp.longitude, cp.latitude, 0.0));
        self.orbit_point.set(orbit);

        self.counters.inc(SELECTION_CHANGES);
        self.events.emit(
            self.last_frame,
            NavigationEvent::SelectionChanged {
                previous,
                current: key,
            },
        );
        match self.selected_record() {
            Some(record) => info!(id = %record.id, "selected image"),
            None => info!("selection cleared"),
        }
        true
    }

    pub fn set_preview_mode(&mut self, enabled: bool) {
        if self.preview_mode == enabled {
            return;
        }
        self.preview_mode = enabled;
        if enabled {
            self.selection_suspended = true;
        } else {
            if self.protocol.pending().is_some() {
                self.protocol = ProtocolState::Idle;
            }
            if !self.protocol.is_flying() {
                self.selection_suspended = false;
                self.preview_visibility.set(PreviewVisibility::VISIBLE);
            }
        }
        debug!(enabled, "preview mode");
    }

    /// Nearest images to the viewpoint within the heading's sector.
    ///
    /// `None` means there is nothing to search from (no camera yet, or the
    /// viewpoint cannot be projected); an empty slice means nothing matched.
    pub fn search(
        &mut self,
        host: &dyn RenderHost,
        request: SearchRequest,
    ) -> Option<SearchResults> {
        let frame = host.frame();
        self.last_frame = frame;

        let viewpoint = request.viewpoint.or_else(|| {
            host.camera().map(|camera| Viewpoint {
                position: camera.position,
                heading_deg: camera.heading_deg,
            })
        });
        let Some(viewpoint) = viewpoint else {
            self.counters.inc(SEARCH_NO_VIEWPOINT);
            debug!("search skipped: no viewpoint");
            return None;
        };

        // A direct override is used as given. The one-shot override is only
        // consumed once a search that may move the selection actually runs.
        let direct_override = request.heading_override_deg.filter(|h| h.is_finite());
        let override_heading = direct_override.or(self.heading_override_deg);

        if !request.compute_only && !request.immediate && override_heading.is_none() {
            if let Some((at, previous)) = &self.last_search {
                let window_s = self.config.search.debounce_ms as f64 / 1000.0;
                if frame.time.since(*at) < window_s {
                    self.counters.inc(SEARCH_DEBOUNCED);
                    debug!("search debounced");
                    return Some(previous.clone());
                }
            }
        }

        let projected = match self.converter.inverse(viewpoint.position) {
            Ok(p) => p,
            Err(err) => {
                warn!("search skipped: cannot project viewpoint: {err}");
                return None;
            }
        };
        if direct_override.is_none() && !request.compute_only {
            self.heading_override_deg = None;
        }

        let heading = override_heading.unwrap_or(viewpoint.heading_deg);
        let sector = Cardinal::from_heading_deg(heading);
        let k = request.k.unwrap_or(self.config.search.default_k);
        let key = SearchKey::new(
            projected.x,
            projected.y,
            self.config.search.position_rounding_m,
            sector,
            k,
            override_heading,
            request.compute_only,
        );

        let results = match self.frame_cache.get(frame, &key) {
            Some(hit) => {
                self.counters.inc(SEARCH_FRAME_CACHE_HITS);
                debug!(frame = frame.index, "search served from frame cache");
                hit
            }
            None => {
                let fresh = self.query(projected, sector, k);
                self.frame_cache.insert(frame, key, fresh.clone());
                fresh
            }
        };

        if !request.compute_only {
            self.last_search = Some((frame.time, results.clone()));
            if !self.selection_suspended {
                if let Some(top) = results.first() {
                    if self.selected != Some(top.key) {
                        self.select(Some(top.key));
                    }
                }
            }
        }
        Some(results)
    }

    fn query(&mut self, at: Vec3, sector: Cardinal, k: usize) -> SearchResults {
        self.counters.inc(SEARCH_INDEX_QUERIES);
        self.index
            .nearest(sector, at.x, at.y, k)
            .into_iter()
            .filter_map(|hit| {
                let record = self.dataset.get(hit.key)?;
                let center = self.dataset.centerpoint(hit.key)?;
                Some(NearestImageResult {
                    key: hit.key,
                    distance_on_ground: (center.x - at.x).hypot(center.y - at.y),
                    distance_to_camera: record.position.distance(at),
                    image_center: center.clone(),
                })
            })
            .collect()
    }

    /// Memoized exterior orientation of `key`; `None` if it cannot be derived.
    pub fn derived_orientation(&mut self, key: ImageKey) -> Option<&DerivedExteriorOrientation> {
        let record = self.dataset.get(key)?;
        let up_axis = self.config.rig.up_axis_for(&record.camera_id);
        match self
            .exterior
            .get_or_compute(key, record, self.converter.as_ref(), up_axis)
        {
            Ok(derived) => Some(derived),
            Err(err) => {
                warn!("no exterior orientation for image {key}: {err}");
                None
            }
        }
    }

    /// Starts a fly-to towards the selected image's exterior orientation.
    ///
    /// Only one flight runs at a time; returns `None` while flying, without
    /// a selection, or when the orientation cannot be derived.
    pub fn fly_to_selected(&mut self, host: &mut dyn RenderHost) -> Option<FlightId> {
        let frame = host.frame();
        self.last_frame = frame;
        if self.protocol.is_flying() {
            self.counters.inc(INPUT_IGNORED);
            debug!("fly-to ignored: flight in progress");
            return None;
        }
        let target = self.selected?;
        let (destination, direction, up) = {
            let derived = self.derived_orientation(target)?;
            (
                derived.position.ecef,
                derived.rotation.ecef.direction,
                derived.rotation.ecef.up,
            )
        };

        let flight = FlightId::new(self.next_flight);
        self.next_flight += 1;
        self.protocol.start_flight(flight);
        self.selection_suspended = true;
        self.counters.inc(FLIGHT_STARTED);
        self.events
            .emit(frame, NavigationEvent::FlightStarted { flight, target });
        debug!(%flight, target = %target, "flight started");

        host.fly_to(FlyToRequest {
            flight,
            destination,
            direction,
            up,
            duration_s: self.config.protocol.fly_duration_s,
            easing: self.config.protocol.easing,
        });
        Some(flight)
    }

    /// Animation completion callback. Stale or repeated ids are ignored.
    pub fn complete_flight(&mut self, flight: FlightId) -> bool {
        if !self.protocol.complete_flight(flight) {
            debug!(%flight, "ignoring completion of unknown flight");
            return false;
        }
        self.preview_visibility.set(PreviewVisibility::VISIBLE);
        if !self.preview_mode {
            self.selection_suspended = false;
        }
        self.counters.inc(FLIGHT_COMPLETED);
        self.events
            .emit(self.last_frame, NavigationEvent::FlightCompleted { flight });
        true
    }

    /// Handles a directional key or button press.
    ///
    /// Outside preview mode every input rotates the camera to the
    /// direction's heading. In preview mode a key moves to the sibling in
    /// that direction at once, a sibling button is debounced and committed
    /// by [`tick`](Self::tick).
    pub fn directional_input(
        &mut self,
        host: &mut dyn RenderHost,
        direction: Cardinal,
        kind: InputKind,
    ) -> InputOutcome {
        let frame = host.frame();
        self.last_frame = frame;

        if self.protocol.is_flying() {
            self.counters.inc(INPUT_IGNORED);
            self.events
                .emit(frame, NavigationEvent::InputIgnored { direction });
            debug!(%direction, "input ignored: flight in progress");
            return InputOutcome::IgnoredWhileFlying;
        }

        if !self.preview_mode {
            let heading_deg = direction.heading_deg();
            host.rotate_to_heading(heading_deg, self.config.protocol.rotate_duration_s);
            self.heading_override_deg = Some(heading_deg);
            self.events
                .emit(frame, NavigationEvent::RotationRequested { heading_deg });
            return InputOutcome::Rotated { heading_deg };
        }

        match kind {
            InputKind::SiblingButton => {
                let due = frame.time.add_millis(self.config.protocol.sibling_debounce_ms);
                self.protocol.queue_intent(direction, due);
                self.events
                    .emit(frame, NavigationEvent::SiblingIntentQueued { direction, due });
                InputOutcome::Queued { direction, due }
            }
            InputKind::Rotate => {
                self.protocol = ProtocolState::Idle;
                self.navigate_to_sibling(host, direction)
            }
        }
    }

    /// Commits a debounced sibling intent once it is due.
    pub fn tick(&mut self, host: &mut dyn RenderHost) -> Option<InputOutcome> {
        let frame = host.frame();
        self.last_frame = frame;
        let direction = self.protocol.take_due_intent(frame.time)?;
        Some(self.navigate_to_sibling(host, direction))
    }

    fn navigate_to_sibling(
        &mut self,
        host: &mut dyn RenderHost,
        direction: Cardinal,
    ) -> InputOutcome {
        let Some(current) = self.selected else {
            return InputOutcome::NoSibling { direction };
        };
        // Resolved without touching the selection; only a distinct sibling
        // commits.
        let Some(target) = self
            .resolver
            .resolve(current, &self.dataset)
            .get(direction)
            .filter(|t| *t != current)
        else {
            debug!(%direction, "no sibling");
            return InputOutcome::NoSibling { direction };
        };

        self.select(Some(target));
        self.preview_visibility.set(PreviewVisibility::LEAVING);
        match self.fly_to_selected(host) {
            Some(flight) => InputOutcome::FlightStarted { flight, target },
            None => {
                self.preview_visibility.set(PreviewVisibility::VISIBLE);
                InputOutcome::SelectedWithoutFlight { target }
            }
        }
    }
}
