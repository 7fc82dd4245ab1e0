use foundation::math::{Ecef, Geodetic, Vec3};
use runtime::Frame;
use serde::{Deserialize, Serialize};

/// Easing curve the host should use for camera animations.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    QuadraticInOut,
    #[default]
    CubicInOut,
}

/// Live camera pose reported by the host.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    pub position: Geodetic,
    /// Degrees clockwise from true north.
    pub heading_deg: f64,
    pub pitch_deg: f64,
}

/// Identifies one fly-to animation; echoed back on completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlightId(u64);

impl FlightId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FlightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "flight-{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlyToRequest {
    pub flight: FlightId,
    pub destination: Ecef,
    /// ECEF view direction.
    pub direction: Vec3,
    /// ECEF up.
    pub up: Vec3,
    pub duration_s: f64,
    pub easing: Easing,
}

/// The render/animation engine the coordinator drives.
///
/// Animations run on the host. When a fly-to finishes the host calls
/// `NavigationCoordinator::complete_flight` with the request's `flight`.
pub trait RenderHost {
    /// `None` until the camera has a usable position.
    fn camera(&self) -> Option<CameraState>;

    fn frame(&self) -> Frame;

    fn fly_to(&mut self, request: FlyToRequest);

    fn rotate_to_heading(&mut self, heading_deg: f64, duration_s: f64);
}
