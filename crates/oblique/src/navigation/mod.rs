//! Nearest-image search and the interactive navigation protocols.

mod coordinator;
pub mod events;
pub mod host;
pub mod protocol;
pub mod search;

pub use coordinator::NavigationCoordinator;
pub use events::{NavigationEvent, PreviewVisibility};
pub use host::{CameraState, Easing, FlightId, FlyToRequest, RenderHost};
pub use protocol::{InputKind, InputOutcome, ProtocolState};
pub use search::{FrameCache, NearestImageResult, SearchKey, SearchRequest, SearchResults, Viewpoint};
