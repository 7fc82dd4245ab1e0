use foundation::time::Time;

use crate::cardinal::Cardinal;
use crate::dataset::ImageKey;
use crate::navigation::host::FlightId;

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    SelectionChanged {
        previous: Option<ImageKey>,
        current: Option<ImageKey>,
    },
    FlightStarted {
        flight: FlightId,
        target: ImageKey,
    },
    FlightCompleted {
        flight: FlightId,
    },
    RotationRequested {
        heading_deg: f64,
    },
    SiblingIntentQueued {
        direction: Cardinal,
        due: Time,
    },
    InputIgnored {
        direction: Cardinal,
    },
}

/// How the host should draw the image being navigated away from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PreviewVisibility {
    pub dim_current: bool,
    pub remove_current: bool,
}

impl PreviewVisibility {
    pub const VISIBLE: Self = Self {
        dim_current: false,
        remove_current: false,
    };

    /// While flying to a sibling the old preview fades and is then dropped.
    pub const LEAVING: Self = Self {
        dim_current: true,
        remove_current: true,
    };
}
