//! Rotate / fly-to-sibling protocol state.
//!
//! ```text
//! Idle ──sibling button──▶ PendingDebounceIntent ──due──▶ (resolve) ──▶ Flying
//!  │                         ▲ newer button press replaces the intent      │
//!  └──────────── key in preview mode ─────────────────────────────────────▶│
//! Flying ──complete_flight(same id)──▶ Idle; any input while Flying is dropped
//! ```

use foundation::time::Time;

use crate::cardinal::Cardinal;
use crate::dataset::ImageKey;
use crate::navigation::host::FlightId;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum ProtocolState {
    #[default]
    Idle,
    PendingDebounceIntent {
        direction: Cardinal,
        due: Time,
    },
    Flying {
        flight: FlightId,
    },
}

impl ProtocolState {
    pub fn is_flying(&self) -> bool {
        matches!(self, ProtocolState::Flying { .. })
    }

    pub fn flight(&self) -> Option<FlightId> {
        match self {
            ProtocolState::Flying { flight } => Some(*flight),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<(Cardinal, Time)> {
        match self {
            ProtocolState::PendingDebounceIntent { direction, due } => Some((*direction, *due)),
            _ => None,
        }
    }

    /// Queues `direction`, replacing any pending intent.
    ///
    /// Returns `false` (and changes nothing) while flying.
    pub fn queue_intent(&mut self, direction: Cardinal, due: Time) -> bool {
        if self.is_flying() {
            return false;
        }
        *self = ProtocolState::PendingDebounceIntent { direction, due };
        true
    }

    /// Takes the pending direction once `now` has reached its due time.
    pub fn take_due_intent(&mut self, now: Time) -> Option<Cardinal> {
        match *self {
            ProtocolState::PendingDebounceIntent { direction, due } if now >= due => {
                *self = ProtocolState::Idle;
                Some(direction)
            }
            _ => None,
        }
    }

    /// Enters `Flying`, discarding any pending intent.
    pub fn start_flight(&mut self, flight: FlightId) {
        *self = ProtocolState::Flying { flight };
    }

    /// Leaves `Flying` if `flight` is the one in progress.
    pub fn complete_flight(&mut self, flight: FlightId) -> bool {
        if self.flight() == Some(flight) {
            *self = ProtocolState::Idle;
            return true;
        }
        false
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// Keyboard or rotate control.
    Rotate,
    /// Preview-mode sibling button; debounced.
    SiblingButton,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputOutcome {
    Rotated { heading_deg: f64 },
    Queued { direction: Cardinal, due: Time },
    FlightStarted { flight: FlightId, target: ImageKey },
    /// The selection moved but no flight could be prepared for it.
    SelectedWithoutFlight { target: ImageKey },
    NoSibling { direction: Cardinal },
    IgnoredWhileFlying,
}
