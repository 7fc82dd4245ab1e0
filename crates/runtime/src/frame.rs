use foundation::time::Time;

/// Render-loop frame stamp supplied by the host.
///
/// `index` identifies the frame for per-frame memoization; `time` is the
/// host timebase used for debouncing. Both are plain data so a session can be
/// recorded and replayed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// Monotonic frame counter.
    pub index: u64,
    /// Host time at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, time: Time) -> Self {
        Self { index, time }
    }

    /// The following frame, `dt_s` seconds later.
    pub fn next(self, dt_s: f64) -> Self {
        Self::new(self.index + 1, Time(self.time.0 + dt_s))
    }

    pub fn same_frame(&self, other: &Frame) -> bool {
        self.index == other.index
    }
}
