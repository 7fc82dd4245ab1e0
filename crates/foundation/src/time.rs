/// Host-supplied timestamp in seconds.
///
/// The engine never reads a wall clock; the render host passes its own
/// timebase in, which keeps debouncing replayable in tests.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn from_millis(ms: u64) -> Self {
        Time(ms as f64 / 1000.0)
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, clamped at zero.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn add_millis(self, ms: u64) -> Self {
        Time(self.0 + ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn since_clamps_backwards_clocks() {
        assert_eq!(Time(2.0).since(Time(1.5)), 0.5);
        assert_eq!(Time(1.0).since(Time(3.0)), 0.0);
    }

    #[test]
    fn millis_helpers() {
        assert_eq!(Time::from_millis(250), Time(0.25));
        assert_eq!(Time(1.0).add_millis(200), Time(1.2));
    }
}
