use std::collections::BTreeMap;

/// Deterministic named counters.
///
/// Counters must not depend on wall-clock time or unordered iteration, so
/// they live in a sorted map and snapshots have stable ordering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counters {
    counters: BTreeMap<&'static str, u64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc(&mut self, name: &'static str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    /// Stable, sorted snapshot suitable for logs and debug overlays.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counters.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Counters;

    #[test]
    fn counters_accumulate() {
        let mut c = Counters::new();
        c.inc("a");
        c.add("a", 2);
        assert_eq!(c.get("a"), 3);
        assert_eq!(c.get("missing"), 0);
    }

    #[test]
    fn snapshot_is_stably_sorted() {
        let mut c = Counters::new();
        c.inc("b");
        c.inc("a");
        assert_eq!(c.snapshot(), vec![("a", 1), ("b", 1)]);
        c.clear();
        assert!(c.snapshot().is_empty());
    }
}
