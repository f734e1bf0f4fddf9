//! Time-windowed memoization
//!
//! Values are stored under `floor(unix_seconds / window)`. A lookup in the
//! same window returns the stored value; once the clock moves into the next
//! window the value is stale and must be recomputed. A small number of
//! windows is retained in least-recently-used order.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// The real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Cache of one value per time window
#[derive(Debug)]
pub struct TimeWindowCache<V> {
    window_secs: u64,
    capacity: usize,
    /// Most recently used at the back
    entries: VecDeque<(u64, V)>,
}

impl<V: Clone> TimeWindowCache<V> {
    /// Create a cache with the given window length and retention bound
    ///
    /// Windows shorter than a second are rounded up to one second and the
    /// capacity is at least one.
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window_secs: window.as_secs().max(1),
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Window index for a point in time
    pub fn window_key(&self, at: SystemTime) -> u64 {
        // Clocks before the epoch all land in window 0.
        let secs = at.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        secs / self.window_secs
    }

    /// Value cached for the window containing `at`, marking it recently used
    pub fn get(&mut self, at: SystemTime) -> Option<V> {
        let key = self.window_key(at);
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        let entry = self.entries.remove(pos)?;
        let value = entry.1.clone();
        self.entries.push_back(entry);
        Some(value)
    }

    /// Store `value` for the window containing `at`
    ///
    /// Replaces any value already stored for that window, drops windows older
    /// than it and evicts the least recently used entries beyond capacity.
    pub fn insert(&mut self, at: SystemTime, value: V) {
        let key = self.window_key(at);
        self.entries.retain(|(k, _)| *k > key);
        self.entries.push_back((key, value));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
