//! Time-windowed debouncer for active-low push buttons.
//!
//! The stable level follows the raw level only after the raw level has held
//! unchanged for the whole debounce window, so contact bounce produces no
//! edges and every physical transition produces exactly one.
//!
//! ```text
//!  raw     ‾‾‾|_|‾|_______________|‾|_|‾‾‾‾‾‾‾‾‾
//!  stable  ‾‾‾‾‾‾‾‾‾‾‾‾|_______________________|‾‾‾
//!                      ▲ Fell                  ▲ Rose
//! ```

/// A debounced level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// High → low (button pressed).
    Fell,
    /// Low → high (button released).
    Rose,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    raw_level: bool,
    raw_since_ms: u64,
    stable_level: bool,
    transitioned_at_ms: u64,
    window_ms: u32,
}

impl Debouncer {
    /// Start with both levels at `initial_level` (high for a pulled-up
    /// button at rest).
    pub fn new(initial_level: bool, window_ms: u32) -> Self {
        Self {
            raw_level: initial_level,
            raw_since_ms: 0,
            stable_level: initial_level,
            transitioned_at_ms: 0,
            window_ms,
        }
    }

    /// Feed one raw sample.  Never blocks.
    pub fn update(&mut self, raw_level: bool, now_ms: u64) -> Option<Edge> {
        if raw_level != self.raw_level {
            self.raw_level = raw_level;
            self.raw_since_ms = now_ms;
        }

        let held_ms = now_ms.saturating_sub(self.raw_since_ms);
        if self.raw_level == self.stable_level || held_ms < u64::from(self.window_ms) {
            return None;
        }

        self.stable_level = self.raw_level;
        self.transitioned_at_ms = now_ms;
        Some(if self.stable_level { Edge::Rose } else { Edge::Fell })
    }

    /// Forget any in-flight bounce and adopt `level` as settled.
    pub fn reset(&mut self, level: bool, now_ms: u64) {
        self.raw_level = level;
        self.raw_since_ms = now_ms;
        self.stable_level = level;
        self.transitioned_at_ms = now_ms;
    }

    pub fn stable_level(&self) -> bool {
        self.stable_level
    }

    pub fn raw_level(&self) -> bool {
        self.raw_level
    }

    /// Time of the last reported edge.
    pub fn transitioned_at_ms(&self) -> u64 {
        self.transitioned_at_ms
    }
}
