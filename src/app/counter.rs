//! Bounded press counter.
//!
//! Short presses count up, a long press commits.  The counter never hands
//! out a value outside `[minimum, maximum]`:
//!
//! ```text
//!   Short:  value += 1   ── value > maximum ──▶ value = 1, Overflow
//!   Long:   value' = policy(value)
//!           minimum <= value' <= maximum ──▶ Committed(value')
//!           otherwise                     ──▶ Underflow, keep counting
//! ```

use serde::{Deserialize, Serialize};

use crate::drivers::button::PressKind;

/// What a long press does to the running count before the range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LongPressPolicy {
    /// The long press only commits; the count is taken as is.
    #[default]
    Keep,
    /// The long press itself was counted as a press, so one is given back
    /// before the range check.
    GiveBack,
}

/// Result of feeding one press to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStep {
    /// Short press counted; carries the new value.
    Counted(u8),
    /// Short press pushed the count past the maximum; wrapped to 1.
    Overflow,
    /// Long press on an out-of-range value; counting continues.
    Underflow,
    /// Long press on a valid value.
    Committed(u8),
}

#[derive(Debug, Clone)]
pub struct BoundedCounter {
    value: u8,
    minimum: u8,
    maximum: u8,
    policy: LongPressPolicy,
}

impl BoundedCounter {
    pub fn new(minimum: u8, maximum: u8, policy: LongPressPolicy) -> Self {
        debug_assert!(minimum <= maximum, "empty counter range {minimum}..={maximum}");
        Self {
            value: 0,
            minimum,
            maximum,
            policy,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn minimum(&self) -> u8 {
        self.minimum
    }

    pub fn maximum(&self) -> u8 {
        self.maximum
    }

    /// Back to zero, as if no press had happened.
    pub fn reset(&mut self) {
        self.value = 0;
    }

    pub fn press(&mut self, kind: PressKind) -> CountStep {
        match kind {
            PressKind::Short => self.count(),
            PressKind::Long => self.commit(),
        }
    }

    fn count(&mut self) -> CountStep {
        self.value = self.value.saturating_add(1);
        if self.value > self.maximum {
            self.value = 1;
            CountStep::Overflow
        } else {
            CountStep::Counted(self.value)
        }
    }

    fn commit(&mut self) -> CountStep {
        let candidate = match self.policy {
            LongPressPolicy::Keep => self.value,
            LongPressPolicy::GiveBack => self.value.saturating_sub(1),
        };
        if (self.minimum..=self.maximum).contains(&candidate) {
            self.value = candidate;
            CountStep::Committed(candidate)
        } else {
            CountStep::Underflow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shorts(c: &mut BoundedCounter, n: usize) -> Vec<CountStep> {
        (0..n).map(|_| c.press(PressKind::Short)).collect()
    }

    #[test]
    fn starts_at_zero() {
        let c = BoundedCounter::new(1, 8, LongPressPolicy::Keep);
        assert_eq!(c.value(), 0);
    }

    #[test]
    fn ninth_short_press_wraps_to_one() {
        let mut c = BoundedCounter::new(1, 8, LongPressPolicy::Keep);
        let steps = shorts(&mut c, 9);
        assert_eq!(steps[7], CountStep::Counted(8));
        assert_eq!(steps[8], CountStep::Overflow);
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn long_press_commits_in_range() {
        let mut c = BoundedCounter::new(4, 8, LongPressPolicy::Keep);
        shorts(&mut c, 5);
        assert_eq!(c.press(PressKind::Long), CountStep::Committed(5));
    }

    #[test]
    fn long_press_below_minimum_underflows() {
        let mut c = BoundedCounter::new(4, 8, LongPressPolicy::Keep);
        shorts(&mut c, 2);
        assert_eq!(c.press(PressKind::Long), CountStep::Underflow);
        assert_eq!(c.value(), 2);
        shorts(&mut c, 2);
        assert_eq!(c.press(PressKind::Long), CountStep::Committed(4));
    }

    #[test]
    fn long_press_with_no_count_underflows() {
        let mut c = BoundedCounter::new(1, 8, LongPressPolicy::Keep);
        assert_eq!(c.press(PressKind::Long), CountStep::Underflow);
    }

    #[test]
    fn give_back_policy_discounts_the_long_press() {
        let mut c = BoundedCounter::new(1, 8, LongPressPolicy::GiveBack);
        shorts(&mut c, 4);
        assert_eq!(c.press(PressKind::Long), CountStep::Committed(3));
    }

    #[test]
    fn give_back_policy_underflows_on_single_press() {
        let mut c = BoundedCounter::new(1, 8, LongPressPolicy::GiveBack);
        shorts(&mut c, 1);
        assert_eq!(c.press(PressKind::Long), CountStep::Underflow);
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut c = BoundedCounter::new(1, 8, LongPressPolicy::Keep);
        shorts(&mut c, 3);
        c.reset();
        assert_eq!(c.value(), 0);
        assert_eq!(c.press(PressKind::Long), CountStep::Underflow);
    }
}
