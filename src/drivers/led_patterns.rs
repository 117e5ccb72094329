//! LED pattern definitions for the three discrete indicator LEDs.
//!
//! Patterns are pure timing data.  The indicator task expands them into
//! frames and drives the LEDs; nothing here touches hardware.
//!
//! | Pattern    | LEDs               | Timing            | Used for            |
//! |------------|--------------------|-------------------|---------------------|
//! | Self-test  | red, yellow, green | 2 × 500 on/500 off | boot                |
//! | Fatal      | red                | N × 200 on/200 off | session abort       |
//! | Steady     | any                | held              | recording indicator |

use crate::error::SessionError;

/// Set of lit LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedMask(u8);

impl LedMask {
    pub const NONE: Self = Self(0);
    pub const RED: Self = Self(0b001);
    pub const YELLOW: Self = Self(0b010);
    pub const GREEN: Self = Self(0b100);
    pub const ALL: Self = Self(0b111);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn red(self) -> bool {
        self.contains(Self::RED)
    }

    pub fn yellow(self) -> bool {
        self.contains(Self::YELLOW)
    }

    pub fn green(self) -> bool {
        self.contains(Self::GREEN)
    }
}

/// Repeated on/off flash of a set of LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    pub leds: LedMask,
    pub reps: u8,
    pub on_ms: u32,
    pub off_ms: u32,
}

impl Flash {
    /// `(mask, hold_ms)` pairs, on then off, `reps` times.
    pub fn frames(self) -> impl Iterator<Item = (LedMask, u32)> {
        (0..self.reps).flat_map(move |_| [(self.leds, self.on_ms), (LedMask::NONE, self.off_ms)])
    }

    pub fn duration_ms(&self) -> u32 {
        u32::from(self.reps) * (self.on_ms + self.off_ms)
    }
}

/// Boot self-test: every LED together, twice.
pub const SELF_TEST: Flash = Flash {
    leds: LedMask::ALL,
    reps: 2,
    on_ms: 500,
    off_ms: 500,
};

const FATAL_ON_MS: u32 = 200;
const FATAL_OFF_MS: u32 = 200;

/// Red flash whose count identifies the failure.
pub fn fatal_flash(kind: SessionError) -> Flash {
    let reps = match kind {
        SessionError::NoSuchNetwork => 1,
        SessionError::BadCredentials => 2,
        SessionError::NoAvailableHostname => 3,
        SessionError::AssociationFailed => 4,
        SessionError::UnsupportedLaneCount(_) => 5,
        SessionError::ServeFailed => 6,
    };
    Flash {
        leds: LedMask::RED,
        reps,
        on_ms: FATAL_ON_MS,
        off_ms: FATAL_OFF_MS,
    }
}
