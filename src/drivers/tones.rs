//! Piezo tunes.
//!
//! A melody is a tempo plus a list of quarter notes (a frequency of `0` is
//! a rest); a quarter lasts `60_000 / bpm` ms.  A sweep steps the frequency
//! from one pitch to another at a fixed interval.

/// One sounded (or silent) step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Frequency in Hz, `0` for silence.
    pub hz: u32,
    pub ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tune {
    Melody {
        bpm: u32,
        notes: &'static [u32],
        repeat: u8,
    },
    Sweep {
        from_hz: u32,
        to_hz: u32,
        step_hz: u32,
        every_ms: u32,
    },
}

pub const REST: u32 = 0;
const C1: u32 = 33;
const C3: u32 = 131;
const C4: u32 = 262;
const G4: u32 = 392;
const C5: u32 = 523;
const F5: u32 = 698;

/// Falling pair: rejected value.
pub const HI_LO: Tune = Tune::Melody { bpm: 140, notes: &[C4, C1], repeat: 1 };
/// Single blip: button acknowledged.
pub const INPUT: Tune = Tune::Melody { bpm: 160, notes: &[C5], repeat: 1 };
/// One beep of a committed count.
pub const FEEDBACK: Tune = Tune::Melody { bpm: 160, notes: &[G4, REST], repeat: 1 };
/// Rising pair: count wrapped.
pub const LO_HI: Tune = Tune::Melody { bpm: 120, notes: &[C3, C5], repeat: 1 };
/// Idle nudge during a capture.
pub const REMINDER: Tune = Tune::Melody { bpm: 120, notes: &[F5, REST], repeat: 3 };
/// A capture is waiting for input.
pub const INPUT_PROMPT: Tune = Tune::Melody { bpm: 140, notes: &[C3, C5], repeat: 1 };

pub const START_UP: Tune = Tune::Sweep { from_hz: 300, to_hz: 400, step_hz: 10, every_ms: 100 };
pub const REBOOT: Tune = Tune::Sweep { from_hz: 400, to_hz: 300, step_hz: 10, every_ms: 100 };

impl Tune {
    /// Expand into timed steps.
    pub fn notes(&self) -> Vec<Note> {
        match *self {
            Tune::Melody { bpm, notes, repeat } => {
                let quarter = 60_000 / bpm.max(1);
                (0..repeat)
                    .flat_map(|_| notes.iter().map(move |&hz| Note { hz, ms: quarter }))
                    .collect()
            }
            Tune::Sweep {
                from_hz,
                to_hz,
                step_hz,
                every_ms,
            } => {
                let step = step_hz.max(1) as usize;
                let hz: Vec<u32> = if from_hz <= to_hz {
                    (from_hz..=to_hz).step_by(step).collect()
                } else {
                    (to_hz..=from_hz).rev().step_by(step).collect()
                };
                hz.into_iter().map(|hz| Note { hz, ms: every_ms }).collect()
            }
        }
    }

    pub fn duration_ms(&self) -> u32 {
        self.notes().iter().map(|n| n.ms).sum()
    }
}
