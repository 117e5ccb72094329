//! Function-pointer phase sequencer.
//!
//! Bring-up is a fixed list of phases that run once each, in table order:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  Phase table                                  │
//! │  ┌────────────────────┬──────────────────────┐│
//! │  │ PhaseId            │ run                  ││
//! │  ├────────────────────┼──────────────────────┤│
//! │  │ SelfTest           │ fn(ctx) -> Result<>  ││
//! │  │ Calibrate          │ fn(ctx) -> Result<>  ││
//! │  │ AssociateTemporary │ fn(ctx) -> Result<>  ││
//! │  │ CaptureTopology    │ fn(ctx) -> Result<>  ││
//! │  │ AssociatePermanent │ fn(ctx) -> Result<>  ││
//! │  │ Serve              │ fn(ctx) -> Result<>  ││
//! │  └────────────────────┴──────────────────────┘│
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The first phase to return an error aborts the sequence; the phases after
//! it never run.  A finished or aborted sequencer never runs a phase again.

pub mod context;
pub mod phases;

use core::fmt;

use log::{error, info};

use crate::app::events::Feedback;
use crate::app::ports::{Board, FeedbackPort, Platform};
use crate::error::SessionError;
use context::SessionContext;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Bring-up phases in execution order.
/// Must stay in sync with the table built in [`phases::phase_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PhaseId {
    SelfTest = 0,
    Calibrate = 1,
    AssociateTemporary = 2,
    CaptureTopology = 3,
    AssociatePermanent = 4,
    Serve = 5,
}

impl PhaseId {
    /// Total number of phases: used to size the table array.
    pub const COUNT: usize = 6;

    pub const fn name(self) -> &'static str {
        match self {
            Self::SelfTest => "SelfTest",
            Self::Calibrate => "Calibrate",
            Self::AssociateTemporary => "AssociateTemporary",
            Self::CaptureTopology => "CaptureTopology",
            Self::AssociatePermanent => "AssociatePermanent",
            Self::Serve => "Serve",
        }
    }
}

// ---------------------------------------------------------------------------
// Phase descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Signature for a phase action.
pub type PhaseFn<C> = fn(&mut C) -> Result<(), SessionError>;

/// Static descriptor for a single phase.
pub struct PhaseDescriptor<C> {
    pub name: &'static str,
    pub run: PhaseFn<C>,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Where a sequencer stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// `next` phases have completed; more remain.
    Pending { next: usize },
    Done,
    Aborted { at: usize, error: SessionError },
}

/// Runs a table of `N` phases against a context of type `C`.
pub struct Sequencer<C, const N: usize> {
    table: [PhaseDescriptor<C>; N],
    state: SequenceState,
}

impl<C, const N: usize> Sequencer<C, N> {
    pub fn new(table: [PhaseDescriptor<C>; N]) -> Self {
        Self {
            table,
            state: if N == 0 {
                SequenceState::Done
            } else {
                SequenceState::Pending { next: 0 }
            },
        }
    }

    /// Run every remaining phase in order.
    pub fn run(&mut self, ctx: &mut C) -> Result<(), SessionError> {
        loop {
            let idx = match self.state {
                SequenceState::Pending { next } => next,
                SequenceState::Done => return Ok(()),
                SequenceState::Aborted { error, .. } => return Err(error),
            };

            let phase = &self.table[idx];
            info!("session: [{}/{}] {} starting", idx + 1, N, phase.name);

            match (phase.run)(ctx) {
                Ok(()) => {
                    info!("session: [{}/{}] {} done", idx + 1, N, phase.name);
                    self.state = if idx + 1 < N {
                        SequenceState::Pending { next: idx + 1 }
                    } else {
                        SequenceState::Done
                    };
                }
                Err(e) => {
                    error!("session: [{}/{}] {} failed: {}", idx + 1, N, phase.name, e);
                    self.state = SequenceState::Aborted { at: idx, error: e };
                }
            }
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }
}

/// Run the full bring-up against `ctx`.  A fatal failure is signalled to the
/// operator before it is returned.
pub fn run_session<P: Platform>(ctx: &mut SessionContext<P>) -> Result<(), SessionError> {
    let mut sequencer = Sequencer::new(phases::phase_table::<P>());
    let result = sequencer.run(ctx);
    if let Err(kind) = result {
        ctx.board.signal(Feedback::Fatal(kind));
    }
    result
}

/// Play the reboot cue, hold for `delay_ms` so it can finish, then hand
/// over to `restart`.
pub fn restart_after<B: Board + ?Sized>(board: &mut B, delay_ms: u32, restart: fn() -> !) -> ! {
    board.signal(Feedback::Reboot);
    info!("restarting in {} ms", delay_ms);
    board.delay_ms(delay_ms);
    restart()
}

/// Unwrap a start-up step, or restart the device when it failed.
pub fn or_restart<T, E: fmt::Display, B: Board + ?Sized>(
    step: Result<T, E>,
    what: &str,
    board: &mut B,
    delay_ms: u32,
    restart: fn() -> !,
) -> T {
    match step {
        Ok(v) => v,
        Err(e) => {
            error!("{} failed: {}", what, e);
            restart_after(board, delay_ms, restart)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace {
        ran: Vec<&'static str>,
    }

    fn a(t: &mut Trace) -> Result<(), SessionError> {
        t.ran.push("a");
        Ok(())
    }

    fn b(t: &mut Trace) -> Result<(), SessionError> {
        t.ran.push("b");
        Ok(())
    }

    fn c(t: &mut Trace) -> Result<(), SessionError> {
        t.ran.push("c");
        Ok(())
    }

    fn fail(t: &mut Trace) -> Result<(), SessionError> {
        t.ran.push("fail");
        Err(SessionError::NoSuchNetwork)
    }

    fn row(name: &'static str, run: PhaseFn<Trace>) -> PhaseDescriptor<Trace> {
        PhaseDescriptor { name, run }
    }

    #[test]
    fn phases_run_in_order_once_each() {
        let mut seq = Sequencer::new([row("a", a), row("b", b), row("c", c)]);
        let mut t = Trace::default();
        assert_eq!(seq.run(&mut t), Ok(()));
        assert_eq!(t.ran, ["a", "b", "c"]);
        assert_eq!(seq.state(), SequenceState::Done);

        assert_eq!(seq.run(&mut t), Ok(()));
        assert_eq!(t.ran.len(), 3);
    }

    #[test]
    fn failure_stops_the_sequence() {
        let mut seq = Sequencer::new([row("a", a), row("fail", fail), row("c", c)]);
        let mut t = Trace::default();
        assert_eq!(seq.run(&mut t), Err(SessionError::NoSuchNetwork));
        assert_eq!(t.ran, ["a", "fail"]);
        assert_eq!(
            seq.state(),
            SequenceState::Aborted {
                at: 1,
                error: SessionError::NoSuchNetwork
            }
        );

        assert_eq!(seq.run(&mut t), Err(SessionError::NoSuchNetwork));
        assert_eq!(t.ran, ["a", "fail"]);
    }

    #[test]
    fn empty_table_is_done() {
        let mut seq: Sequencer<Trace, 0> = Sequencer::new([]);
        assert_eq!(seq.run(&mut Trace::default()), Ok(()));
    }

    #[test]
    fn phase_names_are_distinct() {
        let ids = [
            PhaseId::SelfTest,
            PhaseId::Calibrate,
            PhaseId::AssociateTemporary,
            PhaseId::CaptureTopology,
            PhaseId::AssociatePermanent,
            PhaseId::Serve,
        ];
        assert_eq!(ids.len(), PhaseId::COUNT);
        let names: std::collections::HashSet<_> = ids.iter().map(|p| p.name()).collect();
        assert_eq!(names.len(), PhaseId::COUNT);
        assert_eq!(PhaseId::Serve as usize, PhaseId::COUNT - 1);
    }
}
