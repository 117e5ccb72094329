//! Indicator task: plays operator feedback on the LEDs and the piezo.
//!
//! The session never waits on a blink or a beep.  It pushes [`Feedback`]
//! into a bounded `embassy-sync` channel and moves on; a dedicated thread
//! runs an `edge-executor` that pulls each signal off the channel and plays
//! it with `async-io-mini` reactor timers.
//!
//! ```text
//!  ┌──────────────┐  Feedback   ┌──────────────────────────────┐
//!  │ Session loop │────────────▶│ Indicator thread (async)     │
//!  │ (sync)       │  try_send   │  receive ─▶ cue ─▶ frames ─▶ │──▶ LEDs / piezo
//!  └──────────────┘             └──────────────────────────────┘
//! ```
//!
//! Signals queue behind one another; when the queue is full new signals
//! are dropped with a warning.

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use super::led_patterns::{self, Flash, LedMask};
use super::status_led::{IndicatorOutput, StatusPanel};
use super::tones::{self, Tune};
use crate::app::events::Feedback;
use crate::app::ports::FeedbackPort;

const FEEDBACK_DEPTH: usize = 16;

/// Session → indicator task.
pub static FEEDBACK_CHANNEL: Channel<CriticalSectionRawMutex, Feedback, FEEDBACK_DEPTH> =
    Channel::new();

/// One step of a cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// LEDs to show; `None` shows the resting state.
    pub leds: Option<LedMask>,
    /// Piezo frequency, `0` for silence.
    pub hz: u32,
    pub ms: u32,
}

fn flash_frames(flash: Flash) -> impl Iterator<Item = Frame> {
    flash.frames().map(|(leds, ms)| Frame {
        leds: Some(leds),
        hz: 0,
        ms,
    })
}

/// Tune frames; `lit` is shown while a note sounds, rests show the
/// resting state.
fn tune_frames(tune: Tune, lit: Option<LedMask>) -> impl Iterator<Item = Frame> {
    tune.notes().into_iter().map(move |n| Frame {
        leds: if n.hz == tones::REST { None } else { lit },
        hz: n.hz,
        ms: n.ms,
    })
}

/// What a piece of feedback looks and sounds like.
pub fn cue(feedback: Feedback) -> Vec<Frame> {
    match feedback {
        Feedback::StartUp => flash_frames(led_patterns::SELF_TEST)
            .chain(tune_frames(tones::START_UP, None))
            .collect(),
        Feedback::Acknowledge | Feedback::Recording(_) => tune_frames(tones::INPUT, None).collect(),
        Feedback::Overflow => tune_frames(tones::LO_HI, Some(LedMask::YELLOW)).collect(),
        Feedback::Underflow => tune_frames(tones::HI_LO, Some(LedMask::RED)).collect(),
        Feedback::Commit(n) => (0..n)
            .flat_map(|_| tune_frames(tones::FEEDBACK, Some(LedMask::YELLOW)))
            .collect(),
        Feedback::Reminder => tune_frames(tones::REMINDER, None).collect(),
        Feedback::InputPrompt => tune_frames(tones::INPUT_PROMPT, None).collect(),
        Feedback::Reboot => tune_frames(tones::REBOOT, Some(LedMask::RED)).collect(),
        Feedback::Fatal(kind) => flash_frames(led_patterns::fatal_flash(kind))
            .chain(tune_frames(tones::HI_LO, Some(LedMask::RED)))
            .collect(),
    }
}

/// Plays cues on an output, remembering the resting LED state between
/// them (green while recording).
pub struct Indicator<O: IndicatorOutput> {
    out: O,
    resting: LedMask,
}

impl<O: IndicatorOutput> Indicator<O> {
    pub fn new(out: O) -> Self {
        Self {
            out,
            resting: LedMask::NONE,
        }
    }

    pub fn output(&self) -> &O {
        &self.out
    }

    pub async fn play(&mut self, feedback: Feedback) {
        if let Feedback::Recording(on) = feedback {
            self.resting = if on { LedMask::GREEN } else { LedMask::NONE };
        }
        for frame in cue(feedback) {
            self.out.set_leds(frame.leds.unwrap_or(self.resting));
            self.out.tone(frame.hz);
            async_io_mini::Timer::after(Duration::from_millis(u64::from(frame.ms))).await;
        }
        self.out.tone(0);
        self.out.set_leds(self.resting);
    }
}

// ── Session-side handle ──────────────────────────────────────

/// [`FeedbackPort`] that queues onto the indicator task.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackQueue;

impl FeedbackPort for FeedbackQueue {
    fn signal(&mut self, feedback: Feedback) {
        if FEEDBACK_CHANNEL.try_send(feedback).is_err() {
            warn!("indicator: queue full, dropping {:?}", feedback);
        }
    }
}

// ── Task ─────────────────────────────────────────────────────

async fn indicator_loop(mut indicator: Indicator<StatusPanel>) {
    loop {
        let feedback = FEEDBACK_CHANNEL.receive().await;
        indicator.play(feedback).await;
    }
}

fn run_indicator(panel: StatusPanel) {
    let executor: edge_executor::LocalExecutor<'_, 2> = edge_executor::LocalExecutor::new();
    executor.spawn(indicator_loop(Indicator::new(panel))).detach();

    info!("indicator task started");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

/// Spawn the indicator thread on the application core.
pub fn spawn(mut panel: StatusPanel) -> std::io::Result<std::thread::JoinHandle<()>> {
    panel.off();
    super::task_pin::spawn_on_core(super::task_pin::Core::App, 4, 8, "indicator\0", move || {
        run_indicator(panel)
    })
}
