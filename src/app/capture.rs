//! Numeric capture from the two operator buttons.
//!
//! The yellow button counts (short press) and commits (long press); the
//! black button starts the count over.  Capture is a cooperative poll loop:
//! each tick samples both buttons, runs them through their debouncers and
//! the press classifier, and turns the result into feedback.
//!
//! ```text
//!   yellow ─▶ Debouncer ─▶ PressClassifier ─▶ BoundedCounter ─▶ Commit(n)
//!   black  ─▶ Debouncer ─────────────── Rose ─▶ reset()
//! ```

use log::{debug, info};

use crate::app::counter::{BoundedCounter, CountStep, LongPressPolicy};
use crate::app::events::Feedback;
use crate::app::ports::{Board, ButtonId};
use crate::config::SystemConfig;
use crate::drivers::button::{ButtonEvent, PressClassifier};
use crate::drivers::debounce::{Debouncer, Edge};

/// Timing knobs for a capture, taken from [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub debounce_ms: u32,
    pub short_press_ms: u32,
    pub reminder_ticks: u32,
    pub policy: LongPressPolicy,
    pub poll_interval_ms: u32,
}

impl From<&SystemConfig> for CaptureSettings {
    fn from(cfg: &SystemConfig) -> Self {
        Self {
            debounce_ms: cfg.debounce_ms,
            short_press_ms: cfg.short_press_ms,
            reminder_ticks: cfg.reminder_ticks,
            policy: cfg.long_press_policy,
            poll_interval_ms: 1,
        }
    }
}

/// One in-progress capture.
pub struct NumberCapture {
    yellow: Debouncer,
    black: Debouncer,
    classifier: PressClassifier,
    counter: BoundedCounter,
}

impl NumberCapture {
    /// Seed the debouncers from the current pin levels and prompt the
    /// operator.
    pub fn begin<B: Board + ?Sized>(
        board: &mut B,
        settings: &CaptureSettings,
        minimum: u8,
        maximum: u8,
    ) -> Self {
        let now = board.now_ms();
        let mut yellow = Debouncer::new(true, settings.debounce_ms);
        yellow.reset(board.level(ButtonId::Yellow), now);
        let mut black = Debouncer::new(true, settings.debounce_ms);
        black.reset(board.level(ButtonId::Black), now);

        info!("capture: waiting for a value in {}..={}", minimum, maximum);
        board.signal(Feedback::InputPrompt);

        Self {
            yellow,
            black,
            classifier: PressClassifier::new(settings.short_press_ms, settings.reminder_ticks),
            counter: BoundedCounter::new(minimum, maximum, settings.policy),
        }
    }

    /// Run one poll tick.  Returns the committed value once there is one.
    pub fn poll<B: Board + ?Sized>(&mut self, board: &mut B) -> Option<u8> {
        let now = board.now_ms();

        let edge = self.yellow.update(board.level(ButtonId::Yellow), now);
        let committed = match self.classifier.tick(edge, now) {
            Some(ButtonEvent::Pressed) => {
                board.signal(Feedback::Acknowledge);
                None
            }
            Some(ButtonEvent::Reminder) => {
                board.signal(Feedback::Reminder);
                None
            }
            Some(ButtonEvent::Released(press)) => self.apply(board, press.kind),
            None => None,
        };
        if committed.is_some() {
            return committed;
        }

        match self.black.update(board.level(ButtonId::Black), now) {
            Some(Edge::Fell) => board.signal(Feedback::Acknowledge),
            Some(Edge::Rose) => {
                info!("capture: restart requested, count cleared");
                self.counter.reset();
            }
            None => {}
        }
        None
    }

    fn apply<B: Board + ?Sized>(
        &mut self,
        board: &mut B,
        kind: crate::drivers::button::PressKind,
    ) -> Option<u8> {
        match self.counter.press(kind) {
            CountStep::Counted(n) => {
                debug!("capture: count {}", n);
                None
            }
            CountStep::Overflow => {
                debug!("capture: count wrapped past {}", self.counter.maximum());
                board.signal(Feedback::Overflow);
                None
            }
            CountStep::Underflow => {
                debug!(
                    "capture: {} is outside {}..={}",
                    self.counter.value(),
                    self.counter.minimum(),
                    self.counter.maximum()
                );
                board.signal(Feedback::Underflow);
                None
            }
            CountStep::Committed(n) => {
                info!("capture: committed {}", n);
                board.signal(Feedback::Commit(n));
                Some(n)
            }
        }
    }

    /// Current running count.
    pub fn value(&self) -> u8 {
        self.counter.value()
    }
}

/// Block cooperatively until the operator commits a value in
/// `[minimum, maximum]`.
pub fn capture<B: Board + ?Sized>(
    board: &mut B,
    settings: &CaptureSettings,
    minimum: u8,
    maximum: u8,
) -> u8 {
    let mut session = NumberCapture::begin(board, settings, minimum, maximum);
    loop {
        if let Some(n) = session.poll(board) {
            return n;
        }
        board.delay_ms(settings.poll_interval_ms);
    }
}
