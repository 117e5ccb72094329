//! Press-duration classifier for a debounced button.
//!
//! Consumes the edges produced by [`Debouncer`](super::debounce::Debouncer)
//! and turns each press/release pair into a short or long press.
//!
//! ## Gesture detection
//!
//! | Input           | Condition                         | Event              |
//! |-----------------|-----------------------------------|--------------------|
//! | `Fell`          | always                            | `Pressed`          |
//! | `Rose`          | held `<= short_press_ms`          | `Released(Short)`  |
//! | `Rose`          | held `> short_press_ms`           | `Released(Long)`   |
//! | `Rose`          | no press pending                  | (ignored)          |
//! | no edge         | every `reminder_ticks` idle polls | `Reminder`         |
//!
//! Classification happens on release only; holding the button never emits
//! anything beyond the initial `Pressed`.

use super::debounce::Edge;

/// Outcome of a completed press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Short,
    Long,
}

/// A classified press, emitted on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    pub started_at_ms: u64,
    pub duration_ms: u64,
    pub kind: PressKind,
}

/// Button events emitted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// The button went down; the operator should hear an acknowledgement.
    Pressed,
    /// The button came back up after a classified press.
    Released(PressEvent),
    /// Nothing has happened for a while.
    Reminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle { idle_ticks: u32 },
    Pressed { since_ms: u64 },
}

pub struct PressClassifier {
    state: GestureState,
    short_press_ms: u32,
    reminder_ticks: u32,
}

impl PressClassifier {
    pub fn new(short_press_ms: u32, reminder_ticks: u32) -> Self {
        Self {
            state: GestureState::Idle { idle_ticks: 0 },
            short_press_ms,
            reminder_ticks,
        }
    }

    /// Call once per poll with the debouncer's output for this tick.
    pub fn tick(&mut self, edge: Option<Edge>, now_ms: u64) -> Option<ButtonEvent> {
        match (self.state, edge) {
            (_, Some(Edge::Fell)) => {
                self.state = GestureState::Pressed { since_ms: now_ms };
                Some(ButtonEvent::Pressed)
            }

            (GestureState::Pressed { since_ms }, Some(Edge::Rose)) => {
                self.state = GestureState::Idle { idle_ticks: 0 };
                let duration_ms = now_ms.saturating_sub(since_ms);
                let kind = if duration_ms <= u64::from(self.short_press_ms) {
                    PressKind::Short
                } else {
                    PressKind::Long
                };
                log::debug!("button: {:?} press ({} ms)", kind, duration_ms);
                Some(ButtonEvent::Released(PressEvent {
                    started_at_ms: since_ms,
                    duration_ms,
                    kind,
                }))
            }

            (GestureState::Idle { .. }, Some(Edge::Rose)) => {
                log::debug!("button: release without press ignored");
                None
            }

            (GestureState::Idle { idle_ticks }, None) => {
                let idle_ticks = idle_ticks + 1;
                if idle_ticks >= self.reminder_ticks {
                    self.state = GestureState::Idle { idle_ticks: 0 };
                    Some(ButtonEvent::Reminder)
                } else {
                    self.state = GestureState::Idle { idle_ticks };
                    None
                }
            }

            (GestureState::Pressed { .. }, None) => None,
        }
    }

    /// Whether a press is in progress.
    pub fn is_pressed(&self) -> bool {
        matches!(self.state, GestureState::Pressed { .. })
    }
}
