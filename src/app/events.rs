//! Outbound operator feedback.
//!
//! The session and capture logic emit these through the
//! [`FeedbackPort`](super::ports::FeedbackPort).  Adapters on the other side
//! decide how they look and sound: the firmware hands them to the indicator
//! task, the tests record them.

use crate::error::SessionError;

/// Fire-and-forget signals to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// A button went down.
    Acknowledge,
    /// The count passed the maximum and wrapped to 1.
    Overflow,
    /// A long press tried to commit a value outside the range.
    Underflow,
    /// A value was committed; carries the value.
    Commit(u8),
    /// Boot self-test finished.
    StartUp,
    /// Nothing pressed for a while during a capture.
    Reminder,
    /// A numeric capture is waiting for input.
    InputPrompt,
    /// The device is about to restart.
    Reboot,
    /// The session aborted with the given failure.
    Fatal(SessionError),
    /// Recording to the record log switched on or off.
    Recording(bool),
}
