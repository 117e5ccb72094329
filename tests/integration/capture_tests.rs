//! Numeric capture driven by scripted button presses.

use slotlogger::app::capture::{CaptureSettings, NumberCapture, capture};
use slotlogger::app::counter::LongPressPolicy;
use slotlogger::app::events::Feedback;
use slotlogger::app::ports::ClockPort;
use slotlogger::config::SystemConfig;

use crate::mock_hw::{ButtonScript, MockBoard};

fn settings() -> CaptureSettings {
    CaptureSettings::from(&SystemConfig::default())
}

/// Poll until a value commits or the clock passes `deadline_ms`.
fn poll_until(board: &mut MockBoard, s: &CaptureSettings, min: u8, max: u8, deadline_ms: u64) -> Option<u8> {
    let mut cap = NumberCapture::begin(board, s, min, max);
    while board.now_ms() < deadline_ms {
        if let Some(n) = cap.poll(board) {
            return Some(n);
        }
        board.delay_ms(s.poll_interval_ms);
    }
    None
}

#[test]
fn five_shorts_and_a_long_commit_five() {
    let mut board = MockBoard::new(ButtonScript::starting_at(50).shorts(5).long());
    assert_eq!(capture(&mut board, &settings(), 4, 8), 5);
    assert_eq!(board.feedback.first(), Some(&Feedback::InputPrompt));
    assert_eq!(board.feedback.last(), Some(&Feedback::Commit(5)));
    assert_eq!(board.count(Feedback::Acknowledge), 6);
}

#[test]
fn value_below_minimum_never_commits() {
    let script = ButtonScript::starting_at(50).shorts(2).long();
    let deadline = script.end_ms() + 5_000;
    let mut board = MockBoard::new(script);

    assert_eq!(poll_until(&mut board, &settings(), 4, 8, deadline), None);
    assert!(board.saw(Feedback::Underflow));
    assert!(!board.feedback.iter().any(|f| matches!(f, Feedback::Commit(_))));
}

#[test]
fn counting_resumes_after_underflow() {
    let mut board = MockBoard::new(ButtonScript::starting_at(50).shorts(2).long().shorts(2).long());
    assert_eq!(capture(&mut board, &settings(), 4, 8), 4);
    assert_eq!(board.count(Feedback::Underflow), 1);
}

#[test]
fn ninth_short_wraps_with_overflow() {
    let mut board = MockBoard::new(ButtonScript::starting_at(50).shorts(9).long());
    assert_eq!(capture(&mut board, &settings(), 1, 8), 1);
    assert_eq!(board.count(Feedback::Overflow), 1);
}

#[test]
fn black_button_starts_the_count_over() {
    let script = ButtonScript::starting_at(50)
        .shorts(3)
        .restart()
        .shorts(2)
        .long();
    let mut board = MockBoard::new(script);
    assert_eq!(capture(&mut board, &settings(), 1, 8), 2);
}

#[test]
fn give_back_policy_discounts_the_committing_press() {
    let s = CaptureSettings {
        policy: LongPressPolicy::GiveBack,
        ..settings()
    };
    let mut board = MockBoard::new(ButtonScript::starting_at(50).shorts(6).long());
    assert_eq!(capture(&mut board, &s, 1, 8), 5);
}

#[test]
fn idle_capture_reminds_the_operator() {
    let s = CaptureSettings {
        reminder_ticks: 100,
        ..settings()
    };
    let script = ButtonScript::starting_at(50).idle(450);
    let deadline = script.end_ms();
    let mut board = MockBoard::new(script);

    assert_eq!(poll_until(&mut board, &s, 1, 8, deadline), None);
    assert_eq!(board.count(Feedback::Reminder), 5);
}

#[test]
fn bounce_shorter_than_window_is_not_a_press() {
    // A 5 ms blip under a 10 ms debounce window.
    let script = ButtonScript::starting_at(50)
        .press(slotlogger::app::ports::ButtonId::Yellow, 5)
        .shorts(1)
        .long();
    let mut board = MockBoard::new(script);
    assert_eq!(capture(&mut board, &settings(), 1, 8), 1);
    assert_eq!(board.count(Feedback::Acknowledge), 2);
}
