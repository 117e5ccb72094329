//! Full bring-up runs against the mock platform.

use std::panic::{self, AssertUnwindSafe};

use slotlogger::app::events::Feedback;
use slotlogger::app::ports::{ClockPort, SubscriptionHandle};
use slotlogger::app::profiles::ProfileBook;
use slotlogger::config::{SystemConfig, hstr};
use slotlogger::error::SessionError;
use slotlogger::session::context::SessionContext;
use slotlogger::session::{or_restart, restart_after, run_session};

use crate::mock_hw::{
    ButtonScript, MemStore, MockBoard, MockLog, MockNet, MockPlatform, MockStream, NetCall,
    OTHER_IP,
};

const SSID: &str = "TrackNet";
const PASSWORD: &str = "password1";

fn config() -> SystemConfig {
    let mut cfg = SystemConfig::default();
    cfg.network.ssid = hstr(SSID);
    cfg.network.password = hstr(PASSWORD);
    cfg
}

/// Lane count then own lane, both committed with a long press.
fn topology_script(lanes: usize, lane: usize) -> ButtonScript {
    ButtonScript::starting_at(1_000)
        .shorts(lanes)
        .long()
        .shorts(lane)
        .long()
}

struct Rig {
    ctx: SessionContext<MockPlatform>,
    stream: MockStream,
    log: MockLog,
}

fn rig(script: ButtonScript, net: MockNet) -> Rig {
    let stream = MockStream::default();
    let log = MockLog::default();
    let ctx = SessionContext::<MockPlatform>::new(
        MockBoard::new(script),
        net,
        MemStore::default(),
        stream.clone(),
        log.clone(),
        config(),
    );
    Rig { ctx, stream, log }
}

fn track_net() -> MockNet {
    MockNet::new().with_network(SSID, PASSWORD)
}

#[test]
fn six_lanes_lane_three_joins_as_green() {
    let mut r = rig(topology_script(6, 3), track_net());
    r.stream.0.borrow_mut().waiting.push(SubscriptionHandle(1));

    assert_eq!(run_session(&mut r.ctx), Ok(()));

    assert_eq!(r.ctx.hostname.as_deref(), Some("logger-green"));
    assert_eq!(
        r.ctx.net.last_association(),
        Some(&NetCall::Associate {
            ssid: SSID.into(),
            hostname: "logger-green".into()
        })
    );
    assert!(r.ctx.net.calls.contains(&NetCall::Advertise("logger-green".into())));

    let topology = r.ctx.topology.expect("topology captured");
    assert_eq!((topology.lane_count(), topology.my_lane()), (6, 3));
    assert_eq!(topology.colour(), "green");

    let fb = &r.ctx.board.feedback;
    assert_eq!(fb.first(), Some(&Feedback::StartUp));
    assert!(r.ctx.board.saw(Feedback::Commit(6)));
    assert!(r.ctx.board.saw(Feedback::Commit(3)));
    assert!(!fb.iter().any(|f| matches!(f, Feedback::Fatal(_))));

    let stream = r.stream.0.borrow();
    assert!(stream.started);
    assert_eq!(stream.identity, "logger-green");
    assert!(stream.sent.len() >= 3);
    for (handle, line) in &stream.sent {
        assert_eq!(*handle, SubscriptionHandle(1));
        assert_eq!(line.split(',').count(), 5);
        assert!(line.ends_with(",0"));
    }
}

#[test]
fn phases_touch_the_network_in_order() {
    let mut r = rig(topology_script(4, 1), track_net());
    run_session(&mut r.ctx).unwrap();

    let calls = &r.ctx.net.calls;
    let scan = calls.iter().position(|c| matches!(c, NetCall::Scan(_))).unwrap();
    let first_assoc = calls
        .iter()
        .position(|c| matches!(c, NetCall::Associate { .. }))
        .unwrap();
    let disconnect = calls.iter().position(|c| *c == NetCall::Disconnect).unwrap();
    let last_assoc = calls
        .iter()
        .rposition(|c| matches!(c, NetCall::Associate { .. }))
        .unwrap();
    assert!(scan < first_assoc && first_assoc < disconnect && disconnect < last_assoc);

    // The temporary association never uses the final name.
    match &calls[first_assoc] {
        NetCall::Associate { hostname, .. } => {
            assert!(hostname.starts_with("logger-"));
            assert_ne!(hostname, "logger-red");
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn topology_is_recorded_as_a_profile() {
    let mut r = rig(topology_script(5, 2), track_net());
    run_session(&mut r.ctx).unwrap();

    assert_eq!(r.ctx.profile_id, Some(1));
    let book = ProfileBook::load(&r.ctx.store).unwrap();
    let active = book.active().expect("active profile");
    assert_eq!((active.lane_count, active.lane), (5, 2));
    assert_eq!(active.colour, "blue");
    assert_eq!(active.track, "home");
}

#[test]
fn missing_network_aborts_before_capture() {
    let mut r = rig(topology_script(6, 3), MockNet::new());

    assert_eq!(run_session(&mut r.ctx), Err(SessionError::NoSuchNetwork));
    assert!(r.ctx.board.saw(Feedback::Fatal(SessionError::NoSuchNetwork)));
    assert!(!r.ctx.board.saw(Feedback::InputPrompt));
    assert!(r.ctx.net.last_association().is_none());
    assert!(r.ctx.topology.is_none());
}

#[test]
fn wrong_password_is_bad_credentials() {
    let net = MockNet::new().with_network(SSID, "different1");
    let mut r = rig(topology_script(6, 3), net);

    assert_eq!(run_session(&mut r.ctx), Err(SessionError::BadCredentials));
    assert!(r.ctx.board.saw(Feedback::Fatal(SessionError::BadCredentials)));
    assert!(!r.ctx.board.saw(Feedback::InputPrompt));
}

#[test]
fn three_lanes_have_no_palette() {
    let mut r = rig(topology_script(3, 1), track_net());

    assert_eq!(
        run_session(&mut r.ctx),
        Err(SessionError::UnsupportedLaneCount(3))
    );
    assert!(r.ctx.board.saw(Feedback::Commit(3)));
    assert!(!r.ctx.net.calls.contains(&NetCall::Disconnect));
    assert!(r.ctx.hostname.is_none());
}

#[test]
fn taken_name_moves_to_the_next_colour() {
    let net = track_net().with_host("logger-green", OTHER_IP);
    let mut r = rig(topology_script(6, 3), net);

    run_session(&mut r.ctx).unwrap();
    assert_eq!(r.ctx.hostname.as_deref(), Some("logger-blue"));
    assert_eq!(r.ctx.net.resolves(), ["logger-green", "logger-blue"]);
}

#[test]
fn exhausted_palette_is_fatal() {
    let palette = ["red", "white", "green", "blue", "yellow", "black"];
    let mut net = track_net();
    for colour in palette {
        net = net.with_host(&format!("logger-{colour}"), OTHER_IP);
    }
    let mut r = rig(topology_script(6, 3), net);

    assert_eq!(
        run_session(&mut r.ctx),
        Err(SessionError::NoAvailableHostname)
    );
    assert_eq!(r.ctx.net.resolves().len(), palette.len());
    assert!(r.ctx.board.saw(Feedback::Fatal(SessionError::NoAvailableHostname)));
    assert!(!r.ctx.net.calls.contains(&NetCall::Disconnect));
}

#[test]
fn stream_start_failure_is_fatal() {
    let mut r = rig(topology_script(4, 2), track_net());
    r.stream.0.borrow_mut().fail_start = true;

    assert_eq!(run_session(&mut r.ctx), Err(SessionError::ServeFailed));
    assert!(r.ctx.board.saw(Feedback::Fatal(SessionError::ServeFailed)));
}

#[test]
fn serve_marks_and_records() {
    let script = topology_script(4, 4)
        .idle(500)
        .restart() // black: recording on
        .idle(500)
        .shorts(1); // yellow: mark
    let mut r = rig(script, track_net());
    r.stream.0.borrow_mut().waiting.push(SubscriptionHandle(7));

    run_session(&mut r.ctx).unwrap();

    assert!(r.ctx.board.saw(Feedback::Recording(true)));
    let stream = r.stream.0.borrow();
    let marked = stream.sent.iter().filter(|(_, l)| l.ends_with(",1")).count();
    assert_eq!(marked, 1);

    let log = r.log.0.borrow();
    assert_eq!(log.opens, 1);
    assert_eq!(log.closes, 1, "recording is closed when serving stops");
    assert!(!log.lines.is_empty());
    assert!(log.lines.iter().all(|l| stream.sent.iter().any(|(_, s)| s == l)));
}

// ── Restart policy ───────────────────────────────────────────

fn halt() -> ! {
    panic!("cold restart");
}

#[test]
fn passing_startup_step_does_not_restart() {
    let mut board = MockBoard::new(ButtonScript::starting_at(0));
    let v = or_restart(Ok::<u8, &str>(7), "driver init", &mut board, 5_000, halt);
    assert_eq!(v, 7);
    assert!(!board.saw(Feedback::Reboot));
    assert_eq!(board.now_ms(), 0);
}

#[test]
fn failed_startup_step_cues_waits_then_restarts() {
    let mut board = MockBoard::new(ButtonScript::starting_at(0));
    let restarted = panic::catch_unwind(AssertUnwindSafe(|| {
        or_restart(Err::<(), _>("no modem"), "driver init", &mut board, 5_000, halt)
    }));

    assert!(restarted.is_err());
    assert_eq!(board.feedback.last(), Some(&Feedback::Reboot));
    assert!(board.now_ms() >= 5_000);
}

#[test]
fn aborted_session_ends_in_restart() {
    let mut r = rig(topology_script(6, 3), MockNet::new());
    assert_eq!(run_session(&mut r.ctx), Err(SessionError::NoSuchNetwork));

    let before = r.ctx.board.now_ms();
    let restarted = panic::catch_unwind(AssertUnwindSafe(|| restart_after(&mut r.ctx.board, 5_000, halt)));

    assert!(restarted.is_err());
    let fb = &r.ctx.board.feedback;
    let fatal = fb.iter().position(|f| *f == Feedback::Fatal(SessionError::NoSuchNetwork));
    let reboot = fb.iter().position(|f| *f == Feedback::Reboot);
    assert!(fatal.is_some() && reboot > fatal);
    assert!(r.ctx.board.now_ms() >= before + 5_000);
}
