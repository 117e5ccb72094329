//! Mock adapters for integration tests.
//!
//! A scripted board whose clock only moves when the code under test waits,
//! a fake network, and recording stream/log/store adapters.  Stream and log
//! state sit behind `Rc<RefCell<..>>` so tests can inspect them after the
//! session has consumed the adapters.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::rc::Rc;

use slotlogger::app::events::Feedback;
use slotlogger::app::ports::{
    ButtonId, ClockPort, EventStreamPort, FeedbackPort, InputPort, NetworkPort, Platform,
    RecordLogPort, SensorPort, StoragePort, StreamError, SubscriptionHandle,
};
use slotlogger::error::{NetworkError, StorageError};
use slotlogger::sensors::Channel;

// ── Button script ─────────────────────────────────────────────

pub const SHORT_HOLD_MS: u64 = 100;
pub const LONG_HOLD_MS: u64 = 800;
pub const GAP_MS: u64 = 100;

/// Press windows laid out on the board clock.
#[derive(Debug, Clone)]
pub struct ButtonScript {
    presses: Vec<(ButtonId, u64, u64)>,
    cursor_ms: u64,
}

#[allow(dead_code)]
impl ButtonScript {
    /// Presses start at `start_ms`.
    pub fn starting_at(start_ms: u64) -> Self {
        Self {
            presses: Vec::new(),
            cursor_ms: start_ms,
        }
    }

    pub fn press(mut self, button: ButtonId, hold_ms: u64) -> Self {
        self.presses.push((button, self.cursor_ms, self.cursor_ms + hold_ms));
        self.cursor_ms += hold_ms + GAP_MS;
        self
    }

    pub fn shorts(mut self, n: usize) -> Self {
        for _ in 0..n {
            self = self.press(ButtonId::Yellow, SHORT_HOLD_MS);
        }
        self
    }

    pub fn long(self) -> Self {
        self.press(ButtonId::Yellow, LONG_HOLD_MS)
    }

    pub fn restart(self) -> Self {
        self.press(ButtonId::Black, SHORT_HOLD_MS)
    }

    /// Leave the buttons alone for `ms`.
    pub fn idle(mut self, ms: u64) -> Self {
        self.cursor_ms += ms;
        self
    }

    /// Clock time after the last scripted press.
    pub fn end_ms(&self) -> u64 {
        self.cursor_ms
    }

    fn is_down(&self, button: ButtonId, now_ms: u64) -> bool {
        self.presses
            .iter()
            .any(|&(b, from, to)| b == button && (from..to).contains(&now_ms))
    }
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub now_ms: u64,
    pub script: ButtonScript,
    pub feedback: Vec<Feedback>,
    pub raw: [u16; 3],
    /// Serve loop returns once the clock reaches this.
    pub stop_at_ms: u64,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new(script: ButtonScript) -> Self {
        let stop_at_ms = script.end_ms() + 1_000;
        Self {
            now_ms: 0,
            script,
            feedback: Vec::new(),
            raw: [2048, 1024, 2048],
            stop_at_ms,
        }
    }

    pub fn count(&self, wanted: Feedback) -> usize {
        self.feedback.iter().filter(|&&f| f == wanted).count()
    }

    pub fn saw(&self, wanted: Feedback) -> bool {
        self.count(wanted) > 0
    }
}

impl SensorPort for MockBoard {
    fn read_raw(&mut self, channel: Channel) -> u16 {
        self.raw[channel as usize]
    }
}

impl InputPort for MockBoard {
    fn level(&mut self, button: ButtonId) -> bool {
        !self.script.is_down(button, self.now_ms)
    }
}

impl FeedbackPort for MockBoard {
    fn signal(&mut self, feedback: Feedback) {
        self.feedback.push(feedback);
    }
}

impl ClockPort for MockBoard {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn now_ns(&self) -> u64 {
        self.now_ms * 1_000_000
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
    }

    fn shutdown_requested(&self) -> bool {
        self.now_ms >= self.stop_at_ms
    }
}

// ── MockNet ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetCall {
    Scan(String),
    Associate { ssid: String, hostname: String },
    Disconnect,
    Resolve(String),
    SetHostname(String),
    Advertise(String),
}

pub const OWN_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 20);
pub const OTHER_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 30);

pub struct MockNet {
    pub networks: Vec<(String, String)>,
    pub hosts: HashMap<String, Ipv4Addr>,
    pub failing_probes: Vec<String>,
    pub calls: Vec<NetCall>,
    hostname: String,
    associated: bool,
}

#[allow(dead_code)]
impl MockNet {
    pub fn new() -> Self {
        Self {
            networks: Vec::new(),
            hosts: HashMap::new(),
            failing_probes: Vec::new(),
            calls: Vec::new(),
            hostname: String::new(),
            associated: false,
        }
    }

    pub fn with_network(mut self, ssid: &str, password: &str) -> Self {
        self.networks.push((ssid.into(), password.into()));
        self
    }

    pub fn with_host(mut self, name: &str, ip: Ipv4Addr) -> Self {
        self.hosts.insert(name.into(), ip);
        self
    }

    pub fn resolves(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                NetCall::Resolve(n) => Some(n.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_association(&self) -> Option<&NetCall> {
        self.calls
            .iter()
            .rev()
            .find(|c| matches!(c, NetCall::Associate { .. }))
    }
}

impl NetworkPort for MockNet {
    fn scan(&mut self, ssid: &str) -> Result<bool, NetworkError> {
        self.calls.push(NetCall::Scan(ssid.into()));
        Ok(self.networks.iter().any(|(s, _)| s == ssid))
    }

    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        self.calls.push(NetCall::Associate {
            ssid: ssid.into(),
            hostname: self.hostname.clone(),
        });
        match self.networks.iter().find(|(s, _)| s == ssid) {
            Some((_, p)) if p == password => {
                self.associated = true;
                Ok(())
            }
            Some(_) => Err(NetworkError::AuthFailed),
            None => Err(NetworkError::ConnectFailed),
        }
    }

    fn disconnect(&mut self) {
        self.calls.push(NetCall::Disconnect);
        self.associated = false;
    }

    fn resolve(&mut self, hostname: &str) -> Result<Option<Ipv4Addr>, NetworkError> {
        self.calls.push(NetCall::Resolve(hostname.into()));
        if self.failing_probes.iter().any(|n| n == hostname) {
            return Err(NetworkError::ResolveFailed);
        }
        Ok(self.hosts.get(hostname).copied())
    }

    fn set_hostname(&mut self, name: &str) -> Result<(), NetworkError> {
        self.calls.push(NetCall::SetHostname(name.into()));
        self.hostname = name.into();
        Ok(())
    }

    fn current_ip(&self) -> Option<Ipv4Addr> {
        self.associated.then_some(OWN_IP)
    }

    fn advertise(&mut self, hostname: &str) -> Result<(), NetworkError> {
        self.calls.push(NetCall::Advertise(hostname.into()));
        Ok(())
    }
}

// ── MockStream ────────────────────────────────────────────────

#[derive(Default)]
pub struct StreamState {
    pub started: bool,
    pub identity: String,
    pub fail_start: bool,
    pub waiting: Vec<SubscriptionHandle>,
    pub closed: Vec<SubscriptionHandle>,
    pub sent: Vec<(SubscriptionHandle, String)>,
}

#[derive(Clone, Default)]
pub struct MockStream(pub Rc<RefCell<StreamState>>);

impl EventStreamPort for MockStream {
    fn start(&mut self, identity: &str) -> Result<(), StreamError> {
        let mut s = self.0.borrow_mut();
        if s.fail_start {
            return Err(StreamError::Io);
        }
        s.started = true;
        s.identity = identity.into();
        Ok(())
    }

    fn accept(&mut self) -> Option<SubscriptionHandle> {
        let mut s = self.0.borrow_mut();
        if s.waiting.is_empty() {
            None
        } else {
            Some(s.waiting.remove(0))
        }
    }

    fn close(&mut self, handle: SubscriptionHandle) {
        self.0.borrow_mut().closed.push(handle);
    }

    fn send(&mut self, handle: SubscriptionHandle, data: &str) -> Result<(), StreamError> {
        let mut s = self.0.borrow_mut();
        if s.closed.contains(&handle) {
            return Err(StreamError::Disconnected);
        }
        s.sent.push((handle, data.into()));
        Ok(())
    }
}

// ── MockLog ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogState {
    pub opens: usize,
    pub closes: usize,
    pub lines: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockLog(pub Rc<RefCell<LogState>>);

impl RecordLogPort for MockLog {
    fn open(&mut self) -> Result<(), StorageError> {
        self.0.borrow_mut().opens += 1;
        Ok(())
    }

    fn append(&mut self, line: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().lines.push(line.into());
        Ok(())
    }

    fn close(&mut self) {
        self.0.borrow_mut().closes += 1;
    }
}

// ── MemStore ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStore {
    map: HashMap<(String, String), Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .map
            .get(&(namespace.into(), key.into()))
            .ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.map.insert((namespace.into(), key.into()), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.map.remove(&(namespace.into(), key.into()));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.map.contains_key(&(namespace.into(), key.into()))
    }
}

// ── Platform binding ──────────────────────────────────────────

pub struct MockPlatform;

impl Platform for MockPlatform {
    type Board = MockBoard;
    type Net = MockNet;
    type Stream = MockStream;
    type Store = MemStore;
    type Log = MockLog;
}
