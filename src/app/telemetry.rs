//! Live telemetry: the event feed, the record log and the serve loop.
//!
//! ```text
//!   SensorPort ─▶ sample ─▶ TelemetryRecord ─┬─▶ TelemetryFeed ─▶ EventStreamPort
//!                                            └─▶ Recorder      ─▶ RecordLogPort
//!   yellow Fell ─▶ mark()      black Rose ─▶ toggle recording
//! ```
//!
//! Records go out as one CSV line per event:
//! `timestamp_ns,track_voltage,controller_voltage,controller_current,mark`.

use core::fmt;

use log::{debug, info, warn};

use crate::app::events::Feedback;
use crate::app::ports::{
    Board, ButtonId, EventStreamPort, RecordLogPort, StreamError, SubscriptionHandle,
};
use crate::drivers::debounce::{Debouncer, Edge};
use crate::error::{SessionError, StorageError};
use crate::sensors::calibration::CurrentCalibration;
use crate::sensors::{self, Reading};

/// One published sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub timestamp_ns: u64,
    pub track_volts: f32,
    pub controller_volts: f32,
    pub controller_amps: f32,
    pub mark: bool,
}

impl TelemetryRecord {
    pub fn new(timestamp_ns: u64, reading: &Reading, mark: bool) -> Self {
        Self {
            timestamp_ns,
            track_volts: reading.track_volts,
            controller_volts: reading.controller_volts,
            controller_amps: reading.controller_amps,
            mark,
        }
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{:.3},{:.3},{:.3},{}",
            self.timestamp_ns,
            self.track_volts,
            self.controller_volts,
            self.controller_amps,
            u8::from(self.mark)
        )
    }
}

// ── Event feed ───────────────────────────────────────────────

/// Single-subscriber feed over an [`EventStreamPort`].
pub struct TelemetryFeed<S: EventStreamPort> {
    stream: S,
    subscriber: Option<SubscriptionHandle>,
    mark_pending: bool,
}

impl<S: EventStreamPort> TelemetryFeed<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            subscriber: None,
            mark_pending: false,
        }
    }

    pub fn start(&mut self, identity: &str) -> Result<(), StreamError> {
        self.stream.start(identity)
    }

    /// Pick up a waiting subscriber, replacing the current one.  Returns
    /// `true` when the subscriber changed.
    pub fn subscribe(&mut self) -> bool {
        let Some(handle) = self.stream.accept() else {
            return false;
        };
        if let Some(old) = self.subscriber.replace(handle) {
            info!("telemetry: subscriber {:?} replaced by {:?}", old, handle);
            self.stream.close(old);
        } else {
            info!("telemetry: subscriber {:?} connected", handle);
        }
        true
    }

    /// Flag the next published record.
    pub fn mark(&mut self) {
        self.mark_pending = true;
    }

    pub fn mark_pending(&self) -> bool {
        self.mark_pending
    }

    pub fn subscriber(&self) -> Option<SubscriptionHandle> {
        self.subscriber
    }

    /// Build a record from `reading`, consuming any pending mark, and push
    /// it to the subscriber.  Send failures never reach the caller.
    pub fn publish(&mut self, timestamp_ns: u64, reading: &Reading) -> TelemetryRecord {
        let record = TelemetryRecord::new(timestamp_ns, reading, core::mem::take(&mut self.mark_pending));

        if let Some(handle) = self.subscriber {
            match self.stream.send(handle, &record.to_string()) {
                Ok(()) => {}
                Err(StreamError::Disconnected) => {
                    info!("telemetry: subscriber {:?} went away", handle);
                    self.stream.close(handle);
                    self.subscriber = None;
                }
                Err(e) => debug!("telemetry: send failed: {}", e),
            }
        }
        record
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }
}

// ── Record log ───────────────────────────────────────────────

/// Recording on/off state over a [`RecordLogPort`].  Once the log reports
/// full, no further writes are attempted.
pub struct Recorder<L: RecordLogPort> {
    log: L,
    recording: bool,
    prevent_write: bool,
}

impl<L: RecordLogPort> Recorder<L> {
    pub fn new(log: L) -> Self {
        Self {
            log,
            recording: false,
            prevent_write: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_full(&self) -> bool {
        self.prevent_write
    }

    /// Flip recording and return the new state.
    pub fn toggle(&mut self) -> bool {
        if self.recording {
            self.log.close();
            self.recording = false;
            info!("recorder: stopped");
        } else if self.prevent_write {
            warn!("recorder: log is full, not starting");
        } else {
            match self.log.open() {
                Ok(()) => {
                    self.recording = true;
                    info!("recorder: started");
                }
                Err(StorageError::Full) => {
                    warn!("recorder: no room for a new log");
                    self.prevent_write = true;
                }
                Err(e) => warn!("recorder: open failed: {}", e),
            }
        }
        self.recording
    }

    pub fn record(&mut self, record: &TelemetryRecord) {
        if !self.recording || self.prevent_write {
            return;
        }
        match self.log.append(&record.to_string()) {
            Ok(()) => {}
            Err(StorageError::Full) => {
                warn!("recorder: log full, further records dropped");
                self.prevent_write = true;
            }
            Err(e) => warn!("recorder: append failed: {}", e),
        }
    }

    pub fn log(&self) -> &L {
        &self.log
    }
}

// ── Serve loop ───────────────────────────────────────────────

/// Polls the buttons, accepts subscribers and publishes on schedule.
pub struct ServeLoop<S: EventStreamPort, L: RecordLogPort> {
    feed: TelemetryFeed<S>,
    recorder: Recorder<L>,
    calibration: CurrentCalibration,
    interval_ms: u64,
    next_due_ms: u64,
    yellow: Debouncer,
    black: Debouncer,
}

impl<S: EventStreamPort, L: RecordLogPort> ServeLoop<S, L> {
    pub fn new(
        stream: S,
        log: L,
        calibration: CurrentCalibration,
        interval_ms: u32,
        debounce_ms: u32,
    ) -> Self {
        Self {
            feed: TelemetryFeed::new(stream),
            recorder: Recorder::new(log),
            calibration,
            interval_ms: u64::from(interval_ms.max(1)),
            next_due_ms: 0,
            yellow: Debouncer::new(true, debounce_ms),
            black: Debouncer::new(true, debounce_ms),
        }
    }

    /// One poll.  Returns the record when one was published.
    pub fn tick<B: Board + ?Sized>(&mut self, board: &mut B) -> Option<TelemetryRecord> {
        let now = board.now_ms();

        if self.yellow.update(board.level(ButtonId::Yellow), now) == Some(Edge::Fell) {
            debug!("serve: mark");
            self.feed.mark();
        }
        if self.black.update(board.level(ButtonId::Black), now) == Some(Edge::Rose) {
            let on = self.recorder.toggle();
            board.signal(Feedback::Recording(on));
        }

        self.feed.subscribe();

        if now < self.next_due_ms {
            return None;
        }
        self.next_due_ms = (self.next_due_ms + self.interval_ms).max(now + 1);

        let reading = sensors::sample(board, &self.calibration);
        let record = self.feed.publish(board.now_ns(), &reading);
        self.recorder.record(&record);
        Some(record)
    }

    /// Serve until the board asks to stop.
    pub fn run<B: Board + ?Sized>(&mut self, board: &mut B, identity: &str) -> Result<(), SessionError> {
        self.feed.start(identity).map_err(|e| {
            warn!("serve: event stream failed to start: {}", e);
            SessionError::ServeFailed
        })?;

        let now = board.now_ms();
        self.yellow.reset(board.level(ButtonId::Yellow), now);
        self.black.reset(board.level(ButtonId::Black), now);
        self.next_due_ms = now;
        info!("serve: publishing every {} ms", self.interval_ms);

        while !board.shutdown_requested() {
            self.tick(board);
            board.delay_ms(1);
        }

        if self.recorder.is_recording() {
            self.recorder.toggle();
        }
        info!("serve: stopped");
        Ok(())
    }

    pub fn feed(&self) -> &TelemetryFeed<S> {
        &self.feed
    }

    pub fn recorder(&self) -> &Recorder<L> {
        &self.recorder
    }
}
