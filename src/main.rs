//! Slot-car logger firmware: main entry point.
//!
//! Hexagonal architecture with a one-shot bring-up sequence.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter      WifiAdapter      SseServer               │
//! │  (Sensor+Input+       (Network,        (EventStream)           │
//! │   Feedback+Clock)      mDNS)                                   │
//! │  NvsAdapter           FileRecordLog                            │
//! │  (Config+Storage)     (RecordLog)                              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Session (pure logic)                      │    │
//! │  │  SelfTest · Calibrate · Associate · Capture · Serve    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Indicator task (core 1) ◀── FEEDBACK_CHANNEL                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any way out of the session ends in a cold restart, so every boot
//! starts again from the self-test.
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use slotlogger::adapters::event_stream::{DEFAULT_PORT, SseServer};
use slotlogger::adapters::hardware::HardwareAdapter;
use slotlogger::adapters::nvs::NvsAdapter;
use slotlogger::adapters::record_log::{self, FileRecordLog, LOG_MOUNT};
use slotlogger::adapters::time::MonotonicClock;
use slotlogger::adapters::wifi::WifiAdapter;
use slotlogger::app::ports::{ConfigPort, Platform};
use slotlogger::config::SystemConfig;
use slotlogger::drivers::hw_init;
use slotlogger::drivers::indicator::{self, FeedbackQueue};
use slotlogger::drivers::status_led::StatusPanel;
use slotlogger::sensors::SensorHub;
use slotlogger::session::context::SessionContext;
use slotlogger::session::{or_restart, restart_after, run_session};

// ── Platform binding ──────────────────────────────────────────

struct Firmware;

impl Platform for Firmware {
    type Board = HardwareAdapter;
    type Net = WifiAdapter;
    type Stream = SseServer;
    type Store = NvsAdapter;
    type Log = FileRecordLog;
}

/// Take the modem and bring up the blocking WiFi driver.
fn wifi_driver() -> Result<BlockingWifi<EspWifi<'static>>> {
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?,
        sysloop,
    )?;
    Ok(wifi)
}

// ── Main ──────────────────────────────────────────────────────

/// Never returns: every failure path ends in a cold restart.
fn main() {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();

    let mut board = HardwareAdapter::new(SensorHub::new(), FeedbackQueue, MonotonicClock::new());
    let fallback_delay = SystemConfig::default().restart_delay_ms;

    or_restart(esp_idf_logger::init(), "logger init", &mut board, fallback_delay, hw_init::restart);

    info!("╔══════════════════════════════════════╗");
    info!("║  Slot Logger v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals + indicator task ───────────────────────
    or_restart(hw_init::init_peripherals(), "HAL init", &mut board, fallback_delay, hw_init::restart);
    let _indicator = or_restart(
        indicator::spawn(StatusPanel::new()),
        "indicator task spawn",
        &mut board,
        fallback_delay,
        hw_init::restart,
    );

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let store = or_restart(NvsAdapter::new(), "NVS init", &mut board, fallback_delay, hw_init::restart);
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    let restart_delay = config.restart_delay_ms;

    if let Err(e) = record_log::mount() {
        warn!("record log unavailable ({}), recording will be refused", e);
    }

    // ── 4. WiFi driver ────────────────────────────────────────
    let wifi = or_restart(wifi_driver(), "WiFi driver init", &mut board, restart_delay, hw_init::restart);

    // ── 5. Session ────────────────────────────────────────────
    let mut ctx = SessionContext::<Firmware>::new(
        board,
        WifiAdapter::new(wifi),
        store,
        SseServer::new(DEFAULT_PORT),
        FileRecordLog::new(LOG_MOUNT, config.record_log_max_bytes),
        config,
    );

    match run_session(&mut ctx) {
        Ok(()) => info!("session ended"),
        Err(e) => error!("session aborted: {}", e),
    }
    restart_after(&mut ctx.board, restart_delay, hw_init::restart)
}
