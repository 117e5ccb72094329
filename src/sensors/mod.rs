//! Analog front end: the three measured channels and their scaling.
//!
//! Every channel is read as raw ADC counts and converted to physical units
//! at read time:
//!
//! | Channel             | Pin volts → physical                         |
//! |---------------------|----------------------------------------------|
//! | Track voltage       | `v × 17.966 / 3.3` (resistive divider)       |
//! | Controller voltage  | `v × 17.966 / 3.3`                           |
//! | Controller current  | `(v − zero) / 0.025` A (25 mV/A hall sensor) |
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`SensorHub`] reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from static atomics for injection.

pub mod calibration;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use calibration::CurrentCalibration;

use crate::app::ports::SensorPort;

/// ADC counts at the reference voltage (12-bit converter).
pub const ADC_FULL_SCALE: f32 = 4096.0;
/// ADC reference voltage.
pub const ADC_REF_VOLTS: f32 = 3.3;
/// Divider ratio on both voltage channels.
pub const DIVIDER_SCALE: f32 = 17.966 / 3.3;
/// Current sensor sensitivity.
pub const CURRENT_VOLTS_PER_AMP: f32 = 0.025;

/// One of the three measured analog channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    TrackVoltage,
    ControllerVoltage,
    ControllerCurrent,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::TrackVoltage,
        Channel::ControllerVoltage,
        Channel::ControllerCurrent,
    ];

    /// ADC1 channel number wired to this input.
    pub fn adc_channel(self) -> u32 {
        match self {
            Self::TrackVoltage => crate::pins::ADC1_CH_TRACK_VOLTAGE,
            Self::ControllerVoltage => crate::pins::ADC1_CH_CONTROLLER_VOLTAGE,
            Self::ControllerCurrent => crate::pins::ADC1_CH_CONTROLLER_CURRENT,
        }
    }

    #[cfg_attr(target_os = "espidf", allow(dead_code))]
    fn index(self) -> usize {
        self as usize
    }
}

/// Pin voltage for a raw ADC reading, clamped to the reference.
pub fn raw_to_volts(raw: u16) -> f32 {
    (f32::from(raw) * ADC_REF_VOLTS / ADC_FULL_SCALE).min(ADC_REF_VOLTS)
}

/// Supply-side voltage behind the divider.
pub fn divided_volts(pin_volts: f32) -> f32 {
    pin_volts * DIVIDER_SCALE
}

/// A scaled sample of all three channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub track_volts: f32,
    pub controller_volts: f32,
    pub controller_amps: f32,
}

/// Read all three channels and scale them.
pub fn sample<S: SensorPort + ?Sized>(sensor: &mut S, cal: &CurrentCalibration) -> Reading {
    Reading {
        track_volts: divided_volts(sensor.read_volts(Channel::TrackVoltage)),
        controller_volts: divided_volts(sensor.read_volts(Channel::ControllerVoltage)),
        controller_amps: cal.amps(sensor.read_raw(Channel::ControllerCurrent)),
    }
}

// ── Hardware / simulation source ─────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(2048)];

/// Inject a raw reading for the simulation backend.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw(channel: Channel, raw: u16) {
    SIM_ADC[channel.index()].store(raw, Ordering::Relaxed);
}

/// Reads the ADC channels configured by `hw_init`.
#[derive(Debug, Default)]
pub struct SensorHub {
    reads: u32,
}

impl SensorHub {
    pub fn new() -> Self {
        Self { reads: 0 }
    }

    /// Number of conversions performed since boot.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self, channel: Channel) -> u16 {
        crate::drivers::hw_init::adc1_read(channel.adc_channel())
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self, channel: Channel) -> u16 {
        SIM_ADC[channel.index()].load(Ordering::Relaxed)
    }
}

impl SensorPort for SensorHub {
    fn read_raw(&mut self, channel: Channel) -> u16 {
        self.reads = self.reads.wrapping_add(1);
        self.read_adc(channel)
    }
}
