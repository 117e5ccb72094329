//! Zero-current baseline for the hall-effect current sensor.
//!
//! The sensor idles near mid-rail; the exact offset varies per unit and with
//! supply voltage, so it is measured at boot with no current flowing.  The
//! baseline is kept in raw ADC counts and converted at read time.

use log::info;

use super::{CURRENT_VOLTS_PER_AMP, Channel, raw_to_volts};
use crate::app::ports::{ClockPort, SensorPort};

/// Mid-rail for a 12-bit converter (≈ 1.65 V).
pub const NOMINAL_ZERO_RAW: u16 = 2048;

/// Pause between calibration samples.
const SAMPLE_SPACING_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentCalibration {
    zero_raw: u16,
}

impl Default for CurrentCalibration {
    fn default() -> Self {
        Self::from_zero_raw(NOMINAL_ZERO_RAW)
    }
}

impl CurrentCalibration {
    pub fn from_zero_raw(zero_raw: u16) -> Self {
        Self { zero_raw }
    }

    /// Average `samples` readings of the current channel.
    pub fn measure<B>(board: &mut B, samples: u8) -> Self
    where
        B: SensorPort + ClockPort + ?Sized,
    {
        let n = u32::from(samples.max(1));
        let mut sum: u32 = 0;
        for i in 0..n {
            sum += u32::from(board.read_raw(Channel::ControllerCurrent));
            if i + 1 < n {
                board.delay_ms(SAMPLE_SPACING_MS);
            }
        }
        let zero_raw = ((sum + n / 2) / n) as u16;
        info!(
            "calibration: zero current at {} counts ({:.4} V, {} samples)",
            zero_raw,
            raw_to_volts(zero_raw),
            n
        );
        Self { zero_raw }
    }

    pub fn zero_raw(&self) -> u16 {
        self.zero_raw
    }

    pub fn zero_volts(&self) -> f32 {
        raw_to_volts(self.zero_raw)
    }

    /// Current in amps for a raw reading of the current channel.
    pub fn amps(&self, raw: u16) -> f32 {
        (raw_to_volts(raw) - self.zero_volts()) / CURRENT_VOLTS_PER_AMP
    }
}
