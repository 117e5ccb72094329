//! Hardware adapter: bridges the logger board to the domain port traits.
//!
//! Owns the [`SensorHub`], the indicator queue and the clock, exposing them
//! as one [`Board`](crate::app::ports::Board).  This is the only module in
//! the system that reads the buttons.  On non-espidf targets the button
//! levels come from simulation atomics.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use super::time::MonotonicClock;
use crate::app::events::Feedback;
use crate::app::ports::{ButtonId, ClockPort, FeedbackPort, InputPort, SensorPort};
use crate::drivers::indicator::FeedbackQueue;
use crate::sensors::{Channel, SensorHub};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Released (pulled up) until a test presses them.
#[cfg(not(target_os = "espidf"))]
static SIM_BUTTONS: [AtomicBool; 2] = [AtomicBool::new(true), AtomicBool::new(true)];

/// Drive a simulated button: `pressed` pulls the line low.
#[cfg(not(target_os = "espidf"))]
pub fn sim_press(button: ButtonId, pressed: bool) {
    SIM_BUTTONS[button as usize].store(!pressed, Ordering::Relaxed);
}

/// Concrete adapter that combines all board hardware behind port traits.
pub struct HardwareAdapter {
    sensor_hub: SensorHub,
    feedback: FeedbackQueue,
    clock: MonotonicClock,
}

impl HardwareAdapter {
    pub fn new(sensor_hub: SensorHub, feedback: FeedbackQueue, clock: MonotonicClock) -> Self {
        Self {
            sensor_hub,
            feedback,
            clock,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_raw(&mut self, channel: Channel) -> u16 {
        self.sensor_hub.read_raw(channel)
    }
}

// ── InputPort implementation ──────────────────────────────────

impl InputPort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn level(&mut self, button: ButtonId) -> bool {
        match button {
            ButtonId::Yellow => hw_init::gpio_read(pins::YELLOW_BUTTON_GPIO),
            ButtonId::Black => hw_init::gpio_read(pins::BLACK_BUTTON_GPIO),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn level(&mut self, button: ButtonId) -> bool {
        SIM_BUTTONS[button as usize].load(Ordering::Relaxed)
    }
}

// ── FeedbackPort implementation ───────────────────────────────

impl FeedbackPort for HardwareAdapter {
    fn signal(&mut self, feedback: Feedback) {
        self.feedback.signal(feedback);
    }
}

// ── ClockPort implementation ──────────────────────────────────

impl ClockPort for HardwareAdapter {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn now_ns(&self) -> u64 {
        self.clock.now_ns()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }

    fn shutdown_requested(&self) -> bool {
        self.clock.shutdown_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_buttons_are_active_low() {
        let mut hw = HardwareAdapter::new(SensorHub::new(), FeedbackQueue, MonotonicClock::new());
        assert!(hw.level(ButtonId::Black));
        sim_press(ButtonId::Black, true);
        assert!(!hw.level(ButtonId::Black));
        sim_press(ButtonId::Black, false);
        assert!(hw.level(ButtonId::Black));
    }
}
