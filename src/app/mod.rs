//! Application core: pure domain logic, zero I/O.
//!
//! Button capture, hostname negotiation, telemetry publishing and track
//! profiles.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod capture;
pub mod counter;
pub mod events;
pub mod hostname;
pub mod ports;
pub mod profiles;
pub mod telemetry;
