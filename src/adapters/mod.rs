//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements            | Connects to               |
//! |----------------|-----------------------|---------------------------|
//! | `hardware`     | SensorPort, InputPort | ESP32 ADC, GPIO           |
//! |                | FeedbackPort          | Indicator task queue      |
//! |                | ClockPort             | ESP32 system timer        |
//! | `wifi`         | NetworkPort           | ESP-IDF WiFi STA          |
//! | `mdns`         | (used by `wifi`)      | ESP-IDF mDNS responder    |
//! | `event_stream` | EventStreamPort       | TCP server-sent events    |
//! | `nvs`          | ConfigPort            | NVS / in-memory store     |
//! |                | StoragePort           |                           |
//! | `record_log`   | RecordLogPort         | SPIFFS / host filesystem  |
//! | `time`         | ClockPort             | ESP32 system timer        |

pub mod event_stream;
pub mod hardware;
pub mod mdns;
pub mod nvs;
pub mod record_log;
pub mod time;
pub mod wifi;
