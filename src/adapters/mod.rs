//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `hardware`  | AdcPort, RelayPort | ADS1115 (I2C), relay GPIO    |
//! | `log_sink`  | EventSink          | Serial log output            |
//! | `time`      | clock              | ESP32 high-resolution timer  |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA             |
//! | `mdns`      | discovery          | ESP-IDF mDNS component       |
//! | `http`      | API transport      | ESP-IDF httpd (device only)  |
//! | `mqtt`      | StatusPublisher    | ESP-IDF MQTT (device only)   |

pub mod hardware;
pub mod log_sink;
pub mod mdns;
pub mod time;
pub mod wifi;

#[cfg(feature = "espidf")]
pub mod http;
#[cfg(feature = "espidf")]
pub mod mqtt;
