//! System configuration parameters
//!
//! Compiled defaults for the SWR guard.  Nothing here is persisted: every
//! boot starts from [`SystemConfig::default`] and only the [`Policy`] is
//! mutable at runtime (through the settings API).

use core::time::Duration;

use crate::policy::Policy;
use crate::sensors::sampler::Calibration;

/// mDNS hostname and HTTP `Host` name (`esp32swr.local`).
pub const HOSTNAME: &str = "esp32swr";
/// Port the HTTP API listens on.
pub const HTTP_PORT: u16 = 80;
/// MQTT broker the status side channel publishes to.
pub const MQTT_BROKER_URL: &str = "mqtt://10.0.0.77";
/// Topic carrying the status object after every completed cycle.
pub const MQTT_STATUS_TOPIC: &str = "esp32swr/raw";
/// MQTT client identifier.
pub const MQTT_CLIENT_ID: &str = "esp32swr";

/// Wi-Fi credentials, baked in at build time.
pub const WIFI_SSID: &str = match option_env!("SWR_WIFI_SSID") {
    Some(s) => s,
    None => "",
};
pub const WIFI_PASSWORD: &str = match option_env!("SWR_WIFI_PASS") {
    Some(s) => s,
    None => "",
};

/// Core system configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemConfig {
    // --- Safety limits ---
    /// Initial policy; mutated in place afterwards.
    pub policy: Policy,

    // --- Conversion ---
    /// Coupler/detector calibration used by the sampler.
    pub calibration: Calibration,

    // --- Timing ---
    /// Sampling cycle cadence (milliseconds)
    pub sample_interval_ms: u32,
    /// First Wi-Fi reconnect delay (seconds)
    pub wifi_backoff_initial_secs: u32,
    /// Reconnect delay ceiling (seconds)
    pub wifi_backoff_max_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            calibration: Calibration::default(),

            // Timing
            sample_interval_ms: 500, // 2 Hz
            wifi_backoff_initial_secs: 2,
            wifi_backoff_max_secs: 30,
        }
    }
}

impl SystemConfig {
    /// Sampling cadence as a [`Duration`].
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.sample_interval_ms))
    }
}
