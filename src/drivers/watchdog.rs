//! Task Watchdog Timer (TWDT) guard for the sampling thread.
//!
//! The thread that owns the control loop subscribes itself; if a bus hang
//! or deadlock stops it feeding for longer than the timeout, ESP-IDF
//! panics and the chip reboots with the relay released by reset.
//!
//! On host builds both calls are no-ops.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::{
    esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, esp_task_wdt_reset,
    ESP_OK,
};

use log::{info, warn};

/// Stall budget before reset.
pub const TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    subscribed: bool,
}

impl Watchdog {
    /// Subscribe the calling task.  Must run on the thread that feeds.
    #[cfg(feature = "espidf")]
    pub fn subscribe_current_task(timeout_ms: u32) -> Self {
        // SAFETY: plain FFI calls with a valid config. A null handle means
        // "the calling task".
        let subscribed = unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK as i32 {
                warn!("Watchdog: reconfigure returned {} (already configured?)", ret);
            }
            esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK as i32
        };
        if subscribed {
            info!("Watchdog: sampling task subscribed ({} ms, panic on trigger)", timeout_ms);
        } else {
            warn!("Watchdog: subscribe failed, running unguarded");
        }
        Self { subscribed }
    }

    /// Subscribe the calling task.  Must run on the thread that feeds.
    #[cfg(not(feature = "espidf"))]
    pub fn subscribe_current_task(timeout_ms: u32) -> Self {
        info!("Watchdog(sim): {} ms budget, not enforced", timeout_ms);
        Self { subscribed: false }
    }

    /// Feed once per sampling cycle.
    pub fn feed(&self) {
        #[cfg(feature = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the calling (subscribed) task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
