//! Monotonic uptime clock.
//!
//! - **`espidf`**: wraps `esp_timer_get_time()` (microseconds since boot).
//! - **host**: `std::time::Instant` captured at construction.
//!
//! The interlock only ever compares differences of these values, so the
//! absolute origin does not matter.

#[derive(Debug, Clone, Copy)]
pub struct UptimeClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl UptimeClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(feature = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the always-running high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction.
    #[cfg(not(feature = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds, the unit the interlock works in.
    pub fn now_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }
}
