//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (UART on the device via `esp_idf_logger`).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as a one-line `TAG | key=value` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { locked } => {
                info!("START | locked={}", locked);
            }
            AppEvent::Tripped { reason, measurement: m } => {
                warn!(
                    "TRIP  | reason={} | fwd={:.3}W rev={:.3}W vswr={:.3}",
                    reason, m.forward_power, m.reflected_power, m.vswr
                );
            }
            AppEvent::Rearmed { reason } => {
                debug!("REARM | reason={}", reason);
            }
            AppEvent::Released { cause } => {
                info!("CLEAR | cause={}", cause);
            }
            AppEvent::SampleSkipped(e) => {
                debug!("SKIP  | {}", e);
            }
            AppEvent::SettingsChanged { rejected } => {
                if *rejected {
                    warn!("CONFIG | updated, some fields rejected");
                } else {
                    info!("CONFIG | updated");
                }
            }
        }
    }
}
