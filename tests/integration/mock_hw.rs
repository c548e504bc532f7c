//! Mock hardware adapters for integration tests.
//!
//! The ADC is scripted through a shared handle so a test can change what
//! the detector "sees" after the sampler has been moved into a
//! [`ControlLoop`].  The relay records every drive so tests can assert on
//! the full actuation history.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use swrguard::app::events::AppEvent;
use swrguard::app::ports::{AdcPort, Channel, EventSink, RelayPort, StatusPublisher};
use swrguard::app::service::{ControlLoop, Controller, SharedController};
use swrguard::app::status::StatusView;
use swrguard::error::SampleError;
use swrguard::policy::Policy;
use swrguard::sensors::{Calibration, Sampler};

/// 1 mV per code.
pub const TEST_LSB: f32 = 0.001;

/// Unity coupler, `P = v²`: a code of 1000 reads as 1 W.
pub const UNIT_CAL: Calibration = Calibration {
    coupler_ratio: 1.0,
    power_k: 1.0,
};

/// Code that converts to `watts` under [`UNIT_CAL`].
pub fn code_for(watts: f32) -> i16 {
    (watts.sqrt() / TEST_LSB).round() as i16
}

// ── Scripted ADC ──────────────────────────────────────────────

#[derive(Debug)]
struct Script {
    steady: (i16, i16),
    pending: VecDeque<(Channel, Result<i16, SampleError>)>,
}

/// Test-side handle onto a [`ScriptedAdc`].
#[derive(Debug, Clone)]
pub struct AdcScript(Arc<Mutex<Script>>);

impl AdcScript {
    /// Powers returned on every read from now on.
    pub fn set_watts(&self, forward: f32, reflected: f32) {
        self.0.lock().unwrap().steady = (code_for(forward), code_for(reflected));
    }

    /// Replace the next read of `channel` with `result`.
    pub fn inject(&self, channel: Channel, result: Result<i16, SampleError>) {
        self.0.lock().unwrap().pending.push_back((channel, result));
    }
}

pub struct ScriptedAdc(Arc<Mutex<Script>>);

impl ScriptedAdc {
    pub fn new() -> (Self, AdcScript) {
        let script = Arc::new(Mutex::new(Script {
            steady: (0, 0),
            pending: VecDeque::new(),
        }));
        (Self(Arc::clone(&script)), AdcScript(script))
    }
}

impl AdcPort for ScriptedAdc {
    fn read_differential(&mut self, channel: Channel) -> Result<i16, SampleError> {
        let mut s = self.0.lock().unwrap();
        if s.pending.front().is_some_and(|(c, _)| *c == channel) {
            if let Some((_, result)) = s.pending.pop_front() {
                return result;
            }
        }
        Ok(match channel {
            Channel::Forward => s.steady.0,
            Channel::Reflected => s.steady.1,
        })
    }

    fn lsb_volts(&self) -> f32 {
        TEST_LSB
    }
}

// ── Recording relay ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingRelay {
    /// `true` for every energise, `false` for every release.
    pub drives: Vec<bool>,
    energized: bool,
}

impl RelayPort for RecordingRelay {
    fn connect(&mut self) {
        self.energized = false;
        self.drives.push(false);
    }

    fn disconnect(&mut self) {
        self.energized = true;
        self.drives.push(true);
    }

    fn is_energized(&self) -> bool {
        self.energized
    }
}

// ── Event sink / publisher ────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub published: Vec<StatusView>,
}

impl StatusPublisher for RecordingPublisher {
    fn publish(&mut self, status: &StatusView) {
        self.published.push(*status);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type TestLoop = ControlLoop<ScriptedAdc, RecordingRelay>;

/// A control loop over mock hardware, plus the script driving its ADC.
pub fn rig(policy: Policy) -> (TestLoop, AdcScript) {
    let (adc, script) = ScriptedAdc::new();
    let shared = SharedController::new(Controller::new(policy, RecordingRelay::default()));
    (ControlLoop::new(Sampler::new(adc, UNIT_CAL), shared), script)
}
