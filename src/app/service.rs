//! Application service: the hexagonal core.
//!
//! [`Controller`] owns the control state: latest measurement, policy,
//! and the interlock (which in turn owns the relay).  It is shared
//! between the sampling actor and the HTTP handlers through
//! [`SharedController`]; every read or write is one lock acquisition.
//!
//! ```text
//!  AdcPort ──▶ ControlLoop ──lock──▶ ┌─────────────────────┐ ──▶ RelayPort
//!                 │                  │     Controller       │
//!                 │   HTTP ──lock──▶ │ Measurement · Policy │
//!                 ▼                  │ Interlock · Vswr     │
//!   EventSink · StatusPublisher      └─────────────────────┘
//! ```
//!
//! The ADC is read before the lock is taken and the status is published
//! after it is released, so neither hardware latency nor network I/O
//! ever holds up the other actor.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use crate::error::{SampleError, ValidationError};
use crate::interlock::{Interlock, InterlockState, Transition};
use crate::policy::Policy;
use crate::sensors::sampler::{PowerReading, Sampler};
use crate::vswr::VswrEngine;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{AdcPort, EventSink, RelayPort, StatusPublisher};
use super::status::{Measurement, SettingsView, StatusView};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// Result of feeding one reading through the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub status: StatusView,
    pub measurement: Measurement,
    pub transition: Option<Transition>,
}

/// Result of one external command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandOutcome {
    /// Status after the command.
    pub status: StatusView,
    /// Settings after the command.
    pub settings: SettingsView,
    pub transition: Option<Transition>,
    /// First refused settings field, for `UpdateSettings`.
    pub rejected: Option<ValidationError>,
}

/// The control-state aggregate.
pub struct Controller<R: RelayPort> {
    measurement: Measurement,
    policy: Policy,
    interlock: Interlock<R>,
    engine: VswrEngine,
}

impl<R: RelayPort> Controller<R> {
    pub fn new(policy: Policy, relay: R) -> Self {
        Self {
            measurement: Measurement::IDLE,
            policy,
            interlock: Interlock::new(relay),
            engine: VswrEngine::new(),
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Derive VSWR, replace the measurement, then evaluate the interlock
    /// against it.  The relay is driven before this returns.
    pub fn run_cycle(&mut self, reading: PowerReading, now_ms: u64) -> CycleReport {
        let vswr = self.engine.compute(
            reading.forward_power,
            reading.reflected_power,
            self.policy.forward_min,
        );
        self.measurement = Measurement {
            forward_power: reading.forward_power,
            reflected_power: reading.reflected_power,
            vswr,
        };
        let transition = self.interlock.evaluate(&self.measurement, &self.policy, now_ms);
        CycleReport {
            status: self.status(),
            measurement: self.measurement,
            transition,
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an operator command.  Overrides go through the interlock.
    pub fn execute(&mut self, cmd: AppCommand, now_ms: u64) -> CommandOutcome {
        let mut rejected = None;
        let transition = match cmd {
            AppCommand::ForceUnlock => self.interlock.force_unlock(),
            AppCommand::Disable => {
                self.policy.auto_unlock = false;
                info!("Controller: auto_unlock disabled");
                Some(self.interlock.force_lock(now_ms))
            }
            AppCommand::Enable => {
                self.policy.auto_unlock = true;
                info!("Controller: auto_unlock enabled");
                None
            }
            AppCommand::UpdateSettings(partial) => {
                rejected = self.policy.apply_update(&partial).err();
                None
            }
        };
        CommandOutcome {
            status: self.status(),
            settings: self.settings(),
            transition,
            rejected,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Consistent snapshot of measurement and interlock state.
    pub fn status(&self) -> StatusView {
        StatusView::new(&self.measurement, self.interlock.state(), self.policy.auto_unlock)
    }

    pub fn settings(&self) -> SettingsView {
        SettingsView::from(&self.policy)
    }

    pub fn measurement(&self) -> Measurement {
        self.measurement
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn interlock_state(&self) -> InterlockState {
        self.interlock.state()
    }

    pub fn relay(&self) -> &R {
        self.interlock.relay()
    }
}

// ───────────────────────────────────────────────────────────────
// SharedController
// ───────────────────────────────────────────────────────────────

/// Cloneable handle to the controller behind a mutex.
pub struct SharedController<R: RelayPort> {
    inner: Arc<Mutex<Controller<R>>>,
}

impl<R: RelayPort> Clone for SharedController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RelayPort> SharedController<R> {
    pub fn new(controller: Controller<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Run `f` with the controller locked.
    ///
    /// A poisoned lock is recovered: every mutation is a single step
    /// under the lock, so the state is never left half-written.
    pub fn with<T>(&self, f: impl FnOnce(&mut Controller<R>) -> T) -> T {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    pub fn status(&self) -> StatusView {
        self.with(|c| c.status())
    }

    pub fn settings(&self) -> SettingsView {
        self.with(|c| c.settings())
    }

    /// Execute a command under the lock, then emit its events outside it.
    pub fn execute(
        &self,
        cmd: AppCommand,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        let (outcome, measurement) = self.with(|c| (c.execute(cmd, now_ms), c.measurement()));
        if let Some(t) = outcome.transition {
            sink.emit(&transition_event(t, measurement));
        }
        if let AppCommand::UpdateSettings(_) = cmd {
            sink.emit(&AppEvent::SettingsChanged {
                rejected: outcome.rejected.is_some(),
            });
        }
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, Controller<R>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

/// What one sampling cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// A measurement was taken and evaluated.
    Completed(StatusView),
    /// The hardware read failed; nothing changed.
    Skipped(SampleError),
}

/// The sampling actor: owns the sampler, shares the controller.
pub struct ControlLoop<A: AdcPort, R: RelayPort> {
    sampler: Sampler<A>,
    shared: SharedController<R>,
    cycles: u64,
    skipped: u64,
}

impl<A: AdcPort, R: RelayPort> ControlLoop<A, R> {
    pub fn new(sampler: Sampler<A>, shared: SharedController<R>) -> Self {
        Self {
            sampler,
            shared,
            cycles: 0,
            skipped: 0,
        }
    }

    /// Announce the loop is running.
    pub fn start(&self, sink: &mut impl EventSink) {
        let locked = self.shared.with(|c| c.interlock_state().is_locked());
        sink.emit(&AppEvent::Started { locked });
        info!("ControlLoop started (locked={})", locked);
    }

    /// One cycle: sample → (lock) VSWR + interlock + snapshot → publish.
    pub fn cycle(
        &mut self,
        now_ms: u64,
        sink: &mut impl EventSink,
        publisher: &mut impl StatusPublisher,
    ) -> CycleOutcome {
        self.cycles += 1;

        let reading = match self.sampler.sample() {
            Ok(r) => r,
            Err(e) => {
                self.skipped += 1;
                debug!("ControlLoop: cycle {} skipped ({})", self.cycles, e);
                sink.emit(&AppEvent::SampleSkipped(e));
                return CycleOutcome::Skipped(e);
            }
        };

        let report = self.shared.with(|c| c.run_cycle(reading, now_ms));

        if let Some(t) = report.transition {
            sink.emit(&transition_event(t, report.measurement));
        }
        publisher.publish(&report.status);
        CycleOutcome::Completed(report.status)
    }

    pub fn shared(&self) -> &SharedController<R> {
        &self.shared
    }

    /// Cycles run since construction.
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    /// Cycles discarded because of a failed read.
    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }
}

fn transition_event(t: Transition, measurement: Measurement) -> AppEvent {
    match t {
        Transition::Tripped(reason) => AppEvent::Tripped {
            reason,
            measurement,
        },
        Transition::Rearmed(reason) => AppEvent::Rearmed { reason },
        Transition::Released(cause) => AppEvent::Released { cause },
    }
}
