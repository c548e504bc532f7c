//! Integration tests for the Sampler → VSWR → Interlock → relay pipeline.
//!
//! Drives a real [`ControlLoop`] over a scripted ADC and checks what the
//! relay, the event sink and the status publisher observe.

use swrguard::app::commands::AppCommand;
use swrguard::app::events::AppEvent;
use swrguard::app::ports::{Channel, RelayPort};
use swrguard::app::service::CycleOutcome;
use swrguard::error::SampleError;
use swrguard::interlock::{InterlockState, ReleaseCause, TripReason};
use swrguard::policy::{PartialPolicy, Policy};
use swrguard::sensors::sampler::INVALID_CODE;

use crate::mock_hw::{rig, RecordingPublisher, RecordingSink, TestLoop};

fn approx(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}

fn relay_energized(control: &TestLoop) -> bool {
    control.shared().with(|c| c.relay().is_energized())
}

fn state(control: &TestLoop) -> InterlockState {
    control.shared().with(|c| c.interlock_state())
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boots_unlocked_with_relay_connected() {
    let (control, _script) = rig(Policy::default());
    let mut sink = RecordingSink::new();

    control.start(&mut sink);

    assert_eq!(state(&control), InterlockState::Unlocked);
    assert!(!relay_energized(&control));
    assert_eq!(control.shared().with(|c| c.relay().drives.clone()), vec![false]);
    assert_eq!(sink.events, vec![AppEvent::Started { locked: false }]);

    let status = control.shared().status();
    assert_eq!(status.forward_power, 0.0);
    assert_eq!(status.vswr, 1.0);
    assert!(status.active_key());
}

// ── Normal operation ──────────────────────────────────────────

#[test]
fn matched_load_stays_unlocked_and_publishes_every_cycle() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    script.set_watts(10.0, 0.1);

    for i in 0..5 {
        let outcome = control.cycle(i * 500, &mut sink, &mut publisher);
        assert!(matches!(outcome, CycleOutcome::Completed(_)));
    }

    assert_eq!(state(&control), InterlockState::Unlocked);
    assert_eq!(publisher.published.len(), 5);
    let last = publisher.published[4];
    assert!(approx(last.forward_power, 10.0, 0.01), "fwd={}", last.forward_power);
    assert!(approx(last.reflected_power, 0.1, 0.001), "rev={}", last.reflected_power);
    assert!(last.vswr > 1.0 && last.vswr < 1.5, "vswr={}", last.vswr);
    assert!(sink.events.is_empty(), "no transitions expected: {:?}", sink.events);
}

#[test]
fn carrier_off_reports_unity_vswr() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    script.set_watts(0.0, 0.5);

    control.cycle(0, &mut sink, &mut publisher);

    let status = control.shared().status();
    assert_eq!(status.forward_power, 0.0);
    assert_eq!(status.vswr, 1.0);
    // 0.5 W reflected is within rev_max, so nothing trips.
    assert_eq!(state(&control), InterlockState::Unlocked);
}

#[test]
fn weak_reflection_never_trips_on_vswr() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    // VSWR ≈ 17 but reflected power is under rev_min.
    script.set_watts(0.05, 0.04);

    control.cycle(0, &mut sink, &mut publisher);

    let status = control.shared().status();
    assert!(status.vswr > 10.0, "vswr={}", status.vswr);
    assert_eq!(state(&control), InterlockState::Unlocked);
}

// ── Trips ─────────────────────────────────────────────────────

#[test]
fn high_vswr_trips_and_energizes_relay() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    script.set_watts(100.0, 11.11);

    // 100 W exceeds fwd_max as well; raise it so VSWR is the only fault.
    control.shared().with(|c| {
        c.execute(
            AppCommand::UpdateSettings(PartialPolicy {
                forward_max: Some(Ok(200.0)),
                reflected_max: Some(Ok(20.0)),
                ..Default::default()
            }),
            0,
        )
    });

    control.cycle(1_000, &mut sink, &mut publisher);

    let status = publisher.published[0];
    assert!(approx(status.vswr, 2.0, 0.01), "vswr={}", status.vswr);
    assert_eq!(state(&control), InterlockState::Locked { locked_at_ms: 1_000 });
    assert!(relay_energized(&control));
    assert!(!status.active_key());
    assert!(matches!(
        sink.last(),
        Some(AppEvent::Tripped {
            reason: TripReason::VswrExceeded,
            ..
        })
    ));
}

#[test]
fn forward_over_power_trips_first() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    // Every threshold is exceeded; forward takes precedence.
    script.set_watts(60.0, 30.0);

    control.cycle(0, &mut sink, &mut publisher);

    assert!(matches!(
        sink.last(),
        Some(AppEvent::Tripped {
            reason: TripReason::ForwardOverPower,
            ..
        })
    ));
}

#[test]
fn reflected_over_power_trips() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    script.set_watts(40.0, 1.5);

    control.cycle(0, &mut sink, &mut publisher);

    assert!(matches!(
        sink.last(),
        Some(AppEvent::Tripped {
            reason: TripReason::ReflectedOverPower,
            ..
        })
    ));
}

// ── Cooldown ──────────────────────────────────────────────────

#[test]
fn clears_after_cooldown_once_fault_is_gone() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());

    script.set_watts(60.0, 0.0);
    control.cycle(0, &mut sink, &mut publisher);
    assert!(state(&control).is_locked());

    script.set_watts(10.0, 0.0);
    control.cycle(500, &mut sink, &mut publisher);
    control.cycle(1_999, &mut sink, &mut publisher);
    assert!(state(&control).is_locked(), "cooldown has not elapsed");
    assert!(relay_energized(&control));

    control.cycle(2_000, &mut sink, &mut publisher);
    assert_eq!(state(&control), InterlockState::Unlocked);
    assert!(!relay_energized(&control));
    assert_eq!(
        sink.last(),
        Some(&AppEvent::Released {
            cause: ReleaseCause::Cooldown
        })
    );
}

#[test]
fn persistent_fault_restarts_cooldown() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());

    script.set_watts(60.0, 0.0);
    control.cycle(0, &mut sink, &mut publisher);
    control.cycle(1_500, &mut sink, &mut publisher);
    assert_eq!(state(&control), InterlockState::Locked { locked_at_ms: 1_500 });
    assert!(matches!(sink.last(), Some(AppEvent::Rearmed { .. })));

    script.set_watts(10.0, 0.0);
    control.cycle(2_500, &mut sink, &mut publisher);
    assert!(state(&control).is_locked(), "cooldown counts from the last fault");

    control.cycle(3_500, &mut sink, &mut publisher);
    assert_eq!(state(&control), InterlockState::Unlocked);

    // Boot, trip, re-arm (re-asserted, still open), release.
    let drives = control.shared().with(|c| c.relay().drives.clone());
    assert_eq!(drives, vec![false, true, true, false]);
}

#[test]
fn zero_cooldown_releases_on_next_clean_cycle() {
    let policy = Policy {
        cooldown: std::time::Duration::ZERO,
        ..Policy::default()
    };
    let (mut control, script) = rig(policy);
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());

    script.set_watts(60.0, 0.0);
    control.cycle(0, &mut sink, &mut publisher);
    assert!(state(&control).is_locked());

    script.set_watts(1.0, 0.0);
    control.cycle(0, &mut sink, &mut publisher);
    assert_eq!(state(&control), InterlockState::Unlocked);
}

// ── Sampling failures ─────────────────────────────────────────

#[test]
fn bus_error_skips_cycle_without_touching_state() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());

    script.set_watts(10.0, 0.1);
    control.cycle(0, &mut sink, &mut publisher);
    let before = control.shared().status();

    script.set_watts(60.0, 0.0);
    script.inject(Channel::Forward, Err(SampleError::Bus));
    let outcome = control.cycle(500, &mut sink, &mut publisher);

    assert_eq!(outcome, CycleOutcome::Skipped(SampleError::Bus));
    assert_eq!(control.shared().status(), before);
    assert_eq!(publisher.published.len(), 1, "skipped cycles are not published");
    assert_eq!(control.skipped_count(), 1);
    assert_eq!(control.cycle_count(), 2);
    assert_eq!(sink.last(), Some(&AppEvent::SampleSkipped(SampleError::Bus)));
}

#[test]
fn invalid_reflected_code_discards_the_forward_reading_too() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());

    script.set_watts(60.0, 0.0);
    script.inject(Channel::Reflected, Ok(INVALID_CODE));
    let outcome = control.cycle(0, &mut sink, &mut publisher);

    assert_eq!(outcome, CycleOutcome::Skipped(SampleError::Invalid));
    assert_eq!(control.shared().status().forward_power, 0.0);
    assert_eq!(state(&control), InterlockState::Unlocked);

    // The next good pair is evaluated normally.
    control.cycle(500, &mut sink, &mut publisher);
    assert!(state(&control).is_locked());
}

#[test]
fn timeout_mid_lock_keeps_relay_open() {
    let (mut control, script) = rig(Policy::default());
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());

    script.set_watts(60.0, 0.0);
    control.cycle(0, &mut sink, &mut publisher);

    script.set_watts(1.0, 0.0);
    script.inject(Channel::Forward, Err(SampleError::Timeout));
    control.cycle(5_000, &mut sink, &mut publisher);
    assert!(state(&control).is_locked(), "no release without a valid sample");
    assert!(relay_energized(&control));

    control.cycle(5_500, &mut sink, &mut publisher);
    assert_eq!(state(&control), InterlockState::Unlocked);
}
