//! Operator overrides and settings through the HTTP request handler.
//!
//! Requests go through [`api::handle`] exactly as the device transport
//! calls it, against the same [`SharedController`] the control loop uses.

use std::thread;

use serde_json::Value;
use swrguard::api::{self, Method};
use swrguard::app::events::AppEvent;
use swrguard::app::ports::RelayPort;
use swrguard::interlock::{InterlockState, ReleaseCause, TripReason};
use swrguard::policy::Policy;

use crate::mock_hw::{rig, RecordingPublisher, RecordingSink, TestLoop};

fn request(control: &TestLoop, method: Method, path: &str, body: &str, now_ms: u64) -> (u16, Value) {
    let mut sink = RecordingSink::new();
    let resp = api::handle(control.shared(), method, path, body.as_bytes(), now_ms, &mut sink);
    let json = if resp.body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&resp.body).expect("response is JSON")
    };
    (resp.status, json)
}

fn trip(control: &mut TestLoop, now_ms: u64) {
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    control.cycle(now_ms, &mut sink, &mut publisher);
    assert!(control.shared().status().is_locked(), "fixture must trip");
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_reports_three_decimal_strings() {
    let (mut control, script) = rig(Policy::default());
    script.set_watts(10.0, 0.1);
    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    control.cycle(0, &mut sink, &mut publisher);

    let (status, json) = request(&control, Method::Get, "/api/status", "", 10);

    assert_eq!(status, 200);
    assert_eq!(json["fwd"], "9.998");
    assert_eq!(json["active_key"], "true");
    assert_eq!(json["auto_unlock"], "true");
}

#[test]
fn unknown_path_and_wrong_method_are_refused() {
    let (control, _script) = rig(Policy::default());

    assert_eq!(request(&control, Method::Get, "/api/reboot", "", 0).0, 404);
    assert_eq!(request(&control, Method::Post, "/api/status", "", 0).0, 405);
    assert_eq!(request(&control, Method::Options, "/api/settings", "", 0).0, 200);
}

// ── Overrides ─────────────────────────────────────────────────

#[test]
fn unlock_releases_immediately() {
    let (mut control, script) = rig(Policy::default());
    script.set_watts(60.0, 0.0);
    trip(&mut control, 0);

    let (status, json) = request(&control, Method::Get, "/api/unlock", "", 100);

    assert_eq!(status, 200);
    assert_eq!(json["active_key"], "true");
    assert!(!control.shared().with(|c| c.relay().is_energized()));
}

#[test]
fn unlock_under_persistent_fault_retrips_next_cycle() {
    let (mut control, script) = rig(Policy::default());
    script.set_watts(60.0, 0.0);
    trip(&mut control, 0);
    request(&control, Method::Get, "/api/unlock", "", 100);

    let mut sink = RecordingSink::new();
    control.cycle(500, &mut sink, &mut RecordingPublisher::default());

    assert_eq!(
        control.shared().status().interlock,
        InterlockState::Locked { locked_at_ms: 500 }
    );
    assert!(matches!(
        sink.last(),
        Some(AppEvent::Tripped {
            reason: TripReason::ForwardOverPower,
            ..
        })
    ));
}

#[test]
fn disable_locks_and_holds_past_cooldown() {
    let (mut control, script) = rig(Policy::default());
    script.set_watts(5.0, 0.0);

    let (_, json) = request(&control, Method::Get, "/api/disable", "", 1_000);
    assert_eq!(json["active_key"], "false");
    assert_eq!(json["auto_unlock"], "false");

    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    for t in [3_000, 10_000, 60_000] {
        control.cycle(t, &mut sink, &mut publisher);
    }
    assert!(control.shared().status().is_locked());
    assert!(control.shared().with(|c| c.relay().is_energized()));

    let (_, json) = request(&control, Method::Get, "/api/settings", "", 60_000);
    assert_eq!(json["auto_unlock"], "false");
}

#[test]
fn enable_resumes_automatic_release() {
    let (mut control, script) = rig(Policy::default());
    script.set_watts(5.0, 0.0);
    request(&control, Method::Get, "/api/disable", "", 0);

    let (_, json) = request(&control, Method::Get, "/api/enable", "", 5_000);
    assert_eq!(json["auto_unlock"], "true");
    // Enabling does not itself release.
    assert_eq!(json["active_key"], "false");

    let mut sink = RecordingSink::new();
    control.cycle(5_500, &mut sink, &mut RecordingPublisher::default());
    assert_eq!(control.shared().status().interlock, InterlockState::Unlocked);
    assert_eq!(
        sink.last(),
        Some(&AppEvent::Released {
            cause: ReleaseCause::Cooldown
        })
    );
}

#[test]
fn disable_while_locked_restarts_cooldown_clock() {
    let (mut control, script) = rig(Policy::default());
    script.set_watts(60.0, 0.0);
    trip(&mut control, 0);

    request(&control, Method::Get, "/api/disable", "", 1_500);

    assert_eq!(
        control.shared().status().interlock,
        InterlockState::Locked { locked_at_ms: 1_500 }
    );
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn settings_get_reports_defaults() {
    let (control, _script) = rig(Policy::default());

    let (status, json) = request(&control, Method::Get, "/api/settings", "", 0);

    assert_eq!(status, 200);
    assert_eq!(json["fwd_max"], "50.000");
    assert_eq!(json["rev_max"], "1.000");
    assert_eq!(json["vswr_max"], "1.500");
    assert_eq!(json["rev_min"], "0.100");
    assert_eq!(json["cooldown"], 2000);
    assert_eq!(json["auto_unlock"], "true");
}

#[test]
fn partial_update_changes_only_named_fields() {
    let (control, _script) = rig(Policy::default());

    let (_, json) = request(
        &control,
        Method::Post,
        "/api/settings",
        r#"{"vswr_max": 3.0, "cooldown": 5000}"#,
        0,
    );

    assert_eq!(json["vswr_max"], "3.000");
    assert_eq!(json["cooldown"], 5000);
    assert_eq!(json["fwd_max"], "50.000");
    assert_eq!(json["rev_max"], "1.000");
}

#[test]
fn raised_vswr_limit_applies_on_next_cycle() {
    let (mut control, script) = rig(Policy::default());
    request(
        &control,
        Method::Post,
        "/api/settings",
        r#"{"fwd_max": 200, "rev_max": 20, "vswr_max": 3}"#,
        0,
    );
    script.set_watts(100.0, 11.11);

    let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
    control.cycle(500, &mut sink, &mut publisher);

    assert_eq!(control.shared().status().interlock, InterlockState::Unlocked);
}

#[test]
fn invalid_field_is_rejected_while_others_apply() {
    let (control, _script) = rig(Policy::default());
    let mut sink = RecordingSink::new();

    let resp = api::handle(
        control.shared(),
        Method::Post,
        "/api/settings",
        br#"{"fwd_max": -5, "rev_max": 2}"#,
        0,
        &mut sink,
    );

    let json: Value = serde_json::from_slice(&resp.body).unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(json["fwd_max"], "50.000");
    assert_eq!(json["rev_max"], "2.000");
    assert_eq!(sink.events, vec![AppEvent::SettingsChanged { rejected: true }]);
}

#[test]
fn malformed_body_changes_nothing() {
    let (control, _script) = rig(Policy::default());
    let before = control.shared().settings();

    let (status, _) = request(&control, Method::Post, "/api/settings", "{not json", 0);

    assert_eq!(status, 200);
    assert_eq!(control.shared().settings(), before);
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn relay_always_matches_state_under_concurrent_unlocks() {
    let (mut control, script) = rig(Policy::default());
    script.set_watts(60.0, 0.0);
    let observer = control.shared().clone();

    let sampler = thread::spawn(move || {
        let (mut sink, mut publisher) = (RecordingSink::new(), RecordingPublisher::default());
        for t in 0..300u64 {
            control.cycle(t * 10, &mut sink, &mut publisher);
            let consistent =
                control.shared().with(|c| c.relay().is_energized() == c.interlock_state().is_locked());
            assert!(consistent, "relay diverged from interlock state at cycle {}", t);
        }
    });

    let mut sink = RecordingSink::new();
    for t in 0..300u64 {
        let resp = api::handle(&observer, Method::Get, "/api/unlock", b"", t * 10, &mut sink);
        assert_eq!(resp.status, 200);
        let consistent =
            observer.with(|c| c.relay().is_energized() == c.interlock_state().is_locked());
        assert!(consistent, "relay diverged from interlock state after unlock {}", t);
    }

    sampler.join().expect("sampler thread panicked");
}
