//! Fuzz target: `api::handle`
//!
//! Splits the input into a method selector, a path and a body, and serves
//! it against a live controller.  The handler must never panic, must only
//! answer with 200/404/405, and must leave the relay consistent with the
//! interlock state.
//!
//! cargo fuzz run fuzz_api_request

#![no_main]

use libfuzzer_sys::fuzz_target;
use swrguard::api::{self, Method};
use swrguard::app::events::AppEvent;
use swrguard::app::ports::{EventSink, RelayPort};
use swrguard::app::service::{Controller, SharedController};
use swrguard::policy::Policy;

#[derive(Default)]
struct Coil(bool);

impl RelayPort for Coil {
    fn connect(&mut self) {
        self.0 = false;
    }
    fn disconnect(&mut self) {
        self.0 = true;
    }
    fn is_energized(&self) -> bool {
        self.0
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let method = match selector % 3 {
        0 => Method::Get,
        1 => Method::Post,
        _ => Method::Options,
    };
    let split = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let (path, body) = rest.split_at(split);
    let Ok(path) = std::str::from_utf8(path) else {
        return;
    };

    let shared = SharedController::new(Controller::new(Policy::default(), Coil::default()));
    let resp = api::handle(&shared, method, path, body, 0, &mut Discard);

    assert!(matches!(resp.status, 200 | 404 | 405), "status {}", resp.status);
    assert!(shared.with(|c| c.relay().is_energized() == c.interlock_state().is_locked()));
    assert!(shared.with(|c| c.policy().is_valid()));
});
