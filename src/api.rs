//! HTTP JSON API: routing, response shaping, and settings-body decoding.
//!
//! Transport-agnostic so the whole request/response contract runs on the
//! host; the ESP-IDF server in [`crate::adapters::http`] only moves bytes.
//!
//! | Method | Path            | Response                          |
//! |--------|-----------------|-----------------------------------|
//! | GET    | `/api/status`   | status object                     |
//! | GET    | `/api/settings` | settings object                   |
//! | POST   | `/api/settings` | settings object after the update  |
//! | GET    | `/api/unlock`   | status object (forces unlock)     |
//! | GET    | `/api/disable`  | status object (auto off, locks)   |
//! | GET    | `/api/enable`   | status object (auto on)           |
//!
//! Floats are sent as decimal strings with three places and booleans as
//! the strings `"true"` / `"false"`; `cooldown` is an integer (ms).

use core::fmt::{self, Write as _};

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::app::commands::AppCommand;
use crate::app::ports::{EventSink, RelayPort};
use crate::app::service::SharedController;
use crate::app::status::{SettingsView, StatusView};
use crate::error::ValidationError;
use crate::policy::{FieldValue, PartialPolicy, PolicyField};

/// Largest settings body accepted.
pub const MAX_BODY_LEN: usize = 1024;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Sent on every response, preflight included.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, PUT"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Options,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Settings,
    Unlock,
    Disable,
    Enable,
}

impl Endpoint {
    pub const ALL: [Self; 5] = [
        Self::Status,
        Self::Settings,
        Self::Unlock,
        Self::Disable,
        Self::Enable,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Status => "/api/status",
            Self::Settings => "/api/settings",
            Self::Unlock => "/api/unlock",
            Self::Disable => "/api/disable",
            Self::Enable => "/api/enable",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        // Ignore any query string.
        let path = path.split('?').next().unwrap_or(path);
        Self::ALL.into_iter().find(|e| e.path() == path)
    }

    /// Methods the endpoint answers, besides `OPTIONS`.
    pub fn allows(self, method: Method) -> bool {
        match method {
            Method::Options | Method::Get => true,
            Method::Post => self == Self::Settings,
        }
    }

    /// Override triggered by a GET on this endpoint.
    fn command(self) -> Option<AppCommand> {
        match self {
            Self::Unlock => Some(AppCommand::ForceUnlock),
            Self::Disable => Some(AppCommand::Disable),
            Self::Enable => Some(AppCommand::Enable),
            Self::Status | Self::Settings => None,
        }
    }
}

/// A fully formed response, minus the CORS headers the transport adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ApiResponse {
    fn json(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }
}

/// Serve one request against the shared controller.
pub fn handle<R: RelayPort>(
    shared: &SharedController<R>,
    method: Method,
    path: &str,
    body: &[u8],
    now_ms: u64,
    sink: &mut impl EventSink,
) -> ApiResponse {
    let Some(endpoint) = Endpoint::from_path(path) else {
        return ApiResponse::empty(404);
    };
    if !endpoint.allows(method) {
        return ApiResponse::empty(405);
    }
    if method == Method::Options {
        return ApiResponse::empty(200);
    }

    match (endpoint, method) {
        (Endpoint::Settings, Method::Post) => {
            let settings = match parse_settings(body) {
                Ok(partial) => {
                    shared
                        .execute(AppCommand::UpdateSettings(partial), now_ms, sink)
                        .settings
                }
                Err(e) => {
                    warn!("API: settings body ignored ({})", e);
                    shared.settings()
                }
            };
            ApiResponse::json(settings_json(&settings))
        }
        (Endpoint::Settings, _) => ApiResponse::json(settings_json(&shared.settings())),
        (endpoint, _) => {
            let status = match endpoint.command() {
                Some(cmd) => shared.execute(cmd, now_ms, sink).status,
                None => shared.status(),
            };
            ApiResponse::json(status_json(&status))
        }
    }
}

// ---------------------------------------------------------------------------
// Response shaping
// ---------------------------------------------------------------------------

/// Fits `{:.3}` of any finite `f32`, sign included.
type Decimal = heapless::String<48>;

fn decimal(v: f32) -> Decimal {
    let mut s = Decimal::new();
    // Capacity covers the widest finite value; non-finite never reach here.
    if write!(s, "{:.3}", v).is_err() {
        s.clear();
        let _ = s.push_str("0.000");
    }
    s
}

fn flag(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

#[derive(Serialize)]
struct StatusBody {
    fwd: Decimal,
    rev: Decimal,
    vswr: Decimal,
    active_key: &'static str,
    auto_unlock: &'static str,
}

#[derive(Serialize)]
struct SettingsBody {
    fwd_max: Decimal,
    rev_max: Decimal,
    vswr_max: Decimal,
    rev_min: Decimal,
    cooldown: u64,
    auto_unlock: &'static str,
}

/// Status object, also the MQTT payload.
pub fn status_json(s: &StatusView) -> Vec<u8> {
    to_json(&StatusBody {
        fwd: decimal(s.forward_power),
        rev: decimal(s.reflected_power),
        vswr: decimal(s.vswr),
        active_key: flag(s.active_key()),
        auto_unlock: flag(s.auto_unlock),
    })
}

pub fn settings_json(s: &SettingsView) -> Vec<u8> {
    to_json(&SettingsBody {
        fwd_max: decimal(s.forward_max),
        rev_max: decimal(s.reflected_max),
        vswr_max: decimal(s.vswr_max),
        rev_min: decimal(s.reflected_min),
        cooldown: s.cooldown_ms,
        auto_unlock: flag(s.auto_unlock),
    })
}

fn to_json(body: &impl Serialize) -> Vec<u8> {
    // Plain structs of strings and integers always serialise.
    serde_json::to_vec(body).unwrap_or_else(|e| {
        debug!("API: serialise failed ({})", e);
        b"{}".to_vec()
    })
}

// ---------------------------------------------------------------------------
// Settings body
// ---------------------------------------------------------------------------

/// Why a settings body was ignored as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyError {
    TooLarge,
    Syntax,
    NotAnObject,
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => write!(f, "body exceeds {} bytes", MAX_BODY_LEN),
            Self::Syntax => write!(f, "not valid JSON"),
            Self::NotAnObject => write!(f, "not a JSON object"),
        }
    }
}

/// Decode a partial settings object.
///
/// Unknown keys are ignored.  Numbers may be JSON numbers or numeric
/// strings (the API emits the latter).  `auto_unlock` takes a bool, the
/// strings `"true"`/`"false"`, or an integer (non-zero = on).  A present
/// field of the wrong type becomes a per-field [`ValidationError::Malformed`].
pub fn parse_settings(body: &[u8]) -> Result<PartialPolicy, BodyError> {
    if body.len() > MAX_BODY_LEN {
        return Err(BodyError::TooLarge);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| BodyError::Syntax)?;
    let Value::Object(map) = value else {
        return Err(BodyError::NotAnObject);
    };

    let number = |field: PolicyField| -> FieldValue<f64> {
        map.get(field.wire_name()).map(|v| as_number(v, field))
    };
    let threshold = |field: PolicyField| -> FieldValue<f32> {
        number(field).map(|r| r.map(|v| v as f32))
    };

    Ok(PartialPolicy {
        forward_max: threshold(PolicyField::ForwardMax),
        reflected_max: threshold(PolicyField::ReflectedMax),
        vswr_max: threshold(PolicyField::VswrMax),
        reflected_min: threshold(PolicyField::ReflectedMin),
        forward_min: threshold(PolicyField::ForwardMin),
        cooldown_ms: number(PolicyField::Cooldown),
        auto_unlock: map
            .get(PolicyField::AutoUnlock.wire_name())
            .map(as_flag),
    })
}

fn as_number(v: &Value, field: PolicyField) -> Result<f64, ValidationError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or(ValidationError::Malformed(field))
}

fn as_flag(v: &Value) -> Result<bool, ValidationError> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i != 0)
            .ok_or(ValidationError::Malformed(PolicyField::AutoUnlock)),
        _ => Err(ValidationError::Malformed(PolicyField::AutoUnlock)),
    }
}
