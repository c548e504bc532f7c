//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]: one connection attempt at boot, then
//! supervision from the network thread.  The sampling thread never waits
//! on anything here.
//!
//! ## cfg gating
//!
//! - **`espidf`**: [`EspStation`] drives `esp_idf_svc::wifi::BlockingWifi`.
//! - **host**: [`SimStation`] with scriptable failures for tests.
//!
//! ## Reconnection policy
//!
//! On failure or link loss the adapter waits an exponential backoff
//! (2 s → 4 s → 8 s … capped at 30 s) before the next attempt.

use core::fmt;

use log::{error, info, warn};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

/// Link transitions reported by [`ConnectivityPort::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Up,
    Down,
}

pub trait ConnectivityPort {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Detect loss and retry when the backoff has expired.
    fn poll(&mut self, now_ms: u64) -> Option<LinkEvent>;
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
}

/// Platform half of the adapter: one blocking attempt at a time.
pub trait StationLink {
    fn join(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn leave(&mut self);
    fn is_up(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter<L: StationLink> {
    link: L,
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    initial_backoff_secs: u32,
    max_backoff_secs: u32,
    backoff_secs: u32,
    next_attempt_ms: u64,
}

impl<L: StationLink> WifiAdapter<L> {
    pub fn new(link: L, initial_backoff_secs: u32, max_backoff_secs: u32) -> Self {
        Self {
            link,
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            initial_backoff_secs,
            max_backoff_secs,
            backoff_secs: initial_backoff_secs,
            next_attempt_ms: 0,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_secs(&self) -> u32 {
        self.backoff_secs
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_secs = self.initial_backoff_secs;
    }

    fn schedule_retry(&mut self, attempt: u32, now_ms: u64) {
        self.state = WifiState::Reconnecting { attempt };
        self.next_attempt_ms = now_ms + u64::from(self.backoff_secs) * 1000;
        self.backoff_secs = (self.backoff_secs * 2).min(self.max_backoff_secs);
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl<L: StationLink> ConnectivityPort for WifiAdapter<L> {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.link.join(&self.ssid, &self.password) {
            Ok(()) => {
                self.on_connected();
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.schedule_retry(0, now_ms);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.link.leave();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.link.is_up()
    }

    fn poll(&mut self, now_ms: u64) -> Option<LinkEvent> {
        match self.state {
            WifiState::Reconnecting { attempt } if now_ms >= self.next_attempt_ms => {
                info!("WiFi: reconnect attempt {} (backoff {}s)", attempt + 1, self.backoff_secs);
                match self.link.join(&self.ssid, &self.password) {
                    Ok(()) => {
                        self.on_connected();
                        info!("WiFi: reconnected");
                        Some(LinkEvent::Up)
                    }
                    Err(_) => {
                        self.schedule_retry(attempt + 1, now_ms);
                        None
                    }
                }
            }
            WifiState::Connected if !self.link.is_up() => {
                warn!("WiFi: connection lost, entering reconnect");
                self.schedule_retry(0, now_ms);
                Some(LinkEvent::Down)
            }
            _ => None,
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
pub use esp::EspStation;

#[cfg(feature = "espidf")]
mod esp {
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::warn;

    use super::{ConnectivityError, StationLink};

    pub struct EspStation {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl EspStation {
        pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
            Self { wifi }
        }

        /// Station IPv4 address, once DHCP has completed.
        pub fn ip(&self) -> Option<esp_idf_svc::ipv4::Ipv4Addr> {
            self.wifi.wifi().sta_netif().get_ip_info().ok().map(|i| i.ip)
        }

        fn try_join(&mut self, ssid: &str, password: &str) -> anyhow::Result<()> {
            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| anyhow::anyhow!("ssid too long"))?,
                password: password
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("password too long"))?,
                auth_method: if password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            });
            self.wifi.set_configuration(&config)?;
            if !self.wifi.is_started()? {
                self.wifi.start()?;
            }
            self.wifi.connect()?;
            self.wifi.wait_netif_up()?;
            Ok(())
        }
    }

    impl StationLink for EspStation {
        fn join(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
            self.try_join(ssid, password).map_err(|e| {
                warn!("WiFi(espidf): {}", e);
                ConnectivityError::ConnectionFailed
            })
        }

        fn leave(&mut self) {
            if let Err(e) = self.wifi.disconnect() {
                warn!("WiFi(espidf): disconnect failed: {}", e);
            }
        }

        fn is_up(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host station
// ───────────────────────────────────────────────────────────────

/// In-memory station.  `fail_next` joins fail, then joins succeed.
#[derive(Debug, Default)]
pub struct SimStation {
    pub fail_next: u32,
    pub up: bool,
    pub joins: u32,
}

impl StationLink for SimStation {
    fn join(&mut self, ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        self.joins += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            warn!("WiFi(sim): simulated failure joining '{}'", ssid);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.up = true;
        Ok(())
    }

    fn leave(&mut self) {
        self.up = false;
    }

    fn is_up(&self) -> bool {
        self.up
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
