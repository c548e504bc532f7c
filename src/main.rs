//! SWR Guard firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Ads1115 / RelayDriver   LogEventSink   MqttPublisher          │
//! │  (AdcPort / RelayPort)   (EventSink)    (StatusPublisher)      │
//! │  WifiAdapter   MdnsAdapter   HTTP server (api::handle)         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  SharedController (Mutex)                              │    │
//! │  │  Measurement · Policy · Interlock · VswrEngine         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  sampler thread: ControlLoop::cycle every 500 ms + TWDT        │
//! │  main thread:    WiFi supervision + mDNS                       │
//! │  httpd task:     API requests                                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::Delay;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_svc::hal::i2c::{I2c, I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use swrguard::adapters::hardware::{bring_up, Hardware};
use swrguard::adapters::log_sink::LogEventSink;
use swrguard::adapters::mdns::MdnsAdapter;
use swrguard::adapters::mqtt::MqttPublisher;
use swrguard::adapters::time::UptimeClock;
use swrguard::adapters::wifi::{ConnectivityPort, EspStation, LinkEvent, WifiAdapter};
use swrguard::adapters::http;
use swrguard::app::service::{ControlLoop, Controller, SharedController};
use swrguard::config::{self, SystemConfig};
use swrguard::drivers::watchdog::{self, Watchdog};
use swrguard::error::HardwareInitError;
use swrguard::pins;
use swrguard::sensors::Sampler;

type Relay = PinDriver<'static, AnyOutputPin, Output>;
type Board = Hardware<I2cDriver<'static>, Delay, Relay>;

const SAMPLER_STACK_BYTES: usize = 8 * 1024;
const SUPERVISE_INTERVAL: Duration = Duration::from_secs(1);

// ── Hardware ──────────────────────────────────────────────────

fn init_hardware<I: I2c>(i2c: impl Peripheral<P = I> + 'static) -> swrguard::error::Result<Board> {
    // SAFETY: each GPIO number is claimed exactly once, here, and pins.rs
    // reserves them for these functions.
    let (sda, scl, relay_pin) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyOutputPin::new(pins::RELAY_GPIO),
        )
    };
    let relay_pin = PinDriver::output(relay_pin).map_err(|_| HardwareInitError::Relay)?;
    let i2c = I2cDriver::new(
        i2c,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)),
    )
    .map_err(|e| HardwareInitError::Bus(e.code()))?;

    bring_up(i2c, Delay::new_default(), pins::ADS1115_ADDRESS, relay_pin)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SWR Guard v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    let clock = UptimeClock::new();
    let peripherals = Peripherals::take()?;

    // ── 2. Relay + ADC (fatal on failure) ─────────────────────
    let Hardware { adc, relay } = match init_hardware(peripherals.i2c0) {
        Ok(hw) => hw,
        Err(e) => {
            error!("HW init failed: {}, restarting", e);
            thread::sleep(Duration::from_secs(1));
            esp_idf_svc::hal::reset::restart();
        }
    };

    let shared = SharedController::new(Controller::new(config.policy, relay));
    let mut control = ControlLoop::new(Sampler::new(adc, config.calibration), shared.clone());

    // ── 3. Network stack (non-blocking setup) ─────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let esp_wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(
        EspStation::new(esp_wifi),
        config.wifi_backoff_initial_secs,
        config.wifi_backoff_max_secs,
    );

    let mut publisher = match MqttPublisher::connect(
        config::MQTT_BROKER_URL,
        config::MQTT_CLIENT_ID,
        config::MQTT_STATUS_TOPIC,
    ) {
        Ok(p) => Some(p),
        Err(e) => {
            warn!("MQTT unavailable ({}), status side channel off", e);
            None
        }
    };

    // ── 4. Sampling actor ─────────────────────────────────────
    let interval = config.sample_interval();
    let _sampler = thread::Builder::new()
        .name("sampler".into())
        .stack_size(SAMPLER_STACK_BYTES)
        .spawn(move || {
            let watchdog = Watchdog::subscribe_current_task(watchdog::TIMEOUT_MS);
            let mut sink = LogEventSink::new();
            control.start(&mut sink);
            loop {
                let started = clock.now_ms();
                control.cycle(started, &mut sink, &mut publisher);
                watchdog.feed();
                let elapsed = Duration::from_millis(clock.now_ms().saturating_sub(started));
                thread::sleep(interval.saturating_sub(elapsed));
            }
        })?;

    // ── 5. WiFi, HTTP, mDNS ───────────────────────────────────
    let mut mdns = MdnsAdapter::new(config::HOSTNAME, config::HTTP_PORT);

    match wifi.set_credentials(config::WIFI_SSID, config::WIFI_PASSWORD) {
        Ok(()) => {
            if wifi.connect(clock.now_ms()).is_ok() {
                if let Some(ip) = wifi.link().ip() {
                    info!("API at http://{}/ ({}.local)", ip, config::HOSTNAME);
                }
                mdns.start();
            }
        }
        Err(e) => warn!("WiFi: {}; running offline, protection unaffected", e),
    }

    let _server = match http::start(config::HTTP_PORT, shared, clock) {
        Ok(s) => Some(s),
        Err(e) => {
            error!("HTTP server failed to start: {}", e);
            None
        }
    };

    info!("System ready.");

    // ── 6. Network supervision ────────────────────────────────
    loop {
        thread::sleep(SUPERVISE_INTERVAL);
        match wifi.poll(clock.now_ms()) {
            Some(LinkEvent::Up) => mdns.start(),
            Some(LinkEvent::Down) => mdns.stop(),
            None => {}
        }
    }
}
