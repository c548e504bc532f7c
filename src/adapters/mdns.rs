//! mDNS service advertisement adapter.
//!
//! Advertises `<hostname>.local` and `_http._tcp` on the API port, with a
//! `version` TXT record.  Uses the ESP-IDF mDNS component on the device
//! and is a no-op on host builds.
//!
//! Lifecycle is tied to WiFi: start on link up, stop on link down.

use log::info;

const SERVICE_TYPE: &str = "_http";
const SERVICE_PROTO: &str = "_tcp";

/// mDNS advertisement adapter.
pub struct MdnsAdapter {
    hostname: heapless::String<32>,
    port: u16,
    active: bool,
}

impl MdnsAdapter {
    /// Hostnames longer than 31 bytes are truncated.
    pub fn new(hostname: &str, port: u16) -> Self {
        let mut h = heapless::String::new();
        for c in hostname.chars() {
            if h.push(c).is_err() || h.len() >= 31 {
                break;
            }
        }
        Self {
            hostname: h,
            port,
            active: false,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Whether mDNS is currently advertising.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start hostname + service advertisement.  Call once the station has an IP.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        if self.platform_start() {
            self.active = true;
            info!(
                "mDNS: advertising {}.local {}.{}:{}",
                self.hostname, SERVICE_TYPE, SERVICE_PROTO, self.port
            );
        }
    }

    /// Stop advertisement.  Call on link loss.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.platform_stop();
        self.active = false;
        info!("mDNS: stopped");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(feature = "espidf")]
    fn platform_start(&self) -> bool {
        use esp_idf_svc::sys::*;

        let mut hostname_buf = [0u8; 32];
        let hb = self.hostname.as_bytes();
        hostname_buf[..hb.len()].copy_from_slice(hb);
        let version = concat!(env!("CARGO_PKG_VERSION"), "\0");

        // SAFETY: every pointer is a NUL-terminated buffer that outlives the
        // call; the mDNS component copies what it keeps.
        unsafe {
            let ret = mdns_init();
            if ret != ESP_OK as i32 {
                log::error!("mDNS: mdns_init failed ({})", ret);
                return false;
            }
            mdns_hostname_set(hostname_buf.as_ptr().cast());
            mdns_instance_name_set(b"SWR Guard\0".as_ptr().cast());

            let ret = mdns_service_add(
                b"SWR Guard API\0".as_ptr().cast(),
                b"_http\0".as_ptr().cast(),
                b"_tcp\0".as_ptr().cast(),
                self.port,
                core::ptr::null_mut(),
                0,
            );
            if ret != ESP_OK as i32 {
                log::error!("mDNS: service add failed ({})", ret);
                mdns_free();
                return false;
            }
            mdns_service_txt_item_set(
                b"_http\0".as_ptr().cast(),
                b"_tcp\0".as_ptr().cast(),
                b"version\0".as_ptr().cast(),
                version.as_ptr().cast(),
            );
        }
        true
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_start(&self) -> bool {
        info!(
            "mDNS(sim): registered {}.local v={}",
            self.hostname,
            env!("CARGO_PKG_VERSION")
        );
        true
    }

    #[cfg(feature = "espidf")]
    fn platform_stop(&self) {
        // SAFETY: only reached after a successful mdns_init.
        unsafe {
            esp_idf_svc::sys::mdns_free();
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_stop(&self) {
        info!("mDNS(sim): unregistered");
    }
}
