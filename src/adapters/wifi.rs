//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`]: scan, associate, hostname and address
//! queries, with hostname lookups and advertisement delegated to the
//! [`MdnsAdapter`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use core::net::Ipv4Addr;

use log::{info, warn};

use super::mdns::MdnsAdapter;
use crate::app::ports::NetworkPort;
use crate::error::NetworkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), NetworkError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(NetworkError::ConnectFailed);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), NetworkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(NetworkError::AuthFailed);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Idle,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    mdns: MdnsAdapter,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimAir,
}

impl WifiAdapter {
    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn mdns(&mut self) -> &mut MdnsAdapter {
        &mut self.mdns
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            state: WifiState::Idle,
            mdns: MdnsAdapter::new(),
            wifi,
        }
    }

    #[cfg(target_os = "espidf")]
    fn ensure_started(&mut self) -> Result<(), NetworkError> {
        if self.wifi.is_started().unwrap_or(false) {
            return Ok(());
        }
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|e| NetworkError::Driver(e.code()))?;
        self.wifi.start().map_err(|e| NetworkError::Driver(e.code()))
    }

    #[cfg(target_os = "espidf")]
    fn platform_scan(&mut self, ssid: &str) -> Result<bool, NetworkError> {
        self.ensure_started()?;
        let aps = self.wifi.scan().map_err(|e| NetworkError::Driver(e.code()))?;
        info!("WiFi: scan found {} access points", aps.len());
        Ok(aps.iter().any(|ap| ap.ssid.as_str() == ssid))
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        self.ensure_started()?;
        let config = ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| NetworkError::ConnectFailed)?,
            password: password.try_into().map_err(|_| NetworkError::AuthFailed)?,
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(config))
            .map_err(|e| NetworkError::Driver(e.code()))?;
        // The SSID was seen in the scan, so a refused connect is the
        // access point rejecting the credentials.
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect refused ({})", e);
            NetworkError::AuthFailed
        })?;
        self.wifi.wait_netif_up().map_err(|e| {
            warn!("WiFi: no address ({})", e);
            NetworkError::ConnectFailed
        })
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed ({})", e);
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_set_hostname(&mut self, name: &str) -> Result<(), NetworkError> {
        self.wifi
            .wifi_mut()
            .sta_netif_mut()
            .set_hostname(name)
            .map_err(|e| NetworkError::Driver(e.code()))
    }

    #[cfg(target_os = "espidf")]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        if self.state != WifiState::Connected {
            return None;
        }
        self.wifi.wifi().sta_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Idle,
            mdns: MdnsAdapter::new(),
            sim: SimAir::default(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_scan(&mut self, ssid: &str) -> Result<bool, NetworkError> {
        Ok(self.sim.networks.iter().any(|(s, _)| s == ssid))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        match self.sim.networks.iter().find(|(s, _)| s == ssid) {
            Some((_, expected)) if expected == password => {
                info!("WiFi(sim): joined '{}' as '{}'", ssid, self.sim.hostname);
                Ok(())
            }
            Some(_) => Err(NetworkError::AuthFailed),
            None => Err(NetworkError::ConnectFailed),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_set_hostname(&mut self, name: &str) -> Result<(), NetworkError> {
        self.sim.hostname = name.to_string();
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        (self.state == WifiState::Connected).then_some(self.sim.ip)
    }

    /// Simulation: make `ssid` visible with `password`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_add_network(&mut self, ssid: &str, password: &str) {
        self.sim.networks.push((ssid.to_string(), password.to_string()));
    }

    /// Simulation: hostname the station would present.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_hostname(&self) -> &str {
        &self.sim.hostname
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated radio environment.
#[cfg(not(target_os = "espidf"))]
struct SimAir {
    networks: Vec<(String, String)>,
    hostname: String,
    ip: Ipv4Addr,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimAir {
    fn default() -> Self {
        Self {
            networks: Vec::new(),
            hostname: String::new(),
            ip: Ipv4Addr::new(192, 168, 4, 2),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn scan(&mut self, ssid: &str) -> Result<bool, NetworkError> {
        validate_ssid(ssid)?;
        info!("WiFi: scanning for '{}'", ssid);
        self.platform_scan(ssid)
    }

    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        if self.state == WifiState::Connected {
            self.disconnect();
        }

        info!("WiFi: connecting to '{}'", ssid);
        match self.platform_connect(ssid, password) {
            Ok(()) => {
                self.state = WifiState::Connected;
                info!("WiFi: connected (ip={:?})", self.platform_ip());
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                self.state = WifiState::Failed;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        if self.state != WifiState::Connected {
            return;
        }
        self.mdns.stop();
        self.platform_disconnect();
        self.state = WifiState::Idle;
        info!("WiFi: disconnected");
    }

    fn resolve(&mut self, hostname: &str) -> Result<Option<Ipv4Addr>, NetworkError> {
        if self.state != WifiState::Connected {
            return Err(NetworkError::NotConnected);
        }
        self.mdns.query_a(hostname)
    }

    fn set_hostname(&mut self, name: &str) -> Result<(), NetworkError> {
        if name.is_empty() || name.len() > 32 {
            return Err(NetworkError::InvalidHostname);
        }
        self.platform_set_hostname(name)
    }

    fn current_ip(&self) -> Option<Ipv4Addr> {
        self.platform_ip()
    }

    fn advertise(&mut self, hostname: &str) -> Result<(), NetworkError> {
        if self.state != WifiState::Connected {
            return Err(NetworkError::NotConnected);
        }
        self.mdns.start(hostname)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
