//! mDNS adapter: hostname lookup and advertisement.
//!
//! Resolves other loggers' hostnames during negotiation and, once serving,
//! advertises `<hostname>.local` with an `_http._tcp` service for the event
//! stream.  Uses the ESP-IDF mDNS component on target and an in-memory host
//! table on simulation targets.

use core::net::Ipv4Addr;

use log::info;

use crate::error::NetworkError;

const MDNS_SERVICE_TYPE: &str = "_http";
#[allow(dead_code)]
const MDNS_SERVICE_PROTO: &str = "_tcp";
pub const MDNS_SERVICE_PORT: u16 = 80;

/// How long a lookup waits for an answer.
pub const QUERY_TIMEOUT_MS: u32 = 2_000;

/// Longest hostname the adapter handles (mDNS label limit is 63).
const MAX_HOSTNAME: usize = 63;

fn validate_hostname(name: &str) -> Result<(), NetworkError> {
    if name.is_empty()
        || name.len() > MAX_HOSTNAME
        || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err(NetworkError::InvalidHostname);
    }
    Ok(())
}

/// Null-terminated copy of `name`.
#[cfg(target_os = "espidf")]
fn c_name(name: &str) -> [u8; MAX_HOSTNAME + 1] {
    let mut buf = [0u8; MAX_HOSTNAME + 1];
    let n = name.len().min(MAX_HOSTNAME);
    buf[..n].copy_from_slice(&name.as_bytes()[..n]);
    buf
}

pub struct MdnsAdapter {
    hostname: heapless::String<64>,
    active: bool,
    initialised: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_hosts: std::collections::HashMap<String, Ipv4Addr>,
}

impl Default for MdnsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MdnsAdapter {
    pub fn new() -> Self {
        Self {
            hostname: heapless::String::new(),
            active: false,
            initialised: false,
            #[cfg(not(target_os = "espidf"))]
            sim_hosts: std::collections::HashMap::new(),
        }
    }

    /// Whether mDNS is currently advertising.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Look `name` up; `Ok(None)` when nobody answers within the timeout.
    pub fn query_a(&mut self, name: &str) -> Result<Option<Ipv4Addr>, NetworkError> {
        validate_hostname(name)?;
        self.ensure_init()?;
        self.platform_query(name)
    }

    /// Advertise `hostname`.  Call after the station has its address.
    pub fn start(&mut self, hostname: &str) -> Result<(), NetworkError> {
        validate_hostname(hostname)?;
        if self.active && self.hostname.as_str() == hostname {
            return Ok(());
        }
        self.ensure_init()?;
        self.hostname = crate::config::hstr(hostname);
        self.platform_advertise()?;
        self.active = true;
        info!(
            "mDNS: advertising {}.local → {}:{}",
            self.hostname, MDNS_SERVICE_TYPE, MDNS_SERVICE_PORT
        );
        Ok(())
    }

    /// Stop answering.  Call before the station leaves the network.
    pub fn stop(&mut self) {
        if !self.initialised {
            return;
        }
        self.platform_stop();
        self.active = false;
        self.initialised = false;
        info!("mDNS: stopped");
    }

    fn ensure_init(&mut self) -> Result<(), NetworkError> {
        if !self.initialised {
            self.platform_init()?;
            self.initialised = true;
        }
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&self) -> Result<(), NetworkError> {
        // SAFETY: mdns_init allocates the responder once; guarded by
        // `initialised`.
        let ret = unsafe { esp_idf_svc::sys::mdns_init() };
        if ret != esp_idf_svc::sys::ESP_OK as i32 {
            log::error!("mDNS: mdns_init failed ({})", ret);
            return Err(NetworkError::Driver(ret));
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_query(&self, name: &str) -> Result<Option<Ipv4Addr>, NetworkError> {
        use esp_idf_svc::sys::*;
        let host = c_name(name);
        let mut addr = esp_ip4_addr_t { addr: 0 };
        // SAFETY: `host` is null-terminated and outlives the call; `addr`
        // is a valid out-pointer.
        let ret = unsafe { mdns_query_a(host.as_ptr() as *const _, QUERY_TIMEOUT_MS, &mut addr) };
        match ret {
            r if r == ESP_OK as i32 => {
                // lwIP stores the address in network byte order.
                Ok(Some(Ipv4Addr::from(u32::from_be(addr.addr))))
            }
            r if r == ESP_ERR_NOT_FOUND as i32 => Ok(None),
            r => Err(NetworkError::Driver(r)),
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_advertise(&self) -> Result<(), NetworkError> {
        use esp_idf_svc::sys::*;
        let host = c_name(&self.hostname);
        // SAFETY: every pointer is to a null-terminated buffer that outlives
        // the call; mdns copies what it keeps.
        unsafe {
            let ret = mdns_hostname_set(host.as_ptr() as *const _);
            if ret != ESP_OK as i32 {
                return Err(NetworkError::Driver(ret));
            }
            mdns_instance_name_set(b"Slot Car Logger\0".as_ptr() as *const _);
            mdns_service_remove(b"_http\0".as_ptr() as *const _, b"_tcp\0".as_ptr() as *const _);
            let ret = mdns_service_add(
                b"Slot Car Logger\0".as_ptr() as *const _,
                b"_http\0".as_ptr() as *const _,
                b"_tcp\0".as_ptr() as *const _,
                MDNS_SERVICE_PORT,
                core::ptr::null_mut(),
                0,
            );
            if ret != ESP_OK as i32 {
                return Err(NetworkError::Driver(ret));
            }
        }
        info!(
            "mDNS(espidf): registered {}.local {}:{} v={}",
            self.hostname,
            MDNS_SERVICE_TYPE,
            MDNS_SERVICE_PORT,
            env!("CARGO_PKG_VERSION")
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&self) {
        // SAFETY: only called after a successful mdns_init.
        unsafe {
            esp_idf_svc::sys::mdns_free();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&self) -> Result<(), NetworkError> {
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_query(&self, name: &str) -> Result<Option<Ipv4Addr>, NetworkError> {
        Ok(self.sim_hosts.get(name).copied())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_advertise(&self) -> Result<(), NetworkError> {
        info!("mDNS(sim): registered {}.local", self.hostname);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&self) {
        info!("mDNS(sim): unregistered");
    }

    /// Simulation: make `name` answer with `ip`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_register(&mut self, name: &str, ip: Ipv4Addr) {
        self.sim_hosts.insert(name.to_string(), ip);
    }
}
