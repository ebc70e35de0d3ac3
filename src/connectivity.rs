//! WiFi connectivity supervision.
//!
//! [`ConnectivitySupervisor`] decides between station mode and the fallback
//! access point. It never blocks: association progress is polled on every
//! scheduler pass and the 60 second station deadline is checked against the
//! caller's clock.
//!
//! # State Machine
//!
//! ```text
//!            bring_up (ssid set)            link up
//!   Off ───────────────────────► Connecting ───────► Connected
//!    │                              │    ▲                │
//!    │ bring_up (no ssid)  deadline │    └── link lost ───┘
//!    ▼                              ▼
//!   AccessPointFallback ◄───────────┘   (terminal until reboot)
//! ```

use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::config::{DeviceConfig, FieldString};
use crate::traits::{WifiDriver, PORTAL_SERVICE};

/// SSID broadcast by the fallback access point.
pub const AP_SSID: &str = "ESP_Relay";

/// WPA2 passphrase of the fallback access point.
pub const AP_PASSWORD: &str = "Pa$$w0rd";

/// How long station association may take before falling back.
pub const STATION_TIMEOUT_MS: u64 = 60_000;

/// Current WiFi mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WifiMode {
    /// Networking not started yet.
    #[default]
    Off,
    /// Station association in progress.
    StationConnecting,
    /// Associated with the configured network.
    StationConnected,
    /// Serving the fallback access point.
    AccessPointFallback,
}

impl WifiMode {
    /// Short label used in logs and the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiMode::Off => "off",
            WifiMode::StationConnecting => "connecting",
            WifiMode::StationConnected => "station",
            WifiMode::AccessPointFallback => "access_point",
        }
    }
}

/// Non-blocking station / access-point supervisor.
///
/// # Type Parameters
///
/// - `W`: WiFi driver implementing [`WifiDriver`]
///
/// # Example
///
/// ```rust
/// use esp_relay::config::DeviceConfig;
/// use esp_relay::connectivity::{ConnectivitySupervisor, WifiMode};
/// use esp_relay::hal::MockWifi;
///
/// let config = DeviceConfig::default().with_wifi("HomeNetwork", "secret");
/// let mut wifi = ConnectivitySupervisor::new(MockWifi::new().with_network("HomeNetwork"));
///
/// assert_eq!(wifi.bring_up(&config, 0), WifiMode::StationConnecting);
/// assert_eq!(wifi.monitor(10), WifiMode::StationConnected);
/// ```
pub struct ConnectivitySupervisor<W: WifiDriver> {
    driver: W,
    mode: WifiMode,
    ssid: FieldString,
    password: FieldString,
    mdns_domain: FieldString,
    deadline_ms: u64,
    station_timeout_ms: u64,
    advertised: bool,
}

impl<W: WifiDriver> ConnectivitySupervisor<W> {
    /// Wrap a driver. Nothing is started until [`bring_up`](Self::bring_up).
    pub fn new(driver: W) -> Self {
        Self {
            driver,
            mode: WifiMode::Off,
            ssid: FieldString::new(),
            password: FieldString::new(),
            mdns_domain: FieldString::new(),
            deadline_ms: 0,
            station_timeout_ms: STATION_TIMEOUT_MS,
            advertised: false,
        }
    }

    /// Override the station association deadline.
    pub fn with_station_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.station_timeout_ms = timeout_ms;
        self
    }

    /// Start networking with the identity from `config`.
    ///
    /// Without an ssid the fallback access point is started right away.
    pub fn bring_up(&mut self, config: &DeviceConfig, now_ms: u64) -> WifiMode {
        self.ssid = config.ssid.clone();
        self.password = config.password.clone();
        self.mdns_domain = config.mdns_domain.clone();
        self.start(now_ms)
    }

    /// Advance the state machine. Call once per scheduler pass.
    pub fn monitor(&mut self, now_ms: u64) -> WifiMode {
        match self.mode {
            WifiMode::StationConnecting => {
                if self.driver.is_link_up() {
                    self.mode = WifiMode::StationConnected;
                    match self.driver.ip_addr() {
                        Some(ip) => info!("[WiFi] Connected to '{}', IP: {}", self.ssid, ip),
                        None => info!("[WiFi] Connected to '{}'", self.ssid),
                    }
                    self.register_mdns();
                } else if now_ms >= self.deadline_ms {
                    warn!(
                        "[WiFi] No connection to '{}' after {} s",
                        self.ssid,
                        self.station_timeout_ms / 1000
                    );
                    self.fall_back();
                }
            }
            WifiMode::StationConnected => {
                if !self.driver.is_link_up() {
                    warn!("[WiFi] Link to '{}' lost, reconnecting", self.ssid);
                    self.start(now_ms);
                }
            }
            WifiMode::Off | WifiMode::AccessPointFallback => {}
        }
        self.mode
    }

    /// Current mode.
    pub fn mode(&self) -> WifiMode {
        self.mode
    }

    /// True while associated in station mode.
    pub fn is_station_connected(&self) -> bool {
        self.mode == WifiMode::StationConnected
    }

    /// Address of the active interface, if any.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.driver.ip_addr()
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &W {
        &self.driver
    }

    /// Get a mutable reference to the driver.
    pub fn driver_mut(&mut self) -> &mut W {
        &mut self.driver
    }

    fn start(&mut self, now_ms: u64) -> WifiMode {
        if self.ssid.is_empty() {
            info!("[WiFi] No network configured");
            self.fall_back();
            return self.mode;
        }

        info!("[WiFi] Connecting to '{}'...", self.ssid);
        match self.driver.begin_station(&self.ssid, &self.password) {
            Ok(()) => {
                self.mode = WifiMode::StationConnecting;
                self.deadline_ms = now_ms.saturating_add(self.station_timeout_ms);
            }
            Err(e) => {
                error!("[WiFi] Station start failed: {:?}", e);
                self.fall_back();
            }
        }
        self.mode
    }

    fn fall_back(&mut self) {
        info!("[WiFi] Starting access point '{}'", AP_SSID);
        if let Err(e) = self.driver.start_access_point(AP_SSID, AP_PASSWORD) {
            error!("[WiFi] Access point start failed: {:?}", e);
        }
        self.mode = WifiMode::AccessPointFallback;
    }

    fn register_mdns(&mut self) {
        if self.advertised || self.mdns_domain.is_empty() {
            return;
        }
        match self.driver.advertise(&self.mdns_domain, &PORTAL_SERVICE) {
            Ok(()) => {
                info!("[WiFi] mDNS responder started: {}.local", self.mdns_domain);
                self.advertised = true;
            }
            Err(e) => warn!("[WiFi] mDNS registration failed: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockWifi;

    fn station_config() -> DeviceConfig {
        DeviceConfig::default().with_wifi("HomeNetwork", "secret")
    }

    // =========================================================================
    // Fallback Tests
    // =========================================================================

    #[test]
    fn empty_ssid_goes_straight_to_access_point() {
        let mut wifi = ConnectivitySupervisor::new(MockWifi::new());
        assert_eq!(
            wifi.bring_up(&DeviceConfig::default(), 0),
            WifiMode::AccessPointFallback
        );
        assert!(wifi.driver().station_attempts.is_empty());
        assert_eq!(
            wifi.driver().access_point,
            Some((AP_SSID.to_string(), AP_PASSWORD.to_string()))
        );
    }

    #[test]
    fn station_timeout_falls_back() {
        let mut wifi = ConnectivitySupervisor::new(MockWifi::new());
        assert_eq!(wifi.bring_up(&station_config(), 1_000), WifiMode::StationConnecting);

        assert_eq!(wifi.monitor(60_999), WifiMode::StationConnecting);
        assert!(wifi.driver().access_point.is_none());

        assert_eq!(wifi.monitor(61_000), WifiMode::AccessPointFallback);
        assert!(wifi.driver().access_point.is_some());
    }

    #[test]
    fn custom_timeout() {
        let mut wifi = ConnectivitySupervisor::new(MockWifi::new()).with_station_timeout_ms(5_000);
        wifi.bring_up(&station_config(), 0);
        assert_eq!(wifi.monitor(5_000), WifiMode::AccessPointFallback);
    }

    #[test]
    fn begin_error_falls_back() {
        let mut driver = MockWifi::new();
        driver.fail_begin = true;
        let mut wifi = ConnectivitySupervisor::new(driver);
        assert_eq!(wifi.bring_up(&station_config(), 0), WifiMode::AccessPointFallback);
    }

    #[test]
    fn access_point_is_terminal() {
        let mut wifi = ConnectivitySupervisor::new(MockWifi::new());
        wifi.bring_up(&DeviceConfig::default(), 0);

        wifi.driver_mut().link_up = true;
        assert_eq!(wifi.monitor(200_000), WifiMode::AccessPointFallback);
    }

    // =========================================================================
    // Station Tests
    // =========================================================================

    #[test]
    fn late_association_before_deadline() {
        let mut wifi = ConnectivitySupervisor::new(MockWifi::new());
        wifi.bring_up(&station_config(), 0);
        assert_eq!(wifi.monitor(10_000), WifiMode::StationConnecting);

        wifi.driver_mut().link_up = true;
        assert_eq!(wifi.monitor(20_000), WifiMode::StationConnected);
        assert!(wifi.is_station_connected());
        assert!(wifi.ip_addr().is_some());
    }

    #[test]
    fn link_loss_restarts_station() {
        let mut wifi =
            ConnectivitySupervisor::new(MockWifi::new().with_network("HomeNetwork"));
        wifi.bring_up(&station_config(), 0);
        wifi.monitor(1);

        wifi.driver_mut().link_up = false;
        assert_eq!(wifi.monitor(100_000), WifiMode::StationConnecting);
        assert_eq!(wifi.driver().station_attempts.len(), 2);

        // New deadline counts from the restart
        wifi.driver_mut().reachable = None;
        wifi.driver_mut().link_up = false;
        assert_eq!(wifi.monitor(159_999), WifiMode::StationConnecting);
        assert_eq!(wifi.monitor(160_000), WifiMode::AccessPointFallback);
    }

    // =========================================================================
    // mDNS Tests
    // =========================================================================

    #[test]
    fn mdns_registered_once_on_connect() {
        let config = station_config().with_mdns_domain("relay");
        let mut wifi =
            ConnectivitySupervisor::new(MockWifi::new().with_network("HomeNetwork"));
        wifi.bring_up(&config, 0);
        wifi.monitor(1);

        wifi.driver_mut().link_up = false;
        wifi.monitor(2);
        wifi.monitor(3);

        let adverts = &wifi.driver().advertised;
        assert_eq!(adverts.len(), 1);
        assert_eq!(adverts[0].0, "relay");
        assert_eq!(adverts[0].1, PORTAL_SERVICE);
    }

    #[test]
    fn no_mdns_without_domain() {
        let mut wifi =
            ConnectivitySupervisor::new(MockWifi::new().with_network("HomeNetwork"));
        wifi.bring_up(&station_config(), 0);
        wifi.monitor(1);
        assert!(wifi.driver().advertised.is_empty());
    }

    #[test]
    fn no_mdns_in_access_point_mode() {
        let config = DeviceConfig::default().with_mdns_domain("relay");
        let mut wifi = ConnectivitySupervisor::new(MockWifi::new());
        wifi.bring_up(&config, 0);
        wifi.monitor(1);
        assert!(wifi.driver().advertised.is_empty());
    }

    #[test]
    fn mode_labels() {
        assert_eq!(WifiMode::Off.as_str(), "off");
        assert_eq!(WifiMode::StationConnected.as_str(), "station");
        assert_eq!(WifiMode::AccessPointFallback.as_str(), "access_point");
    }
}
