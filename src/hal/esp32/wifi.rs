//! WiFi driver for ESP32.
//!
//! Wraps `EspWifi` directly rather than `BlockingWifi`: association and DHCP
//! progress is observed through [`WifiDriver::is_link_up`], so the main loop
//! keeps running while the station connects.
//!
//! # Example
//!
//! ```ignore
//! use esp_relay::hal::esp32::Esp32Wifi;
//! use esp_relay::traits::WifiDriver;
//!
//! let mut wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs))?;
//! wifi.begin_station("HomeNetwork", "secret")?;
//! while !wifi.is_link_up() { /* keep serving the main loop */ }
//! ```

use core::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};
use log::{debug, info};

use crate::traits::{ServiceAdvert, WifiDriver};

/// Channel used by the fallback access point.
const AP_CHANNEL: u8 = 1;

/// Errors from the ESP32 WiFi driver.
#[derive(Debug)]
pub enum Esp32WifiError {
    /// ESP-IDF call failed
    Esp(EspError),
    /// SSID or password longer than the driver accepts
    TooLong(&'static str),
}

impl From<EspError> for Esp32WifiError {
    fn from(e: EspError) -> Self {
        Esp32WifiError::Esp(e)
    }
}

impl core::fmt::Display for Esp32WifiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Esp32WifiError::Esp(e) => write!(f, "WiFi error: {}", e),
            Esp32WifiError::TooLong(what) => write!(f, "WiFi {} too long", what),
        }
    }
}

impl std::error::Error for Esp32WifiError {}

/// WiFi station / access point driver.
pub struct Esp32Wifi {
    wifi: EspWifi<'static>,
    access_point: bool,
    #[cfg(feature = "mdns")]
    mdns: Option<esp_idf_svc::mdns::EspMdns>,
}

impl Esp32Wifi {
    /// Initialize the WiFi driver. The radio stays off until a mode is set.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self {
            wifi,
            access_point: false,
            #[cfg(feature = "mdns")]
            mdns: None,
        })
    }

    /// Stop the driver if it is running, before switching modes.
    fn reset(&mut self) -> Result<(), EspError> {
        if self.wifi.is_started()? {
            self.wifi.stop()?;
        }
        Ok(())
    }

    /// Get the underlying WiFi driver for advanced operations.
    pub fn driver(&self) -> &EspWifi<'static> {
        &self.wifi
    }
}

impl WifiDriver for Esp32Wifi {
    type Error = Esp32WifiError;

    fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        self.reset()?;
        self.access_point = false;

        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: ssid
                    .try_into()
                    .map_err(|_| Esp32WifiError::TooLong("SSID"))?,
                password: password
                    .try_into()
                    .map_err(|_| Esp32WifiError::TooLong("password"))?,
                ..Default::default()
            }))?;

        self.wifi.start()?;
        // Returns immediately; association completes in the background
        self.wifi.connect()?;
        debug!("[WiFi] Station started for '{}'", ssid);
        Ok(())
    }

    fn is_link_up(&self) -> bool {
        !self.access_point && self.wifi.is_up().unwrap_or(false)
    }

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        self.reset()?;

        self.wifi
            .set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
                ssid: ssid
                    .try_into()
                    .map_err(|_| Esp32WifiError::TooLong("SSID"))?,
                password: password
                    .try_into()
                    .map_err(|_| Esp32WifiError::TooLong("password"))?,
                auth_method: AuthMethod::WPA2Personal,
                channel: AP_CHANNEL,
                ..Default::default()
            }))?;

        self.wifi.start()?;
        self.access_point = true;
        info!("[WiFi] Access point '{}' up", ssid);
        Ok(())
    }

    #[cfg(feature = "mdns")]
    fn advertise(&mut self, hostname: &str, service: &ServiceAdvert) -> Result<(), Self::Error> {
        use esp_idf_svc::mdns::EspMdns;

        let mdns = match self.mdns.as_mut() {
            Some(mdns) => mdns,
            None => self.mdns.insert(EspMdns::take()?),
        };
        mdns.set_hostname(hostname)?;
        mdns.add_service(
            None,
            format!("_{}", service.service),
            format!("_{}", service.proto),
            service.port,
            &[],
        )?;
        Ok(())
    }

    #[cfg(not(feature = "mdns"))]
    fn advertise(&mut self, hostname: &str, _service: &ServiceAdvert) -> Result<(), Self::Error> {
        info!("[WiFi] mDNS not built in, skipping {}.local", hostname);
        Ok(())
    }

    fn ip_addr(&self) -> Option<Ipv4Addr> {
        let netif = if self.access_point {
            self.wifi.ap_netif()
        } else if self.is_link_up() {
            self.wifi.sta_netif()
        } else {
            return None;
        };
        netif.get_ip_info().ok().map(|info| info.ip)
    }
}
