//! ESP32 relay firmware.
//!
//! This is the main entry point for the relay board. It boots the relay
//! into its configured state, then runs a cooperative loop that:
//! - Supervises WiFi (station, then access point fallback after 60 s)
//! - Keeps the MQTT session alive and applies relay commands
//! - Serves the configuration portal (if `esp32-http` is enabled)
//! - Blinks the on-board LED while associating and lights it during broker
//!   connect attempts
//!
//! # Build
//!
//! ```bash
//! # WiFi + MQTT
//! cargo build --release --features esp32-mqtt
//!
//! # Full (portal + mDNS + MQTT)
//! cargo build --release --features esp32-net
//! ```
//!
//! On a blank device the configuration can be seeded at build time with
//! `RELAY_WIFI_SSID`, `RELAY_WIFI_PASSWORD`, `RELAY_MQTT_SERVER`,
//! `RELAY_MQTT_PORT` and `RELAY_MDNS_DOMAIN`. A stored configuration always
//! wins over these.

use std::thread;
use std::time::Duration;

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_relay::config::DEFAULT_MQTT_PORT;
use esp_relay::hal::esp32::{Esp32Clock, Esp32Mqtt, Esp32RelayPin, Esp32Storage, Esp32Wifi};
use esp_relay::indicator::PinLed;
use esp_relay::traits::Clock;
use esp_relay::{ConfigStore, DeviceConfig, RelayDevice};
use log::{info, warn};

/// Scheduler pass interval in milliseconds
const LOOP_INTERVAL_MS: u64 = 10;

/// On-board LED (active low on most dev boards)
const STATUS_LED_GPIO: u8 = 2;

/// Time given to the portal to flush its reply before restarting
const RESTART_DELAY_MS: u64 = 500;

/// Seed an uninitialized configuration from build-time variables.
fn with_build_overrides(mut config: DeviceConfig) -> DeviceConfig {
    if let Some(ssid) = option_env!("RELAY_WIFI_SSID") {
        config = config.with_wifi(ssid, option_env!("RELAY_WIFI_PASSWORD").unwrap_or(""));
    }
    if let Some(server) = option_env!("RELAY_MQTT_SERVER") {
        let port = option_env!("RELAY_MQTT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_MQTT_PORT);
        config = config.with_mqtt_server(server, port);
    }
    if let Some(domain) = option_env!("RELAY_MDNS_DOMAIN") {
        config = config.with_mdns_domain(domain);
    }
    config
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    info!("ESP Relay starting");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let clock = Esp32Clock;

    // =========================================================================
    // Configuration
    // =========================================================================
    let mut store = ConfigStore::new(Esp32Storage::new(nvs.clone())?);
    let (mut config, initialized) = store.load();
    if !initialized {
        config = with_build_overrides(config);
    }
    info!(
        "[Config] Relay on GPIO{} (active {})",
        config.relay_pin,
        if config.relay_active_high { "high" } else { "low" }
    );

    // =========================================================================
    // Device
    // =========================================================================
    let pin = Esp32RelayPin::new(config.relay_pin);
    let led = if config.relay_pin == STATUS_LED_GPIO {
        warn!("[Config] Relay on GPIO{}, status LED disabled", STATUS_LED_GPIO);
        None
    } else {
        Some(PinLed::new(Esp32RelayPin::new(STATUS_LED_GPIO), false)?)
    };
    let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let mut device = RelayDevice::start(
        store,
        (config, initialized),
        pin,
        wifi,
        Esp32Mqtt::new(),
        clock.now_ms(),
    )?
    .with_status_led(led);

    // =========================================================================
    // Configuration Portal
    // =========================================================================
    #[cfg(feature = "esp32-http")]
    let (_server, portal) = {
        use esp_relay::hal::esp32::{Esp32HttpServer, Esp32SharedState};
        use esp_relay::traits::PORTAL_SERVICE;
        use std::sync::{Arc, Mutex};

        let shared = Arc::new(Mutex::new(Esp32SharedState::default()));
        let server = Esp32HttpServer::new(PORTAL_SERVICE.port, shared.clone())?;
        (server, shared)
    };

    info!("Starting control loop");

    // =========================================================================
    // Main Loop
    // =========================================================================
    loop {
        let now = clock.now_ms();
        device.run_once(now);

        // ---------------------------------------------------------------------
        // Portal requests
        // ---------------------------------------------------------------------
        #[cfg(feature = "esp32-http")]
        {
            let pending = {
                let mut guard = portal.lock().unwrap();
                guard.status = device.status(now);
                guard.pending.take()
            };
            if let Some(request) = pending {
                match device.handle_portal(request, now) {
                    Ok(reply) if reply.requests_restart() => {
                        info!("[Portal] Restarting");
                        thread::sleep(Duration::from_millis(RESTART_DELAY_MS));
                        esp_idf_hal::reset::restart();
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("[Portal] Request failed: {}", e),
                }
            }
        }

        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}
