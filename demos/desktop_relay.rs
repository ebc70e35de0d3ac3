//! Desktop relay simulator.
//!
//! Runs the relay firmware logic on a desktop with a simulated relay pin and
//! WiFi, a real MQTT client and the HTTP configuration portal:
//! - Portal at http://localhost:8080 (`/status`, `/switch?on=true`, `/store?...`, `/reboot`)
//! - Configuration persisted in a file (default `relay-config.bin`)
//! - MQTT control on `/<client id><suffix>` once a broker is configured
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_relay --features web,mqtt -- [config-file]
//! ```
//!
//! On first start the configuration is blank, so the simulated WiFi falls
//! back to the access point. Store a network and a broker, then restart:
//!
//! ```sh
//! curl 'http://localhost:8080/store?ssid=Home&password=secret&server=localhost&reboot=1'
//! ```
//!
//! A restart request ends the process; run it again to boot with the saved
//! configuration. `RUST_LOG` controls log output (default `info`).

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_relay::hal::{FileStorage, MockRelayPin, MockWifi};
use esp_relay::services::{run_server, RumqttClient, SharedDevice, WebServerConfig};
use esp_relay::{ConfigStore, RelayDevice};
use log::info;

/// Scheduler pass interval in milliseconds
const LOOP_INTERVAL_MS: u64 = 10;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "relay-config.bin".to_string());
    info!("[Config] Using {}", path);

    let mut store = ConfigStore::new(FileStorage::new(&path));
    let (config, initialized) = store.load();

    // The configured network is always in range on the desktop
    let wifi = MockWifi::new().with_network(&config.ssid);
    let mqtt = RumqttClient::new().with_connect_timeout(Duration::from_secs(2));

    let device = RelayDevice::start(
        store,
        (config, initialized),
        MockRelayPin::new(),
        wifi,
        mqtt,
        0,
    )
    .map_err(|e| anyhow::anyhow!("relay init failed: {:?}", e))?;
    let shared = Arc::new(SharedDevice::new(device));

    // Control loop on a plain thread: the blocking MQTT client runs its own
    // runtime and must stay outside tokio.
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let control = Arc::clone(&shared);
    thread::spawn(move || {
        while !control.restart_requested() {
            control.run_once();
            thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
        }
        let _ = done_tx.send(());
    });

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        tokio::select! {
            result = run_server(Arc::clone(&shared), WebServerConfig::default()) => result?,
            _ = done_rx => info!("Restart requested, exiting"),
        }
        Ok::<_, anyhow::Error>(())
    })
}
