//! The relay device: every component wired together.
//!
//! [`RelayDevice`] is the explicit context object the control loop owns. It
//! holds the active configuration, the config store, the relay, the WiFi
//! supervisor and the broker session, and performs one scheduler pass per
//! [`run_once`](RelayDevice::run_once) call.
//!
//! # Example
//!
//! ```rust
//! use esp_relay::config::DeviceConfig;
//! use esp_relay::device::RelayDevice;
//! use esp_relay::hal::{MockMqtt, MockRelayPin, MockStorage, MockWifi};
//! use esp_relay::store::ConfigStore;
//!
//! let mut store = ConfigStore::new(MockStorage::new());
//! let loaded = store.load();
//!
//! let mut device = RelayDevice::start(
//!     store,
//!     loaded,
//!     MockRelayPin::new(),
//!     MockWifi::new(),
//!     MockMqtt::new(),
//!     0,
//! )
//! .unwrap();
//!
//! device.run_once(100);
//! assert!(!device.status(100).relay_on);
//! ```

use core::fmt;
use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::commands::RelayCommand;
use crate::config::DeviceConfig;
use crate::connectivity::{ConnectivitySupervisor, WifiMode};
use crate::indicator::StatusIndicator;
use crate::messaging::{MessagingSession, SessionError, SessionState};
use crate::portal::{ConfigUpdate, PortalReply, PortalRequest};
use crate::relay::{RelayController, SwitchOutcome};
use crate::store::ConfigStore;
use crate::traits::{MqttClient, NoLed, NvStorage, RelayPin, StatusLed, WifiDriver};

/// Snapshot of the device for the status endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DeviceStatus {
    /// WiFi mode
    pub wifi_mode: WifiMode,
    /// Broker session state
    pub session: SessionState,
    /// Logical relay state
    pub relay_on: bool,
    /// Seconds since start
    pub uptime_secs: u64,
    /// Whether a stored configuration was found at boot
    pub initialized: bool,
    /// A saved configuration waits for a restart to take effect
    pub restart_pending: bool,
    /// Address of the active interface
    pub ip: Option<Ipv4Addr>,
}

/// Error from a portal request.
#[derive(Debug)]
pub enum DeviceError<PE, SE> {
    /// Relay pin error.
    Pin(PE),
    /// Config storage error.
    Storage(SE),
}

impl<PE: fmt::Debug, SE: fmt::Debug> fmt::Display for DeviceError<PE, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Pin(e) => write!(f, "relay pin error: {:?}", e),
            DeviceError::Storage(e) => write!(f, "config storage error: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<PE: fmt::Debug, SE: fmt::Debug> std::error::Error for DeviceError<PE, SE> {}

/// The relay device.
///
/// # Type Parameters
///
/// - `P`: Relay output pin
/// - `W`: WiFi driver
/// - `C`: MQTT client
/// - `S`: Non-volatile config storage
/// - `L`: Connectivity indicator LED (none by default)
pub struct RelayDevice<P, W, C, S, L = NoLed>
where
    P: RelayPin,
    W: WifiDriver,
    C: MqttClient,
    S: NvStorage,
    L: StatusLed,
{
    config: DeviceConfig,
    store: ConfigStore<S>,
    relay: RelayController<P>,
    wifi: ConnectivitySupervisor<W>,
    session: MessagingSession<C>,
    indicator: StatusIndicator<L>,
    started_ms: u64,
    initialized: bool,
    restart_pending: bool,
}

impl<P, W, C, S> RelayDevice<P, W, C, S>
where
    P: RelayPin,
    W: WifiDriver,
    C: MqttClient,
    S: NvStorage,
{
    /// Boot the device.
    ///
    /// `loaded` is the result of [`ConfigStore::load`]. The relay is set to
    /// its boot state first, then networking is started and the broker
    /// session configured.
    pub fn start(
        store: ConfigStore<S>,
        loaded: (DeviceConfig, bool),
        pin: P,
        wifi: W,
        mqtt: C,
        now_ms: u64,
    ) -> Result<Self, P::Error> {
        Self::start_with(
            store,
            loaded,
            pin,
            ConnectivitySupervisor::new(wifi),
            mqtt,
            now_ms,
        )
    }

    /// Boot with a preconfigured supervisor (e.g. a custom station timeout).
    pub fn start_with(
        store: ConfigStore<S>,
        loaded: (DeviceConfig, bool),
        pin: P,
        mut wifi: ConnectivitySupervisor<W>,
        mqtt: C,
        now_ms: u64,
    ) -> Result<Self, P::Error> {
        let (config, initialized) = loaded;
        if !initialized {
            info!("[Config] Running with defaults");
        }

        let mut relay = RelayController::new(pin, &config);
        relay.initialize(config.relay_on_boot)?;

        wifi.bring_up(&config, now_ms);

        let mut session = MessagingSession::new(mqtt);
        session.configure(&config);

        Ok(Self {
            config,
            store,
            relay,
            wifi,
            session,
            indicator: StatusIndicator::new(NoLed),
            started_ms: now_ms,
            initialized,
            restart_pending: false,
        })
    }

    /// Attach a connectivity indicator LED.
    pub fn with_status_led<L: StatusLed>(self, led: L) -> RelayDevice<P, W, C, S, L> {
        RelayDevice {
            config: self.config,
            store: self.store,
            relay: self.relay,
            wifi: self.wifi,
            session: self.session,
            indicator: StatusIndicator::new(led),
            started_ms: self.started_ms,
            initialized: self.initialized,
            restart_pending: self.restart_pending,
        }
    }
}

impl<P, W, C, S, L> RelayDevice<P, W, C, S, L>
where
    P: RelayPin,
    W: WifiDriver,
    C: MqttClient,
    S: NvStorage,
    L: StatusLed,
{
    /// One scheduler pass.
    ///
    /// Monitors connectivity, then services the broker session and applies
    /// at most one inbound command. The broker is only serviced while
    /// associated in station mode; otherwise the session state just follows
    /// the client.
    pub fn run_once(&mut self, now_ms: u64) {
        let mode = self.wifi.monitor(now_ms);
        if mode != WifiMode::StationConnected {
            let state = self.session.refresh();
            self.indicator.update(mode, state, now_ms);
            return;
        }

        if self.session.attempt_due(now_ms) {
            self.indicator.show(true);
        }
        let state = self.session.tick(now_ms);
        self.indicator.update(mode, state, now_ms);
        if state != SessionState::Connected {
            return;
        }

        let Some(msg) = self.session.pump() else {
            return;
        };
        if let Some(cmd) = self.session.interpret(&msg) {
            if let Err(e) = self.handle_command(cmd) {
                error!("[Relay] Command {:?} failed: {:?}", cmd, e);
            }
        }
    }

    /// Switch the relay and announce a change on the control topic.
    pub fn switch_relay(&mut self, on: bool) -> Result<SwitchOutcome, P::Error> {
        let outcome = self.relay.set_relay(on)?;
        if let SwitchOutcome::Switched { on } = outcome {
            self.announce(on);
        }
        Ok(outcome)
    }

    /// Apply a relay command.
    ///
    /// A query publishes the current state without touching the pin.
    pub fn handle_command(&mut self, cmd: RelayCommand) -> Result<SwitchOutcome, P::Error> {
        match cmd.desired_state() {
            Some(on) => self.switch_relay(on),
            None => {
                let on = self.relay.current_state();
                self.announce(on);
                Ok(SwitchOutcome::Unchanged)
            }
        }
    }

    /// Save a partial configuration update.
    ///
    /// The merged configuration is written as a whole record and becomes
    /// the active one. Network and broker settings only take effect after
    /// a restart. Returns the update's reboot flag.
    pub fn apply_update(&mut self, update: &ConfigUpdate) -> Result<bool, S::Error> {
        let mut next = self.config.clone();
        next.apply(update);
        self.store.save(&next)?;

        if next != self.config {
            self.restart_pending = true;
        }
        self.config = next;
        self.initialized = true;
        info!(
            "[Config] Stored{}",
            if update.reboot { ", reboot requested" } else { "" }
        );
        Ok(update.reboot)
    }

    /// Handle a portal request.
    pub fn handle_portal(
        &mut self,
        request: PortalRequest,
        now_ms: u64,
    ) -> Result<PortalReply, DeviceError<P::Error, S::Error>> {
        match request {
            PortalRequest::Status => Ok(PortalReply::Status(self.status(now_ms))),
            PortalRequest::Switch(on) => {
                info!("[Portal] Switch {}", if on { "on" } else { "off" });
                let outcome = self.switch_relay(on).map_err(DeviceError::Pin)?;
                Ok(PortalReply::switched(on, outcome))
            }
            PortalRequest::Store(update) => {
                let reboot = self.apply_update(&update).map_err(DeviceError::Storage)?;
                Ok(PortalReply::Stored { reboot })
            }
            PortalRequest::Reboot => {
                info!("[Portal] Reboot requested");
                Ok(PortalReply::Rebooting)
            }
        }
    }

    /// Status snapshot.
    pub fn status(&self, now_ms: u64) -> DeviceStatus {
        DeviceStatus {
            wifi_mode: self.wifi.mode(),
            session: self.session.state(),
            relay_on: self.relay.current_state(),
            uptime_secs: now_ms.saturating_sub(self.started_ms) / 1000,
            initialized: self.initialized,
            restart_pending: self.restart_pending,
            ip: self.wifi.ip_addr(),
        }
    }

    /// Active configuration (including saved changes awaiting restart).
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The relay controller.
    pub fn relay(&self) -> &RelayController<P> {
        &self.relay
    }

    /// The WiFi supervisor.
    pub fn wifi(&self) -> &ConnectivitySupervisor<W> {
        &self.wifi
    }

    /// Mutable access to the WiFi supervisor.
    pub fn wifi_mut(&mut self) -> &mut ConnectivitySupervisor<W> {
        &mut self.wifi
    }

    /// The broker session.
    pub fn session(&self) -> &MessagingSession<C> {
        &self.session
    }

    /// Mutable access to the broker session.
    pub fn session_mut(&mut self) -> &mut MessagingSession<C> {
        &mut self.session
    }

    /// The config store.
    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    /// The connectivity indicator.
    pub fn indicator(&self) -> &StatusIndicator<L> {
        &self.indicator
    }

    fn announce(&mut self, on: bool) {
        if !self.session.is_enabled() {
            return;
        }
        let topic = self.config.control_topic();
        match self.session.publish(&topic, on) {
            Ok(()) => info!("[MQTT] Published {} = {}", topic, on as u8),
            Err(SessionError::NotConnected) => {}
            Err(e) => warn!("[MQTT] Publish to {} failed: {}", topic, e),
        }
    }
}
