//! Fixed-layout binary persistence of [`DeviceConfig`].
//!
//! The record is written to the start of an [`NvStorage`] region:
//!
//! ```text
//! offset  width  field
//!      0      4  signature "#REL"
//!      4     32  ssid
//!     36     32  password
//!     68     32  mdns_domain
//!    100     32  mqtt_server
//!    132      2  mqtt_port (little endian)
//!    134     32  mqtt_user
//!    166     32  mqtt_password
//!    198     32  mqtt_client_id
//!    230     32  mqtt_topic_suffix
//!    262      1  relay_pin
//!    263      1  relay_active_high
//!    264      1  relay_on_boot
//!    265      1  format version
//! ```
//!
//! Fields are only ever appended. Images written before the version byte
//! existed have `0x00` or `0xFF` at offset 265 and decode as version 0,
//! which has the same layout.
//!
//! # Example
//!
//! ```rust
//! use esp_relay::config::DeviceConfig;
//! use esp_relay::hal::MockStorage;
//! use esp_relay::store::ConfigStore;
//!
//! let mut store = ConfigStore::new(MockStorage::new());
//! let (config, initialized) = store.load();
//! assert!(!initialized);
//! assert_eq!(config, DeviceConfig::default());
//!
//! let config = config.with_wifi("HomeNetwork", "secret");
//! store.save(&config).unwrap();
//! assert_eq!(store.load(), (config, true));
//! ```

use log::{debug, info, warn};

use crate::config::{DeviceConfig, FieldString, MAX_FIELD_LEN};
use crate::traits::NvStorage;

/// Magic bytes marking an initialized record.
pub const SIGNATURE: [u8; 4] = *b"#REL";

/// Version written into the trailing format byte.
pub const FORMAT_VERSION: u8 = 1;

const SSID_OFFSET: usize = SIGNATURE.len();
const PASSWORD_OFFSET: usize = SSID_OFFSET + MAX_FIELD_LEN;
const DOMAIN_OFFSET: usize = PASSWORD_OFFSET + MAX_FIELD_LEN;
const SERVER_OFFSET: usize = DOMAIN_OFFSET + MAX_FIELD_LEN;
const PORT_OFFSET: usize = SERVER_OFFSET + MAX_FIELD_LEN;
const USER_OFFSET: usize = PORT_OFFSET + 2;
const MQTT_PASSWORD_OFFSET: usize = USER_OFFSET + MAX_FIELD_LEN;
const CLIENT_OFFSET: usize = MQTT_PASSWORD_OFFSET + MAX_FIELD_LEN;
const SUFFIX_OFFSET: usize = CLIENT_OFFSET + MAX_FIELD_LEN;
const PIN_OFFSET: usize = SUFFIX_OFFSET + MAX_FIELD_LEN;
const LEVEL_OFFSET: usize = PIN_OFFSET + 1;
const ON_BOOT_OFFSET: usize = LEVEL_OFFSET + 1;
const VERSION_OFFSET: usize = ON_BOOT_OFFSET + 1;

/// Total size of the persisted record in bytes.
pub const RECORD_LEN: usize = VERSION_OFFSET + 1;

/// Encoded record buffer.
pub type Record = [u8; RECORD_LEN];

// ============================================================================
// Encoding
// ============================================================================

fn write_text(buf: &mut [u8], offset: usize, text: &FieldString) {
    let slot = &mut buf[offset..offset + MAX_FIELD_LEN];
    let bytes = text.as_bytes();
    let len = bytes.len().min(MAX_FIELD_LEN);
    slot[..len].copy_from_slice(&bytes[..len]);
    slot[len..].fill(0);
}

fn read_text(buf: &[u8], offset: usize) -> FieldString {
    let slot = &buf[offset..offset + MAX_FIELD_LEN];
    let end = slot.iter().position(|b| *b == 0).unwrap_or(MAX_FIELD_LEN);
    let text = match core::str::from_utf8(&slot[..end]) {
        Ok(text) => text,
        // valid_up_to always lands on a char boundary
        Err(e) => core::str::from_utf8(&slot[..e.valid_up_to()]).unwrap_or_default(),
    };
    let mut out = FieldString::new();
    let _ = out.push_str(text);
    out
}

/// Encode a configuration into the fixed record layout.
pub fn encode_record(config: &DeviceConfig) -> Record {
    let mut buf = [0u8; RECORD_LEN];
    buf[..SIGNATURE.len()].copy_from_slice(&SIGNATURE);
    write_text(&mut buf, SSID_OFFSET, &config.ssid);
    write_text(&mut buf, PASSWORD_OFFSET, &config.password);
    write_text(&mut buf, DOMAIN_OFFSET, &config.mdns_domain);
    write_text(&mut buf, SERVER_OFFSET, &config.mqtt_server);
    buf[PORT_OFFSET..PORT_OFFSET + 2].copy_from_slice(&config.mqtt_port.to_le_bytes());
    write_text(&mut buf, USER_OFFSET, &config.mqtt_user);
    write_text(&mut buf, MQTT_PASSWORD_OFFSET, &config.mqtt_password);
    write_text(&mut buf, CLIENT_OFFSET, &config.mqtt_client_id);
    write_text(&mut buf, SUFFIX_OFFSET, &config.mqtt_topic_suffix);
    buf[PIN_OFFSET] = config.relay_pin;
    buf[LEVEL_OFFSET] = config.relay_active_high as u8;
    buf[ON_BOOT_OFFSET] = config.relay_on_boot as u8;
    buf[VERSION_OFFSET] = FORMAT_VERSION;
    buf
}

/// Decode a record, returning the configuration and its format version.
///
/// Returns `None` if the buffer is too short or the signature does not match.
pub fn decode_record(buf: &[u8]) -> Option<(DeviceConfig, u8)> {
    if buf.len() < RECORD_LEN || buf[..SIGNATURE.len()] != SIGNATURE {
        return None;
    }

    let port = u16::from_le_bytes([buf[PORT_OFFSET], buf[PORT_OFFSET + 1]]);
    let config = DeviceConfig {
        ssid: read_text(buf, SSID_OFFSET),
        password: read_text(buf, PASSWORD_OFFSET),
        mdns_domain: read_text(buf, DOMAIN_OFFSET),
        mqtt_server: read_text(buf, SERVER_OFFSET),
        mqtt_port: port,
        mqtt_user: read_text(buf, USER_OFFSET),
        mqtt_password: read_text(buf, MQTT_PASSWORD_OFFSET),
        mqtt_client_id: read_text(buf, CLIENT_OFFSET),
        mqtt_topic_suffix: read_text(buf, SUFFIX_OFFSET),
        relay_pin: buf[PIN_OFFSET],
        relay_active_high: buf[LEVEL_OFFSET] != 0,
        relay_on_boot: buf[ON_BOOT_OFFSET] != 0,
    };

    let version = match buf[VERSION_OFFSET] {
        0x00 | 0xFF => 0,
        v => v,
    };

    Some((config, version))
}

// ============================================================================
// Config Store
// ============================================================================

/// Loads and saves the device configuration on a non-volatile region.
pub struct ConfigStore<S: NvStorage> {
    storage: S,
}

impl<S: NvStorage> ConfigStore<S> {
    /// Wrap a storage region.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the persisted configuration.
    ///
    /// Returns `(config, true)` if a valid record was found. A missing or
    /// mismatched signature, and any read error, yield the compiled-in
    /// defaults and `false`; this never fails.
    pub fn load(&mut self) -> (DeviceConfig, bool) {
        let mut buf = [0u8; RECORD_LEN];
        if let Err(e) = self.storage.read(&mut buf) {
            warn!("[Config] Read failed ({:?}), using defaults", e);
            return (DeviceConfig::default(), false);
        }

        match decode_record(&buf) {
            Some((config, version)) => {
                debug!("[Config] Loaded record format v{}", version);
                if version > FORMAT_VERSION {
                    warn!(
                        "[Config] Record written by newer firmware (v{}), reading known fields",
                        version
                    );
                }
                (config, true)
            }
            None => {
                info!("[Config] Storage is empty, using defaults");
                (DeviceConfig::default(), false)
            }
        }
    }

    /// Persist the whole configuration record and commit it.
    pub fn save(&mut self, config: &DeviceConfig) -> Result<(), S::Error> {
        info!("[Config] Writing config");
        let record = encode_record(config);
        self.storage.write(&record)?;
        self.storage.commit()
    }

    /// Get a reference to the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
