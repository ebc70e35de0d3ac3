//! Persistence tests for the configuration record.

use esp_relay::config::MAX_FIELD_LEN;
use esp_relay::hal::{FileStorage, MockStorage};
use esp_relay::store::{encode_record, ConfigStore, RECORD_LEN, SIGNATURE};
use esp_relay::DeviceConfig;

fn full_config() -> DeviceConfig {
    DeviceConfig::default()
        .with_wifi("HomeNetwork", "correct horse")
        .with_mdns_domain("garage-relay")
        .with_mqtt_server("broker.example.org", 8883)
        .with_mqtt_auth("relay", "s3cret")
        .with_client_id("Garage")
        .with_topic_suffix("/Door")
        .with_relay(14, false)
        .with_relay_on_boot(true)
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn saved_config_loads_identically() {
    let configs = [
        DeviceConfig::default(),
        full_config(),
        DeviceConfig::default().with_wifi("a", ""),
        DeviceConfig::default().with_mqtt_server("10.0.0.1", 0),
        DeviceConfig::default().with_mqtt_server("10.0.0.1", u16::MAX),
    ];

    for config in configs {
        let mut store = ConfigStore::new(MockStorage::new());
        store.save(&config).unwrap();
        assert_eq!(store.load(), (config, true));
    }
}

#[test]
fn shorter_value_does_not_leave_old_tail() {
    let mut store = ConfigStore::new(MockStorage::new());
    store
        .save(&DeviceConfig::default().with_wifi("AVeryLongNetworkName", "pw"))
        .unwrap();
    store
        .save(&DeviceConfig::default().with_wifi("Short", "pw"))
        .unwrap();

    let (config, _) = store.load();
    assert_eq!(config.ssid.as_str(), "Short");
}

#[test]
fn long_text_is_truncated_to_slot() {
    let long = "x".repeat(MAX_FIELD_LEN + 10);
    let config = DeviceConfig::default()
        .with_wifi(&long, &long)
        .with_client_id(&long);

    let mut store = ConfigStore::new(MockStorage::new());
    store.save(&config).unwrap();
    let (loaded, _) = store.load();

    assert_eq!(loaded.ssid.len(), MAX_FIELD_LEN);
    assert_eq!(loaded.password.as_str(), &long[..MAX_FIELD_LEN]);
    assert_eq!(loaded.mqtt_client_id.len(), MAX_FIELD_LEN);
    // Neighbouring fields are intact
    assert_eq!(loaded.mdns_domain.as_str(), "");
    assert_eq!(loaded.mqtt_topic_suffix, DeviceConfig::default().mqtt_topic_suffix);
}

// ============================================================================
// Uninitialized regions
// ============================================================================

#[test]
fn blank_regions_load_defaults() {
    for storage in [MockStorage::filled(0x00), MockStorage::filled(0xFF)] {
        let mut store = ConfigStore::new(storage);
        assert_eq!(store.load(), (DeviceConfig::default(), false));
    }
}

#[test]
fn mismatched_signature_loads_defaults() {
    let mut record = encode_record(&full_config());
    record[0] = b'!';

    let mut store = ConfigStore::new(MockStorage::with_contents(&record));
    assert_eq!(store.load(), (DeviceConfig::default(), false));
}

#[test]
fn legacy_image_without_version_byte() {
    let mut record = encode_record(&full_config());
    record[RECORD_LEN - 1] = 0xFF;

    let mut store = ConfigStore::new(MockStorage::with_contents(&record));
    assert_eq!(store.load(), (full_config(), true));
}

#[test]
fn record_starts_with_signature() {
    let mut store = ConfigStore::new(MockStorage::new());
    store.save(&full_config()).unwrap();
    assert_eq!(&store.storage().region[..4], &SIGNATURE);
    assert_eq!(store.storage().commits, 1);
}

// ============================================================================
// File storage
// ============================================================================

#[test]
fn file_storage_persists_across_instances() {
    let path = std::env::temp_dir().join(format!(
        "esp-relay-store-test-{}.bin",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let mut first = ConfigStore::new(FileStorage::new(&path));
    assert!(!first.load().1);
    first.save(&full_config()).unwrap();

    let mut second = ConfigStore::new(FileStorage::new(&path));
    assert_eq!(second.load(), (full_config(), true));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), RECORD_LEN as u64);

    let _ = std::fs::remove_file(&path);
}
