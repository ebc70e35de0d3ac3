//! Configuration storage in the ESP32 NVS partition.
//!
//! The whole configuration record is kept as a single blob, so a commit
//! replaces it atomically.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;
use log::debug;

use crate::traits::NvStorage;

/// NVS namespace holding the relay configuration.
pub const NVS_NAMESPACE: &str = "relay";

/// Key of the configuration blob.
pub const NVS_CONFIG_KEY: &str = "config";

/// [`NvStorage`] backed by an NVS blob.
pub struct Esp32Storage {
    nvs: EspNvs<NvsDefault>,
    staged: Option<Vec<u8>>,
}

impl Esp32Storage {
    /// Open the relay namespace read-write.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, EspError> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
        Ok(Self { nvs, staged: None })
    }
}

impl NvStorage for Esp32Storage {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        let Some(len) = self.nvs.blob_len(NVS_CONFIG_KEY)? else {
            debug!("[Storage] No configuration blob");
            return Ok(0);
        };
        if len <= buf.len() {
            return Ok(self
                .nvs
                .get_blob(NVS_CONFIG_KEY, buf)?
                .map_or(0, |data| data.len()));
        }

        // Written by newer firmware with appended fields
        debug!("[Storage] Blob is {} bytes, reading the first {}", len, buf.len());
        let mut blob = vec![0u8; len];
        let data = self.nvs.get_blob(NVS_CONFIG_KEY, &mut blob)?.unwrap_or(&[]);
        Ok(copy_prefix(data, buf))
    }

    fn write(&mut self, data: &[u8]) -> Result<(), EspError> {
        self.staged = Some(data.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), EspError> {
        if let Some(data) = self.staged.take() {
            self.nvs.set_blob(NVS_CONFIG_KEY, &data)?;
            debug!("[Storage] Wrote {} bytes", data.len());
        }
        Ok(())
    }
}

/// Copy as much of `src` as fits into `dst`.
fn copy_prefix(src: &[u8], dst: &mut [u8]) -> usize {
    let len = src.len().min(dst.len());
    dst[..len].copy_from_slice(&src[..len]);
    len
}
