//! File-backed [`NvStorage`] for running the firmware logic on a desktop.
//!
//! The file plays the role of the EEPROM region. A missing file reads as an
//! empty region; writes are kept in memory until [`NvStorage::commit`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::traits::NvStorage;

/// Configuration storage in a single file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    staged: Option<Vec<u8>>,
}

impl FileStorage {
    /// Use `path` as the storage region. The file is created on first commit.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            staged: None,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NvStorage for FileStorage {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("[Storage] {} does not exist yet", self.path.display());
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        let len = buf.len().min(data.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), io::Error> {
        self.staged = Some(data.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), io::Error> {
        if let Some(data) = self.staged.take() {
            fs::write(&self.path, &data)?;
            debug!("[Storage] Wrote {} bytes to {}", data.len(), self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::store::ConfigStore;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("esp-relay-{}-{}", std::process::id(), name))
    }

    #[test]
    fn missing_file_reads_empty() {
        let mut storage = FileStorage::new(temp_path("missing"));
        let mut buf = [0u8; 8];
        assert_eq!(storage.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn write_without_commit_leaves_no_file() {
        let path = temp_path("uncommitted");
        let mut storage = FileStorage::new(&path);
        storage.write(b"data").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn config_survives_reopen() {
        let path = temp_path("reopen");
        let config = DeviceConfig::default()
            .with_wifi("HomeNetwork", "secret")
            .with_relay(4, true);

        ConfigStore::new(FileStorage::new(&path)).save(&config).unwrap();

        let (loaded, initialized) = ConfigStore::new(FileStorage::new(&path)).load();
        assert!(initialized);
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }
}
