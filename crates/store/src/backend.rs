//! Durability backends for the vault store.

use crate::StoreError;
use async_trait::async_trait;
use ratewatch_core::VaultConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where the store persists its state.
///
/// `load` runs once when the store opens. The save methods are invoked while
/// the store's write lock is held, so readers never observe state the backend
/// has not accepted.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn load(&self) -> Result<StoreSnapshot, StoreError>;
    async fn save_vaults(&self, vaults: &HashMap<String, VaultConfig>) -> Result<(), StoreError>;
    async fn save_rates(&self, rates: &HashMap<String, f64>) -> Result<(), StoreError>;
}

/// State handed back by a backend on open.
#[derive(Debug, Default)]
pub struct StoreSnapshot {
    pub vaults: HashMap<String, VaultConfig>,
    pub rates: HashMap<String, f64>,
}

/// Backend that keeps nothing: load is empty, every save is a no-op.
#[derive(Debug, Default)]
pub struct MemoryBackend;

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load(&self) -> Result<StoreSnapshot, StoreError> {
        Ok(StoreSnapshot::default())
    }

    async fn save_vaults(&self, _vaults: &HashMap<String, VaultConfig>) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_rates(&self, _rates: &HashMap<String, f64>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// JSON-file backend: `vaults.json` and `rates.json` under a data directory.
#[derive(Debug)]
pub struct JsonFileBackend {
    vaults_file: PathBuf,
    rates_file: PathBuf,
}

impl JsonFileBackend {
    /// Prepare the data directory. Missing files read back as empty state.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await?;
        Ok(Self {
            vaults_file: data_dir.join("vaults.json"),
            rates_file: data_dir.join("rates.json"),
        })
    }

    async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) if bytes.is_empty() => Ok(T::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn load(&self) -> Result<StoreSnapshot, StoreError> {
        Ok(StoreSnapshot {
            vaults: Self::read_json(&self.vaults_file).await?,
            rates: Self::read_json(&self.rates_file).await?,
        })
    }

    async fn save_vaults(&self, vaults: &HashMap<String, VaultConfig>) -> Result<(), StoreError> {
        Self::write_json(&self.vaults_file, vaults).await
    }

    async fn save_rates(&self, rates: &HashMap<String, f64>) -> Result<(), StoreError> {
        Self::write_json(&self.rates_file, rates).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::open(dir.path()).await.unwrap();
        let snapshot = backend.load().await.unwrap();
        assert!(snapshot.vaults.is_empty());
        assert!(snapshot.rates.is_empty());
    }

    #[tokio::test]
    async fn test_saved_state_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::open(dir.path()).await.unwrap();

        let mut vaults = HashMap::new();
        vaults.insert(
            "1234".to_string(),
            VaultConfig::new("1234", "My Vault", 0.5, "chan-1"),
        );
        let mut rates = HashMap::new();
        rates.insert("1234".to_string(), 5.2);

        backend.save_vaults(&vaults).await.unwrap();
        backend.save_rates(&rates).await.unwrap();

        let reopened = JsonFileBackend::open(dir.path()).await.unwrap();
        let snapshot = reopened.load().await.unwrap();
        assert_eq!(snapshot.vaults.len(), 1);
        assert_eq!(snapshot.vaults["1234"].nickname, "My Vault");
        assert_eq!(snapshot.rates["1234"], 5.2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("vaults.json"), b"not json")
            .await
            .unwrap();
        let backend = JsonFileBackend::open(dir.path()).await.unwrap();
        assert!(backend.load().await.is_err());
    }
}
