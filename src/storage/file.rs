use super::KeyValueStore;
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Store backed by a single JSON object on disk.
///
/// Every call re-reads the file so that several processes sharing the path
/// observe each other's writes, the way content scripts in separate tabs
/// share extension storage.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data =
            serde_json::to_vec_pretty(values).map_err(|e| StorageError::Encode(e.to_string()))?;

        // Readers never take the lock, so the file is only ever swapped whole.
        let staging = self.staging_path();
        tokio::fs::write(&staging, data).await?;
        if let Err(error) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StorageError::Io(error));
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "storage".into(), |n| n.to_string_lossy().into_owned());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", std::process::id()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }
}
