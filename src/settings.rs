use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{Config, SettingsLocation};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("settings unavailable: {0}")]
    Unavailable(String),
}

/// String key-value slot store for user preferences.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Settings kept as a flat JSON object in a file on local disk
pub struct FileSettings {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: tokio::sync::Mutex<()>,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::info!("Using settings file {}", path.display());
        Self {
            path,
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<Map<String, Value>, SettingsError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::Unavailable(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SettingsProvider for FileSettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let _guard = self.lock.lock().await;
        let map = self.read_map().await?;
        // Non-string values are treated as absent.
        Ok(map.get(key).and_then(Value::as_str).map(str::to_owned))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;

        // A corrupt file is replaced rather than blocking every future write.
        let mut map = match self.read_map().await {
            Ok(map) => map,
            Err(e @ SettingsError::Io { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!("Discarding unreadable settings: {}", e);
                Map::new()
            }
        };
        map.insert(key.to_owned(), Value::String(value.to_owned()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_string_pretty(&Value::Object(map))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!("Saved setting {} to {}", key, self.path.display());
        Ok(())
    }
}

/// In-memory settings (used when no settings file is wanted; nothing persists)
#[derive(Default)]
pub struct InMemorySettings {
    values: RwLock<Map<String, Value>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        tracing::info!("Using in-memory settings (preferences will not persist)");
        Self::default()
    }
}

#[async_trait]
impl SettingsProvider for InMemorySettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let values = self.values.read().await;
        Ok(values.get(key).and_then(Value::as_str).map(str::to_owned))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut values = self.values.write().await;
        values.insert(key.to_owned(), Value::String(value.to_owned()));
        Ok(())
    }
}

/// Create the settings backend selected by configuration
pub fn create_settings(config: &Config) -> Arc<dyn SettingsProvider> {
    match &config.settings {
        SettingsLocation::File(path) => Arc::new(FileSettings::new(path.clone())),
        SettingsLocation::Memory => Arc::new(InMemorySettings::new()),
    }
}
