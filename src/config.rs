use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatcher::DispatcherConfig;
use crate::permissions::{Capability, MemoryPermissions, Response};
use crate::storage::{package_cache_dir, PlatformStorage, DEFAULT_CHUNK_SIZE};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub dispatcher: DispatcherSettings,
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "media-file-helper".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Shared storage root, used while it is mounted
    pub external_dir: PathBuf,
    /// App package whose private cache is the fallback root
    pub package_name: String,
    /// Explicit fallback root, overrides the package cache location
    pub cache_dir: Option<PathBuf>,
    /// Write buffer size in bytes
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            external_dir: PathBuf::from("/sdcard"),
            package_name: "org.apache.cordova.media".to_string(),
            cache_dir: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StorageConfig {
    pub fn platform_storage(&self) -> PlatformStorage {
        let cache_dir = self
            .cache_dir
            .clone()
            .unwrap_or_else(|| package_cache_dir(&self.package_name));
        PlatformStorage::new(&self.external_dir, cache_dir)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    pub queue_capacity: usize,
    pub permission_timeout_secs: u64,
    /// Gate `exists` on the same permissions as writes
    pub gate_exists: bool,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        let defaults = DispatcherConfig::default();
        Self {
            queue_capacity: defaults.queue_capacity,
            permission_timeout_secs: defaults.permission_timeout.as_secs(),
            gate_exists: defaults.gate_exists,
        }
    }
}

impl DispatcherSettings {
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            queue_capacity: self.queue_capacity,
            permission_timeout: Duration::from_secs(self.permission_timeout_secs),
            gate_exists: self.gate_exists,
        }
    }
}

/// Answer the standalone permission host gives to requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnRequest {
    Grant,
    Deny,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Capabilities held from startup
    pub granted: Vec<Capability>,
    pub on_request: OnRequest,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            granted: Vec::new(),
            on_request: OnRequest::Grant,
        }
    }
}

impl PermissionsConfig {
    pub fn memory_host(&self) -> MemoryPermissions {
        let response = match self.on_request {
            OnRequest::Grant => Response::Grant,
            OnRequest::Deny => Response::Deny,
        };
        MemoryPermissions::new(response).with_granted(self.granted.iter().copied())
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load `path` if present, defaults otherwise
    pub fn load_or_default(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
