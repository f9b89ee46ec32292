use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves the directory under which all filenames live
pub trait StorageRoot: Send + Sync {
    /// Current storage root. Called on every operation, never cached.
    fn storage_root(&self) -> PathBuf;
}

impl StorageRoot for PathBuf {
    fn storage_root(&self) -> PathBuf {
        self.clone()
    }
}

/// Platform storage: shared external storage when mounted, otherwise the
/// app-private cache directory
#[derive(Debug, Clone)]
pub struct PlatformStorage {
    external_dir: PathBuf,
    cache_dir: PathBuf,
}

impl PlatformStorage {
    pub fn new(external_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            external_dir: external_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Use the default private cache location for an app package
    pub fn for_package(external_dir: impl Into<PathBuf>, package_name: &str) -> Self {
        Self::new(external_dir, package_cache_dir(package_name))
    }

    /// External storage counts as mounted when its directory is present
    pub fn is_external_mounted(&self) -> bool {
        self.external_dir.is_dir()
    }

    pub fn external_dir(&self) -> &Path {
        &self.external_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl StorageRoot for PlatformStorage {
    fn storage_root(&self) -> PathBuf {
        if self.is_external_mounted() {
            self.external_dir.clone()
        } else {
            debug!(
                "External storage {} not mounted, using cache {}",
                self.external_dir.display(),
                self.cache_dir.display()
            );
            self.cache_dir.clone()
        }
    }
}

/// Private cache directory of an installed app package
pub fn package_cache_dir(package_name: &str) -> PathBuf {
    PathBuf::from("/data/data").join(package_name).join("cache")
}
