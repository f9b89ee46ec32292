// Tests for configuration loading

use anyhow::Result;
use media_file_helper::permissions::{Capability, PermissionHost};
use media_file_helper::{Config, StorageRoot};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_shipped_config_loads() -> Result<()> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("media-file-helper.toml");

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.service.name, "media-file-helper");
    assert_eq!(cfg.storage.external_dir, PathBuf::from("/sdcard"));
    assert!(cfg.dispatcher.gate_exists);

    let host = cfg.permissions.memory_host();
    assert!(host.has_permission(Capability::RecordAudio));
    assert!(host.has_permission(Capability::WriteExternalStorage));

    Ok(())
}

#[test]
fn test_partial_config_uses_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("partial.toml");
    std::fs::write(
        &path,
        r#"
[storage]
external_dir = "/nonexistent/sdcard"
cache_dir = "/tmp/helper-cache"

[dispatcher]
permission_timeout_secs = 5
gate_exists = false
"#,
    )?;

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.service.http.port, 8787);
    assert_eq!(
        cfg.storage.platform_storage().storage_root(),
        PathBuf::from("/tmp/helper-cache")
    );

    let dispatcher = cfg.dispatcher.dispatcher_config();
    assert_eq!(dispatcher.permission_timeout, Duration::from_secs(5));
    assert!(!dispatcher.gate_exists);
    assert_eq!(dispatcher.queue_capacity, 32);

    let host = cfg.permissions.memory_host();
    assert!(!host.has_permission(Capability::RecordAudio));

    Ok(())
}

#[test]
fn test_missing_config_falls_back_to_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("absent");

    let cfg = Config::load_or_default(path.to_str().unwrap())?;

    assert_eq!(cfg.storage.package_name, "org.apache.cordova.media");
    assert_eq!(
        cfg.storage.platform_storage().cache_dir(),
        PathBuf::from("/data/data/org.apache.cordova.media/cache")
    );

    Ok(())
}
