// Integration tests for file materialization
//
// These tests verify path resolution, the exists check, and that base64
// payloads land on disk exactly once.

use anyhow::Result;
use base64::Engine;
use media_file_helper::storage::{FileMaterializer, PlatformStorage};
use media_file_helper::BridgeError;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn materializer(dir: &TempDir) -> FileMaterializer {
    FileMaterializer::new(Arc::new(dir.path().to_path_buf()))
}

fn visible_entries(dir: &TempDir) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir.path())? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[test]
fn test_resolve_full_path_joins_root() {
    let dir = TempDir::new().unwrap();
    let files = materializer(&dir);

    assert_eq!(files.resolve_full_path("a.mp3"), dir.path().join("a.mp3"));
}

#[test]
fn test_exists_absent() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir);

    assert_eq!(files.exists("a.mp3")?, None);

    Ok(())
}

#[test]
fn test_exists_ignores_directories() -> Result<()> {
    let dir = TempDir::new()?;
    fs::create_dir(dir.path().join("a.mp3"))?;
    let files = materializer(&dir);

    assert_eq!(files.exists("a.mp3")?, None);

    Ok(())
}

#[test]
fn test_download_writes_decoded_bytes() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir);

    let path = files.download_audio_file("a.mp3", &encode(b"hi"))?;

    assert_eq!(path, dir.path().join("a.mp3"));
    assert_eq!(fs::read(&path)?, b"hi");
    assert_eq!(files.exists("a.mp3")?, Some(path));

    Ok(())
}

#[test]
fn test_download_is_idempotent_and_keeps_first_payload() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir);

    let first = files.download_audio_file("a.mp3", &encode(b"first"))?;
    let second = files.download_audio_file("a.mp3", &encode(b"second"))?;

    assert_eq!(first, second);
    assert_eq!(fs::read(&first)?, b"first");

    Ok(())
}

#[test]
fn test_existing_file_short_circuits_even_with_bad_payload() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("a.mp3"), b"already here")?;
    let files = materializer(&dir);

    let path = files.download_audio_file("a.mp3", "!!! not base64 !!!")?;

    assert_eq!(fs::read(path)?, b"already here");

    Ok(())
}

#[test]
fn test_malformed_payload_fails_and_leaves_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir);

    let err = files
        .download_audio_file("a.mp3", "aGk=*bad*")
        .unwrap_err();

    assert!(matches!(err, BridgeError::Io(ref msg) if msg.contains("Invalid base64")));
    assert_eq!(files.exists("a.mp3")?, None);
    assert!(visible_entries(&dir)?.is_empty(), "No partial file should remain");

    Ok(())
}

#[test]
fn test_large_payload_streams_through_small_buffer() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir).with_chunk_size(16);

    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let path = files.download_audio_file("big.wav", &encode(&data))?;

    assert_eq!(fs::read(path)?, data);

    Ok(())
}

#[test]
fn test_payload_whitespace_and_missing_padding_accepted() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir);

    // "hello" = aGVsbG8=
    let path = files.download_audio_file("a.mp3", "aGVs\nbG8")?;

    assert_eq!(fs::read(path)?, b"hello");

    Ok(())
}

#[test]
fn test_empty_payload_creates_empty_file() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir);

    let path = files.download_audio_file("empty.mp3", "")?;

    assert_eq!(fs::metadata(path)?.len(), 0);

    Ok(())
}

#[test]
fn test_rejects_names_outside_flat_namespace() {
    let dir = TempDir::new().unwrap();
    let files = materializer(&dir);

    for name in ["", "..", "../escape.mp3", "sub/a.mp3"] {
        assert_eq!(
            files.exists(name),
            Err(BridgeError::InvalidFilename(name.to_string()))
        );
        assert!(files.download_audio_file(name, &encode(b"x")).is_err());
    }
}

#[test]
fn test_write_creates_missing_root() -> Result<()> {
    let dir = TempDir::new()?;
    let cache = dir.path().join("cache");
    let storage = PlatformStorage::new(dir.path().join("sdcard"), &cache);
    let files = FileMaterializer::new(Arc::new(storage));

    let path = files.download_audio_file("a.mp3", &encode(b"hi"))?;

    assert_eq!(path, cache.join("a.mp3"));
    assert_eq!(fs::read(path)?, b"hi");

    Ok(())
}

#[test]
fn test_root_switches_when_external_mounts() -> Result<()> {
    let dir = TempDir::new()?;
    let external = dir.path().join("sdcard");
    let cache = dir.path().join("cache");
    let storage = PlatformStorage::new(&external, &cache);
    let files = FileMaterializer::new(Arc::new(storage));

    files.download_audio_file("a.mp3", &encode(b"cached"))?;
    fs::create_dir(&external)?;

    // Same name now resolves under the mounted root where nothing exists yet
    assert_eq!(files.exists("a.mp3")?, None);
    let path = files.download_audio_file("a.mp3", &encode(b"shared"))?;
    assert_eq!(path, external.join("a.mp3"));
    assert_eq!(fs::read(cache.join("a.mp3"))?, b"cached");

    Ok(())
}

#[test]
fn test_unwritable_root_reports_io_failure() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"file").unwrap();
    let files = FileMaterializer::new(Arc::new(PathBuf::from(&blocker)));

    let err = files.download_audio_file("a.mp3", &encode(b"hi")).unwrap_err();

    assert!(matches!(err, BridgeError::Io(_)));
}

#[test]
fn test_overlapping_writes_never_replace_published_file() -> Result<()> {
    let dir = TempDir::new()?;
    let files = materializer(&dir);

    let big = encode(&vec![7u8; 16 * 1024 * 1024]);
    let slow = {
        let files = files.clone();
        std::thread::spawn(move || files.download_audio_file("a.mp3", &big))
    };

    let path = files.download_audio_file("a.mp3", &encode(b"small"))?;
    let first_seen = fs::read(&path)?;

    let slow_path = slow.join().expect("writer thread")?;
    assert_eq!(slow_path, path);
    assert_eq!(fs::read(&path)?, first_seen, "Published file must not change");
    assert_eq!(visible_entries(&dir)?, vec!["a.mp3".to_string()]);

    Ok(())
}
