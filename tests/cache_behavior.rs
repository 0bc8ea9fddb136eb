//! Cache behavior observed through the reader

use anyhow::Result;
use mpak::{ArchiveReader, ReaderOptions};
use std::path::PathBuf;
use tempfile::TempDir;

fn build_numbered_archive(dir: &TempDir, count: usize, asset_len: usize) -> PathBuf {
    let mut entries = Vec::new();
    for index in 0..count {
        let source = dir.path().join(format!("src{index}.bin"));
        std::fs::write(&source, vec![index as u8; asset_len]).unwrap();
        entries.push((format!("asset{index}.bin"), source));
    }
    let pak = dir.path().join("assets.mpak");
    mpak::build(&pak, entries).unwrap();
    pak
}

fn open_with_budget(pak: &PathBuf, budget: usize) -> ArchiveReader {
    ArchiveReader::open_with(
        pak,
        ReaderOptions {
            cache_budget: budget,
            ..ReaderOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn test_resident_bytes_never_exceed_budget() -> Result<()> {
    let dir = TempDir::new()?;
    let pak = build_numbered_archive(&dir, 8, 100);
    let reader = open_with_budget(&pak, 250);

    for index in 0..8 {
        reader.load(&format!("asset{index}.bin"))?;
        let stats = reader.cache_stats();
        assert!(stats.resident_bytes <= 250);
        assert!(stats.entries <= 2);
    }
    Ok(())
}

#[test]
fn test_oldest_entries_are_evicted_first() -> Result<()> {
    let dir = TempDir::new()?;
    let pak = build_numbered_archive(&dir, 4, 100);
    let reader = open_with_budget(&pak, 250);

    reader.load("asset0.bin")?;
    reader.load("asset1.bin")?;
    reader.load("asset2.bin")?; // evicts asset0

    let hits_before = reader.cache_stats().hits;
    reader.load("asset1.bin")?;
    reader.load("asset2.bin")?;
    assert_eq!(reader.cache_stats().hits, hits_before + 2);

    // asset0 was evicted, so this load misses and re-reads from disk.
    let misses_before = reader.cache_stats().misses;
    reader.load("asset0.bin")?;
    assert_eq!(reader.cache_stats().misses, misses_before + 1);
    Ok(())
}

#[test]
fn test_mutating_a_returned_buffer_does_not_poison_the_cache() -> Result<()> {
    let dir = TempDir::new()?;
    let pak = build_numbered_archive(&dir, 1, 64);
    let reader = ArchiveReader::open(&pak)?;

    let mut bytes = reader.load("asset0.bin")?.unwrap();
    bytes.fill(0xFF);

    let again = reader.load("asset0.bin")?.unwrap();
    assert_eq!(again, vec![0u8; 64]);
    Ok(())
}

#[test]
fn test_second_load_is_served_from_cache() -> Result<()> {
    let dir = TempDir::new()?;
    let pak = build_numbered_archive(&dir, 1, 64);
    let reader = ArchiveReader::open(&pak)?;

    reader.load("asset0.bin")?;
    let stats = reader.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 0);

    reader.load("asset0.bin")?;
    let stats = reader.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    Ok(())
}

#[test]
fn test_invalidate_forces_a_disk_reread() -> Result<()> {
    let dir = TempDir::new()?;
    let pak = build_numbered_archive(&dir, 1, 64);
    let reader = ArchiveReader::open(&pak)?;

    reader.load("asset0.bin")?;
    assert_eq!(reader.cache_stats().entries, 1);

    reader.invalidate("asset0.bin")?;
    assert_eq!(reader.cache_stats().entries, 0);

    // Still loads correctly after invalidation.
    assert_eq!(reader.load("asset0.bin")?.unwrap(), vec![0u8; 64]);
    assert_eq!(reader.cache_stats().entries, 1);
    Ok(())
}

#[test]
fn test_clear_cache_drops_everything() -> Result<()> {
    let dir = TempDir::new()?;
    let pak = build_numbered_archive(&dir, 4, 32);
    let reader = ArchiveReader::open(&pak)?;

    for index in 0..4 {
        reader.load(&format!("asset{index}.bin"))?;
    }
    assert_eq!(reader.cache_stats().entries, 4);

    reader.clear_cache()?;
    let stats = reader.cache_stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.resident_bytes, 0);
    Ok(())
}

#[test]
fn test_invalidating_an_uncached_name_is_harmless() -> Result<()> {
    let dir = TempDir::new()?;
    let pak = build_numbered_archive(&dir, 1, 16);
    let reader = ArchiveReader::open(&pak)?;

    reader.invalidate("asset0.bin")?;
    reader.invalidate("never-loaded.bin")?;
    assert_eq!(reader.load("asset0.bin")?.unwrap(), vec![0u8; 16]);
    Ok(())
}
