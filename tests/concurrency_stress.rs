//! Concurrent reader stress tests

use mpak::{ArchiveReader, ReaderOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn build_archive(dir: &TempDir, assets: &[(&str, Vec<u8>)]) -> PathBuf {
    let mut entries = Vec::new();
    for (index, (asset_name, content)) in assets.iter().enumerate() {
        let source = dir.path().join(format!("src{index}.bin"));
        std::fs::write(&source, content).unwrap();
        entries.push((asset_name.to_string(), source));
    }
    let pak = dir.path().join("assets.mpak");
    mpak::build(&pak, entries).unwrap();
    pak
}

#[test]
fn test_50_threads_load_the_same_asset() {
    let dir = TempDir::new().unwrap();
    let content: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let pak = build_archive(&dir, &[("shared.asset", content.clone())]);

    let reader = Arc::new(ArchiveReader::open(&pak).unwrap());

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let reader = Arc::clone(&reader);
            let expected = content.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let bytes = reader.load("shared.asset").unwrap().unwrap();
                    assert_eq!(bytes, expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_mixed_names_under_a_tiny_cache() {
    let dir = TempDir::new().unwrap();
    let assets: Vec<(String, Vec<u8>)> = (0..16)
        .map(|i| (format!("asset{i}.bin"), vec![i as u8; 512]))
        .collect();
    let borrowed: Vec<(&str, Vec<u8>)> = assets
        .iter()
        .map(|(asset_name, content)| (asset_name.as_str(), content.clone()))
        .collect();
    let pak = build_archive(&dir, &borrowed);

    // Budget fits only three entries, so loads keep evicting and
    // re-reading under contention.
    let budget = 3 * 512;
    let options = ReaderOptions {
        cache_budget: budget,
        ..ReaderOptions::default()
    };
    let reader = Arc::new(ArchiveReader::open_with(&pak, options).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let reader = Arc::clone(&reader);
            thread::spawn(move || {
                for _ in 0..200 {
                    let index = rand::random::<usize>() % 16;
                    let bytes = reader
                        .load(&format!("asset{index}.bin"))
                        .unwrap()
                        .unwrap();
                    assert_eq!(bytes, vec![index as u8; 512]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = reader.cache_stats();
    assert!(stats.resident_bytes <= budget);
}

#[test]
fn test_concurrent_callers_get_independent_buffers() {
    let dir = TempDir::new().unwrap();
    let content = vec![0x5Au8; 1024];
    let pak = build_archive(&dir, &[("shared.asset", content.clone())]);

    let reader = Arc::new(ArchiveReader::open(&pak).unwrap());

    let handles: Vec<_> = (0..16)
        .map(|thread_id| {
            let reader = Arc::clone(&reader);
            thread::spawn(move || {
                for _ in 0..50 {
                    let mut bytes = reader.load("shared.asset").unwrap().unwrap();
                    // Scribbling over our copy must never leak into
                    // anyone else's.
                    bytes.fill(thread_id as u8);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let bytes = reader.load("shared.asset").unwrap().unwrap();
    assert_eq!(bytes, content);
}

#[test]
fn test_dispose_races_with_loads() {
    let dir = TempDir::new().unwrap();
    let content = vec![7u8; 2048];
    let pak = build_archive(&dir, &[("shared.asset", content.clone())]);

    let reader = Arc::new(ArchiveReader::open(&pak).unwrap());

    let loaders: Vec<_> = (0..8)
        .map(|_| {
            let reader = Arc::clone(&reader);
            let expected = content.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    match reader.load("shared.asset") {
                        Ok(Some(bytes)) => assert_eq!(bytes, expected),
                        Ok(None) => panic!("asset vanished"),
                        Err(mpak::PakError::Disposed) => return,
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
            })
        })
        .collect();

    let disposer = {
        let reader = Arc::clone(&reader);
        thread::spawn(move || {
            thread::yield_now();
            reader.dispose();
        })
    };

    for handle in loaders {
        handle.join().unwrap();
    }
    disposer.join().unwrap();

    assert!(matches!(
        reader.load("shared.asset"),
        Err(mpak::PakError::Disposed)
    ));
}
