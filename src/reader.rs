//! Memory-mapped archive reading
//!
//! [`ArchiveReader`] opens an archive read-only, maps its full extent, and
//! parses the TOC into an in-memory index once. The index is immutable
//! afterwards, so concurrent lookups need no locking; decoded payloads are
//! served through a [`BoundedCache`] scoped to the reader.
//!
//! The mapping lives behind a reader/writer lock: loads share it,
//! [`ArchiveReader::dispose`] takes it exclusively and drops it. A mapped
//! read therefore never races a dispose, and every operation after dispose
//! fails fast with [`PakError::Disposed`].

use crate::buffer_pool::{BufferPool, DEFAULT_POOLED_BUFFERS};
use crate::cache::{BoundedCache, CacheStats};
use crate::cipher;
use crate::error::{PakError, Result};
use crate::format::{AssetRecord, Header, RECORD_SIZE};
use crate::name;
use ahash::AHashMap;
use memmap2::Mmap;
use parking_lot::RwLock;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default cache byte budget: 64 MiB.
pub const DEFAULT_CACHE_BUDGET: usize = 64 * 1024 * 1024;

/// Tunables fixed at open time.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Byte budget of the payload cache.
    pub cache_budget: usize,

    /// Idle scratch buffers retained by the decode pool.
    pub pooled_buffers: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            cache_budget: DEFAULT_CACHE_BUDGET,
            pooled_buffers: DEFAULT_POOLED_BUFFERS,
        }
    }
}

/// Read-side handle to one archive.
pub struct ArchiveReader {
    path: PathBuf,
    mapping: RwLock<Option<Mmap>>,
    toc: AHashMap<u64, AssetRecord>,
    cache: BoundedCache,
    scratch: BufferPool,
}

impl ArchiveReader {
    /// Open with default [`ReaderOptions`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ReaderOptions::default())
    }

    /// Open an archive and index its TOC.
    ///
    /// Fails if the file is missing, the magic or version does not match,
    /// or the TOC region does not fit inside the file.
    pub fn open_with<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        // Archives are immutable once built; nothing remaps or truncates
        // the file while it is open.
        let mapping = unsafe { Mmap::map(&file)? };

        let header = Header::from_bytes(&mapping)?;
        let toc = parse_toc(&mapping, &header)?;
        info!(
            "opened archive {:?}: {} assets, {} bytes",
            path,
            toc.len(),
            mapping.len()
        );

        Ok(ArchiveReader {
            path,
            mapping: RwLock::new(Some(mapping)),
            toc,
            cache: BoundedCache::new(options.cache_budget),
            scratch: BufferPool::new(options.pooled_buffers),
        })
    }

    /// Fetch an asset's bytes by logical name.
    ///
    /// Returns `Ok(None)` when the name is not in the archive; that is a
    /// normal outcome, not an error. The returned buffer is independently
    /// owned: the caller may mutate it freely without affecting later
    /// loads.
    pub fn load(&self, asset_name: &str) -> Result<Option<Vec<u8>>> {
        let id = name::hash(asset_name);

        let guard = self.mapping.read();
        let mapping = guard.as_ref().ok_or(PakError::Disposed)?;

        if let Some(bytes) = self.cache.try_get(id) {
            debug!("cache hit for '{asset_name}' ({id:#018x})");
            return Ok(Some(bytes));
        }

        let Some(record) = self.toc.get(&id) else {
            debug!("asset '{asset_name}' ({id:#018x}) not present in archive");
            return Ok(None);
        };

        // The mapped read and decode run outside the cache locks; only the
        // final insertion below takes the exclusive side.
        let decoded = self.decode(mapping, record)?;
        drop(guard);

        self.cache.put(id, decoded.clone());
        Ok(Some(decoded))
    }

    /// Copy the record's payload out of the mapping and reverse the
    /// cipher. Fails if the record reaches past the end of the mapping.
    fn decode(&self, mapping: &[u8], record: &AssetRecord) -> Result<Vec<u8>> {
        let span = usize::try_from(record.offset)
            .ok()
            .zip(usize::try_from(record.size).ok())
            .and_then(|(start, len)| start.checked_add(len).map(|end| (start, end)))
            .filter(|&(_, end)| end <= mapping.len());

        let Some((start, end)) = span else {
            return Err(PakError::Truncated {
                id: record.id,
                offset: record.offset,
                expected: record.size,
                available: mapping.len(),
            });
        };

        let mut scratch = self.scratch.acquire(end - start);
        scratch.as_mut_slice().copy_from_slice(&mapping[start..end]);
        cipher::apply_in_place(scratch.as_mut_slice());
        Ok(scratch.as_slice().to_vec())
    }

    /// Whether the archive contains a name. Independent of cache state.
    pub fn contains(&self, asset_name: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.toc.contains_key(&name::hash(asset_name)))
    }

    /// Drop one name's cached payload. The TOC is unaffected.
    pub fn invalidate(&self, asset_name: &str) -> Result<()> {
        self.ensure_open()?;
        self.cache.invalidate(name::hash(asset_name));
        Ok(())
    }

    /// Drop every cached payload. The TOC is unaffected.
    pub fn clear_cache(&self) -> Result<()> {
        self.ensure_open()?;
        self.cache.clear();
        Ok(())
    }

    /// Cache observability counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of assets in the archive.
    pub fn len(&self) -> usize {
        self.toc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toc.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the memory mapping and drop all cached payloads.
    ///
    /// Idempotent: the second and later calls are no-ops. Every other
    /// operation fails with [`PakError::Disposed`] afterwards.
    pub fn dispose(&self) {
        let mut guard = self.mapping.write();
        if guard.take().is_some() {
            self.cache.clear();
            debug!("disposed archive reader for {:?}", self.path);
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.mapping.read().is_none() {
            return Err(PakError::Disposed);
        }
        Ok(())
    }
}

fn parse_toc(mapping: &[u8], header: &Header) -> Result<AHashMap<u64, AssetRecord>> {
    let region = usize::try_from(header.toc_offset)
        .ok()
        .zip(usize::try_from(header.entry_count).ok())
        .and_then(|(offset, count)| {
            let len = count.checked_mul(RECORD_SIZE)?;
            let end = offset.checked_add(len)?;
            (end <= mapping.len()).then_some((offset, count))
        });

    let Some((offset, count)) = region else {
        return Err(PakError::TocOutOfBounds {
            toc_offset: header.toc_offset,
            entry_count: header.entry_count,
            archive_len: mapping.len(),
        });
    };

    let mut toc = AHashMap::with_capacity(count);
    for index in 0..count {
        let at = offset + index * RECORD_SIZE;
        let record = AssetRecord::from_bytes(&mapping[at..at + RECORD_SIZE])?;
        if toc.insert(record.id, record).is_some() {
            // Build-time collision rejection should make this unreachable;
            // a foreign archive may still carry one.
            warn!(
                "duplicate id {:#018x} in table of contents, keeping the later record",
                record.id
            );
        }
    }
    Ok(toc)
}

#[cfg(feature = "async")]
mod async_ops {
    use super::*;
    use crate::cancel::CancellationToken;
    use std::sync::Arc;

    impl ArchiveReader {
        /// Asynchronous [`load`](ArchiveReader::load).
        ///
        /// An already-cached id resolves immediately without touching the
        /// background pool. Cancellation observed before the load is
        /// scheduled yields [`PakError::Cancelled`] with no cache
        /// mutation. A cancel that lands mid-read returns early, but the
        /// read itself is never interrupted and may still populate the
        /// cache.
        pub async fn load_async(
            self: Arc<Self>,
            asset_name: &str,
            token: &CancellationToken,
        ) -> Result<Option<Vec<u8>>> {
            let id = name::hash(asset_name);
            self.ensure_open()?;
            if let Some(bytes) = self.cache.try_get(id) {
                return Ok(Some(bytes));
            }

            if token.is_cancelled() {
                return Err(PakError::Cancelled);
            }

            let reader = Arc::clone(&self);
            let owned = asset_name.to_string();
            let task = tokio::task::spawn_blocking(move || reader.load(&owned));
            tokio::select! {
                outcome = task => outcome.map_err(|err| PakError::TaskJoin(err.to_string()))?,
                () = token.cancelled() => Err(PakError::Cancelled),
            }
        }

        /// Warm the cache for a batch of names.
        ///
        /// Loads run sequentially on the blocking pool; the token is
        /// checked between loads, never during one. Returns how many names
        /// resolved to an asset.
        pub async fn prefetch_async<S: AsRef<str>>(
            self: Arc<Self>,
            asset_names: &[S],
            token: &CancellationToken,
        ) -> Result<usize> {
            let mut resident = 0usize;
            for asset_name in asset_names {
                if token.is_cancelled() {
                    debug!("prefetch cancelled after {resident} assets");
                    return Err(PakError::Cancelled);
                }

                let reader = Arc::clone(&self);
                let owned = asset_name.as_ref().to_string();
                let loaded = tokio::task::spawn_blocking(move || reader.load(&owned))
                    .await
                    .map_err(|err| PakError::TaskJoin(err.to_string()))??;
                if loaded.is_some() {
                    resident += 1;
                }
            }
            Ok(resident)
        }
    }
}
