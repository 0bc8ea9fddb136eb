//! Byte-budgeted cache for decoded asset payloads
//!
//! A least-recently-used cache keyed by content address. The recency list
//! is an arena of slots linked by indices with explicit head/tail, not a
//! pointer graph. Capacity is a byte budget, not an entry count: inserting
//! past the budget evicts from the least-recently-used end one entry at a
//! time until the resident total fits.
//!
//! Two deliberate departures from textbook LRU:
//! - [`BoundedCache::try_get`] does not promote recency. Only `put` touches
//!   the ordering.
//! - Re-`put`ting an existing key refreshes its recency but never its
//!   payload. Within one archive an id's bytes are immutable, so the first
//!   stored buffer stays.

use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

struct Node {
    key: u64,
    bytes: Vec<u8>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed recency list plus key index. Mutated only under the
/// exclusive side of the cache lock.
#[derive(Default)]
struct CacheInner {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    index: AHashMap<u64, usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
    resident_bytes: usize,
}

impl CacheInner {
    fn node(&self, slot: usize) -> &Node {
        self.slots[slot].as_ref().expect("indexed slot is occupied")
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        self.slots[slot].as_mut().expect("indexed slot is occupied")
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }

    fn link_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(slot);
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            self.node_mut(h).prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }

    fn insert_front(&mut self, key: u64, bytes: Vec<u8>) {
        self.resident_bytes += bytes.len();
        let node = Node {
            key,
            bytes,
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.link_front(slot);
    }

    /// Unlink and drop the node in `slot`, returning its key and size.
    fn remove(&mut self, slot: usize) -> (u64, usize) {
        self.unlink(slot);
        let node = self.slots[slot].take().expect("indexed slot is occupied");
        self.index.remove(&node.key);
        self.free.push(slot);
        self.resident_bytes -= node.bytes.len();
        (node.key, node.bytes.len())
    }
}

/// Cache observability counters.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub resident_bytes: usize,
    pub budget: usize,
}

impl CacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Thread-safe byte-budgeted LRU keyed by `u64` content address.
///
/// Any number of `try_get` calls proceed concurrently under the shared
/// lock; `put`/`invalidate`/`clear` take the exclusive lock. Hit/miss
/// counters are atomics so reads stay on the shared side.
pub struct BoundedCache {
    budget: usize,
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BoundedCache {
    /// Create a cache holding at most `budget` payload bytes.
    pub fn new(budget: usize) -> Self {
        BoundedCache {
            budget,
            inner: RwLock::new(CacheInner::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a key, returning a defensive copy of the stored bytes.
    ///
    /// Does not promote recency.
    pub fn try_get(&self, key: u64) -> Option<Vec<u8>> {
        let inner = self.inner.read();
        match inner.index.get(&key).copied() {
            Some(slot) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(inner.node(slot).bytes.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert bytes for a key, evicting from the LRU end until the budget
    /// holds.
    ///
    /// If the key is already present only its recency is refreshed; the
    /// stored payload and the resident total are unchanged and `bytes` is
    /// dropped.
    pub fn put(&self, key: u64, bytes: Vec<u8>) {
        let mut inner = self.inner.write();
        if let Some(slot) = inner.index.get(&key).copied() {
            inner.unlink(slot);
            inner.link_front(slot);
            return;
        }

        inner.insert_front(key, bytes);
        while inner.resident_bytes > self.budget {
            let Some(tail) = inner.tail else {
                break;
            };
            let (evicted, size) = inner.remove(tail);
            trace!("evicted {evicted:#018x} ({size} bytes) from asset cache");
        }
    }

    /// Drop a single entry if present. Returns whether an entry was
    /// removed.
    pub fn invalidate(&self, key: u64) -> bool {
        let mut inner = self.inner.write();
        match inner.index.get(&key).copied() {
            Some(slot) => {
                inner.remove(slot);
                true
            }
            None => false,
        }
    }

    /// Drop every entry and reset the resident total. Hit/miss counters
    /// are cumulative and survive a clear.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        *inner = CacheInner::default();
    }

    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total payload bytes currently resident.
    pub fn resident_bytes(&self) -> usize {
        self.inner.read().resident_bytes
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: inner.index.len(),
            resident_bytes: inner.resident_bytes,
            budget: self.budget,
        }
    }
}
