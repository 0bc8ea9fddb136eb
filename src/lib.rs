//! # mpak - Immutable Asset Archive Format
//!
//! `mpak` packs many named byte blobs into a single immutable archive with
//! a trailing table of contents, and serves them back through a
//! memory-mapped reader with a bounded, thread-safe cache.
//!
//! ## Features
//!
//! - **Content addressing**: assets are looked up by the FNV-1a 64 hash of
//!   their canonical name; lookups are case- and separator-insensitive
//! - **Zero-seek reads**: the reader memory-maps the archive and indexes
//!   the TOC once at open time
//! - **Bounded caching**: decoded payloads live in a byte-budgeted LRU
//!   scoped to the reader
//! - **Background loading**: async single-asset loads and batch prefetch
//!   with cooperative cancellation (`async` feature, on by default)
//! - **Obfuscated payloads**: a reversible XOR transform keeps casual
//!   inspection out (this is not encryption)
//!
//! ## Archive layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Header (20 bytes)                            │
//! │  - Magic: "MPAK", version 1                  │
//! │  - Entry count, TOC offset                   │
//! ├──────────────────────────────────────────────┤
//! │ Payload                                      │
//! │  - Obfuscated asset bytes in build order     │
//! │  - No padding or alignment                   │
//! ├──────────────────────────────────────────────┤
//! │ TOC                                          │
//! │  - 20-byte records: id, offset, size         │
//! │  - Payload-write order, not sorted           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Archives are immutable once built: there is no append or patch
//! operation, and the reader relies on that immutability for safe shared
//! mapped reads.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mpak::{ArchiveReader, Result};
//!
//! fn main() -> Result<()> {
//!     // Pack sources into an archive
//!     mpak::build(
//!         "assets.mpak",
//!         [("models/cube.fbx", "build/meshes/cube.fbx")],
//!     )?;
//!
//!     // Serve them back, case- and separator-insensitively
//!     let reader = ArchiveReader::open("assets.mpak")?;
//!     if let Some(bytes) = reader.load("Models\\Cube.fbx")? {
//!         println!("loaded {} bytes", bytes.len());
//!     }
//!
//!     reader.dispose();
//!     Ok(())
//! }
//! ```

pub mod buffer_pool;
pub mod builder;
pub mod cache;
#[cfg(feature = "async")]
pub mod cancel;
pub mod cipher;
pub mod error;
pub mod format;
pub mod manifest;
pub mod name;
pub mod reader;

// Re-export commonly used types
pub use builder::{build, BuildReport};
pub use cache::{BoundedCache, CacheStats};
#[cfg(feature = "async")]
pub use cancel::CancellationToken;
pub use error::{PakError, Result};
pub use format::{AssetRecord, Header, HEADER_SIZE, MAGIC, RECORD_SIZE, VERSION};
pub use manifest::{AssetManifest, ManifestEntry};
pub use reader::{ArchiveReader, ReaderOptions, DEFAULT_CACHE_BUDGET};
