//! On-disk archive layout
//!
//! An archive is a single immutable file, little-endian throughout:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Header (20 bytes)            │ magic "MPAK", version, entry count, TOC offset
//! ├──────────────────────────────┤
//! │ Payload                      │ obfuscated asset bytes, build order, no padding
//! ├──────────────────────────────┤
//! │ TOC                          │ entry_count records of 20 bytes each
//! └──────────────────────────────┘
//! ```
//!
//! `toc_offset` points exactly past the last payload byte. TOC records are
//! stored in payload-write order, not sorted by id.

use crate::error::{PakError, Result};

/// Archive magic number.
pub const MAGIC: [u8; 4] = *b"MPAK";

/// Archive format version.
pub const VERSION: i32 = 1;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 20;

/// Fixed TOC record size in bytes.
pub const RECORD_SIZE: usize = 20;

/// Archive header.
///
/// Magic and version are constants of the format and are not carried here;
/// [`Header::to_bytes`] writes them and [`Header::from_bytes`] validates
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Number of assets recorded in the TOC.
    pub entry_count: i32,

    /// Byte offset of the first TOC record.
    pub toc_offset: i64,
}

impl Header {
    pub fn new(entry_count: i32, toc_offset: i64) -> Self {
        Header {
            entry_count,
            toc_offset,
        }
    }

    /// Header written before any payload exists. Patched in place once the
    /// final count and TOC offset are known.
    pub fn placeholder() -> Self {
        Self::new(0, 0)
    }

    /// Serialize to the fixed 20-byte layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&MAGIC);
        bytes[4..8].copy_from_slice(&VERSION.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.entry_count.to_le_bytes());
        bytes[12..20].copy_from_slice(&self.toc_offset.to_le_bytes());
        bytes
    }

    /// Deserialize and validate magic and version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(PakError::ShortInput {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        if bytes[0..4] != MAGIC {
            return Err(PakError::InvalidMagic);
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..8]);
        let version = i32::from_le_bytes(version);
        if version != VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let mut entry_count = [0u8; 4];
        entry_count.copy_from_slice(&bytes[8..12]);

        let mut toc_offset = [0u8; 8];
        toc_offset.copy_from_slice(&bytes[12..20]);

        Ok(Header {
            entry_count: i32::from_le_bytes(entry_count),
            toc_offset: i64::from_le_bytes(toc_offset),
        })
    }
}

/// One TOC entry.
///
/// `offset` and `size` index the payload region. Records are created by the
/// builder while streaming and are immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetRecord {
    /// Content address of the asset's canonical name.
    pub id: u64,

    /// Byte offset of the obfuscated payload.
    pub offset: i64,

    /// Payload length in bytes.
    pub size: i32,
}

impl AssetRecord {
    /// Serialize to the fixed 20-byte layout.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..8].copy_from_slice(&self.id.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.offset.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    /// Deserialize from at least [`RECORD_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < RECORD_SIZE {
            return Err(PakError::ShortInput {
                expected: RECORD_SIZE,
                actual: bytes.len(),
            });
        }

        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[0..8]);

        let mut offset = [0u8; 8];
        offset.copy_from_slice(&bytes[8..16]);

        let mut size = [0u8; 4];
        size.copy_from_slice(&bytes[16..20]);

        Ok(AssetRecord {
            id: u64::from_le_bytes(id),
            offset: i64::from_le_bytes(offset),
            size: i32::from_le_bytes(size),
        })
    }
}
