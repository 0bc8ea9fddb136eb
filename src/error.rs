use thiserror::Error;

#[derive(Error, Debug)]
pub enum PakError {
    #[error("Invalid magic number in archive header")]
    InvalidMagic,

    #[error("Unsupported archive version: {0}")]
    UnsupportedVersion(i32),

    #[error("Input too short for a fixed-size structure: need {expected} bytes, have {actual}")]
    ShortInput { expected: usize, actual: usize },

    #[error("Table of contents out of bounds: offset {toc_offset}, {entry_count} entries, archive is {archive_len} bytes")]
    TocOutOfBounds {
        toc_offset: i64,
        entry_count: i32,
        archive_len: usize,
    },

    #[error("Name hash collision: '{first}' and '{second}' both map to {id:#018x}")]
    HashCollision {
        first: String,
        second: String,
        id: u64,
    },

    #[error("Asset '{name}' is {len} bytes, larger than the record size field can hold")]
    AssetTooLarge { name: String, len: usize },

    #[error("Asset {id:#018x} truncated: record promises {expected} bytes at offset {offset}, mapping is {available} bytes")]
    Truncated {
        id: u64,
        offset: i64,
        expected: i32,
        available: usize,
    },

    #[error("Archive reader is disposed")]
    Disposed,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Background load task failed: {0}")]
    TaskJoin(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PakError>;
