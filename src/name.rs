//! Logical asset names and content addressing
//!
//! Assets are addressed by the 64-bit FNV-1a hash of their canonical name.
//! Canonicalization makes lookups separator- and case-insensitive, so
//! `"Models\\Cube.fbx"` and `"models/cube.fbx"` resolve to the same asset.
//! The hash is the sole lookup key in the archive; the name itself is never
//! stored on disk.

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Canonicalize a logical asset name.
///
/// Backslashes become forward slashes, the result is lowercased
/// (locale-invariant), and a single leading slash is stripped.
pub fn normalize(name: &str) -> String {
    let lowered = name.replace('\\', "/").to_lowercase();
    match lowered.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

/// Content address of a logical asset name.
///
/// FNV-1a 64 over the UTF-8 bytes of [`normalize`]\(name). Deterministic and
/// free of process-wide state.
pub fn hash(name: &str) -> u64 {
    let canonical = normalize(name);
    let mut acc = FNV_OFFSET_BASIS;
    for byte in canonical.as_bytes() {
        acc ^= u64::from(*byte);
        acc = acc.wrapping_mul(FNV_PRIME);
    }
    acc
}
