//! Payload obfuscation
//!
//! Every payload byte is XORed with a fixed key byte on write and again on
//! read. This is anti-casual-inspection obfuscation, not encryption: anyone
//! with the key byte (which ships in this source file) can reverse it.
//!
//! The transform is pure and stateless so a different scheme can replace it
//! without touching the builder or reader.

/// Fixed obfuscation key.
pub const KEY: u8 = 0xAC;

/// XOR a buffer with [`KEY`] in place. Self-inverse.
pub fn apply_in_place(bytes: &mut [u8]) {
    for byte in bytes.iter_mut() {
        *byte ^= KEY;
    }
}

/// Allocating variant of [`apply_in_place`].
pub fn apply(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    apply_in_place(&mut out);
    out
}
