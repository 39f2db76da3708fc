//! 32-bit FNV-1a, the rolling hash every cacheable token is keyed by.
//!
//! Decoders fold bytes in one at a time while scanning so a token's hash is
//! ready the moment its terminator is found. For percent-encoded components the
//! *decoded* byte is folded, which makes `%20`, `+` and a literal space hash
//! identically.

/// FNV-1a offset basis for 32-bit hashes.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a prime for 32-bit hashes.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Folds one byte into a running FNV-1a hash.
#[inline(always)]
pub const fn fnv_step(hash: u32, b: u8) -> u32 {
    (hash ^ b as u32).wrapping_mul(FNV_PRIME)
}

/// Hashes a whole slice.
#[inline]
pub fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| fnv_step(hash, *b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn rolling_equals_whole() {
        let rolled = b"Content-Type".iter().fold(FNV_OFFSET_BASIS, |h, b| fnv_step(h, *b));
        assert_eq!(rolled, fnv1a(b"Content-Type"));
    }
}
