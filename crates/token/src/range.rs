//! Cursor-free descriptors of a token's location in a buffer.

use std::borrow::Cow;

use crate::hash::{FNV_OFFSET_BASIS, fnv1a};
use crate::percent;
use crate::protocol::ParseError;

/// Where a candidate token lives in the buffer it was scanned from.
///
/// A range is reset at the start of each decode attempt and finalized only
/// once the whole token is recognized. `len` is the raw scanned span; for
/// percent/plus encoded components `decoded_len` and `hash` describe the
/// decoded bytes, which is what the caches key on.
///
/// The range does not hold the buffer. Whoever stores ranges also stores the
/// bytes they index into (see [`crate::protocol::Ranged`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRange {
    start: usize,
    len: usize,
    decoded_len: usize,
    first: u8,
    hash: u32,
    encoded: bool,
}

impl Default for DataRange {
    fn default() -> Self {
        Self { start: 0, len: 0, decoded_len: 0, first: 0, hash: FNV_OFFSET_BASIS, encoded: false }
    }
}

impl DataRange {
    /// A finalized range covering all of `bytes`, for lookups by literal.
    pub fn literal(bytes: &[u8]) -> Self {
        Self {
            start: 0,
            len: bytes.len(),
            decoded_len: bytes.len(),
            first: bytes.first().copied().unwrap_or(0),
            hash: fnv1a(bytes),
            encoded: false,
        }
    }

    /// Starts a new attempt at `start`, discarding whatever was recorded before.
    #[inline]
    pub fn reset(&mut self, start: usize, first: u8) {
        *self = Self { start, first, ..Self::default() };
    }

    /// Freezes the range once the terminator has been found.
    #[inline]
    pub fn finish(&mut self, len: usize, decoded_len: usize, hash: u32, encoded: bool) {
        self.len = len;
        self.decoded_len = decoded_len;
        self.hash = hash;
        self.encoded = encoded;
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Raw scanned length.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length after percent/plus decoding.
    #[inline]
    pub fn decoded_len(&self) -> usize {
        self.decoded_len
    }

    #[inline]
    pub fn first(&self) -> u8 {
        self.first
    }

    /// FNV-1a of the decoded bytes.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Whether percent/plus decoding occurred while scanning.
    #[inline]
    pub fn is_encoded(&self) -> bool {
        self.encoded
    }

    /// The raw bytes of the range within `src`.
    #[inline]
    pub fn raw<'b>(&self, src: &'b [u8]) -> &'b [u8] {
        &src[self.start..self.end()]
    }

    /// The decoded bytes, borrowed from `src` unless decoding occurred.
    pub fn decode<'b>(&self, src: &'b [u8]) -> Result<Cow<'b, [u8]>, ParseError> {
        let raw = self.raw(src);
        if self.encoded { percent::decode_component(raw) } else { Ok(Cow::Borrowed(raw)) }
    }

    /// Exact content comparison of the decoded range against `expected`.
    pub fn matches(&self, src: &[u8], expected: &[u8]) -> bool {
        if self.decoded_len != expected.len() {
            return false;
        }
        let raw = self.raw(src);
        if self.encoded { percent::eq_decoded(raw, expected) } else { raw == expected }
    }
}
