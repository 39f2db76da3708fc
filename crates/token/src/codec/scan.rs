//! The scanning loops shared by every token decoder.
//!
//! Each routine walks `src` from `start`, finalizes `range` once the token's
//! terminator is found and reports the terminator's offset. Running out of bytes
//! is `None` and leaves the range unfinished; callers retry from the same start
//! after a refill and the hash is recomputed from scratch.

use crate::config::LineScan;
use crate::hash::{FNV_OFFSET_BASIS, fnv_step};
use crate::percent::decode_pair;
use crate::protocol::ParseError;
use crate::range::DataRange;

const BLOCK: usize = 10;

/// Plain token scan: every byte up to the terminator is hashed as is.
pub(crate) fn scan_token(src: &[u8], start: usize, range: &mut DataRange, is_end: impl Fn(u8) -> bool) -> Option<usize> {
    range.reset(start, src.get(start).copied().unwrap_or_default());
    let mut hash = FNV_OFFSET_BASIS;
    for (offset, &b) in src.iter().enumerate().skip(start) {
        if is_end(b) {
            let len = offset - start;
            range.finish(len, len, hash, false);
            return Some(offset);
        }
        hash = fnv_step(hash, b);
    }
    None
}

/// Percent/plus decoding scan used by paths and query components.
///
/// The hash and decoded length cover the decoded bytes. With `bounded` the end
/// of `src` terminates the component; otherwise it means more bytes are needed,
/// including a `%` that is not yet followed by two bytes.
pub(crate) fn scan_component(
    src: &[u8],
    start: usize,
    range: &mut DataRange,
    bounded: bool,
    is_end: impl Fn(u8) -> bool,
) -> Result<Option<usize>, ParseError> {
    range.reset(start, src.get(start).copied().unwrap_or_default());
    let mut hash = FNV_OFFSET_BASIS;
    let mut decoded_len = 0;
    let mut encoded = false;
    let mut i = start;

    while i < src.len() {
        let b = src[i];
        if is_end(b) {
            range.finish(i - start, decoded_len, hash, encoded);
            return Ok(Some(i));
        }
        let decoded = match b {
            b'+' => {
                encoded = true;
                b' '
            }
            b'%' => {
                if i + 2 >= src.len() {
                    return if bounded { Err(ParseError::invalid_percent_encoding(&src[i..])) } else { Ok(None) };
                }
                encoded = true;
                let decoded = decode_pair(src[i + 1], src[i + 2])?;
                i += 2;
                decoded
            }
            b => b,
        };
        hash = fnv_step(hash, decoded);
        decoded_len += 1;
        i += 1;
    }

    if bounded {
        range.finish(i - start, decoded_len, hash, encoded);
        Ok(Some(i))
    } else {
        Ok(None)
    }
}

/// Finds the CR of the CR LF ending a line that starts at `start`.
///
/// A CR followed by anything but LF, or an LF without its CR, is malformed; a
/// CR as the last available byte is not enough data.
pub(crate) fn scan_line(src: &[u8], start: usize, mode: LineScan) -> Result<Option<usize>, ParseError> {
    let mut i = start;
    if mode == LineScan::Block {
        while i + BLOCK <= src.len() && !src[i..i + BLOCK].iter().any(|b| matches!(b, b'\r' | b'\n')) {
            i += BLOCK;
        }
    }

    while i < src.len() {
        match src[i] {
            b'\r' => {
                return match src.get(i + 1) {
                    Some(b'\n') => Ok(Some(i)),
                    Some(_) => Err(ParseError::invalid_header("CR not followed by LF")),
                    None => Ok(None),
                };
            }
            b'\n' => return Err(ParseError::invalid_header("bare LF in header line")),
            _ => i += 1,
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fnv1a;

    #[test]
    fn token_scan() {
        let mut range = DataRange::default();
        assert_eq!(scan_token(b"PATCH /", 0, &mut range, |b| b == b' '), Some(5));
        assert_eq!(range.raw(b"PATCH /"), b"PATCH");
        assert_eq!(range.hash(), fnv1a(b"PATCH"));

        assert_eq!(scan_token(b"PATC", 0, &mut range, |b| b == b' '), None);
    }

    #[test]
    fn component_decodes_inline() {
        let src = b"/a+b%20c?x";
        let mut range = DataRange::default();
        let end = scan_component(src, 0, &mut range, false, |b| matches!(b, b' ' | b'?' | b'#')).unwrap();
        assert_eq!(end, Some(8));
        assert_eq!(range.len(), 8);
        assert_eq!(range.decoded_len(), 6);
        assert_eq!(range.hash(), fnv1a(b"/a b c"));
        assert!(range.is_encoded());
    }

    #[test]
    fn component_needs_both_nibbles() {
        let mut range = DataRange::default();
        assert_eq!(scan_component(b"/a%2", 0, &mut range, false, |b| b == b' ').unwrap(), None);
        assert!(scan_component(b"/a%2", 0, &mut range, true, |b| b == b' ').is_err());
        assert!(scan_component(b"/a%zz ", 0, &mut range, false, |b| b == b' ').is_err());
    }

    #[test]
    fn bounded_component_ends_at_slice_end() {
        let mut range = DataRange::default();
        assert_eq!(scan_component(b"k=v", 2, &mut range, true, |b| b == b'&').unwrap(), Some(3));
        assert_eq!(range.raw(b"k=v"), b"v");
    }

    #[test]
    fn line_scan_modes_agree() {
        let inputs: [&[u8]; 7] = [
            b"short\r\n",
            b"a\nInjected: b\r\n",
            b"0123456789abc\nInjected: b\r\n",
            b"a value that is longer than one block\r\nnext",
            b"0123456789\r\n",
            b"012345678\r",
            b"0123456789012345678\rX",
        ];
        for input in inputs {
            for start in 0..input.len() {
                let bytewise = scan_line(input, start, LineScan::Bytewise).map_err(|e| e.to_string());
                let block = scan_line(input, start, LineScan::Block).map_err(|e| e.to_string());
                assert_eq!(bytewise, block, "input {input:?} from {start}");
            }
        }
    }

    #[test]
    fn line_scan_results() {
        assert_eq!(scan_line(b"abc\r\n", 0, LineScan::Block).unwrap(), Some(3));
        assert_eq!(scan_line(b"abc\r", 0, LineScan::Block).unwrap(), None);
        assert_eq!(scan_line(b"abc", 0, LineScan::Bytewise).unwrap(), None);
        assert!(scan_line(b"abc\rd", 0, LineScan::Bytewise).is_err());
        for mode in [LineScan::Bytewise, LineScan::Block] {
            assert!(scan_line(b"a\nInjected: b\r\n", 0, mode).is_err());
            assert!(scan_line(b"0123456789abcdef\n", 0, mode).is_err());
        }
    }
}
