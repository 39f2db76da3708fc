//! `application/x-www-form-urlencoded` style decoding used by path and query tokens.
//!
//! `+` decodes to a space and `%XX` to the byte `0xXX`. Decoding happens inline
//! while scanning; the helpers here re-decode a
//! finalized range when a caller asks for the bytes or when a cache needs to
//! compare a candidate against an interned token.

use std::borrow::Cow;

use crate::protocol::ParseError;

/// Byte → hex nibble, `-1` for bytes that are not hex digits.
pub(crate) static HEX_NIBBLE: [i8; 256] = build_nibble_table();

const fn build_nibble_table() -> [i8; 256] {
    let mut table = [-1_i8; 256];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as i8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as i8;
        table[b'A' as usize + i] = 10 + i as i8;
        i += 1;
    }
    table
}

/// Decodes the two hex digits following a `%`.
#[inline]
pub(crate) fn decode_pair(hi: u8, lo: u8) -> Result<u8, ParseError> {
    let high = HEX_NIBBLE[hi as usize];
    let low = HEX_NIBBLE[lo as usize];
    if high < 0 || low < 0 {
        return Err(ParseError::invalid_percent_encoding(&[b'%', hi, lo]));
    }
    Ok(((high as u8) << 4) | low as u8)
}

/// Decodes a raw component, borrowing when nothing needs decoding.
pub fn decode_component(raw: &[u8]) -> Result<Cow<'_, [u8]>, ParseError> {
    if !raw.iter().any(|b| matches!(b, b'+' | b'%')) {
        return Ok(Cow::Borrowed(raw));
    }

    let mut decoded = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'+' => decoded.push(b' '),
            b'%' => {
                if i + 2 >= raw.len() {
                    return Err(ParseError::invalid_percent_encoding(&raw[i..]));
                }
                decoded.push(decode_pair(raw[i + 1], raw[i + 2])?);
                i += 2;
            }
            b => decoded.push(b),
        }
        i += 1;
    }
    Ok(Cow::Owned(decoded))
}

/// Compares the decoded form of `raw` with `expected` without allocating.
pub(crate) fn eq_decoded(raw: &[u8], expected: &[u8]) -> bool {
    let mut i = 0;
    let mut j = 0;
    while i < raw.len() {
        let b = match raw[i] {
            b'+' => b' ',
            b'%' if i + 2 < raw.len() => match decode_pair(raw[i + 1], raw[i + 2]) {
                Ok(b) => {
                    i += 2;
                    b
                }
                Err(_) => return false,
            },
            b => b,
        };
        if expected.get(j) != Some(&b) {
            return false;
        }
        i += 1;
        j += 1;
    }
    j == expected.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibbles() {
        assert_eq!(HEX_NIBBLE[b'0' as usize], 0);
        assert_eq!(HEX_NIBBLE[b'9' as usize], 9);
        assert_eq!(HEX_NIBBLE[b'a' as usize], 10);
        assert_eq!(HEX_NIBBLE[b'F' as usize], 15);
        assert_eq!(HEX_NIBBLE[b'g' as usize], -1);
        assert_eq!(HEX_NIBBLE[b'%' as usize], -1);
    }

    #[test]
    fn decode_plus_and_percent() {
        assert_eq!(decode_component(b"a+b%20c").unwrap().as_ref(), b"a b c");
        assert_eq!(decode_component(b"%2Fx%2f").unwrap().as_ref(), b"/x/");
        assert!(matches!(decode_component(b"plain").unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn decode_rejects_bad_escape() {
        assert!(decode_component(b"a%zz").is_err());
        assert!(decode_component(b"a%2").is_err());
        assert!(decode_component(b"%").is_err());
    }

    #[test]
    fn compare_decoded() {
        assert!(eq_decoded(b"a+b%20c", b"a b c"));
        assert!(eq_decoded(b"a b c", b"a b c"));
        assert!(!eq_decoded(b"a+b%20c", b"a b"));
        assert!(!eq_decoded(b"a+b", b"a b c"));
        assert!(!eq_decoded(b"a%zz", b"a%zz"));
    }
}
