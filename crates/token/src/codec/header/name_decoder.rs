use std::sync::Arc as SharedArc;

use triomphe::Arc;

use crate::buffer::Buffer;
use crate::cache::TokenCaches;
use crate::codec::TokenDecoder;
use crate::codec::header::HeaderLine;
use crate::hash::{FNV_OFFSET_BASIS, fnv_step};
use crate::protocol::ParseError;
use crate::range::DataRange;
use crate::token::HeaderName;
use crate::utils::is_token_byte;

/// Decodes a header name up to its `:`, or the CR LF that ends the header block.
///
/// Spaces are tolerated between the name and the colon only, so `Host:` and
/// `Host :` are the same name while `Ho st:` is rejected. Every other name byte
/// must be a token byte, whichever representation the name ends up in. On
/// success the cursor is past the colon (or past the final CR LF).
#[derive(Debug, Clone)]
pub struct HeaderNameDecoder {
    caches: SharedArc<TokenCaches>,
}

impl HeaderNameDecoder {
    pub fn new(caches: SharedArc<TokenCaches>) -> Self {
        Self { caches }
    }

    fn locate(src: &[u8], start: usize, range: &mut DataRange) -> Result<Option<HeaderLine<usize>>, ParseError> {
        match src.get(start) {
            None => return Ok(None),
            Some(b'\r') => {
                return match src.get(start + 1) {
                    Some(b'\n') => Ok(Some(HeaderLine::End)),
                    Some(_) => Err(ParseError::invalid_header("CR not followed by LF")),
                    None => Ok(None),
                };
            }
            Some(&first) => range.reset(start, first),
        }

        let mut hash = FNV_OFFSET_BASIS;
        let mut name_end = None;
        for (offset, &b) in src.iter().enumerate().skip(start) {
            match b {
                b':' => {
                    let len = name_end.unwrap_or(offset) - start;
                    if len == 0 {
                        return Err(ParseError::invalid_header("empty header name"));
                    }
                    range.finish(len, len, hash, false);
                    return Ok(Some(HeaderLine::Name(offset)));
                }
                b' ' => {
                    name_end.get_or_insert(offset);
                }
                _ if name_end.is_some() => return Err(ParseError::invalid_header("space inside header name")),
                b'\r' | b'\n' => return Err(ParseError::invalid_header("header line without ':'")),
                b if is_token_byte(b) => hash = fnv_step(hash, b),
                b => return Err(ParseError::invalid_header(format!("illegal byte {b:#04x} in header name"))),
            }
        }
        Ok(None)
    }

    /// Finds the next name without interning it.
    pub fn scan<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<HeaderLine<DataRange>>, ParseError> {
        let start = buf.read_pos();
        let line = match Self::locate(buf.written(), start, range)? {
            None => return Ok(None),
            Some(HeaderLine::End) => {
                buf.set_read_pos(start + 2);
                HeaderLine::End
            }
            Some(HeaderLine::Name(colon)) => {
                buf.set_read_pos(colon + 1);
                HeaderLine::Name(*range)
            }
        };
        Ok(Some(line))
    }
}

impl TokenDecoder for HeaderNameDecoder {
    type Token = HeaderLine<Arc<HeaderName>>;

    fn decode<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Token>, ParseError> {
        let start = buf.read_pos();
        let line = match Self::locate(buf.written(), start, range)? {
            None => return Ok(None),
            Some(HeaderLine::End) => {
                buf.set_read_pos(start + 2);
                HeaderLine::End
            }
            Some(HeaderLine::Name(colon)) => {
                let name = self.caches.header_names().get(buf.written(), range)?;
                buf.set_read_pos(colon + 1);
                HeaderLine::Name(name)
            }
        };
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ScanBuf;
    use crate::token::HeaderKind;

    fn decoder() -> HeaderNameDecoder {
        HeaderNameDecoder::new(SharedArc::new(TokenCaches::new()))
    }

    fn name_of(decoder: &HeaderNameDecoder, input: &[u8]) -> Arc<HeaderName> {
        let mut range = DataRange::default();
        match decoder.decode(&mut ScanBuf::new(input), &mut range).unwrap() {
            Some(HeaderLine::Name(name)) => name,
            other => panic!("expected a name, got {other:?}"),
        }
    }

    #[test]
    fn tolerated_spaces_share_token() {
        let decoder = decoder();
        let tight = name_of(&decoder, b"Host: example.com\r\n");
        let spaced = name_of(&decoder, b"Host  : example.com\r\n");
        assert!(Arc::ptr_eq(&tight, &spaced));
        assert_eq!(tight.kind(), HeaderKind::Vocabulary);
    }

    #[test]
    fn cursor_after_colon() {
        let decoder = decoder();
        let mut range = DataRange::default();
        let mut buf = ScanBuf::new(b"Content-Length : 5\r\n");
        decoder.decode(&mut buf, &mut range).unwrap().unwrap();
        assert_eq!(buf.unread(), b" 5\r\n");
        assert_eq!(range.raw(buf.bytes()), b"Content-Length");
    }

    #[test]
    fn malformed_names() {
        let decoder = decoder();
        let mut range = DataRange::default();
        for input in [&b"Ho st: x\r\n"[..], b": x\r\n", b" Host: x\r\n", b"Host\r\n", b"\rX", b"Bad\"Name: x\r\n"] {
            assert!(decoder.decode(&mut ScanBuf::new(input), &mut range).is_err(), "{input:?}");
        }
    }

    #[test]
    fn scan_rejects_what_decode_rejects() {
        let decoder = decoder();
        for input in [&b"Bad\"Name: x\r\n"[..], b"Bad\tName: x\r\n", b"Bad(Name): x\r\n", b"Na\x80me: x\r\n"] {
            let mut range = DataRange::default();
            assert!(decoder.scan(&mut ScanBuf::new(input), &mut range).is_err(), "{input:?}");
            assert!(decoder.decode(&mut ScanBuf::new(input), &mut range).is_err(), "{input:?}");
        }
        assert!(decoder.caches.header_names().is_empty());
    }

    #[test]
    fn end_of_headers() {
        let decoder = decoder();
        let mut range = DataRange::default();

        let mut buf = ScanBuf::new(b"\r\nbody");
        assert_eq!(decoder.scan(&mut buf, &mut range).unwrap(), Some(HeaderLine::End));
        assert_eq!(buf.unread(), b"body");

        let mut buf = ScanBuf::new(b"\r");
        assert_eq!(decoder.scan(&mut buf, &mut range).unwrap(), None);
        assert_eq!(buf.read_pos(), 0);
    }

    #[test]
    fn partial_name() {
        let decoder = decoder();
        let mut range = DataRange::default();
        for input in [&b""[..], b"Hos", b"Host  "] {
            let mut buf = ScanBuf::new(input);
            assert!(decoder.decode(&mut buf, &mut range).unwrap().is_none());
            assert_eq!(buf.read_pos(), 0);
        }
    }
}
