use std::sync::Arc as SharedArc;

use bytes::Bytes;

use crate::buffer::Buffer;
use crate::cache::TokenCaches;
use crate::codec::TokenDecoder;
use crate::codec::scan::scan_line;
use crate::config::LineScan;
use crate::hash::fnv1a;
use crate::protocol::{FieldValue, ParseError};
use crate::range::DataRange;
use crate::token::ValueStrategy;

/// Decodes a header value: leading SP / HTAB skipped, everything else kept up to CR LF.
///
/// Scanning is the same for every header; the [`ValueStrategy`] picked from the
/// header name only decides how the bytes are materialized. On success the
/// cursor is past the CR LF.
#[derive(Debug, Clone)]
pub struct HeaderValueDecoder {
    caches: SharedArc<TokenCaches>,
    line_scan: LineScan,
}

impl HeaderValueDecoder {
    pub fn new(caches: SharedArc<TokenCaches>, line_scan: LineScan) -> Self {
        Self { caches, line_scan }
    }

    fn locate(&self, src: &[u8], start: usize, range: &mut DataRange) -> Result<Option<usize>, ParseError> {
        let Some(skipped) = src[start..].iter().position(|b| !matches!(b, b' ' | b'\t')) else {
            return Ok(None);
        };
        let from = start + skipped;
        let Some(cr) = scan_line(src, from, self.line_scan)? else {
            return Ok(None);
        };
        let len = cr - from;
        range.reset(from, src[from]);
        range.finish(len, len, range.hash(), false);
        Ok(Some(cr))
    }

    /// Decodes the value and materializes it as `strategy` asks.
    pub fn decode_as<B: Buffer>(
        &self,
        strategy: ValueStrategy,
        buf: &mut B,
        range: &mut DataRange,
    ) -> Result<Option<FieldValue>, ParseError> {
        let src = buf.written();
        let Some(cr) = self.locate(src, buf.read_pos(), range)? else {
            return Ok(None);
        };
        let value = self.materialize(strategy, src, range)?;
        buf.set_read_pos(cr + 2);
        Ok(Some(value))
    }

    fn materialize(&self, strategy: ValueStrategy, src: &[u8], range: &mut DataRange) -> Result<FieldValue, ParseError> {
        if strategy == ValueStrategy::Plain {
            return Ok(FieldValue::Plain(Bytes::copy_from_slice(range.raw(src))));
        }

        // only interned values need the hash
        let len = range.len();
        range.finish(len, len, fnv1a(range.raw(src)), false);
        let value = match strategy {
            ValueStrategy::Connection => FieldValue::Connection(self.caches.connection_values().get(src, range)?),
            ValueStrategy::ContentType => FieldValue::ContentType(self.caches.content_types().get(src, range)?),
            ValueStrategy::Cached | ValueStrategy::Plain => FieldValue::Cached(self.caches.header_values().get(src, range)?),
        };
        Ok(value)
    }
}

impl TokenDecoder for HeaderValueDecoder {
    /// The raw value range, left unmaterialized.
    type Token = DataRange;

    fn decode<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Token>, ParseError> {
        let Some(cr) = self.locate(buf.written(), buf.read_pos(), range)? else {
            return Ok(None);
        };
        buf.set_read_pos(cr + 2);
        Ok(Some(*range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ScanBuf;
    use crate::token::{ConnectionKind, ContentKind};

    fn decoder(line_scan: LineScan) -> HeaderValueDecoder {
        HeaderValueDecoder::new(SharedArc::new(TokenCaches::new()), line_scan)
    }

    #[test]
    fn skips_leading_whitespace() {
        let decoder = decoder(LineScan::Block);
        let mut range = DataRange::default();
        let src = b" \t keep-alive \r\nnext";
        let mut buf = ScanBuf::new(src);
        let value = decoder.decode(&mut buf, &mut range).unwrap().unwrap();
        assert_eq!(value.raw(src), b"keep-alive ");
        assert_eq!(buf.unread(), b"next");
    }

    #[test]
    fn whitespace_only_needs_more() {
        let decoder = decoder(LineScan::Bytewise);
        let mut range = DataRange::default();
        for input in [&b"   "[..], b" value", b" value\r"] {
            let mut buf = ScanBuf::new(input);
            assert!(decoder.decode(&mut buf, &mut range).unwrap().is_none());
            assert_eq!(buf.read_pos(), 0);
        }
        assert!(decoder.decode(&mut ScanBuf::new(b" value\rx"), &mut range).is_err());
        assert!(decoder.decode(&mut ScanBuf::new(b" a\nInjected: b\r\n"), &mut range).is_err());
    }

    #[test]
    fn empty_value() {
        let decoder = decoder(LineScan::Block);
        let mut range = DataRange::default();
        let mut buf = ScanBuf::new(b"\r\n");
        let value = decoder.decode_as(ValueStrategy::Plain, &mut buf, &mut range).unwrap().unwrap();
        assert_eq!(value.as_bytes(), b"");
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn strategies() {
        let decoder = decoder(LineScan::Block);
        let mut range = DataRange::default();
        let decode = |strategy, input: &[u8], range: &mut DataRange| {
            decoder.decode_as(strategy, &mut ScanBuf::new(input), range).unwrap().unwrap()
        };

        let FieldValue::Connection(connection) = decode(ValueStrategy::Connection, b" close\r\n", &mut range) else {
            panic!("expected a connection value");
        };
        assert_eq!(connection.kind(), ConnectionKind::Close);

        let FieldValue::ContentType(content_type) = decode(ValueStrategy::ContentType, b" application/json\r\n", &mut range) else {
            panic!("expected a content type");
        };
        assert_eq!(content_type.kind(), ContentKind::Json);

        let first = decode(ValueStrategy::Cached, b" gzip, br\r\n", &mut range);
        let second = decode(ValueStrategy::Cached, b"gzip, br\r\n", &mut range);
        match (first, second) {
            (FieldValue::Cached(a), FieldValue::Cached(b)) => assert!(triomphe::Arc::ptr_eq(&a, &b)),
            other => panic!("expected cached values, got {other:?}"),
        }

        assert!(matches!(decode(ValueStrategy::Plain, b" abc\r\n", &mut range), FieldValue::Plain(bytes) if bytes == "abc"));
    }

    #[test]
    fn block_and_bytewise_agree() {
        let bytewise = decoder(LineScan::Bytewise);
        let block = decoder(LineScan::Block);
        let inputs: [&[u8]; 7] = [
            b" Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36\r\n",
            b"0123456789\r\n",
            b"012345678\r\n",
            b"a\r",
            b"a long value with a stray CR\rin it\r\n",
            b" a\nInjected: b\r\n",
            b" a value longer than a block\nInjected: b\r\n",
        ];
        for input in inputs {
            for split in 0..=input.len() {
                let mut left = DataRange::default();
                let mut right = DataRange::default();
                let a = bytewise.decode(&mut ScanBuf::new(&input[..split]), &mut left).map_err(|e| e.to_string());
                let b = block.decode(&mut ScanBuf::new(&input[..split]), &mut right).map_err(|e| e.to_string());
                assert_eq!(a, b, "{input:?} cut at {split}");
            }
        }
    }
}
