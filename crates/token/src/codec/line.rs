//! Request-line decoders: method, path, query string and version.
//!
//! The request line is decoded token by token. After the method the cursor
//! sits on the path; the path decoder leaves it on its terminator so the driving
//! loop can tell a query (`?`), a fragment (`#`) and the version apart.

use std::sync::Arc as SharedArc;

use bytes::Bytes;
use tracing::trace;
use triomphe::Arc;

use crate::buffer::Buffer;
use crate::cache::TokenCaches;
use crate::codec::TokenDecoder;
use crate::codec::scan::{scan_component, scan_token};
use crate::hash::fnv1a;
use crate::protocol::{HttpVersion, ParseError, QueryParam, QueryString, RangePairs};
use crate::range::DataRange;
use crate::token::{Interned, Method, Path, StandardMethod};

/// Decodes the request method, the eight standard verbs without hashing.
#[derive(Debug, Clone)]
pub struct MethodDecoder {
    caches: SharedArc<TokenCaches>,
}

impl MethodDecoder {
    pub fn new(caches: SharedArc<TokenCaches>) -> Self {
        Self { caches }
    }

    fn fast_path(unread: &[u8]) -> Option<StandardMethod> {
        match unread {
            [b'G', b'E', b'T', b' ', ..] => Some(StandardMethod::Get),
            [b'P', b'U', b'T', b' ', ..] => Some(StandardMethod::Put),
            [b'H', b'E', b'A', b'D', b' ', ..] => Some(StandardMethod::Head),
            [b'P', b'O', b'S', b'T', b' ', ..] => Some(StandardMethod::Post),
            [b'T', b'R', b'A', b'C', b'E', b' ', ..] => Some(StandardMethod::Trace),
            [b'D', b'E', b'L', b'E', b'T', b'E', b' ', ..] => Some(StandardMethod::Delete),
            [b'C', b'O', b'N', b'N', b'E', b'C', b'T', b' ', ..] => Some(StandardMethod::Connect),
            [b'O', b'P', b'T', b'I', b'O', b'N', b'S', b' ', ..] => Some(StandardMethod::Options),
            _ => None,
        }
    }

    /// Hash scan up to the space and a method cache lookup, for any verb.
    pub fn decode_generic<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Arc<Method>>, ParseError> {
        let src = buf.written();
        let Some(end) = scan_token(src, buf.read_pos(), range, |b| matches!(b, b' ' | b'\r' | b'\n')) else {
            return Ok(None);
        };
        if src[end] != b' ' {
            return Err(ParseError::invalid_method("request line ends after the method"));
        }
        if range.is_empty() {
            return Err(ParseError::invalid_method("empty method"));
        }

        let method = self.caches.methods().get(src, range)?;
        buf.set_read_pos(end + 1);
        Ok(Some(method))
    }
}

impl TokenDecoder for MethodDecoder {
    type Token = Arc<Method>;

    fn decode<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Token>, ParseError> {
        let Some(standard) = Self::fast_path(buf.unread()) else {
            return self.decode_generic(buf, range);
        };

        let method = self.caches.standard_method(standard);
        let len = method.as_bytes().len();
        range.reset(buf.read_pos(), method.as_bytes()[0]);
        range.finish(len, len, method.fnv_hash(), false);
        buf.advance(len + 1);
        Ok(Some(Arc::clone(method)))
    }
}

/// Decodes the path, up to a space, `?` or `#`.
///
/// `+` and `%XX` are decoded inline, so `/a%20b`, `/a+b` and `/a b` share
/// one cache entry. The cursor is left on the terminator.
#[derive(Debug, Clone)]
pub struct PathDecoder {
    caches: SharedArc<TokenCaches>,
}

impl PathDecoder {
    pub fn new(caches: SharedArc<TokenCaches>) -> Self {
        Self { caches }
    }

    fn locate<B: Buffer>(buf: &B, range: &mut DataRange) -> Result<Option<usize>, ParseError> {
        let src = buf.written();
        let end = scan_component(src, buf.read_pos(), range, false, |b| matches!(b, b' ' | b'?' | b'#' | b'\r' | b'\n'))?;
        let Some(end) = end else {
            return Ok(None);
        };
        if matches!(src[end], b'\r' | b'\n') {
            return Err(ParseError::invalid_uri("request line ends after the path"));
        }
        if range.is_empty() {
            return Err(ParseError::invalid_uri("empty path"));
        }
        Ok(Some(end))
    }

    /// Finds the path without interning it.
    pub fn scan<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<DataRange>, ParseError> {
        let Some(end) = Self::locate(buf, range)? else {
            return Ok(None);
        };
        buf.set_read_pos(end);
        Ok(Some(*range))
    }
}

impl TokenDecoder for PathDecoder {
    type Token = Arc<Path>;

    fn decode<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Token>, ParseError> {
        let Some(end) = Self::locate(buf, range)? else {
            return Ok(None);
        };
        let path = self.caches.paths().get(buf.written(), range)?;
        buf.set_read_pos(end);
        Ok(Some(path))
    }
}

/// Decodes a query string, starting on the `?` (or `#`) that ended the path.
///
/// The whole query is one token: nothing is committed until its terminating
/// space has arrived, and on success the cursor is past that space. A `#`
/// fragment is skipped. Pairs with an empty key are dropped and a key without
/// `=` gets an empty value.
#[derive(Debug, Clone)]
pub struct QueryDecoder {
    caches: SharedArc<TokenCaches>,
}

impl QueryDecoder {
    pub fn new(caches: SharedArc<TokenCaches>) -> Self {
        Self { caches }
    }

    /// Returns the end of the query proper and the offset of the terminating space.
    fn locate(src: &[u8], start: usize) -> Result<Option<(usize, usize)>, ParseError> {
        let mut query_end = None;
        for (offset, &b) in src.iter().enumerate().skip(start) {
            match b {
                b' ' => return Ok(Some((query_end.unwrap_or(offset), offset))),
                b'#' if query_end.is_none() => query_end = Some(offset),
                b'\r' | b'\n' => return Err(ParseError::invalid_uri("request line ends after the query")),
                _ => {}
            }
        }
        Ok(None)
    }

    fn for_each_pair(
        src: &[u8],
        from: usize,
        to: usize,
        mut f: impl FnMut(&DataRange, &DataRange) -> Result<(), ParseError>,
    ) -> Result<(), ParseError> {
        let query = &src[..to];
        let mut pos = from;
        while pos < to {
            let mut key = DataRange::default();
            let mut value = DataRange::default();
            let key_end = scan_component(query, pos, &mut key, true, |b| b == b'&' || b == b'=')?.unwrap_or(to);
            value.reset(key_end, 0);
            pos = key_end;
            if key_end < to && query[key_end] == b'=' {
                pos = scan_component(query, key_end + 1, &mut value, true, |b| b == b'&')?.unwrap_or(to);
            }
            if key.decoded_len() > 0 {
                f(&key, &value)?;
            }
            // past the '&'
            pos += 1;
        }
        Ok(())
    }

    fn query_range(src: &[u8], from: usize, to: usize, range: &mut DataRange) {
        range.reset(from, src.get(from).copied().unwrap_or_default());
        range.finish(to - from, to - from, range.hash(), false);
    }

    /// Records the pairs as ranges without decoding or interning them.
    ///
    /// Returns the range of the raw query. On `None` the pairs are untouched.
    pub fn scan_into<B: Buffer>(
        &self,
        buf: &mut B,
        range: &mut DataRange,
        pairs: &mut RangePairs,
    ) -> Result<Option<DataRange>, ParseError> {
        let start = buf.read_pos();
        let src = buf.written();
        let Some((query_end, space)) = Self::locate(src, start)? else {
            return Ok(None);
        };
        let from = (start + 1).min(query_end);
        Self::for_each_pair(src, from, query_end, |key, value| {
            pairs.push(*key, *value);
            Ok(())
        })?;

        Self::query_range(src, from, query_end, range);
        trace!(pairs = pairs.len(), "scanned query string");
        buf.set_read_pos(space + 1);
        Ok(Some(*range))
    }
}

impl TokenDecoder for QueryDecoder {
    type Token = QueryString;

    fn decode<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Token>, ParseError> {
        let start = buf.read_pos();
        let src = buf.written();
        let Some((query_end, space)) = Self::locate(src, start)? else {
            return Ok(None);
        };
        let from = (start + 1).min(query_end);

        let mut params = Vec::new();
        Self::for_each_pair(src, from, query_end, |key, value| {
            let key = self.caches.query_keys().get(src, key)?;
            let value = Bytes::from(value.decode(src)?.into_owned());
            params.push(QueryParam::new(key, value));
            Ok(())
        })?;

        Self::query_range(src, from, query_end, range);
        trace!(params = params.len(), "decoded query string");
        buf.set_read_pos(space + 1);
        Ok(Some(QueryString::new(params)))
    }
}

/// Decodes the `HTTP/x.y\r\n` window that ends the request line.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionDecoder;

const VERSION_WINDOW: usize = 10;

impl TokenDecoder for VersionDecoder {
    type Token = HttpVersion;

    fn decode<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Token>, ParseError> {
        let Some(window) = buf.unread().get(..VERSION_WINDOW) else {
            return Ok(None);
        };
        if &window[8..] != b"\r\n" {
            return Err(ParseError::invalid_version(String::from_utf8_lossy(&window[..8])));
        }

        let version = if window[..4].eq_ignore_ascii_case(b"HTTP") && window[4] == b'/' && window[6] == b'.' {
            match (window[5], window[7]) {
                (b'0', b'9') => HttpVersion::Http09,
                (b'1', b'0') => HttpVersion::Http10,
                (b'1', b'1') => HttpVersion::Http11,
                (b'2', b'0') => HttpVersion::Http20,
                _ => HttpVersion::NotSupported,
            }
        } else {
            HttpVersion::NotSupported
        };

        let hash = fnv1a(&window[..8]);
        range.reset(buf.read_pos(), window[0]);
        range.finish(8, 8, hash, false);
        buf.advance(VERSION_WINDOW);
        Ok(Some(version))
    }
}
