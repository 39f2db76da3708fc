//! Incremental request decoding.
//!
//! The codec is split into small token decoders, each recognizing one unit of
//! the request grammar, and the [`RequestDecoder`] driving them:
//!
//! - Request line: [`MethodDecoder`], [`PathDecoder`], [`QueryDecoder`], [`VersionDecoder`]
//! - Header block: [`HeaderNameDecoder`], [`HeaderValueDecoder`]
//! - Body: [`LengthDecoder`]
//!
//! Every token decoder follows the same contract: it either recognizes a whole
//! token and moves the read cursor past it, or reports `Ok(None)` with the
//! cursor exactly where it was, so the caller can refill the buffer and call
//! again. Malformed input is an `Err` and is never retried.
//!
//! # Example
//!
//! ```no_run
//! use bytes::BytesMut;
//! use micro_http_token::codec::RequestDecoder;
//! use micro_http_token::protocol::Eager;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::<Eager>::new();
//! let mut buffer = BytesMut::from(&b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
//! let request = decoder.decode(&mut buffer);
//! ```

mod body;
mod header;
mod line;
mod request_decoder;
mod scan;

use std::sync::Arc as SharedArc;

pub use body::{LengthDecoder, PayloadSize};
pub use header::{HeaderLine, HeaderNameDecoder, HeaderValueDecoder};
pub use line::{MethodDecoder, PathDecoder, QueryDecoder, VersionDecoder};
pub use request_decoder::RequestDecoder;

use crate::buffer::Buffer;
use crate::cache::TokenCaches;
use crate::config::DecoderConfig;
use crate::protocol::ParseError;
use crate::range::DataRange;

/// A decoder for one kind of token.
pub trait TokenDecoder {
    type Token;

    /// Decodes the token starting at the buffer's read cursor.
    ///
    /// `range` is scratch space: it is reset on every attempt and, on success,
    /// describes the token's bytes.
    fn decode<B: Buffer>(&self, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Token>, ParseError>;
}

/// The head decoders of one connection, all sharing one set of caches.
#[derive(Debug, Clone)]
pub struct HeadDecoders {
    method: MethodDecoder,
    path: PathDecoder,
    query: QueryDecoder,
    version: VersionDecoder,
    name: HeaderNameDecoder,
    value: HeaderValueDecoder,
}

impl HeadDecoders {
    pub fn new(caches: SharedArc<TokenCaches>, config: &DecoderConfig) -> Self {
        Self {
            method: MethodDecoder::new(SharedArc::clone(&caches)),
            path: PathDecoder::new(SharedArc::clone(&caches)),
            query: QueryDecoder::new(SharedArc::clone(&caches)),
            version: VersionDecoder,
            name: HeaderNameDecoder::new(SharedArc::clone(&caches)),
            value: HeaderValueDecoder::new(caches, config.line_scan()),
        }
    }

    pub fn method(&self) -> &MethodDecoder {
        &self.method
    }

    pub fn path(&self) -> &PathDecoder {
        &self.path
    }

    pub fn query(&self) -> &QueryDecoder {
        &self.query
    }

    pub fn version(&self) -> &VersionDecoder {
        &self.version
    }

    pub fn name(&self) -> &HeaderNameDecoder {
        &self.name
    }

    pub fn value(&self) -> &HeaderValueDecoder {
        &self.value
    }
}
