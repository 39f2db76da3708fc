//! The driving loop: request line, headers, then body.
//!
//! [`RequestDecoder`] implements [`Decoder`] so it can sit under a
//! `FramedRead`. Between calls it keeps the state it reached, the cursor of the
//! first unconsumed byte and whatever tokens were already decoded; a call with
//! more bytes resumes from there instead of rescanning the head.
//!
//! # State Machine
//!
//! ```text
//! Idle -> Method -> Path -> [Query] -> Version -> HeaderName <-> HeaderValue -> [Body]
//! ```
//!
//! `Idle` skips whitespace and control bytes left over before a request. Once
//! the final CR LF is seen the head is split off the read buffer and frozen,
//! the body (if any) is gathered, and the decoder goes back to `Idle` for the
//! next pipelined request. A transfer-encoded request is returned with its body
//! deferred; the decoder then refuses any further input.

use std::sync::Arc as SharedArc;
use std::{io, mem};

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{trace, warn};
use triomphe::Arc;

use crate::buffer::{Buffer, ScanBuf};
use crate::cache::TokenCaches;
use crate::codec::body::{LengthDecoder, PayloadSize, parse_content_length, parse_payload};
use crate::codec::{HeadDecoders, HeaderLine, TokenDecoder};
use crate::config::DecoderConfig;
use crate::protocol::{Eager, HttpVersion, ParseError, ParseResult, Repr, Request};
use crate::range::DataRange;
use crate::token::{ConnectionKind, HeaderKind, Method};
use crate::utils::{ensure, is_leading_junk};

#[derive(Debug)]
enum State<N> {
    Idle,
    Method,
    Path,
    Query,
    Version,
    HeaderName,
    HeaderValue(N),
    Body,
    Deferred,
}

/// What has been decoded of the current head so far.
#[derive(Debug)]
struct Partial<R: Repr> {
    method: Option<Arc<Method>>,
    path: Option<R::Path>,
    target: DataRange,
    query: R::Query,
    version: HttpVersion,
    headers: R::Headers,
    content_length: Option<u64>,
    transfer_encoding: Option<DataRange>,
    connection: Option<ConnectionKind>,
}

impl<R: Repr> Default for Partial<R> {
    fn default() -> Self {
        Self {
            method: None,
            path: None,
            target: DataRange::default(),
            query: R::Query::default(),
            version: HttpVersion::default(),
            headers: R::Headers::default(),
            content_length: None,
            transfer_encoding: None,
            connection: None,
        }
    }
}

impl<R: Repr> Partial<R> {
    fn reset(&mut self) {
        let mut headers = mem::take(&mut self.headers);
        R::clear_headers(&mut headers);
        *self = Self { headers, ..Self::default() };
    }

    /// Stretches the request target over the token that was just decoded.
    fn extend_target(&mut self, range: &DataRange) {
        let len = range.end().max(self.target.end()) - self.target.start();
        self.target.finish(len, len, self.target.hash(), false);
    }
}

/// Decodes pipelined HTTP/1.x requests from a connection's read buffer.
///
/// The type parameter picks the representation of the decoded requests
/// ([`Eager`] tokens or [`crate::protocol::Ranged`] descriptors).
#[derive(Debug)]
pub struct RequestDecoder<R: Repr = Eager> {
    config: DecoderConfig,
    decoders: HeadDecoders,
    state: State<R::Name>,
    /// Offset of the first byte of the current head not yet consumed by a token.
    cursor: usize,
    range: DataRange,
    partial: Partial<R>,
    spare_headers: R::Headers,
    pending: Option<Request<R>>,
    body: LengthDecoder,
    deferred_encoding: Bytes,
}

impl<R: Repr> RequestDecoder<R> {
    /// A decoder with default limits over the process-wide caches.
    pub fn new() -> Self {
        Self::with_caches(TokenCaches::shared(), DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self::with_caches(TokenCaches::shared(), config)
    }

    pub fn with_caches(caches: SharedArc<TokenCaches>, config: DecoderConfig) -> Self {
        Self {
            decoders: HeadDecoders::new(caches, &config),
            config,
            state: State::Idle,
            cursor: 0,
            range: DataRange::default(),
            partial: Partial::default(),
            spare_headers: R::Headers::default(),
            pending: None,
            body: LengthDecoder::new(),
            deferred_encoding: Bytes::new(),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Drops whatever was decoded of the current request.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.cursor = 0;
        self.partial.reset();
        self.pending = None;
        self.body.start(0);
        self.deferred_encoding = Bytes::new();
    }

    /// Hands a served request's header storage back for the next request.
    pub fn recycle(&mut self, mut request: Request<R>) {
        R::clear_headers(&mut request.headers);
        self.spare_headers = request.headers;
    }

    /// [`Decoder::decode`] folded into a [`ParseResult`].
    pub fn parse(&mut self, src: &mut BytesMut) -> ParseResult<Request<R>> {
        ParseResult::from(self.decode(src))
    }

    fn start_request(&mut self) {
        self.state = State::Method;
        self.cursor = 0;
        self.partial.reset();
    }

    /// Runs the head decoders from the saved cursor, returning the head length once complete.
    fn decode_head(&mut self, src: &BytesMut) -> Result<Option<usize>, ParseError> {
        let max_header_bytes = self.config.header_bytes_limit();
        let mut buf = ScanBuf::with_read_pos(src, self.cursor);
        let completed = self.run_head(&mut buf);
        self.cursor = buf.read_pos();

        if completed? {
            let head_len = self.cursor;
            ensure!(head_len <= max_header_bytes, ParseError::too_large_header(head_len, max_header_bytes));
            trace!(head_len, headers = R::header_count(&self.partial.headers), "decoded request head");
            Ok(Some(head_len))
        } else {
            ensure!(src.len() <= max_header_bytes, ParseError::too_large_header(src.len(), max_header_bytes));
            trace!(cursor = self.cursor, state = ?self.state, "request head incomplete");
            Ok(None)
        }
    }

    fn run_head(&mut self, buf: &mut ScanBuf<'_>) -> Result<bool, ParseError> {
        let Self { config, decoders, state, range, partial, .. } = self;
        loop {
            match state {
                State::Method => {
                    let Some(method) = decoders.method().decode(buf, range)? else {
                        return Ok(false);
                    };
                    partial.method = Some(method);
                    *state = State::Path;
                }
                State::Path => {
                    let Some(path) = R::decode_path(decoders, buf, range)? else {
                        return Ok(false);
                    };
                    partial.path = Some(path);
                    partial.target = *range;
                    if buf.byte_at(buf.read_pos()) == b' ' {
                        buf.advance(1);
                        *state = State::Version;
                    } else {
                        *state = State::Query;
                    }
                }
                State::Query => {
                    if R::decode_query(decoders, buf, range, &mut partial.query)?.is_none() {
                        return Ok(false);
                    }
                    partial.extend_target(range);
                    *state = State::Version;
                }
                State::Version => {
                    let Some(version) = decoders.version().decode(buf, range)? else {
                        return Ok(false);
                    };
                    partial.version = version;
                    *state = State::HeaderName;
                }
                State::HeaderName => match R::decode_name(decoders, buf, range)? {
                    None => return Ok(false),
                    Some(HeaderLine::End) => return Ok(true),
                    Some(HeaderLine::Name(name)) => {
                        let max_headers = config.headers_limit();
                        ensure!(R::header_count(&partial.headers) < max_headers, ParseError::too_many_headers(max_headers));
                        *state = State::HeaderValue(name);
                    }
                },
                State::HeaderValue(name) => {
                    let Some(value) = R::decode_value(decoders, buf, range, name)? else {
                        return Ok(false);
                    };
                    let head = buf.bytes();
                    let raw = range.raw(head);
                    match R::name_kind(name, head) {
                        HeaderKind::ContentLength => {
                            let length = parse_content_length(raw)?;
                            if partial.content_length.is_some_and(|previous| previous != length) {
                                return Err(ParseError::invalid_content_length("conflicting content-length values"));
                            }
                            partial.content_length = Some(length);
                        }
                        HeaderKind::TransferEncoding => partial.transfer_encoding = Some(*range),
                        HeaderKind::Connection => partial.connection = Some(R::connection_kind(&value, raw)),
                        _ => {}
                    }
                    R::push_header(&mut partial.headers, name.clone(), value);
                    *state = State::HeaderName;
                }
                State::Idle | State::Body | State::Deferred => return Ok(false),
            }
        }
    }

    fn finish_head(&mut self, head: Bytes) -> Result<Request<R>, ParseError> {
        let partial = &mut self.partial;
        let method = partial.method.take().ok_or_else(|| ParseError::invalid_method("request head without a method"))?;
        let path = partial.path.take().ok_or_else(|| ParseError::invalid_uri("request head without a path"))?;
        let payload = parse_payload(&method, partial.content_length, partial.transfer_encoding.is_some(), self.config.body_bytes_limit())?;

        Ok(Request {
            method,
            target: partial.target,
            path,
            query: mem::take(&mut partial.query),
            version: partial.version,
            headers: mem::replace(&mut partial.headers, mem::take(&mut self.spare_headers)),
            content_length: partial.content_length,
            transfer_encoding: partial.transfer_encoding,
            connection: partial.connection,
            payload,
            head,
            body: None,
        })
    }

    fn decode_body(&mut self, src: &mut BytesMut) -> Result<Option<Request<R>>, ParseError> {
        let Some(body) = self.body.decode(src)? else {
            return Ok(None);
        };
        self.state = State::Idle;
        let mut request = self.pending.take().ok_or_else(|| ParseError::invalid_content_length("body without a request head"))?;
        trace!(body_size = body.len(), "decoded request body");
        request.body = Some(body);
        Ok(Some(request))
    }

    fn decode_request(&mut self, src: &mut BytesMut) -> Result<Option<Request<R>>, ParseError> {
        match self.state {
            State::Deferred => {
                if src.is_empty() {
                    return Ok(None);
                }
                return Err(ParseError::unsupported_transfer_encoding(&self.deferred_encoding));
            }
            State::Body => return self.decode_body(src),
            State::Idle => {
                let junk = src.iter().take_while(|b| is_leading_junk(**b)).count();
                src.advance(junk);
                if src.is_empty() {
                    return Ok(None);
                }
                self.start_request();
            }
            _ => {}
        }

        let Some(head_len) = self.decode_head(src)? else {
            return Ok(None);
        };
        let head = src.split_to(head_len).freeze();
        self.cursor = 0;
        let request = self.finish_head(head)?;

        match request.payload_size() {
            PayloadSize::Empty => {
                self.state = State::Idle;
                Ok(Some(request))
            }
            PayloadSize::Length(length) => {
                self.body.start(length);
                self.pending = Some(request);
                self.state = State::Body;
                self.decode_body(src)
            }
            PayloadSize::Deferred => {
                let encoding = request.transfer_encoding.unwrap_or_default();
                self.deferred_encoding = request.head.slice(encoding.start()..encoding.end());
                self.state = State::Deferred;
                trace!(encoding = ?self.deferred_encoding, "request body deferred");
                Ok(Some(request))
            }
        }
    }
}

impl<R: Repr> Default for RequestDecoder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Repr> Decoder for RequestDecoder<R> {
    type Item = Request<R>;
    type Error = ParseError;

    /// Attempts to decode one request from the buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: a request, with its body when it declared one
    /// - `Ok(None)`: more bytes are needed
    /// - `Err(_)`: the request is malformed; the decoder is reset
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let result = self.decode_request(src);
        if let Err(e) = &result {
            warn!(cause = %e, "rejecting malformed request");
            self.reset();
        }
        result
    }

    /// Like [`Decoder::decode`], but a request cut short by the end of the
    /// stream is an error rather than a clean close.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }
        match self.state {
            State::Idle | State::Deferred if src.is_empty() => Ok(None),
            _ => {
                warn!(state = ?self.state, buffered = src.len(), gathered = self.body.gathered(), "stream ended inside a request");
                self.reset();
                Err(ParseError::io(io::ErrorKind::UnexpectedEof))
            }
        }
    }
}
