//! A decoded request, in either representation.
//!
//! Both representations keep the frozen head bytes the request was parsed
//! from, so the raw request target and every header are reachable without
//! copying. Fields common to both are available on any [`Request<R>`]; the
//! path, query and header accessors depend on the representation.

use std::borrow::Cow;

use bytes::Bytes;
use triomphe::Arc;

use crate::codec::PayloadSize;
use crate::protocol::{Eager, FieldValue, HttpVersion, ParseError, QueryString, RangeQuery, Ranged, Repr};
use crate::range::DataRange;
use crate::token::{ConnectionKind, ContentTypeValue, HeaderName, Method, Path};

/// A request whose head has been fully decoded.
#[derive(Debug, Clone)]
pub struct Request<R: Repr> {
    pub(crate) method: Arc<Method>,
    pub(crate) target: DataRange,
    pub(crate) path: R::Path,
    pub(crate) query: R::Query,
    pub(crate) version: HttpVersion,
    pub(crate) headers: R::Headers,
    pub(crate) content_length: Option<u64>,
    pub(crate) transfer_encoding: Option<DataRange>,
    pub(crate) connection: Option<ConnectionKind>,
    pub(crate) payload: PayloadSize,
    pub(crate) head: Bytes,
    pub(crate) body: Option<Bytes>,
}

impl<R: Repr> Request<R> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// The raw request target: path and query, undecoded, without any fragment.
    pub fn target(&self) -> &[u8] {
        self.target.raw(&self.head)
    }

    /// Every byte of the request head, request line to final CR LF.
    pub fn head(&self) -> &Bytes {
        &self.head
    }

    pub fn header_count(&self) -> usize {
        R::header_count(&self.headers)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The raw `Transfer-Encoding` value, if the request carried one.
    pub fn transfer_encoding(&self) -> Option<&[u8]> {
        self.transfer_encoding.as_ref().map(|range| range.raw(&self.head))
    }

    /// The option of the `Connection` header, if any.
    pub fn connection(&self) -> Option<ConnectionKind> {
        self.connection
    }

    /// Whether the connection should stay open after this request.
    pub fn keep_alive(&self) -> bool {
        match self.connection {
            Some(ConnectionKind::Close) => false,
            Some(ConnectionKind::KeepAlive) => true,
            _ => self.version.keep_alive_by_default(),
        }
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.payload
    }

    /// Whether the body was left undecoded because it is transfer-encoded.
    pub fn is_body_deferred(&self) -> bool {
        self.payload.is_deferred()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }
}

impl Request<Eager> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn query(&self) -> &QueryString {
        &self.query
    }

    pub fn headers(&self) -> &[(Arc<HeaderName>, FieldValue)] {
        &self.headers
    }

    /// The first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&FieldValue> {
        self.headers.iter().find(|(header, _)| header.as_str().eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    pub fn content_type(&self) -> Option<&ContentTypeValue> {
        self.headers.iter().find_map(|(_, value)| match value {
            FieldValue::ContentType(content_type) => Some(&**content_type),
            _ => None,
        })
    }

    /// Converts into an [`http::Request`], for handlers written against the `http` crate.
    pub fn into_http(self) -> Result<http::Request<Bytes>, ParseError> {
        let version = self.version.to_http().ok_or_else(|| ParseError::invalid_version(self.version))?;
        let uri = http::Uri::from_maybe_shared(self.head.slice(self.target.start()..self.target.end())).map_err(ParseError::invalid_uri)?;

        let mut builder = http::Request::builder().method(self.method.to_http()?).uri(uri).version(version);
        if let Some(headers) = builder.headers_mut() {
            headers.reserve(self.headers.len());
            for (name, value) in &self.headers {
                let value = match value {
                    FieldValue::Plain(bytes) => http::HeaderValue::from_maybe_shared(bytes.clone()),
                    other => http::HeaderValue::from_bytes(other.as_bytes()),
                }
                .map_err(ParseError::invalid_header)?;
                headers.append(name.to_http()?, value);
            }
        }

        builder.body(self.body.unwrap_or_default()).map_err(ParseError::invalid_header)
    }
}

impl Request<Ranged> {
    /// The path as received, still percent-encoded.
    pub fn raw_path(&self) -> &[u8] {
        self.path.raw(&self.head)
    }

    /// The decoded path.
    pub fn path(&self) -> Result<Cow<'_, [u8]>, ParseError> {
        self.path.decode(&self.head)
    }

    pub fn query(&self) -> &RangeQuery {
        &self.query
    }

    /// The query as received, without the `?`.
    pub fn raw_query(&self) -> &[u8] {
        self.query.range().raw(&self.head)
    }

    /// Decoded query pairs, in request order.
    pub fn query_pairs(&self) -> impl Iterator<Item = Result<(Cow<'_, [u8]>, Cow<'_, [u8]>), ParseError>> {
        self.query.params().iter().map(|(key, value)| -> Result<_, ParseError> { Ok((key.decode(&self.head)?, value.decode(&self.head)?)) })
    }

    /// The decoded value of the first pair whose decoded key is `key`.
    pub fn query_param(&self, key: &[u8]) -> Option<Cow<'_, [u8]>> {
        let (_, value) = self.query.params().iter().find(|(candidate, _)| candidate.matches(&self.head, key))?;
        value.decode(&self.head).ok()
    }

    /// Raw header names and values, in request order.
    pub fn headers(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.headers.iter().map(|(name, value)| (name.raw(&self.head), value.raw(&self.head)))
    }

    /// The first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &[u8]) -> Option<&[u8]> {
        self.headers().find(|(candidate, _)| candidate.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }
}
