//! Field representations of a request.
//!
//! A [`Request`](crate::protocol::Request) is generic over a [`Repr`] policy
//! deciding what the head decoders store for the path, query and headers:
//!
//! - [`Eager`]: interned tokens and decoded values, ready to use;
//! - [`Ranged`]: [`DataRange`]s into the frozen head, decoded only when asked.
//!
//! The driving loop is the same for both.

use std::fmt;

use bytes::Bytes;
use triomphe::Arc;

use crate::buffer::Buffer;
use crate::codec::{HeadDecoders, HeaderLine, TokenDecoder};
use crate::protocol::ParseError;
use crate::range::DataRange;
use crate::token::{ConnectionKind, ConnectionValue, ContentTypeValue, HeaderKind, HeaderName, HeaderValue, Interned, Path, QueryKey};

/// The representation policy of a request.
pub trait Repr: Sized + Send + Sync + 'static {
    type Path: fmt::Debug + Clone + Send + Sync;
    type Query: fmt::Debug + Clone + Default + Send + Sync;
    type Name: fmt::Debug + Clone + Send + Sync;
    type Value: fmt::Debug + Send + Sync;
    type Headers: fmt::Debug + Clone + Default + Send + Sync;

    fn decode_path<B: Buffer>(decoders: &HeadDecoders, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Path>, ParseError>;

    /// Decodes the query the cursor is on into `query`. Nothing is committed on `None`.
    fn decode_query<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
        query: &mut Self::Query,
    ) -> Result<Option<()>, ParseError>;

    fn decode_name<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
    ) -> Result<Option<HeaderLine<Self::Name>>, ParseError>;

    /// Decodes the value of header `name`. `range` holds the raw value afterwards.
    fn decode_value<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
        name: &Self::Name,
    ) -> Result<Option<Self::Value>, ParseError>;

    fn name_kind(name: &Self::Name, head: &[u8]) -> HeaderKind;

    /// The option a decoded `Connection` value asks for; `raw` is its bytes in the head.
    fn connection_kind(value: &Self::Value, raw: &[u8]) -> ConnectionKind;

    fn push_header(headers: &mut Self::Headers, name: Self::Name, value: Self::Value);

    fn header_count(headers: &Self::Headers) -> usize;

    /// Empties the header storage, keeping its capacity.
    fn clear_headers(headers: &mut Self::Headers);
}

/// One decoded query parameter: an interned key and its decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    key: Arc<QueryKey>,
    value: Bytes,
}

impl QueryParam {
    pub fn new(key: Arc<QueryKey>, value: Bytes) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }
}

/// The decoded parameters of a query string, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    params: Vec<QueryParam>,
}

impl QueryString {
    pub fn new(params: Vec<QueryParam>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    /// The first value given for `key`.
    pub fn get(&self, key: &[u8]) -> Option<&Bytes> {
        self.params.iter().find(|param| param.key.as_bytes() == key).map(QueryParam::value)
    }
}

/// A header value as the eager representation stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Plain(Bytes),
    Cached(Arc<HeaderValue>),
    Connection(Arc<ConnectionValue>),
    ContentType(Arc<ContentTypeValue>),
}

impl FieldValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FieldValue::Plain(bytes) => bytes,
            FieldValue::Cached(value) => value.as_bytes(),
            FieldValue::Connection(value) => value.as_bytes(),
            FieldValue::ContentType(value) => value.as_bytes(),
        }
    }

    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }
}

/// Key/value ranges kept as two parallel arrays and a running count.
///
/// Clearing only resets the count, so a recycled instance stores the next
/// request's pairs without allocating.
#[derive(Debug, Clone, Default)]
pub struct RangePairs {
    keys: Vec<DataRange>,
    values: Vec<DataRange>,
    count: usize,
}

impl RangePairs {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { keys: Vec::with_capacity(capacity), values: Vec::with_capacity(capacity), count: 0 }
    }

    pub fn push(&mut self, key: DataRange, value: DataRange) {
        if self.count < self.keys.len() {
            self.keys[self.count] = key;
            self.values[self.count] = value;
        } else {
            self.keys.push(key);
            self.values.push(value);
        }
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<(DataRange, DataRange)> {
        if index < self.count { Some((self.keys[index], self.values[index])) } else { None }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataRange, &DataRange)> {
        self.keys[..self.count].iter().zip(&self.values[..self.count])
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }
}

/// A query string kept as ranges: the raw query and its pairs.
#[derive(Debug, Clone, Default)]
pub struct RangeQuery {
    range: DataRange,
    params: RangePairs,
}

impl RangeQuery {
    pub fn range(&self) -> &DataRange {
        &self.range
    }

    pub fn params(&self) -> &RangePairs {
        &self.params
    }
}

/// Interned tokens, decoded up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eager;

impl Repr for Eager {
    type Path = Arc<Path>;
    type Query = QueryString;
    type Name = Arc<HeaderName>;
    type Value = FieldValue;
    type Headers = Vec<(Arc<HeaderName>, FieldValue)>;

    fn decode_path<B: Buffer>(decoders: &HeadDecoders, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Path>, ParseError> {
        decoders.path().decode(buf, range)
    }

    fn decode_query<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
        query: &mut Self::Query,
    ) -> Result<Option<()>, ParseError> {
        let Some(decoded) = decoders.query().decode(buf, range)? else {
            return Ok(None);
        };
        *query = decoded;
        Ok(Some(()))
    }

    fn decode_name<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
    ) -> Result<Option<HeaderLine<Self::Name>>, ParseError> {
        decoders.name().decode(buf, range)
    }

    fn decode_value<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
        name: &Self::Name,
    ) -> Result<Option<Self::Value>, ParseError> {
        decoders.value().decode_as(name.value_strategy(), buf, range)
    }

    fn name_kind(name: &Self::Name, _head: &[u8]) -> HeaderKind {
        name.kind()
    }

    fn connection_kind(value: &Self::Value, raw: &[u8]) -> ConnectionKind {
        match value {
            FieldValue::Connection(connection) => connection.kind(),
            _ => ConnectionKind::classify(raw),
        }
    }

    fn push_header(headers: &mut Self::Headers, name: Self::Name, value: Self::Value) {
        headers.push((name, value));
    }

    fn header_count(headers: &Self::Headers) -> usize {
        headers.len()
    }

    fn clear_headers(headers: &mut Self::Headers) {
        headers.clear();
    }
}

/// Ranges into the frozen head, decoded lazily.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranged;

impl Repr for Ranged {
    type Path = DataRange;
    type Query = RangeQuery;
    type Name = DataRange;
    type Value = DataRange;
    type Headers = RangePairs;

    fn decode_path<B: Buffer>(decoders: &HeadDecoders, buf: &mut B, range: &mut DataRange) -> Result<Option<Self::Path>, ParseError> {
        decoders.path().scan(buf, range)
    }

    fn decode_query<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
        query: &mut Self::Query,
    ) -> Result<Option<()>, ParseError> {
        query.params.clear();
        let Some(whole) = decoders.query().scan_into(buf, range, &mut query.params)? else {
            return Ok(None);
        };
        query.range = whole;
        Ok(Some(()))
    }

    fn decode_name<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
    ) -> Result<Option<HeaderLine<Self::Name>>, ParseError> {
        decoders.name().scan(buf, range)
    }

    fn decode_value<B: Buffer>(
        decoders: &HeadDecoders,
        buf: &mut B,
        range: &mut DataRange,
        _name: &Self::Name,
    ) -> Result<Option<Self::Value>, ParseError> {
        decoders.value().decode(buf, range)
    }

    fn name_kind(name: &Self::Name, head: &[u8]) -> HeaderKind {
        HeaderKind::classify(name.raw(head))
    }

    fn connection_kind(_value: &Self::Value, raw: &[u8]) -> ConnectionKind {
        ConnectionKind::classify(raw)
    }

    fn push_header(headers: &mut Self::Headers, name: Self::Name, value: Self::Value) {
        headers.push(name, value);
    }

    fn header_count(headers: &Self::Headers) -> usize {
        headers.len()
    }

    fn clear_headers(headers: &mut Self::Headers) {
        headers.clear();
    }
}
