//! Immutable, cache-owned token values.
//!
//! Every token carries its decoded bytes and the FNV-1a hash they were interned
//! under. Tokens are only ever built by a [`crate::cache::TokenCache`] on a miss
//! (through [`Interned::intern`]) and handed out as `triomphe::Arc` clones, so a
//! request holds references into the cache and never copies of the bytes.
//!
//! Equality is content equality. Two racing first insertions may hand out two
//! different allocations; they still compare equal.

use std::fmt;
use std::str;

use mime::Mime;

use crate::hash::fnv1a;
use crate::protocol::ParseError;
use crate::utils::is_token_byte;

/// A value the caches can build from decoded bytes.
pub trait Interned: Sized + Send + Sync + 'static {
    /// Builds the token on a cache miss. Validation that is too costly for the
    /// scanning loop happens here, once per distinct token.
    fn intern(decoded: &[u8], hash: u32) -> Result<Self, ParseError>;

    /// The decoded bytes the token was interned from.
    fn as_bytes(&self) -> &[u8];

    /// The FNV-1a hash the token was interned under.
    fn fnv_hash(&self) -> u32;
}

/// The eight verbs the method decoder recognizes without hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardMethod {
    Get,
    Put,
    Head,
    Post,
    Trace,
    Delete,
    Connect,
    Options,
}

impl StandardMethod {
    pub const ALL: [StandardMethod; 8] = [
        StandardMethod::Get,
        StandardMethod::Put,
        StandardMethod::Head,
        StandardMethod::Post,
        StandardMethod::Trace,
        StandardMethod::Delete,
        StandardMethod::Connect,
        StandardMethod::Options,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StandardMethod::Get => "GET",
            StandardMethod::Put => "PUT",
            StandardMethod::Head => "HEAD",
            StandardMethod::Post => "POST",
            StandardMethod::Trace => "TRACE",
            StandardMethod::Delete => "DELETE",
            StandardMethod::Connect => "CONNECT",
            StandardMethod::Options => "OPTIONS",
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str().as_bytes() == bytes)
    }

    pub fn to_http(self) -> http::Method {
        match self {
            StandardMethod::Get => http::Method::GET,
            StandardMethod::Put => http::Method::PUT,
            StandardMethod::Head => http::Method::HEAD,
            StandardMethod::Post => http::Method::POST,
            StandardMethod::Trace => http::Method::TRACE,
            StandardMethod::Delete => http::Method::DELETE,
            StandardMethod::Connect => http::Method::CONNECT,
            StandardMethod::Options => http::Method::OPTIONS,
        }
    }
}

/// An interned request method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    name: Box<str>,
    hash: u32,
    standard: Option<StandardMethod>,
}

impl Method {
    /// The pre-interned token for one of the eight fast-pathed verbs.
    pub(crate) fn from_standard(method: StandardMethod) -> Self {
        let name = method.as_str();
        Self { name: name.into(), hash: fnv1a(name.as_bytes()), standard: Some(method) }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// `Some` for the eight verbs the decoder fast-paths.
    pub fn standard(&self) -> Option<StandardMethod> {
        self.standard
    }

    pub fn is(&self, method: StandardMethod) -> bool {
        self.standard == Some(method)
    }

    pub fn to_http(&self) -> Result<http::Method, ParseError> {
        match self.standard {
            Some(standard) => Ok(standard.to_http()),
            None => http::Method::from_bytes(self.name.as_bytes()).map_err(ParseError::invalid_method),
        }
    }
}

impl Interned for Method {
    fn intern(decoded: &[u8], hash: u32) -> Result<Self, ParseError> {
        if decoded.is_empty() || !decoded.iter().all(|b| is_token_byte(*b)) {
            return Err(ParseError::invalid_method(String::from_utf8_lossy(decoded)));
        }
        // token bytes are ascii
        let name = str::from_utf8(decoded).map_err(ParseError::invalid_method)?;
        Ok(Self { name: name.into(), hash, standard: StandardMethod::from_bytes(decoded) })
    }

    fn as_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }

    fn fnv_hash(&self) -> u32 {
        self.hash
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// What the decoders know about a header from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    ContentLength,
    TransferEncoding,
    Connection,
    ContentType,
    /// Headers whose values repeat across requests and are worth interning.
    Vocabulary,
    Other,
}

const VOCABULARY_HEADERS: [&str; 7] =
    ["host", "accept", "accept-encoding", "accept-language", "user-agent", "cache-control", "origin"];

impl HeaderKind {
    pub fn classify(name: &[u8]) -> Self {
        if name.eq_ignore_ascii_case(b"content-length") {
            HeaderKind::ContentLength
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            HeaderKind::TransferEncoding
        } else if name.eq_ignore_ascii_case(b"connection") {
            HeaderKind::Connection
        } else if name.eq_ignore_ascii_case(b"content-type") {
            HeaderKind::ContentType
        } else if VOCABULARY_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h.as_bytes())) {
            HeaderKind::Vocabulary
        } else {
            HeaderKind::Other
        }
    }

    /// How values of this header are materialized.
    pub fn value_strategy(self) -> ValueStrategy {
        match self {
            HeaderKind::Connection => ValueStrategy::Connection,
            HeaderKind::ContentType => ValueStrategy::ContentType,
            HeaderKind::TransferEncoding | HeaderKind::Vocabulary => ValueStrategy::Cached,
            HeaderKind::ContentLength | HeaderKind::Other => ValueStrategy::Plain,
        }
    }
}

/// Materialization policy for a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStrategy {
    /// A fresh copy per request.
    Plain,
    /// Interned [`HeaderValue`].
    Cached,
    /// Interned and classified [`ConnectionValue`].
    Connection,
    /// Interned and parsed [`ContentTypeValue`].
    ContentType,
}

/// An interned header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderName {
    name: Box<str>,
    hash: u32,
    kind: HeaderKind,
}

impl HeaderName {
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> HeaderKind {
        self.kind
    }

    pub fn value_strategy(&self) -> ValueStrategy {
        self.kind.value_strategy()
    }

    pub fn to_http(&self) -> Result<http::HeaderName, ParseError> {
        http::HeaderName::from_bytes(self.name.as_bytes()).map_err(ParseError::invalid_header)
    }
}

impl Interned for HeaderName {
    fn intern(decoded: &[u8], hash: u32) -> Result<Self, ParseError> {
        if decoded.is_empty() || !decoded.iter().all(|b| is_token_byte(*b)) {
            return Err(ParseError::invalid_header(format!("illegal header name {:?}", String::from_utf8_lossy(decoded))));
        }
        let name = str::from_utf8(decoded).map_err(ParseError::invalid_header)?;
        Ok(Self { name: name.into(), hash, kind: HeaderKind::classify(decoded) })
    }

    fn as_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }

    fn fnv_hash(&self) -> u32 {
        self.hash
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

macro_rules! bytes_token {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            bytes: Box<[u8]>,
            hash: u32,
        }

        impl $name {
            pub fn as_bytes(&self) -> &[u8] {
                &self.bytes
            }

            /// The bytes as text, `None` when they are not valid UTF-8.
            pub fn to_str(&self) -> Option<&str> {
                str::from_utf8(&self.bytes).ok()
            }
        }

        impl Interned for $name {
            fn intern(decoded: &[u8], hash: u32) -> Result<Self, ParseError> {
                Ok(Self { bytes: decoded.into(), hash })
            }

            fn as_bytes(&self) -> &[u8] {
                &self.bytes
            }

            fn fnv_hash(&self) -> u32 {
                self.hash
            }
        }
    };
}

bytes_token! {
    /// An interned header value, for headers with a small repetitive vocabulary.
    HeaderValue
}

bytes_token! {
    /// An interned, decoded request path.
    Path
}

bytes_token! {
    /// An interned, decoded query parameter key.
    QueryKey
}

/// The connection option a `Connection` header asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    KeepAlive,
    Close,
    Upgrade,
    Other,
}

impl ConnectionKind {
    /// `close` wins over everything, then `upgrade`, then `keep-alive`.
    pub(crate) fn classify(value: &[u8]) -> Self {
        let mut kind = ConnectionKind::Other;
        for option in value.split(|b| *b == b',').map(<[u8]>::trim_ascii) {
            if option.eq_ignore_ascii_case(b"close") {
                return ConnectionKind::Close;
            } else if option.eq_ignore_ascii_case(b"upgrade") {
                kind = ConnectionKind::Upgrade;
            } else if option.eq_ignore_ascii_case(b"keep-alive") && kind == ConnectionKind::Other {
                kind = ConnectionKind::KeepAlive;
            }
        }
        kind
    }
}

/// An interned `Connection` header value, classified once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionValue {
    bytes: Box<[u8]>,
    hash: u32,
    kind: ConnectionKind,
}

impl ConnectionValue {
    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }
}

impl Interned for ConnectionValue {
    fn intern(decoded: &[u8], hash: u32) -> Result<Self, ParseError> {
        Ok(Self { bytes: decoded.into(), hash, kind: ConnectionKind::classify(decoded) })
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn fnv_hash(&self) -> u32 {
        self.hash
    }
}

/// The media types the body consumers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Plain,
    Html,
    Protobuf,
    FormUrlEncoded,
    FormData,
    Unknown,
}

impl ContentKind {
    fn from_essence(essence: &str) -> Self {
        match essence {
            "application/json" => ContentKind::Json,
            "text/plain" => ContentKind::Plain,
            "text/html" => ContentKind::Html,
            "application/x-protobuf" => ContentKind::Protobuf,
            "application/x-www-form-urlencoded" => ContentKind::FormUrlEncoded,
            "multipart/form-data" => ContentKind::FormData,
            _ => ContentKind::Unknown,
        }
    }
}

/// An interned `Content-Type` value, parsed once.
///
/// A value that does not parse as a media type is still interned, with
/// [`ContentKind::Unknown`] and no [`Mime`].
#[derive(Debug, Clone)]
pub struct ContentTypeValue {
    bytes: Box<[u8]>,
    hash: u32,
    mime: Option<Mime>,
    kind: ContentKind,
}

impl ContentTypeValue {
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn mime(&self) -> Option<&Mime> {
        self.mime.as_ref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.mime.as_ref()?.get_param(mime::CHARSET).map(|name| name.as_str())
    }
}

impl PartialEq for ContentTypeValue {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ContentTypeValue {}

impl Interned for ContentTypeValue {
    fn intern(decoded: &[u8], hash: u32) -> Result<Self, ParseError> {
        let mime = str::from_utf8(decoded).ok().and_then(|text| text.trim().parse::<Mime>().ok());
        let kind = mime.as_ref().map_or(ContentKind::Unknown, |mime| ContentKind::from_essence(mime.essence_str()));
        Ok(Self { bytes: decoded.into(), hash, mime, kind })
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn fnv_hash(&self) -> u32 {
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intern<T: Interned>(text: &str) -> T {
        T::intern(text.as_bytes(), fnv1a(text.as_bytes())).unwrap()
    }

    #[test]
    fn standard_methods() {
        for method in StandardMethod::ALL {
            assert_eq!(StandardMethod::from_bytes(method.as_str().as_bytes()), Some(method));
            assert_eq!(method.to_http().as_str(), method.as_str());
        }
        assert_eq!(StandardMethod::from_bytes(b"PATCH"), None);
    }

    #[test]
    fn extension_method() {
        let method: Method = intern("PATCH");
        assert_eq!(method.standard(), None);
        assert_eq!(method.to_http().unwrap(), http::Method::PATCH);

        assert!(Method::intern(b"BAD METHOD", 0).is_err());
        assert!(Method::intern(b"", 0).is_err());
    }

    #[test]
    fn header_kinds() {
        assert_eq!(HeaderKind::classify(b"Content-Length"), HeaderKind::ContentLength);
        assert_eq!(HeaderKind::classify(b"content-type"), HeaderKind::ContentType);
        assert_eq!(HeaderKind::classify(b"CONNECTION"), HeaderKind::Connection);
        assert_eq!(HeaderKind::classify(b"Host"), HeaderKind::Vocabulary);
        assert_eq!(HeaderKind::classify(b"X-Request-Id"), HeaderKind::Other);

        assert_eq!(HeaderKind::Connection.value_strategy(), ValueStrategy::Connection);
        assert_eq!(HeaderKind::Vocabulary.value_strategy(), ValueStrategy::Cached);
        assert_eq!(HeaderKind::Other.value_strategy(), ValueStrategy::Plain);
    }

    #[test]
    fn header_name_rejects_separators() {
        assert!(HeaderName::intern(b"Bad\"Name", 0).is_err());
        let name: HeaderName = intern("X-Trace");
        assert_eq!(name.to_http().unwrap(), http::HeaderName::from_static("x-trace"));
    }

    #[test]
    fn connection_values() {
        assert_eq!(intern::<ConnectionValue>("keep-alive").kind(), ConnectionKind::KeepAlive);
        assert_eq!(intern::<ConnectionValue>("Close").kind(), ConnectionKind::Close);
        assert_eq!(intern::<ConnectionValue>("keep-alive, Upgrade").kind(), ConnectionKind::Upgrade);
        assert_eq!(intern::<ConnectionValue>("upgrade, close").kind(), ConnectionKind::Close);
        assert_eq!(intern::<ConnectionValue>("TE").kind(), ConnectionKind::Other);
    }

    #[test]
    fn content_types() {
        let json: ContentTypeValue = intern("application/json; charset=UTF-8");
        assert_eq!(json.kind(), ContentKind::Json);
        assert!(json.charset().is_some_and(|charset| charset.eq_ignore_ascii_case("utf-8")));

        let form: ContentTypeValue = intern("application/x-www-form-urlencoded");
        assert_eq!(form.kind(), ContentKind::FormUrlEncoded);
        assert_eq!(form.charset(), None);

        let garbage: ContentTypeValue = intern("not a media type");
        assert_eq!(garbage.kind(), ContentKind::Unknown);
        assert!(garbage.mime().is_none());
    }

    #[test]
    fn bytes_tokens() {
        let path: Path = intern("/a b");
        assert_eq!(path.to_str(), Some("/a b"));
        assert_eq!(path, intern::<Path>("/a b"));

        let value = HeaderValue::intern(&[0xff, 0xfe], 1).unwrap();
        assert_eq!(value.to_str(), None);
        assert_eq!(value.as_bytes(), &[0xff, 0xfe]);
    }
}
