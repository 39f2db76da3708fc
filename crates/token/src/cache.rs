//! Hash-keyed interning caches shared across connections.
//!
//! A cache maps `(hash, decoded_len)` to the tokens interned under that key.
//! The hash only narrows the search: a hit always requires an exact content
//! comparison between the candidate range and the stored token.
//!
//! Reads load an [`ArcSwap`] snapshot and never lock. A miss builds the token
//! and publishes a new snapshot with a compare-and-swap, re-checking for the key
//! after every lost race, so concurrent first insertions of the same bytes end
//! up with a single stored entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc as SharedArc;

use arc_swap::{ArcSwap, Guard};
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use triomphe::Arc;

use crate::config::CacheLimits;
use crate::protocol::ParseError;
use crate::range::DataRange;
use crate::token::{ConnectionValue, ContentTypeValue, HeaderName, HeaderValue, Interned, Method, Path, QueryKey, StandardMethod};

type Key = (u32, usize);

struct Entries<T> {
    map: HashMap<Key, Vec<Arc<T>>>,
    len: usize,
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self { map: HashMap::new(), len: 0 }
    }
}

impl<T> Clone for Entries<T> {
    fn clone(&self) -> Self {
        Self { map: self.map.clone(), len: self.len }
    }
}

impl<T: Interned> Entries<T> {
    fn find(&self, key: Key, src: &[u8], range: &DataRange) -> Option<Arc<T>> {
        self.map.get(&key)?.iter().find(|token| range.matches(src, token.as_bytes())).map(Arc::clone)
    }
}

/// An interning cache for one token kind.
pub struct TokenCache<T> {
    name: &'static str,
    limit: usize,
    entries: ArcSwap<Entries<T>>,
}

impl<T: Interned> TokenCache<T> {
    pub fn new(name: &'static str, limit: usize) -> Self {
        Self { name, limit, entries: ArcSwap::from_pointee(Entries::default()) }
    }

    /// Returns the token for the bytes `range` describes within `src`, interning it on a miss.
    ///
    /// When the cache is full the token is built but not stored.
    pub fn get(&self, src: &[u8], range: &DataRange) -> Result<Arc<T>, ParseError> {
        let key = (range.hash(), range.decoded_len());
        if let Some(token) = self.entries.load().find(key, src, range) {
            return Ok(token);
        }

        let decoded = range.decode(src)?;
        let token = Arc::new(T::intern(&decoded, range.hash())?);
        debug!(cache = self.name, hash = range.hash(), len = range.decoded_len(), "token cache miss");
        Ok(self.install(src, range, token))
    }

    /// Looks up or interns an already decoded literal.
    pub fn get_bytes(&self, bytes: &[u8]) -> Result<Arc<T>, ParseError> {
        self.get(bytes, &DataRange::literal(bytes))
    }

    /// Stores a ready-made token, returning the canonical entry for its bytes.
    pub(crate) fn preload(&self, token: T) -> Arc<T> {
        let token = Arc::new(token);
        let range = DataRange::literal(token.as_bytes());
        self.install(token.as_bytes(), &range, Arc::clone(&token))
    }

    #[cold]
    fn install(&self, src: &[u8], range: &DataRange, token: Arc<T>) -> Arc<T> {
        let key = (range.hash(), range.decoded_len());
        let mut current = self.entries.load_full();
        loop {
            if let Some(existing) = current.find(key, src, range) {
                return existing;
            }
            if current.len >= self.limit {
                debug!(cache = self.name, limit = self.limit, "token cache full, token not interned");
                return token;
            }

            // copy-on-write: each insertion clones the snapshot, so filling a cache is quadratic in its limit
            let mut next = Entries::clone(&current);
            next.map.entry(key).or_default().push(Arc::clone(&token));
            next.len += 1;
            let len = next.len;

            let previous = self.entries.compare_and_swap(&current, SharedArc::new(next));
            if SharedArc::ptr_eq(&*previous, &current) {
                if len == self.limit {
                    warn!(cache = self.name, limit = self.limit, "token cache reached its limit");
                }
                return token;
            }
            debug!(cache = self.name, "lost token cache insertion race, retrying");
            current = Guard::into_inner(previous);
        }
    }

    /// Number of interned entries.
    pub fn len(&self) -> usize {
        self.entries.load().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether `bytes` are interned, without interning them.
    pub fn contains(&self, bytes: &[u8]) -> bool {
        let range = DataRange::literal(bytes);
        self.entries.load().find((range.hash(), range.decoded_len()), bytes, &range).is_some()
    }
}

impl<T> fmt::Debug for TokenCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache").field("name", &self.name).field("limit", &self.limit).field("len", &self.entries.load().len).finish()
    }
}

/// One cache per token kind, plus the pre-interned standard methods.
///
/// Decoders receive it as a `std::sync::Arc<TokenCaches>`; servers usually share
/// a single instance (see [`TokenCaches::shared`]) across every connection.
#[derive(Debug)]
pub struct TokenCaches {
    methods: TokenCache<Method>,
    header_names: TokenCache<HeaderName>,
    header_values: TokenCache<HeaderValue>,
    paths: TokenCache<Path>,
    query_keys: TokenCache<QueryKey>,
    connection_values: TokenCache<ConnectionValue>,
    content_types: TokenCache<ContentTypeValue>,
    standard_methods: [Arc<Method>; 8],
}

static SHARED: Lazy<SharedArc<TokenCaches>> = Lazy::new(|| SharedArc::new(TokenCaches::new()));

impl TokenCaches {
    pub fn new() -> Self {
        Self::with_limits(CacheLimits::default())
    }

    pub fn with_limits(limits: CacheLimits) -> Self {
        // the standard methods always fit, whatever the configured limit
        let methods = TokenCache::new("method", limits.methods.max(StandardMethod::ALL.len()));
        let standard_methods = StandardMethod::ALL.map(|method| methods.preload(Method::from_standard(method)));
        Self {
            methods,
            header_names: TokenCache::new("header_name", limits.header_names),
            header_values: TokenCache::new("header_value", limits.header_values),
            paths: TokenCache::new("path", limits.paths),
            query_keys: TokenCache::new("query_key", limits.query_keys),
            connection_values: TokenCache::new("connection", limits.connection_values),
            content_types: TokenCache::new("content_type", limits.content_types),
            standard_methods,
        }
    }

    /// The process-wide instance, created on first use with default limits.
    pub fn shared() -> SharedArc<TokenCaches> {
        SharedArc::clone(&SHARED)
    }

    /// The pre-interned token of a fast-pathed verb.
    pub fn standard_method(&self, method: StandardMethod) -> &Arc<Method> {
        &self.standard_methods[method as usize]
    }

    pub fn methods(&self) -> &TokenCache<Method> {
        &self.methods
    }

    pub fn header_names(&self) -> &TokenCache<HeaderName> {
        &self.header_names
    }

    pub fn header_values(&self) -> &TokenCache<HeaderValue> {
        &self.header_values
    }

    pub fn paths(&self) -> &TokenCache<Path> {
        &self.paths
    }

    pub fn query_keys(&self) -> &TokenCache<QueryKey> {
        &self.query_keys
    }

    pub fn connection_values(&self) -> &TokenCache<ConnectionValue> {
        &self.connection_values
    }

    pub fn content_types(&self) -> &TokenCache<ContentTypeValue> {
        &self.content_types
    }
}

impl Default for TokenCaches {
    fn default() -> Self {
        Self::new()
    }
}
