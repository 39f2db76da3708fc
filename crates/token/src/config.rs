//! Tunables for the decoders and the token caches.
//!
//! Both configs are plain values with builder-style setters; the defaults are
//! what a server without special needs should use.

/// Maximum size in bytes allowed for the request line plus header block.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Maximum number of headers allowed in a request.
pub const DEFAULT_MAX_HEADERS: usize = 64;

/// Maximum accepted `Content-Length`.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

/// How header values are scanned for their CR LF terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineScan {
    /// One byte at a time.
    Bytewise,
    /// Skip ahead ten bytes at a time while no CR is in the window.
    #[default]
    Block,
}

/// Limits and scanning options for [`crate::codec::RequestDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    max_header_bytes: usize,
    max_headers: usize,
    max_body_bytes: u64,
    value_scan: LineScan,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_headers: DEFAULT_MAX_HEADERS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            value_scan: LineScan::default(),
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    #[must_use]
    pub fn max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub fn value_scan(mut self, value_scan: LineScan) -> Self {
        self.value_scan = value_scan;
        self
    }

    pub fn header_bytes_limit(&self) -> usize {
        self.max_header_bytes
    }

    pub fn headers_limit(&self) -> usize {
        self.max_headers
    }

    pub fn body_bytes_limit(&self) -> u64 {
        self.max_body_bytes
    }

    pub fn line_scan(&self) -> LineScan {
        self.value_scan
    }
}

/// Entry limits of the token caches.
///
/// A full cache stops interning: misses still produce a correct token, it is
/// just not shared. Nothing is ever evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub methods: usize,
    pub header_names: usize,
    pub header_values: usize,
    pub paths: usize,
    pub query_keys: usize,
    pub connection_values: usize,
    pub content_types: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            methods: 64,
            header_names: 1024,
            header_values: 4096,
            paths: 8192,
            query_keys: 4096,
            connection_values: 64,
            content_types: 256,
        }
    }
}

impl CacheLimits {
    /// The same limit for every cache.
    pub fn uniform(limit: usize) -> Self {
        Self {
            methods: limit,
            header_names: limit,
            header_values: limit,
            paths: limit,
            query_keys: limit,
            connection_values: limit,
            content_types: limit,
        }
    }
}
