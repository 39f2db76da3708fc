use std::fmt;

/// The protocol version named on the request line.
///
/// A well-formed version window naming anything else is
/// [`HttpVersion::NotSupported`] rather than an error, so the caller can answer
/// `505 HTTP Version Not Supported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpVersion {
    Http09,
    Http10,
    #[default]
    Http11,
    Http20,
    NotSupported,
}

impl HttpVersion {
    pub fn to_http(self) -> Option<http::Version> {
        match self {
            HttpVersion::Http09 => Some(http::Version::HTTP_09),
            HttpVersion::Http10 => Some(http::Version::HTTP_10),
            HttpVersion::Http11 => Some(http::Version::HTTP_11),
            HttpVersion::Http20 => Some(http::Version::HTTP_2),
            HttpVersion::NotSupported => None,
        }
    }

    pub fn is_supported(self) -> bool {
        self != HttpVersion::NotSupported
    }

    /// Whether a connection stays open when the request says nothing about it.
    pub fn keep_alive_by_default(self) -> bool {
        matches!(self, HttpVersion::Http11 | HttpVersion::Http20)
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpVersion::Http09 => "HTTP/0.9",
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
            HttpVersion::Http20 => "HTTP/2.0",
            HttpVersion::NotSupported => "unsupported",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_http() {
        assert_eq!(HttpVersion::Http11.to_http(), Some(http::Version::HTTP_11));
        assert_eq!(HttpVersion::NotSupported.to_http(), None);
        assert!(!HttpVersion::Http10.keep_alive_by_default());
        assert_eq!(HttpVersion::Http10.to_string(), "HTTP/1.0");
    }
}
