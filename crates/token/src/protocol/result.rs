use std::fmt;

use http::StatusCode;

use crate::protocol::ParseError;

/// The outcome of one [`crate::codec::RequestDecoder::parse`] call.
///
/// Exactly one of three things holds: a request finished, the request is
/// malformed (with the status to answer and a short message), or more bytes
/// are needed.
#[derive(Debug)]
pub struct ParseResult<T> {
    request: Option<T>,
    error: Option<ParseFailure>,
}

/// Why a request was rejected, ready to be turned into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    status: StatusCode,
    message: String,
}

impl ParseFailure {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl From<&ParseError> for ParseFailure {
    fn from(error: &ParseError) -> Self {
        Self { status: error.status_code(), message: error.to_string() }
    }
}

impl<T> ParseResult<T> {
    pub fn finished(&self) -> bool {
        self.request.is_some()
    }

    pub fn needs_more(&self) -> bool {
        self.request.is_none() && self.error.is_none()
    }

    pub fn error(&self) -> Option<&ParseFailure> {
        self.error.as_ref()
    }

    pub fn request(&self) -> Option<&T> {
        self.request.as_ref()
    }

    pub fn into_request(self) -> Option<T> {
        self.request
    }
}

impl<T> From<Result<Option<T>, ParseError>> for ParseResult<T> {
    fn from(result: Result<Option<T>, ParseError>) -> Self {
        match result {
            Ok(request) => Self { request, error: None },
            Err(e) => Self { request: None, error: Some(ParseFailure::from(&e)) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_outcomes() {
        let done = ParseResult::from(Ok(Some(1)));
        assert!(done.finished());
        assert_eq!(done.into_request(), Some(1));

        let more: ParseResult<i32> = ParseResult::from(Ok(None));
        assert!(more.needs_more());
        assert!(!more.finished());

        let failed: ParseResult<i32> = ParseResult::from(Err(ParseError::too_many_headers(64)));
        assert!(!failed.needs_more());
        let failure = failed.error().unwrap();
        assert_eq!(failure.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
        assert_eq!(failure.message(), "header number exceed the limit 64");
    }
}
