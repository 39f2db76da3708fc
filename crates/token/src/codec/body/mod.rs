//! Request body decoding.
//!
//! Only length-delimited bodies are decoded. A `Transfer-Encoding` without a
//! `Content-Length` is recorded and the body left to the caller
//! ([`PayloadSize::Deferred`]).

mod length_decoder;

pub use length_decoder::LengthDecoder;

use crate::protocol::ParseError;
use crate::token::{Method, StandardMethod};

/// How the body following a request head is delimited.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Exactly this many bytes, always more than zero.
    Length(u64),
    /// Transfer-encoded; not decoded here.
    Deferred,
    /// No body.
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    #[inline]
    pub fn is_deferred(&self) -> bool {
        matches!(self, PayloadSize::Deferred)
    }
}

/// Picks the body framing from what the head declared.
pub(crate) fn parse_payload(
    method: &Method,
    content_length: Option<u64>,
    transfer_encoding: bool,
    max_body_bytes: u64,
) -> Result<PayloadSize, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length
    match (transfer_encoding, content_length) {
        (true, Some(_)) => Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers")),
        (_, None | Some(0)) if method.is(StandardMethod::Get) || method.is(StandardMethod::Head) => Ok(PayloadSize::Empty),
        (true, None) => Ok(PayloadSize::Deferred),
        (false, None | Some(0)) => Ok(PayloadSize::Empty),
        (false, Some(length)) => {
            if length > max_body_bytes {
                return Err(ParseError::too_large_body(length, max_body_bytes));
            }
            Ok(PayloadSize::Length(length))
        }
    }
}

/// Parses a `Content-Length` value, rejecting anything but ASCII digits.
pub(crate) fn parse_content_length(raw: &[u8]) -> Result<u64, ParseError> {
    let digits = raw.trim_ascii();
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ParseError::invalid_content_length(format!("value {:?} is not u64", String::from_utf8_lossy(raw))));
    }
    digits
        .iter()
        .try_fold(0_u64, |length, digit| length.checked_mul(10)?.checked_add(u64::from(digit - b'0')))
        .ok_or_else(|| ParseError::invalid_content_length("value overflows u64"))
}
