//! Decoder for bodies delimited by a `Content-Length` header.
//!
//! The body may arrive over any number of reads. Bytes are gathered in a
//! per-connection scratch buffer until the declared length is reached; a body
//! that is already complete on the first call is split off the read buffer
//! without copying.

use std::cmp;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::ParseError;

#[derive(Debug, Default)]
pub struct LengthDecoder {
    /// Bytes still missing from the current body.
    remaining: u64,
    scratch: BytesMut,
}

impl LengthDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a body of `length` bytes, dropping whatever was gathered before.
    pub fn start(&mut self, length: u64) {
        self.remaining = length;
        self.scratch.clear();
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Bytes gathered so far for the current body.
    pub fn gathered(&self) -> usize {
        self.scratch.len()
    }
}

impl Decoder for LengthDecoder {
    type Item = Bytes;
    type Error = ParseError;

    /// Returns the whole body once the last byte has arrived, `None` before that.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            return Ok(Some(self.scratch.split().freeze()));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let len = cmp::min(self.remaining, src.len() as u64) as usize;
        if self.scratch.is_empty() && len as u64 == self.remaining {
            self.remaining = 0;
            return Ok(Some(src.split_to(len).freeze()));
        }

        self.scratch.extend_from_slice(&src[..len]);
        src.advance(len);
        self.remaining -= len as u64;
        trace!(gathered = self.scratch.len(), remaining = self.remaining, "gathered body bytes");

        if self.remaining == 0 { Ok(Some(self.scratch.split().freeze())) } else { Ok(None) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_over_three_reads() {
        let mut decoder = LengthDecoder::new();
        decoder.start(5);
        let mut buffer = BytesMut::new();

        buffer.extend_from_slice(b"he");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
        assert!(buffer.is_empty());

        buffer.extend_from_slice(b"ll");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
        assert_eq!(decoder.gathered(), 4);

        buffer.extend_from_slice(b"o");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(Bytes::from_static(b"hello")));
        assert_eq!(decoder.gathered(), 0);
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn complete_body_is_split_off() {
        let mut buffer = BytesMut::from(&b"1012345678GET / HTTP/1.1\r\n"[..]);
        let mut decoder = LengthDecoder::new();
        decoder.start(10);

        let body = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&body[..], b"1012345678");
        assert_eq!(&buffer[..], b"GET / HTTP/1.1\r\n");
    }

    #[test]
    fn restart_drops_partial_body() {
        let mut decoder = LengthDecoder::new();
        decoder.start(4);
        decoder.decode(&mut BytesMut::from(&b"ab"[..])).unwrap();

        decoder.start(2);
        assert_eq!(decoder.decode(&mut BytesMut::from(&b"cd"[..])).unwrap(), Some(Bytes::from_static(b"cd")));
    }
}
