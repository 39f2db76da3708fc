//! Reading requests off an async byte stream.
//!
//! [`RequestStream`] owns the read half of a connection and a
//! [`RequestDecoder`]; every [`RequestStream::next_request`] yields the next
//! pipelined request. Writing responses is left to the caller.

use bytes::BytesMut;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

use crate::codec::RequestDecoder;
use crate::protocol::{Eager, ParseError, Repr, Request};

const READ_CAPACITY: usize = 8 * 1024;

/// The request side of one HTTP/1.x connection.
#[derive(Debug)]
pub struct RequestStream<IO, R: Repr = Eager> {
    framed: FramedRead<IO, RequestDecoder<R>>,
}

impl<IO, R> RequestStream<IO, R>
where
    IO: AsyncRead + Unpin,
    R: Repr,
{
    pub fn new(io: IO, decoder: RequestDecoder<R>) -> Self {
        Self { framed: FramedRead::with_capacity(io, decoder, READ_CAPACITY) }
    }

    /// Waits for the next complete request.
    ///
    /// `None` once the peer closed the connection between requests. A peer
    /// closing in the middle of a request is reported as an error.
    pub async fn next_request(&mut self) -> Option<Result<Request<R>, ParseError>> {
        match self.framed.next().await {
            Some(Ok(request)) => {
                debug!(method = %request.method(), version = %request.version(), "received request");
                Some(Ok(request))
            }
            Some(Err(e)) => Some(Err(e)),
            None => {
                info!("can't read more request, connection closed");
                None
            }
        }
    }

    /// Hands a served request's header storage back to the decoder.
    pub fn recycle(&mut self, request: Request<R>) {
        self.framed.decoder_mut().recycle(request);
    }

    pub fn decoder_mut(&mut self) -> &mut RequestDecoder<R> {
        self.framed.decoder_mut()
    }

    /// Bytes read from the peer but not decoded yet.
    pub fn read_buffer(&self) -> &BytesMut {
        self.framed.read_buffer()
    }

    pub fn into_inner(self) -> IO {
        self.framed.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TokenCaches;
    use crate::config::DecoderConfig;
    use crate::protocol::Ranged;
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn reads_pipelined_requests() {
        let (mut client, server) = tokio::io::duplex(64);
        let decoder = RequestDecoder::<Ranged>::with_caches(Arc::new(TokenCaches::new()), DecoderConfig::default());
        let mut stream = RequestStream::new(server, decoder);

        let writer = tokio::spawn(async move {
            for chunk in [&b"GET /first HTTP/1.1\r\nHost: a\r\n"[..], b"\r\nPOST /second HTTP/1.1\r\nContent-Length: 3\r\n\r\nab", b"c"] {
                client.write_all(chunk).await.unwrap();
            }
        });

        let first = stream.next_request().await.unwrap().unwrap();
        assert_eq!(first.raw_path(), b"/first");
        stream.recycle(first);

        let second = stream.next_request().await.unwrap().unwrap();
        assert_eq!(second.raw_path(), b"/second");
        assert_eq!(second.body().map(|body| &body[..]), Some(&b"abc"[..]));

        writer.await.unwrap();
        assert!(stream.next_request().await.is_none());
    }

    #[tokio::test]
    async fn truncated_request_is_an_error() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut stream = RequestStream::new(server, RequestDecoder::<Eager>::new());

        client.write_all(b"GET /never-finished HTTP/1.1\r\nHost").await.unwrap();
        drop(client);

        assert!(matches!(stream.next_request().await, Some(Err(ParseError::Io { .. }))));
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut stream = RequestStream::new(server, RequestDecoder::<Eager>::new());

        client.write_all(b"POST /upload HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").await.unwrap();
        drop(client);

        assert!(matches!(stream.next_request().await, Some(Err(ParseError::Io { .. }))));
    }
}
