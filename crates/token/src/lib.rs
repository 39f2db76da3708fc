//! An incremental, zero-copy HTTP/1.x request tokenizer.
//!
//! Requests are decoded straight out of a connection's read buffer. The
//! decoders never copy a token they can describe by position, and tokens that
//! repeat across requests (methods, header names, common header values, paths,
//! query keys) are interned once in process-wide caches and shared afterwards.
//!
//! # Features
//!
//! - Resumable decoding: a request split over any number of reads decodes to
//!   the same result, without rescanning what was already recognized
//! - Pipelined requests and leading empty lines
//! - Two representations of the same request, see [`protocol::Repr`]
//! - Lock-free interning caches keyed by FNV-1a hashes
//! - `Content-Length` bodies; transfer-encoded bodies are reported, not decoded
//! - Conversion into [`http::Request`]
//!
//! # Example
//!
//! ```no_run
//! use micro_http_token::connection::RequestStream;
//! use micro_http_token::codec::RequestDecoder;
//! use micro_http_token::protocol::Eager;
//! use tokio::net::TcpListener;
//! use tracing::{info, warn};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     loop {
//!         let (tcp_stream, _remote_addr) = listener.accept().await?;
//!         tokio::spawn(async move {
//!             let mut requests = RequestStream::new(tcp_stream, RequestDecoder::<Eager>::new());
//!             while let Some(result) = requests.next_request().await {
//!                 match result {
//!                     Ok(request) => info!(path = ?request.path(), "request received"),
//!                     Err(e) => {
//!                         warn!(cause = %e, status = %e.status_code(), "bad request");
//!                         break;
//!                     }
//!                 }
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`buffer`]: the byte-buffer contract the decoders read through
//! - [`range`]: [`range::DataRange`], a token's position, length and hash
//! - [`hash`], [`percent`]: FNV-1a and form-style percent decoding
//! - [`token`], [`cache`]: interned token values and the caches owning them
//! - [`codec`]: the token decoders and the [`codec::RequestDecoder`] driving them
//! - [`protocol`]: requests, representations and errors
//! - [`connection`]: a request stream over an async reader
//! - [`config`]: decoder limits and cache sizes

pub mod buffer;
pub mod cache;
pub mod codec;
pub mod config;
pub mod connection;
pub mod hash;
pub mod percent;
pub mod protocol;
pub mod range;
pub mod token;

mod utils;
