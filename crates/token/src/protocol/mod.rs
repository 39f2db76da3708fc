//! Request types produced by the decoders.
//!
//! - [`Request`]: a decoded head plus its body, generic over a [`Repr`]
//!   - [`Eager`]: interned tokens, see [`QueryString`] and [`FieldValue`]
//!   - [`Ranged`]: [`DataRange`](crate::range::DataRange)s into the frozen head, see [`RangeQuery`] and [`RangePairs`]
//! - [`HttpVersion`]: the protocol version of the request line
//! - [`ParseError`]: every way a request can be rejected
//! - [`ParseResult`]: the flattened outcome of one decode call

mod error;
mod repr;
mod request;
mod result;
mod version;

pub use error::ParseError;
pub use repr::{Eager, FieldValue, QueryParam, QueryString, RangePairs, RangeQuery, Ranged, Repr};
pub use request::Request;
pub use result::{ParseFailure, ParseResult};
pub use version::HttpVersion;
