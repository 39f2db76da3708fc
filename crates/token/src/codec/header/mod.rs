//! Header block decoders.
//!
//! Names and values are decoded separately so the driving loop can stop between
//! them; the name decided on the first pass selects how the value is stored.

mod name_decoder;
mod value_decoder;

pub use name_decoder::HeaderNameDecoder;
pub use value_decoder::HeaderValueDecoder;

/// What the header-name decoder found at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine<T> {
    /// The empty line that ends the header block.
    End,
    Name(T),
}
