//! Small helpers shared by the decoders.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Used for limit checks where the decoders want `?`-like control flow
/// without building a `Result` first.
///
/// ```ignore
/// ensure!(count < config.max_headers(), ParseError::too_many_headers(config.max_headers()));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Returns true for the whitespace and control bytes that may precede a request line.
#[inline]
pub(crate) fn is_leading_junk(b: u8) -> bool {
    b.is_ascii_whitespace() || b.is_ascii_control()
}

/// Returns true for bytes allowed in an RFC 9110 `token` (methods, header names).
#[inline]
pub(crate) fn is_token_byte(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~' | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z')
}
