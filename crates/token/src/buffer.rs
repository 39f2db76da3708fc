//! The byte-buffer contract the decoders scan through.
//!
//! A decoder only ever sees a [`Buffer`]: a region of written bytes with a read
//! cursor. It never learns how the bytes got there (socket reads, pooling,
//! refills); the driving loop hands it a fresh [`ScanBuf`] view per call and the
//! view is dropped before the loop touches the underlying `BytesMut` again.

/// Byte-addressable region with a read cursor and a write cursor.
///
/// Offsets are absolute within [`Buffer::written`]. Reads never copy.
pub trait Buffer {
    /// Every byte written so far, `0..write_pos`.
    fn written(&self) -> &[u8];

    /// Offset of the next unread byte.
    fn read_pos(&self) -> usize;

    /// Moves the read cursor; `pos` must not exceed [`Buffer::write_pos`].
    fn set_read_pos(&mut self, pos: usize);

    /// Offset one past the last written byte (the read limit).
    #[inline]
    fn write_pos(&self) -> usize {
        self.written().len()
    }

    /// Number of unread bytes.
    #[inline]
    fn remaining(&self) -> usize {
        self.write_pos() - self.read_pos()
    }

    /// The byte at an absolute offset.
    #[inline]
    fn byte_at(&self, offset: usize) -> u8 {
        self.written()[offset]
    }

    /// The unread bytes.
    #[inline]
    fn unread(&self) -> &[u8] {
        &self.written()[self.read_pos()..]
    }

    /// Moves the read cursor forward by `n` bytes.
    #[inline]
    fn advance(&mut self, n: usize) {
        let pos = self.read_pos() + n;
        self.set_read_pos(pos);
    }
}

/// A borrowed, read-only view over a connection's buffer with its own cursor.
#[derive(Debug, Clone, Copy)]
pub struct ScanBuf<'a> {
    bytes: &'a [u8],
    read_pos: usize,
}

impl<'a> ScanBuf<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, read_pos: 0 }
    }

    /// A view whose cursor starts at `read_pos`, used to resume a partially decoded request.
    pub fn with_read_pos(bytes: &'a [u8], read_pos: usize) -> Self {
        debug_assert!(read_pos <= bytes.len());
        Self { bytes, read_pos }
    }

    /// The underlying bytes with the view's lifetime rather than the borrow's.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl Buffer for ScanBuf<'_> {
    #[inline]
    fn written(&self) -> &[u8] {
        self.bytes
    }

    #[inline]
    fn read_pos(&self) -> usize {
        self.read_pos
    }

    #[inline]
    fn set_read_pos(&mut self, pos: usize) {
        debug_assert!(pos <= self.bytes.len(), "read cursor {pos} beyond write cursor {}", self.bytes.len());
        self.read_pos = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_moves() {
        let mut buf = ScanBuf::new(b"GET / HTTP/1.1\r\n");
        assert_eq!(buf.remaining(), 16);
        assert_eq!(buf.byte_at(0), b'G');

        buf.advance(4);
        assert_eq!(buf.read_pos(), 4);
        assert_eq!(buf.unread(), b"/ HTTP/1.1\r\n");
        assert_eq!(buf.remaining(), 12);
        assert_eq!(buf.write_pos(), 16);
    }

    #[test]
    fn resume_from_offset() {
        let buf = ScanBuf::with_read_pos(b"GET /", 4);
        assert_eq!(buf.unread(), b"/");
    }
}
