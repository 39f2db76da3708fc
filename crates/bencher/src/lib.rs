//! Request fixtures shared by the benchmarks.

/// A raw request on disk, embedded with `include_str!`.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.content.as_bytes()
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

/// How the request reaches the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The whole request in one read.
    Whole,
    /// The request cut into reads of this many bytes.
    Pieces(usize),
}

/// A fixture together with the way it is delivered.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    delivery: Delivery,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, delivery: Delivery, file: TestFile) -> Self {
        Self { name, delivery, file }
    }

    pub fn whole(name: &'static str, file: TestFile) -> Self {
        Self::new(name, Delivery::Whole, file)
    }

    pub fn pieces(name: &'static str, piece_len: usize, file: TestFile) -> Self {
        Self::new(name, Delivery::Pieces(piece_len), file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    /// The reads the decoder sees, in order.
    pub fn reads(&self) -> Vec<&'static [u8]> {
        match self.delivery {
            Delivery::Whole => vec![self.file.bytes()],
            Delivery::Pieces(len) => self.file.bytes().chunks(len.max(1)).collect(),
        }
    }
}
