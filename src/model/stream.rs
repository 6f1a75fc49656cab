//! One-shot file streams returned by `open`/`get`

use super::FileMetadata;
use bytes::{Buf, Bytes};
use std::io;

/// Retrieved file content plus the version and metadata it was read at.
///
/// The stream owns its content and drains it: the first [`read`](Self::read)
/// returns everything, every later call returns an empty buffer. It cannot
/// be rewound.
#[derive(Debug)]
pub struct FileStream {
    content: Bytes,
    version: Option<u64>,
    metadata: Option<FileMetadata>,
}

impl FileStream {
    pub fn new(
        content: impl Into<Bytes>,
        version: Option<u64>,
        metadata: Option<FileMetadata>,
    ) -> Self {
        FileStream {
            content: content.into(),
            version,
            metadata,
        }
    }

    /// Take all remaining content, leaving the stream at EOF
    pub fn read(&mut self) -> Bytes {
        std::mem::take(&mut self.content)
    }

    /// Version the content was read at; `None` for the flat backend
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Stored metadata; `None` for the flat backend
    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.metadata.as_ref()
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.content.len()
    }
}

impl io::Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.content.len());
        buf[..n].copy_from_slice(&self.content[..n]);
        self.content.advance(n);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_read_is_empty() {
        let mut stream = FileStream::new(b"abc".to_vec(), Some(1), Some(FileMetadata::new(3)));
        assert_eq!(&stream.read()[..], b"abc");
        assert!(stream.read().is_empty());
        assert_eq!(stream.version(), Some(1));
        assert_eq!(stream.metadata().map(|m| m.size), Some(3));
    }

    #[test]
    fn test_io_read_drains_in_chunks() {
        let mut stream = FileStream::new(b"abcdef".to_vec(), None, None);
        let mut buf = [0u8; 4];
        assert_eq!(io::Read::read(&mut stream, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(stream.remaining(), 2);

        let mut rest = Vec::new();
        io::Read::read_to_end(&mut stream, &mut rest).unwrap();
        assert_eq!(rest, b"ef");
        assert!(stream.read().is_empty());
    }
}
