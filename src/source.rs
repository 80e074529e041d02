//! Byte sources a reader can own.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{CsvError, Result};

/// Contiguous bytes owned by a reader. Exactly one variant is active and its
/// address range never changes while the reader lives.
#[derive(Debug)]
pub enum Source {
    /// A memory-mapped file.
    Mapped(Mmap),
    /// An in-memory buffer handed over by the caller.
    Owned(Vec<u8>),
    /// A buffer filled by decompressing the whole input up front.
    Decompressed(Vec<u8>),
}

impl Source {
    /// The bytes of the source.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Source::Mapped(mmap) => &mmap[..],
            Source::Owned(buf) | Source::Decompressed(buf) => &buf[..],
        }
    }

    /// Total length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if the source holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the active variant, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Source::Mapped(_) => "mapped",
            Source::Owned(_) => "owned",
            Source::Decompressed(_) => "decompressed",
        }
    }

    /// Open a file: `.gz` files are decompressed, everything else is mapped.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CsvError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => CsvError::Io(e),
        })?;

        let is_gzip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
        if is_gzip {
            return Self::decompress(file);
        }

        // Mapping a zero-length file fails on some platforms
        if file.metadata()?.len() == 0 {
            return Err(CsvError::EmptyArgument);
        }

        // SAFETY: read-only map; the file must not be truncated while mapped.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| CsvError::Mapping(format!("{}: {e}", path.display())))?;
        Ok(Source::Mapped(mmap))
    }

    /// Pull a gzip stream to completion into an owned buffer.
    #[cfg(feature = "gzip")]
    pub fn decompress<R: Read>(reader: R) -> Result<Self> {
        let mut decoder = flate2::read::GzDecoder::new(reader);
        let mut buffer = Vec::new();
        decoder.read_to_end(&mut buffer)?;
        Ok(Source::Decompressed(buffer))
    }

    /// Pull a gzip stream to completion into an owned buffer.
    #[cfg(not(feature = "gzip"))]
    pub fn decompress<R: Read>(_reader: R) -> Result<Self> {
        Err(CsvError::InvalidConfig(
            "gzip sources require the `gzip` feature".to_string(),
        ))
    }

    /// Read any `io::Read` to completion into an owned buffer.
    pub fn read_all<R: Read>(mut reader: R) -> Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(Source::Owned(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_maps_plain_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n1,2\n").unwrap();
        file.flush().unwrap();

        let source = Source::open(file.path()).unwrap();
        assert_eq!(source.kind(), "mapped");
        assert_eq!(source.as_bytes(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_open_missing_file() {
        let result = Source::open(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(CsvError::FileNotFound { .. })));
    }

    #[test]
    fn test_open_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let result = Source::open(file.path());
        assert!(matches!(result, Err(CsvError::EmptyArgument)));
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_open_gzip_file() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let file = tempfile::Builder::new().suffix(".csv.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(b"x,y\n3,4\n").unwrap();
        encoder.finish().unwrap();

        let source = Source::open(file.path()).unwrap();
        assert_eq!(source.kind(), "decompressed");
        assert_eq!(source.as_bytes(), b"x,y\n3,4\n");
    }
}
