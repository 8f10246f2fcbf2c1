//! Random-access byte sources and the little-endian decoding cursor
//!
//! Provides buffered or memory-mapped access to index files and a
//! [`ByteCursor`] that decodes the fixed-width fields of the BAI layout.

use crate::core::error::{BaiError, BaiResult};
use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Default buffer size for BufReader (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Large buffer size for high-throughput I/O (1MB)
pub const LARGE_BUFFER_SIZE: usize = 1024 * 1024;

/// Threshold for using memory mapping (16MB)
pub const MMAP_THRESHOLD: u64 = 16 * 1024 * 1024;

/// I/O strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoStrategy {
    /// Use buffered reading with configurable buffer size
    Buffered(usize),
    /// Use memory mapping for the entire file
    MemoryMapped,
    /// Automatically select based on file size
    #[default]
    Auto,
}

/// A smart reader that automatically selects the optimal I/O strategy
pub enum SmartReader {
    /// Buffered reader for smaller files
    Buffered(BufReader<File>),
    /// Memory-mapped reader for large files
    Mapped(MappedReader),
}

/// Memory-mapped file reader
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    /// Create a new memory-mapped reader
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: We assume the file won't be modified while mapped
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }

    /// Get the entire file content as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Get file size
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.mmap[self.position..];
        let to_read = std::cmp::min(buf.len(), remaining.len());
        buf[..to_read].copy_from_slice(&remaining[..to_read]);
        self.position += to_read;
        Ok(to_read)
    }
}

impl Seek for MappedReader {
    /// Positions past the end of the mapping clamp to its length.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.mmap.len() as i128;
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(n) => self.position as i128 + n as i128,
            SeekFrom::End(n) => len + n as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative position",
            ));
        }
        self.position = target.min(len) as usize;
        Ok(self.position as u64)
    }
}

impl SmartReader {
    /// Open a file with the specified I/O strategy
    pub fn open<P: AsRef<Path>>(path: P, strategy: IoStrategy) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let file_size = file.metadata()?.len();

        match strategy {
            IoStrategy::Buffered(buf_size) => {
                Ok(SmartReader::Buffered(BufReader::with_capacity(buf_size, file)))
            }
            IoStrategy::MemoryMapped => Ok(SmartReader::Mapped(MappedReader::new(&file)?)),
            IoStrategy::Auto => {
                if file_size >= MMAP_THRESHOLD {
                    Ok(SmartReader::Mapped(MappedReader::new(&file)?))
                } else {
                    let buf_size = if file_size > 4 * 1024 * 1024 {
                        LARGE_BUFFER_SIZE
                    } else {
                        DEFAULT_BUFFER_SIZE
                    };
                    Ok(SmartReader::Buffered(BufReader::with_capacity(buf_size, file)))
                }
            }
        }
    }

    /// Open with default auto strategy
    pub fn open_auto<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::open(path, IoStrategy::Auto)
    }

    /// Check if using memory mapping
    pub fn is_mapped(&self) -> bool {
        matches!(self, SmartReader::Mapped(_))
    }
}

impl Read for SmartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SmartReader::Buffered(reader) => reader.read(buf),
            SmartReader::Mapped(reader) => reader.read(buf),
        }
    }
}

impl Seek for SmartReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            SmartReader::Buffered(reader) => reader.seek(pos),
            SmartReader::Mapped(reader) => reader.seek(pos),
        }
    }
}

/// Reference point for [`ByteCursor::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whence {
    /// From the start of the file
    #[default]
    Start,
    /// From the current position
    Current,
    /// From the end of the file
    End,
}

impl TryFrom<i32> for Whence {
    type Error = BaiError;

    fn try_from(value: i32) -> BaiResult<Self> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(BaiError::InvalidArgument(format!(
                "whence must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Seekable cursor decoding little-endian fields from a byte source
pub struct ByteCursor<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a source; the cursor starts at offset 0.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the underlying source in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move the cursor and return the new absolute position.
    ///
    /// A missing offset, or one that resolves before the start of the
    /// source, fails with `InvalidArgument` without moving the cursor.
    pub fn seek(&mut self, offset: Option<i64>, whence: Whence) -> BaiResult<u64> {
        let offset = offset
            .ok_or_else(|| BaiError::InvalidArgument("no offset provided".to_string()))?;
        let pos = match whence {
            Whence::Start => {
                let start = u64::try_from(offset).map_err(|_| {
                    BaiError::InvalidArgument(format!("negative absolute offset {}", offset))
                })?;
                SeekFrom::Start(start)
            }
            Whence::Current => {
                let here = self.tell()?;
                if offset < 0 && offset.unsigned_abs() > here {
                    return Err(BaiError::InvalidArgument(format!(
                        "offset {} moves before start of file",
                        offset
                    )));
                }
                SeekFrom::Current(offset)
            }
            Whence::End => {
                if offset < 0 && offset.unsigned_abs() > self.len {
                    return Err(BaiError::InvalidArgument(format!(
                        "offset {} moves before start of file",
                        offset
                    )));
                }
                SeekFrom::End(offset)
            }
        };
        Ok(self.inner.seek(pos)?)
    }

    /// Seek to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> BaiResult<u64> {
        Ok(self.inner.seek(SeekFrom::Start(offset))?)
    }

    /// Advance `n` bytes without decoding them.
    ///
    /// Skipping past the end of the source is reported as a truncated `what`.
    pub fn skip(&mut self, n: u64, what: &str) -> BaiResult<u64> {
        let here = self.tell()?;
        match here.checked_add(n) {
            Some(target) if target <= self.len => self.seek_to(target),
            _ => Err(BaiError::Format(format!("truncated {}", what))),
        }
    }

    /// Current absolute position
    pub fn tell(&mut self) -> BaiResult<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Read up to `n` bytes; fewer are returned at end of file.
    pub fn read(&mut self, n: usize) -> BaiResult<Vec<u8>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut buf = Vec::with_capacity(n.min(DEFAULT_BUFFER_SIZE));
        (&mut self.inner).take(n as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read everything from the current position to the end
    pub fn read_to_end(&mut self) -> BaiResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn read_i32(&mut self, what: &str) -> BaiResult<i32> {
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|e| BaiError::decoding(e, what))
    }

    pub fn read_u64(&mut self, what: &str) -> BaiResult<u64> {
        self.inner
            .read_u64::<LittleEndian>()
            .map_err(|e| BaiError::decoding(e, what))
    }

    /// Read a fixed-size byte string
    pub fn read_bytes<const N: usize>(&mut self, what: &str) -> BaiResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| BaiError::decoding(e, what))?;
        Ok(buf)
    }

    /// Read `n` consecutive little-endian `u64` values
    pub fn read_u64_array(&mut self, n: usize, what: &str) -> BaiResult<Vec<u64>> {
        let needed = (n as u64).saturating_mul(8);
        if needed > self.len.saturating_sub(self.tell()?) {
            return Err(BaiError::Format(format!("truncated {}", what)));
        }
        let mut values = vec![0u64; n];
        self.inner
            .read_u64_into::<LittleEndian>(&mut values)
            .map_err(|e| BaiError::decoding(e, what))?;
        Ok(values)
    }

    /// Read a `u64` that may be absent at end of file.
    ///
    /// Zero remaining bytes is `None`; a partial value is a format error.
    pub fn read_optional_u64(&mut self, what: &str) -> BaiResult<Option<u64>> {
        let bytes = self.read(8)?;
        match bytes.len() {
            0 => Ok(None),
            8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes);
                Ok(Some(u64::from_le_bytes(raw)))
            }
            n => Err(BaiError::Format(format!(
                "truncated {}: {} of 8 bytes present",
                what, n
            ))),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn cursor(bytes: &[u8]) -> ByteCursor<Cursor<Vec<u8>>> {
        ByteCursor::new(Cursor::new(bytes.to_vec())).unwrap()
    }

    #[test]
    fn test_io_strategy_default() {
        assert_eq!(IoStrategy::default(), IoStrategy::Auto);
    }

    #[test]
    fn test_smart_reader_auto_small_file() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(b"BAI\x01")?;
        temp.flush()?;

        let reader = SmartReader::open_auto(temp.path())?;
        assert!(!reader.is_mapped());
        Ok(())
    }

    #[test]
    fn test_mapped_reader_seek_clamps() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(b"test content")?;
        temp.flush()?;

        let file = File::open(temp.path())?;
        let mut reader = MappedReader::new(&file)?;
        assert_eq!(reader.len(), 12);
        assert_eq!(reader.seek(SeekFrom::Start(100))?, 12);
        assert_eq!(reader.seek(SeekFrom::End(-7))?, 5);
        assert!(reader.seek(SeekFrom::Current(-6)).is_err());

        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        assert_eq!(buf, "content");
        Ok(())
    }

    #[test]
    fn test_decode_little_endian() {
        let mut bytes = b"BAI\x01".to_vec();
        bytes.extend_from_slice(&(-3i32).to_le_bytes());
        bytes.extend_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());

        let mut c = cursor(&bytes);
        assert_eq!(&c.read_bytes::<4>("magic").unwrap(), b"BAI\x01");
        assert_eq!(c.read_i32("n_ref").unwrap(), -3);
        assert_eq!(c.read_u64("offset").unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(c.tell().unwrap(), 16);
    }

    #[test]
    fn test_truncated_field_is_format_error() {
        let mut c = cursor(&[1, 2]);
        assert!(matches!(c.read_i32("n_bin"), Err(BaiError::Format(_))));
    }

    #[test]
    fn test_read_zero_does_not_move() {
        let mut c = cursor(b"abcdef");
        c.seek_to(3).unwrap();
        assert!(c.read(0).unwrap().is_empty());
        assert_eq!(c.tell().unwrap(), 3);
        assert_eq!(c.read(10).unwrap(), b"def");
    }

    #[test]
    fn test_seek_requires_offset() {
        let mut c = cursor(b"abcdef");
        c.seek_to(2).unwrap();
        assert!(matches!(
            c.seek(None, Whence::Start),
            Err(BaiError::InvalidArgument(_))
        ));
        assert!(matches!(
            c.seek(Some(-1), Whence::Start),
            Err(BaiError::InvalidArgument(_))
        ));
        assert!(matches!(
            c.seek(Some(-3), Whence::Current),
            Err(BaiError::InvalidArgument(_))
        ));
        assert_eq!(c.tell().unwrap(), 2);
        assert_eq!(c.seek(Some(-1), Whence::End).unwrap(), 5);
        assert_eq!(c.seek(Some(-2), Whence::Current).unwrap(), 3);
    }

    #[test]
    fn test_whence_from_int() {
        assert_eq!(Whence::try_from(0).unwrap(), Whence::Start);
        assert_eq!(Whence::try_from(1).unwrap(), Whence::Current);
        assert_eq!(Whence::try_from(2).unwrap(), Whence::End);
        assert!(Whence::try_from(3).is_err());
    }

    #[test]
    fn test_skip_past_end() {
        let mut c = cursor(&[0u8; 16]);
        assert_eq!(c.skip(16, "chunks").unwrap(), 16);
        c.seek_to(0).unwrap();
        assert!(matches!(c.skip(17, "chunks"), Err(BaiError::Format(_))));
    }

    #[test]
    fn test_u64_array_and_optional() {
        let mut bytes = Vec::new();
        for v in [7u64, 8, 9] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut c = cursor(&bytes);
        assert_eq!(c.read_u64_array(2, "intervals").unwrap(), vec![7, 8]);
        assert_eq!(c.read_optional_u64("n_no_coor").unwrap(), Some(9));
        assert_eq!(c.read_optional_u64("n_no_coor").unwrap(), None);

        let mut short = cursor(&[1, 2, 3]);
        assert!(matches!(
            short.read_optional_u64("n_no_coor"),
            Err(BaiError::Format(_))
        ));
        let mut short = cursor(&[0u8; 8]);
        assert!(matches!(
            short.read_u64_array(2, "intervals"),
            Err(BaiError::Format(_))
        ));
    }
}
