//! Stream adapters used by the container codec.
//!
//! - [`CountingReader`] tracks how many bytes an engine pulled from a source.
//! - [`BoundedWriter`] refuses to let an engine write past the declared
//!   uncompressed size, so over-production surfaces as an error instead of
//!   silently reaching the destination.
//! - [`PrefixCapture`] swallows the first `N` bytes written through it.  The
//!   LZMA engine emits its property block in front of the payload; the
//!   container writes that block itself, so the engine's copy is captured
//!   here and compared rather than written twice.

use std::io::{self, Read, Write};

// ── CountingReader ───────────────────────────────────────────────────────────

pub struct CountingReader<R: Read> {
    inner: R,
    pub bytes_read: u64,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, bytes_read: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

// ── BoundedWriter ────────────────────────────────────────────────────────────

/// Writer that accepts at most `limit` bytes.
///
/// A write that would cross the limit is rejected whole (nothing is
/// forwarded) and `overflowed` is latched.
pub struct BoundedWriter<W: Write> {
    inner:      W,
    limit:      u64,
    pub bytes_written: u64,
    pub overflowed:    bool,
}

impl<W: Write> BoundedWriter<W> {
    pub fn new(inner: W, limit: u64) -> Self {
        Self { inner, limit, bytes_written: 0, overflowed: false }
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.bytes_written
    }
}

impl<W: Write> Write for BoundedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() as u64 > self.remaining() {
            self.overflowed = true;
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "engine output exceeds declared size of {} bytes",
                    self.limit
                ),
            ));
        }
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ── PrefixCapture ────────────────────────────────────────────────────────────

/// Writer that captures the first `N` bytes and forwards everything after.
pub struct PrefixCapture<W: Write, const N: usize> {
    inner:    W,
    prefix:   [u8; N],
    captured: usize,
}

impl<W: Write, const N: usize> PrefixCapture<W, N> {
    pub fn new(inner: W) -> Self {
        Self { inner, prefix: [0u8; N], captured: 0 }
    }

    /// The captured prefix, or `None` if fewer than `N` bytes were written.
    pub fn prefix(&self) -> Option<[u8; N]> {
        (self.captured == N).then_some(self.prefix)
    }
}

impl<W: Write, const N: usize> Write for PrefixCapture<W, N> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.captured < N {
            let take = (N - self.captured).min(buf.len());
            self.prefix[self.captured..self.captured + take].copy_from_slice(&buf[..take]);
            self.captured += take;
            return Ok(take);
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_reader_counts() {
        let mut r = CountingReader::new(&b"hello world"[..]);
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(r.bytes_read, 11);
    }

    #[test]
    fn bounded_writer_accepts_up_to_limit() {
        let mut out = Vec::new();
        let mut w = BoundedWriter::new(&mut out, 4);
        w.write_all(b"ab").unwrap();
        w.write_all(b"cd").unwrap();
        assert_eq!(w.bytes_written, 4);
        assert!(!w.overflowed);
        assert_eq!(out, b"abcd");
    }

    #[test]
    fn bounded_writer_rejects_overflow_without_forwarding() {
        let mut out = Vec::new();
        let mut w = BoundedWriter::new(&mut out, 3);
        w.write_all(b"ab").unwrap();
        assert!(w.write_all(b"cd").is_err());
        assert!(w.overflowed);
        assert_eq!(out, b"ab");
    }

    #[test]
    fn prefix_capture_splits_stream() {
        let mut out = Vec::new();
        let mut w: PrefixCapture<_, 5> = PrefixCapture::new(&mut out);
        w.write_all(b"ab").unwrap();
        assert_eq!(w.prefix(), None);
        w.write_all(b"cdefgh").unwrap();
        assert_eq!(w.prefix(), Some(*b"abcde"));
        drop(w);
        assert_eq!(out, b"fgh");
    }
}
