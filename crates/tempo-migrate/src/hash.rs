//! FNV-1a checksums over checkpoint bytes.
//!
//! Not cryptographically secure. The checksum catches truncation and
//! corruption in transit, nothing more.

use std::io::{self, Read, Write};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fold(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, &b| (h ^ b as u64).wrapping_mul(FNV_PRIME))
}

/// FNV-1a hash of `bytes`.
///
/// Returns the offset basis (non-zero) for an empty slice.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    fold(FNV_OFFSET, bytes)
}

/// A writer that hashes every byte it forwards.
pub struct HashingWriter<'a> {
    inner: &'a mut dyn Write,
    hash: u64,
}

impl<'a> HashingWriter<'a> {
    /// Wrap `inner`.
    pub fn new(inner: &'a mut dyn Write) -> Self {
        Self {
            inner,
            hash: FNV_OFFSET,
        }
    }

    /// Hash of every byte written so far.
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl Write for HashingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hash = fold(self.hash, &buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A reader that hashes every byte it yields.
pub struct HashingReader<'a> {
    inner: &'a mut dyn Read,
    hash: u64,
}

impl<'a> HashingReader<'a> {
    /// Wrap `inner`.
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self {
            inner,
            hash: FNV_OFFSET,
        }
    }

    /// Hash of every byte read so far.
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl Read for HashingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hash = fold(self.hash, &buf[..n]);
        Ok(n)
    }
}
