//! # Internal utilities
use std::io::{Seek, SeekFrom, Write};

/// Additive checksum over a byte slice.
///
/// The wire checksum is the wrapping sum of every byte preceding the
/// checksum byte itself.
pub fn additive_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Wrapper for [Write] streams which accumulates an additive checksum of
/// every byte written through it.
///
/// This lets a frame's trailing checksum field be computed while the frame
/// is being serialized, without a second pass over the buffer.
pub struct ChecksumWriter<T> {
    sum: u8,
    inner: T,
}

impl<T> ChecksumWriter<T> {
    pub fn new(inner: T) -> Self {
        Self::seeded(0, inner)
    }

    /// Starts the sum at `seed`, covering bytes emitted before the stream
    /// was wrapped.
    pub fn seeded(seed: u8, inner: T) -> Self {
        Self { sum: seed, inner }
    }

    /// The wrapping sum of all bytes written so far.
    pub const fn sum(&self) -> u8 {
        self.sum
    }
}

impl<T: Write> Write for ChecksumWriter<T> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let w = self.inner.write(buf)?;
        self.sum = buf[..w]
            .iter()
            .fold(self.sum, |acc, b| acc.wrapping_add(*b));
        Ok(w)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<T: Seek> Seek for ChecksumWriter<T> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn checksum_wraps() {
        assert_eq!(additive_checksum(&[0xff, 0x02]), 0x01);
        assert_eq!(additive_checksum(&[]), 0);
    }

    #[test]
    fn writer_matches_slice_checksum() {
        let data = [0x52, 0x4d, 0x00, 0x03, 0xaa, 0xbb, 0xcc];
        let mut w = ChecksumWriter::new(Cursor::new(Vec::new()));
        w.write_all(&data).unwrap();
        assert_eq!(w.sum(), additive_checksum(&data));
    }

    #[test]
    fn seeded_writer_covers_prefix() {
        let prefix = [0x52, 0x4d];
        let rest = [0x00, 0x02, 0x03, 0x02];
        let mut w = ChecksumWriter::seeded(additive_checksum(&prefix), Cursor::new(Vec::new()));
        w.write_all(&rest).unwrap();

        let mut all = prefix.to_vec();
        all.extend_from_slice(&rest);
        assert_eq!(w.sum(), additive_checksum(&all));
    }
}
