//! Little-endian wire primitives.
//!
//! All multi-byte integers on the wire are little-endian two's-complement
//! values of fixed width. Strings are a `u32` length followed by the raw
//! bytes, with no terminator.

use bytes::Buf;
use sheaf_error::{sheaf_bail, sheaf_err, SheafResult};

/// Destination for serialization: either a real byte buffer or a counting
/// sink.
///
/// Both modes advance the same position, so a sizing pass over a
/// [`WriteCursor::sizer`] returns exactly the byte count that a write pass
/// over [`WriteCursor::new`] produces. Write mode fails with
/// `BufferTooShort` when the supplied buffer is exhausted; the counting
/// sink never fails.
pub struct WriteCursor<'a> {
    buf: Option<&'a mut [u8]>,
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    /// A cursor that writes into `buf`, starting at its first byte.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf: Some(buf),
            pos: 0,
        }
    }

    /// A counting sink: advances the position without writing anywhere.
    pub fn sizer() -> Self {
        Self { buf: None, pos: 0 }
    }

    /// Bytes written (or counted) so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Whether this cursor only counts bytes.
    pub fn is_sizing(&self) -> bool {
        self.buf.is_none()
    }

    /// Appends raw bytes with no length prefix.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> SheafResult<()> {
        if let Some(buf) = self.buf.as_deref_mut() {
            let end = self.pos + bytes.len();
            let Some(dst) = buf.get_mut(self.pos..end) else {
                sheaf_bail!(
                    BufferTooShort:
                    "writing {} bytes at offset {} exceeds the {}-byte output buffer",
                    bytes.len(),
                    self.pos,
                    buf.len()
                );
            };
            dst.copy_from_slice(bytes);
        }
        self.pos += bytes.len();
        Ok(())
    }

    /// Writes a `u16`, always 2 bytes.
    pub fn put_u16(&mut self, val: u16) -> SheafResult<()> {
        self.put_bytes(&val.to_le_bytes())
    }

    /// Writes an `i16`, always 2 bytes.
    pub fn put_i16(&mut self, val: i16) -> SheafResult<()> {
        self.put_bytes(&val.to_le_bytes())
    }

    /// Writes a `u32`, always 4 bytes.
    pub fn put_u32(&mut self, val: u32) -> SheafResult<()> {
        self.put_bytes(&val.to_le_bytes())
    }

    /// Writes an `i32`, always 4 bytes.
    pub fn put_i32(&mut self, val: i32) -> SheafResult<()> {
        self.put_bytes(&val.to_le_bytes())
    }

    /// Writes a `u64`, always 8 bytes.
    pub fn put_u64(&mut self, val: u64) -> SheafResult<()> {
        self.put_bytes(&val.to_le_bytes())
    }

    /// Writes an `i64`, always 8 bytes.
    pub fn put_i64(&mut self, val: i64) -> SheafResult<()> {
        self.put_bytes(&val.to_le_bytes())
    }

    /// Writes a length-prefixed string: `u32` length, then the raw bytes.
    /// Returns the byte count, `4 + len`.
    pub fn put_string(&mut self, val: &str) -> SheafResult<usize> {
        let len = u32::try_from(val.len())
            .map_err(|_| sheaf_err!(SizeOverflow: "string of {} bytes", val.len()))?;
        self.put_u32(len)?;
        self.put_bytes(val.as_bytes())?;
        Ok(4 + val.len())
    }

    /// Rewrites 4 bytes at an already-written position. A no-op when
    /// sizing. `at + 4` must not exceed the current position.
    pub(crate) fn patch_i32(&mut self, at: usize, val: i32) -> SheafResult<()> {
        debug_assert!(at + 4 <= self.pos);
        if let Some(buf) = self.buf.as_deref_mut() {
            let Some(dst) = buf.get_mut(at..at + 4) else {
                sheaf_bail!(BufferTooShort: "patching 4 bytes at offset {at}");
            };
            dst.copy_from_slice(&val.to_le_bytes());
        }
        Ok(())
    }

    /// The bytes written since `start`, or `None` when sizing.
    pub(crate) fn written_since(&self, start: usize) -> Option<&[u8]> {
        self.buf.as_deref().map(|buf| &buf[start..self.pos])
    }
}

/// Checked little-endian reads over a byte slice.
///
/// Every accessor verifies the remaining length before reading and fails
/// with `BufferTooShort` instead of running past the end.
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> ReadCursor<'a> {
    /// A cursor over `buf`, starting at its first byte.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    /// Bytes read so far.
    pub fn consumed(&self) -> usize {
        self.len - self.buf.len()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn ensure(&self, n: usize, what: &str) -> SheafResult<()> {
        if self.buf.remaining() < n {
            sheaf_bail!(
                BufferTooShort:
                "{what} needs {n} bytes, {} available",
                self.buf.remaining()
            );
        }
        Ok(())
    }

    /// Reads a `u16`.
    pub fn get_u16(&mut self) -> SheafResult<u16> {
        self.ensure(2, "u16")?;
        Ok(self.buf.get_u16_le())
    }

    /// Reads an `i16`.
    pub fn get_i16(&mut self) -> SheafResult<i16> {
        self.ensure(2, "i16")?;
        Ok(self.buf.get_i16_le())
    }

    /// Reads a `u32`.
    pub fn get_u32(&mut self) -> SheafResult<u32> {
        self.ensure(4, "u32")?;
        Ok(self.buf.get_u32_le())
    }

    /// Reads an `i32`.
    pub fn get_i32(&mut self) -> SheafResult<i32> {
        self.ensure(4, "i32")?;
        Ok(self.buf.get_i32_le())
    }

    /// Reads a `u64`.
    pub fn get_u64(&mut self) -> SheafResult<u64> {
        self.ensure(8, "u64")?;
        Ok(self.buf.get_u64_le())
    }

    /// Reads an `i64`.
    pub fn get_i64(&mut self) -> SheafResult<i64> {
        self.ensure(8, "i64")?;
        Ok(self.buf.get_i64_le())
    }

    /// Reads `n` raw bytes.
    pub fn get_bytes(&mut self, n: usize) -> SheafResult<Vec<u8>> {
        self.ensure(n, "raw bytes")?;
        let bytes = self.buf[..n].to_vec();
        self.buf.advance(n);
        Ok(bytes)
    }

    /// Reads a length-prefixed string: `u32` length, then the raw bytes,
    /// which must be valid UTF-8.
    pub fn get_string(&mut self) -> SheafResult<String> {
        self.ensure(4, "string length")?;
        let len = self.buf.get_u32_le() as usize;
        let bytes = self.get_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| sheaf_err!("string contents are not valid utf-8"))
    }
}

#[cfg(test)]
mod test {
    use sheaf_error::SheafError;

    use super::*;

    #[test]
    fn integer_round_trips() {
        let mut buf = [0u8; 28];
        let mut sink = WriteCursor::new(&mut buf);
        sink.put_u16(0xBEEF).unwrap();
        sink.put_i16(-2).unwrap();
        sink.put_u32(0xDEAD_BEEF).unwrap();
        sink.put_i32(-40).unwrap();
        sink.put_u64(u64::MAX - 1).unwrap();
        sink.put_i64(i64::MIN).unwrap();
        assert_eq!(sink.pos(), 28);

        let mut cursor = ReadCursor::new(&buf);
        assert_eq!(cursor.get_u16().unwrap(), 0xBEEF);
        assert_eq!(cursor.get_i16().unwrap(), -2);
        assert_eq!(cursor.get_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(cursor.get_i32().unwrap(), -40);
        assert_eq!(cursor.get_u64().unwrap(), u64::MAX - 1);
        assert_eq!(cursor.get_i64().unwrap(), i64::MIN);
        assert_eq!(cursor.consumed(), 28);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn integers_are_little_endian() {
        let mut buf = [0u8; 4];
        WriteCursor::new(&mut buf).put_u32(0x0102_0304).unwrap();
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn signed_and_unsigned_share_bit_patterns() {
        let mut buf = [0u8; 4];
        WriteCursor::new(&mut buf).put_i32(-1).unwrap();
        assert_eq!(ReadCursor::new(&buf).get_u32().unwrap(), u32::MAX);
    }

    #[test]
    fn string_round_trip() {
        let mut buf = [0u8; 16];
        let mut sink = WriteCursor::new(&mut buf);
        let written = sink.put_string("sheaf").unwrap();
        assert_eq!(written, 9);
        assert_eq!(sink.pos(), 9);
        assert_eq!(&buf[..4], &5u32.to_le_bytes());

        let mut cursor = ReadCursor::new(&buf[..9]);
        assert_eq!(cursor.get_string().unwrap(), "sheaf");
        assert_eq!(cursor.consumed(), 9);
    }

    #[test]
    fn sizer_counts_without_writing() {
        let mut sizer = WriteCursor::sizer();
        sizer.put_u16(7).unwrap();
        sizer.put_string("abc").unwrap();
        sizer.put_u64(42).unwrap();
        assert!(sizer.is_sizing());

        let mut buf = [0u8; 17];
        let mut sink = WriteCursor::new(&mut buf);
        sink.put_u16(7).unwrap();
        sink.put_string("abc").unwrap();
        sink.put_u64(42).unwrap();
        assert_eq!(sizer.pos(), sink.pos());
    }

    #[test]
    fn write_past_end_fails() {
        let mut buf = [0u8; 3];
        let mut sink = WriteCursor::new(&mut buf);
        assert!(matches!(
            sink.put_u32(1),
            Err(SheafError::BufferTooShort(_))
        ));
    }

    #[test]
    fn read_past_end_fails() {
        let buf = [0u8; 3];
        assert!(matches!(
            ReadCursor::new(&buf).get_u32(),
            Err(SheafError::BufferTooShort(_))
        ));
    }

    #[test]
    fn string_read_checks_both_lengths() {
        // Truncated length prefix.
        let buf = [5u8, 0, 0];
        assert!(matches!(
            ReadCursor::new(&buf).get_string(),
            Err(SheafError::BufferTooShort(_))
        ));

        // Length prefix promising more contents than available.
        let mut buf = [0u8; 6];
        WriteCursor::new(&mut buf).put_u32(100).unwrap();
        assert!(matches!(
            ReadCursor::new(&buf).get_string(),
            Err(SheafError::BufferTooShort(_))
        ));
    }

    #[test]
    fn patch_rewrites_in_place() {
        let mut buf = [0u8; 8];
        let mut sink = WriteCursor::new(&mut buf);
        sink.put_i32(1).unwrap();
        sink.put_i32(2).unwrap();
        sink.patch_i32(0, -48).unwrap();
        let mut cursor = ReadCursor::new(&buf);
        assert_eq!(cursor.get_i32().unwrap(), -48);
        assert_eq!(cursor.get_i32().unwrap(), 2);
    }
}
