//! Envelopes: version-prefixed, CRC32-terminated byte blocks.
//!
//! Every metadata block in a Sheaf dataset is wrapped in an envelope. The
//! first two `u16` words record the protocol version the writer used and
//! the minimum version a reader needs; the final `u32` is a CRC32 over
//! every preceding byte of the envelope.

use sheaf_error::{sheaf_bail, SheafResult};

use crate::wire::{ReadCursor, WriteCursor};

/// Protocol version written into every envelope.
pub const ENVELOPE_CURRENT_VERSION: u16 = 1;
/// Minimum protocol version a reader needs for envelopes written today.
pub const ENVELOPE_MIN_VERSION: u16 = 1;

/// Two version words plus the trailing checksum.
const MIN_ENVELOPE_BYTES: usize = 8;

/// Appends the CRC32 of `data` as a `u32`, always 4 bytes.
pub fn write_crc32(data: &[u8], sink: &mut WriteCursor) -> SheafResult<()> {
    sink.put_u32(crc32fast::hash(data))
}

/// Verifies that the final 4 bytes of `buf` hold the CRC32 of everything
/// before them.
pub fn verify_crc32(buf: &[u8]) -> SheafResult<()> {
    if buf.len() < 4 {
        sheaf_bail!(BufferTooShort: "no room for a CRC32 in {} bytes", buf.len());
    }
    let (body, tail) = buf.split_at(buf.len() - 4);
    let expected = ReadCursor::new(tail).get_u32()?;
    let actual = crc32fast::hash(body);
    if actual != expected {
        sheaf_bail!(
            ChecksumMismatch:
            "stored {expected:#010x}, computed {actual:#010x} over {} bytes",
            body.len()
        );
    }
    Ok(())
}

/// In-progress envelope on a [`WriteCursor`].
///
/// [`begin`] writes the version preamble; [`finish`] appends the CRC32
/// postscript over everything written in between.
///
/// [`begin`]: EnvelopeWriter::begin
/// [`finish`]: EnvelopeWriter::finish
pub struct EnvelopeWriter {
    start: usize,
}

impl EnvelopeWriter {
    /// Starts an envelope at the cursor's current position and writes the
    /// two version words.
    pub fn begin(sink: &mut WriteCursor) -> SheafResult<Self> {
        let start = sink.pos();
        sink.put_u16(ENVELOPE_CURRENT_VERSION)?;
        sink.put_u16(ENVELOPE_MIN_VERSION)?;
        Ok(Self { start })
    }

    /// Appends the trailing CRC32 and returns the envelope size including
    /// it, plus the checksum itself in write mode. A sizing pass counts
    /// the 4 checksum bytes but cannot produce their value.
    pub fn finish(self, sink: &mut WriteCursor) -> SheafResult<(usize, Option<u32>)> {
        let crc32 = sink.written_since(self.start).map(crc32fast::hash);
        sink.put_u32(crc32.unwrap_or(0))?;
        Ok((sink.pos() - self.start, crc32))
    }
}

/// Validates an envelope: verifies the trailing CRC32 over the whole of
/// `buf` and gates on both version words. Returns the number of preamble
/// bytes consumed, after which the envelope body begins.
pub fn read_envelope(buf: &[u8]) -> SheafResult<usize> {
    if buf.len() < MIN_ENVELOPE_BYTES {
        sheaf_bail!(BufferTooShort: "envelope of {} bytes", buf.len());
    }
    verify_crc32(buf)?;

    let mut cursor = ReadCursor::new(buf);
    let version_at_write = cursor.get_u16()?;
    if version_at_write < 1 {
        sheaf_bail!(FormatTooOld: "envelope written by protocol version {version_at_write}");
    }
    let min_required = cursor.get_u16()?;
    if min_required > ENVELOPE_CURRENT_VERSION {
        sheaf_bail!(
            FormatTooNew:
            "envelope requires protocol version {min_required}, this reader supports {ENVELOPE_CURRENT_VERSION}"
        );
    }
    Ok(cursor.consumed())
}

/// Reads the trailing CRC32 of an envelope without verifying it.
pub fn extract_envelope_crc32(buf: &[u8]) -> SheafResult<u32> {
    if buf.len() < MIN_ENVELOPE_BYTES {
        sheaf_bail!(BufferTooShort: "envelope of {} bytes", buf.len());
    }
    ReadCursor::new(&buf[buf.len() - 4..]).get_u32()
}
