//! Record and list frames.
//!
//! A frame is a length-delimited region inside an envelope. Its first
//! word is a signed `i32`: the writer emits a `+1` or `-1` sentinel, lets
//! the caller fill the body, and finalizes the frame by overwriting the
//! sentinel with `marker * total_size` — the sign distinguishes a record
//! frame (positive, single body) from a list frame (negative, body
//! preceded by a `u32` item count), and the magnitude is the frame length
//! including its own header.

use sheaf_error::{sheaf_bail, SheafResult};

use crate::wire::{ReadCursor, WriteCursor};

/// List frames hold fewer than 2^28 items; the upper 4 bits of the item
/// count are reserved.
pub const MAX_LIST_ITEMS: u32 = 1 << 28;

const ITEM_COUNT_MASK: u32 = MAX_LIST_ITEMS - 1;

/// The two frame kinds, distinguished on the wire by the sign of the
/// size word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// A single body; positive size word.
    Record,
    /// An item count followed by that many serialized items; negative
    /// size word.
    List,
}

/// In-progress frame on a [`WriteCursor`].
pub struct FrameWriter {
    start: usize,
    marker: i32,
}

impl FrameWriter {
    /// Starts a record frame: writes the `+1` sentinel.
    pub fn record(sink: &mut WriteCursor) -> SheafResult<Self> {
        let start = sink.pos();
        sink.put_i32(1)?;
        Ok(Self { start, marker: 1 })
    }

    /// Starts a list frame: writes the `-1` sentinel and the item count.
    pub fn list(sink: &mut WriteCursor, nitems: u32) -> SheafResult<Self> {
        if nitems >= MAX_LIST_ITEMS {
            sheaf_bail!(SizeOverflow: "list frame of {nitems} items");
        }
        let start = sink.pos();
        sink.put_i32(-1)?;
        sink.put_u32(nitems)?;
        Ok(Self { start, marker: -1 })
    }

    /// Finalizes the frame: overwrites the sentinel with
    /// `marker * size`. Returns the frame size, header included.
    pub fn finish(self, sink: &mut WriteCursor) -> SheafResult<usize> {
        let size = sink.pos() - self.start;
        let Ok(ssize) = i32::try_from(size) else {
            sheaf_bail!(SizeOverflow: "frame of {size} bytes exceeds the signed 32-bit size word");
        };
        sink.patch_i32(self.start, self.marker * ssize)?;
        Ok(size)
    }
}

/// A decoded frame header.
#[derive(Clone, Copy, Debug)]
pub struct FrameHeader {
    /// Record or list, recovered from the sign of the size word.
    pub kind: FrameKind,
    /// Frame length, header included.
    pub size: u32,
    /// Item count for list frames; 1 for record frames.
    pub nitems: u32,
    /// Header bytes consumed: 4 for records, 8 for lists. The body
    /// occupies `header_len..size`.
    pub header_len: usize,
}

/// Reads and validates a frame header at the start of `buf`. The whole
/// frame must fit inside `buf`.
pub fn read_frame_header(buf: &[u8]) -> SheafResult<FrameHeader> {
    let mut cursor = ReadCursor::new(buf);
    let ssize = cursor.get_i32()?;

    let header = if ssize >= 0 {
        let size = ssize as u32;
        if size < 4 {
            sheaf_bail!(CorruptFrame: "record frame of {size} bytes, below its 4-byte header");
        }
        FrameHeader {
            kind: FrameKind::Record,
            size,
            nitems: 1,
            header_len: cursor.consumed(),
        }
    } else {
        let nitems = cursor.get_u32()? & ITEM_COUNT_MASK;
        let size = ssize.unsigned_abs();
        if size < 8 {
            sheaf_bail!(CorruptFrame: "list frame of {size} bytes, below its 8-byte header");
        }
        FrameHeader {
            kind: FrameKind::List,
            size,
            nitems,
            header_len: cursor.consumed(),
        }
    };

    if (buf.len() as u64) < u64::from(header.size) {
        sheaf_bail!(
            BufferTooShort:
            "frame of {} bytes in a {}-byte buffer",
            header.size,
            buf.len()
        );
    }
    Ok(header)
}
