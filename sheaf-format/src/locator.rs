//! Locators: tagged references to stored bytes.
//!
//! A locator is either an inline `(length, position)` pair or a URL. The
//! sign of the first `i32` word discriminates: non-negative means inline
//! (the word is the byte length, followed by a `u64` position); negative
//! means a reference, with the type in bits 24..31 of the magnitude and
//! the payload length in the low 24 bits. Only the URL type (`0x02`) is
//! defined.

use sheaf_error::{sheaf_bail, sheaf_err, SheafResult};

use crate::wire::{ReadCursor, WriteCursor};

/// URLs in locators are shorter than 2^24 bytes.
pub const MAX_URL_BYTES: usize = 1 << 24;

const URL_LOCATOR_TYPE: u32 = 0x02;

/// A reference to a run of stored bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    /// Bytes at an absolute position within the same storage.
    Inline {
        /// Compressed byte count on storage.
        bytes_on_storage: u32,
        /// Absolute byte offset.
        position: u64,
    },
    /// Bytes reachable through a URL.
    Url(String),
}

impl Locator {
    /// Serializes the locator. Returns the byte count: 12 for inline,
    /// `4 + url_len` for URLs.
    pub fn write(&self, sink: &mut WriteCursor) -> SheafResult<usize> {
        let start = sink.pos();
        match self {
            Locator::Inline {
                bytes_on_storage,
                position,
            } => {
                if *bytes_on_storage > i32::MAX as u32 {
                    sheaf_bail!(SizeOverflow: "inline locator of {bytes_on_storage} bytes");
                }
                sink.put_u32(*bytes_on_storage)?;
                sink.put_u64(*position)?;
            }
            Locator::Url(url) => {
                if url.len() >= MAX_URL_BYTES {
                    sheaf_bail!(SizeOverflow: "locator url of {} bytes", url.len());
                }
                let head = -(((URL_LOCATOR_TYPE << 24) | url.len() as u32) as i32);
                sink.put_i32(head)?;
                sink.put_bytes(url.as_bytes())?;
            }
        }
        Ok(sink.pos() - start)
    }

    /// Deserializes a locator.
    pub fn read(cursor: &mut ReadCursor) -> SheafResult<Self> {
        let head = cursor.get_i32()?;
        if head < 0 {
            let magnitude = head.unsigned_abs();
            let locator_type = magnitude >> 24;
            if locator_type != URL_LOCATOR_TYPE {
                sheaf_bail!(UnsupportedLocatorType: "{locator_type:#04x}");
            }
            let len = (magnitude & 0x00FF_FFFF) as usize;
            let url = String::from_utf8(cursor.get_bytes(len)?)
                .map_err(|_| sheaf_err!("locator url is not valid utf-8"))?;
            Ok(Locator::Url(url))
        } else {
            let position = cursor.get_u64()?;
            Ok(Locator::Inline {
                bytes_on_storage: head as u32,
                position,
            })
        }
    }
}

/// A pointer to another envelope: its uncompressed size plus a locator
/// for its bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeLink {
    /// Envelope size after decompression.
    pub unzipped_size: u32,
    /// Where the envelope bytes live.
    pub locator: Locator,
}

impl EnvelopeLink {
    /// Serializes the link. Returns the byte count.
    pub fn write(&self, sink: &mut WriteCursor) -> SheafResult<usize> {
        let start = sink.pos();
        sink.put_u32(self.unzipped_size)?;
        self.locator.write(sink)?;
        Ok(sink.pos() - start)
    }

    /// Deserializes an envelope link.
    pub fn read(cursor: &mut ReadCursor) -> SheafResult<Self> {
        let unzipped_size = cursor.get_u32()?;
        let locator = Locator::read(cursor)?;
        Ok(Self {
            unzipped_size,
            locator,
        })
    }
}
