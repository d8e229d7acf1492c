//! Compound records: cluster summaries and cluster groups.
//!
//! Both are record frames wrapping a handful of typed primitives. They
//! appear in the footer envelope, one summary per cluster and one group
//! per page-list envelope.

use sheaf_error::{sheaf_bail, sheaf_err, SheafResult};

use crate::frame::{read_frame_header, FrameWriter};
use crate::locator::EnvelopeLink;
use crate::wire::{ReadCursor, WriteCursor};

/// Entry range of a cluster, with an optional column-group association.
///
/// The wire couples the entry count and the group: a positive `i64` is
/// the entry count of a cluster covering all columns; a negative one is
/// the negated entry count followed by a `u32` column-group ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSummary {
    /// Index of the cluster's first entry in the dataset.
    pub first_entry: u64,
    /// Number of entries in the cluster.
    pub n_entries: u64,
    /// The column group this cluster covers; `None` means all columns.
    pub column_group_id: Option<u32>,
}

impl ClusterSummary {
    /// Serializes the summary as a record frame. Returns the frame size.
    pub fn write(&self, sink: &mut WriteCursor) -> SheafResult<usize> {
        let entries = i64::try_from(self.n_entries)
            .map_err(|_| sheaf_err!(SizeOverflow: "cluster of {} entries", self.n_entries))?;
        let frame = FrameWriter::record(sink)?;
        sink.put_u64(self.first_entry)?;
        match self.column_group_id {
            Some(group_id) => {
                sink.put_i64(-entries)?;
                sink.put_u32(group_id)?;
            }
            None => sink.put_i64(entries)?,
        }
        frame.finish(sink)
    }

    /// Deserializes a summary from the record frame at the start of
    /// `buf`. Returns the summary and the frame size, so the caller can
    /// skip to the next record.
    pub fn read(buf: &[u8]) -> SheafResult<(Self, usize)> {
        let header = read_frame_header(buf)?;
        let mut cursor = ReadCursor::new(&buf[header.header_len..header.size as usize]);
        if cursor.remaining() < 16 {
            sheaf_bail!(CorruptFrame: "cluster summary body of {} bytes", cursor.remaining());
        }

        let first_entry = cursor.get_u64()?;
        let entries = cursor.get_i64()?;
        let (n_entries, column_group_id) = if entries < 0 {
            if cursor.remaining() < 4 {
                sheaf_bail!(CorruptFrame: "cluster summary is missing its column group");
            }
            let Some(positive) = entries.checked_neg() else {
                sheaf_bail!(CorruptFrame: "cluster entry count {entries} is not representable");
            };
            (positive as u64, Some(cursor.get_u32()?))
        } else {
            (entries as u64, None)
        };

        Ok((
            Self {
                first_entry,
                n_entries,
                column_group_id,
            },
            header.size as usize,
        ))
    }
}

/// A set of clusters whose page lists share one page-list envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterGroup {
    /// Number of clusters covered by the envelope.
    pub n_clusters: u32,
    /// Pointer to the page-list envelope.
    pub page_list_link: EnvelopeLink,
}

impl ClusterGroup {
    /// Serializes the group as a record frame. Returns the frame size.
    pub fn write(&self, sink: &mut WriteCursor) -> SheafResult<usize> {
        let frame = FrameWriter::record(sink)?;
        sink.put_u32(self.n_clusters)?;
        self.page_list_link.write(sink)?;
        frame.finish(sink)
    }

    /// Deserializes a group from the record frame at the start of `buf`.
    /// Returns the group and the frame size.
    pub fn read(buf: &[u8]) -> SheafResult<(Self, usize)> {
        let header = read_frame_header(buf)?;
        let mut cursor = ReadCursor::new(&buf[header.header_len..header.size as usize]);
        if cursor.remaining() < 4 {
            sheaf_bail!(CorruptFrame: "cluster group body of {} bytes", cursor.remaining());
        }

        let n_clusters = cursor.get_u32()?;
        let page_list_link = EnvelopeLink::read(&mut cursor)?;
        Ok((
            Self {
                n_clusters,
                page_list_link,
            },
            header.size as usize,
        ))
    }
}

#[cfg(test)]
mod test {
    use sheaf_error::SheafError;

    use crate::locator::Locator;

    use super::*;

    fn write_to_vec(write: impl Fn(&mut WriteCursor) -> SheafResult<usize>) -> Vec<u8> {
        let mut sizer = WriteCursor::sizer();
        let size = write(&mut sizer).unwrap();
        assert_eq!(size, sizer.pos());

        let mut buf = vec![0u8; size];
        write(&mut WriteCursor::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn summary_round_trip_without_group() {
        let summary = ClusterSummary {
            first_entry: 0,
            n_entries: 1000,
            column_group_id: None,
        };
        let buf = write_to_vec(|sink| summary.write(sink));
        assert_eq!(buf.len(), 4 + 8 + 8);

        let (back, consumed) = ClusterSummary::read(&buf).unwrap();
        assert_eq!(back, summary);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn summary_with_group_couples_sign_and_group_word() {
        let summary = ClusterSummary {
            first_entry: 100,
            n_entries: 50,
            column_group_id: Some(7),
        };
        let buf = write_to_vec(|sink| summary.write(sink));

        let mut cursor = ReadCursor::new(&buf[4..]);
        assert_eq!(cursor.get_u64().unwrap(), 100);
        assert_eq!(cursor.get_i64().unwrap(), -50);
        assert_eq!(cursor.get_u32().unwrap(), 7);

        let (back, _) = ClusterSummary::read(&buf).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn truncated_summary_is_rejected() {
        let summary = ClusterSummary {
            first_entry: 1,
            n_entries: 2,
            column_group_id: None,
        };
        let mut buf = write_to_vec(|sink| summary.write(sink));
        // Shrink the frame to 12 bytes: too small for its two u64 words.
        buf.truncate(12);
        buf[0..4].copy_from_slice(&12i32.to_le_bytes());
        assert!(matches!(
            ClusterSummary::read(&buf),
            Err(SheafError::CorruptFrame(_))
        ));
    }

    #[test]
    fn group_round_trip() {
        let group = ClusterGroup {
            n_clusters: 4,
            page_list_link: EnvelopeLink {
                unzipped_size: 2048,
                locator: Locator::Inline {
                    bytes_on_storage: 512,
                    position: 9000,
                },
            },
        };
        let buf = write_to_vec(|sink| group.write(sink));

        let (back, consumed) = ClusterGroup::read(&buf).unwrap();
        assert_eq!(back, group);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn group_with_url_link_round_trip() {
        let group = ClusterGroup {
            n_clusters: 1,
            page_list_link: EnvelopeLink {
                unzipped_size: 128,
                locator: Locator::Url("root://eos/x".to_string()),
            },
        };
        let buf = write_to_vec(|sink| group.write(sink));
        let (back, _) = ClusterGroup::read(&buf).unwrap();
        assert_eq!(back, group);
    }
}
