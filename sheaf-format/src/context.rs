//! The streamer context: writer-side state between serialization passes.
//!
//! Header serialization assigns every field and column a dense *physical*
//! ID in traversal order; clusters are mapped by the caller as it commits
//! them. The context carries those assignments, the header's size and
//! CRC32, and the registered cluster groups into the page-list and footer
//! passes. Reading needs none of this: identifiers flow in physical order
//! from the wire.

use std::collections::HashMap;

use crate::descriptor::DescriptorId;
use crate::locator::EnvelopeLink;
use crate::record::ClusterGroup;

/// One bidirectional mem-to-physical ID space: a hash map forward and a
/// dense vector backward, both O(1).
#[derive(Debug, Default)]
struct IdMap {
    mem_to_phys: HashMap<DescriptorId, DescriptorId>,
    phys_to_mem: Vec<DescriptorId>,
}

impl IdMap {
    fn map(&mut self, mem_id: DescriptorId) -> DescriptorId {
        debug_assert!(
            !self.mem_to_phys.contains_key(&mem_id),
            "id {mem_id} mapped twice"
        );
        let phys_id = self.phys_to_mem.len() as DescriptorId;
        self.mem_to_phys.insert(mem_id, phys_id);
        self.phys_to_mem.push(mem_id);
        phys_id
    }

    fn phys(&self, mem_id: DescriptorId) -> Option<DescriptorId> {
        self.mem_to_phys.get(&mem_id).copied()
    }

    fn mem(&self, phys_id: DescriptorId) -> Option<DescriptorId> {
        self.phys_to_mem.get(phys_id as usize).copied()
    }

    fn len(&self) -> usize {
        self.phys_to_mem.len()
    }
}

/// State built during header serialization and consumed by the cluster,
/// page-list, and footer passes.
///
/// Only [`serialize_header`] produces a context, which is how the writer
/// ordering is enforced: the passes that need physical IDs cannot be
/// called before the header has assigned them.
///
/// [`serialize_header`]: crate::serialize_header
#[derive(Debug, Default)]
pub struct StreamerContext {
    header_size: usize,
    header_crc32: u32,
    cluster_groups: Vec<ClusterGroup>,
    fields: IdMap,
    columns: IdMap,
    clusters: IdMap,
}

impl StreamerContext {
    /// Byte size of the header envelope, trailing CRC32 included.
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// CRC32 of the header envelope. Zero until a write-mode header pass
    /// has run; a sizing pass cannot produce it.
    pub fn header_crc32(&self) -> u32 {
        self.header_crc32
    }

    pub(crate) fn set_header_size(&mut self, size: usize) {
        self.header_size = size;
    }

    pub(crate) fn set_header_crc32(&mut self, crc32: u32) {
        self.header_crc32 = crc32;
    }

    /// Registers a cluster group for the footer, pointing at an already
    /// written page-list envelope.
    pub fn add_cluster_group(&mut self, n_clusters: u32, page_list_link: EnvelopeLink) {
        self.cluster_groups.push(ClusterGroup {
            n_clusters,
            page_list_link,
        });
    }

    /// Cluster groups registered so far, in registration order.
    pub fn cluster_groups(&self) -> &[ClusterGroup] {
        &self.cluster_groups
    }

    pub(crate) fn map_field_id(&mut self, mem_id: DescriptorId) -> DescriptorId {
        self.fields.map(mem_id)
    }

    pub(crate) fn map_column_id(&mut self, mem_id: DescriptorId) -> DescriptorId {
        self.columns.map(mem_id)
    }

    /// Assigns the next dense physical cluster ID to `mem_id`. Called by
    /// the writer in the order it commits clusters.
    pub fn map_cluster_id(&mut self, mem_id: DescriptorId) -> DescriptorId {
        self.clusters.map(mem_id)
    }

    /// Physical ID of a field, if the header pass mapped it.
    pub fn phys_field_id(&self, mem_id: DescriptorId) -> Option<DescriptorId> {
        self.fields.phys(mem_id)
    }

    /// Physical ID of a column, if the header pass mapped it.
    pub fn phys_column_id(&self, mem_id: DescriptorId) -> Option<DescriptorId> {
        self.columns.phys(mem_id)
    }

    /// Physical ID of a cluster, if the writer mapped it.
    pub fn phys_cluster_id(&self, mem_id: DescriptorId) -> Option<DescriptorId> {
        self.clusters.phys(mem_id)
    }

    /// In-memory ID of the field with the given physical ID.
    pub fn mem_field_id(&self, phys_id: DescriptorId) -> Option<DescriptorId> {
        self.fields.mem(phys_id)
    }

    /// In-memory ID of the column with the given physical ID.
    pub fn mem_column_id(&self, phys_id: DescriptorId) -> Option<DescriptorId> {
        self.columns.mem(phys_id)
    }

    /// In-memory ID of the cluster with the given physical ID.
    pub fn mem_cluster_id(&self, phys_id: DescriptorId) -> Option<DescriptorId> {
        self.clusters.mem(phys_id)
    }

    /// Number of fields mapped so far, the root included.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Number of columns mapped so far.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of clusters mapped so far.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }
}

#[cfg(test)]
mod test {
    use crate::locator::Locator;

    use super::*;

    #[test]
    fn physical_ids_are_dense_per_space() {
        let mut context = StreamerContext::default();
        assert_eq!(context.map_field_id(100), 0);
        assert_eq!(context.map_field_id(50), 1);
        assert_eq!(context.map_column_id(100), 0);
        assert_eq!(context.map_cluster_id(9), 0);

        assert_eq!(context.phys_field_id(50), Some(1));
        assert_eq!(context.phys_column_id(100), Some(0));
        assert_eq!(context.mem_field_id(0), Some(100));
        assert_eq!(context.mem_cluster_id(0), Some(9));
        assert_eq!(context.phys_field_id(7), None);
        assert_eq!(context.mem_column_id(1), None);
    }

    #[test]
    fn cluster_groups_keep_registration_order() {
        let mut context = StreamerContext::default();
        for position in [10u64, 20] {
            context.add_cluster_group(
                2,
                EnvelopeLink {
                    unzipped_size: 100,
                    locator: Locator::Inline {
                        bytes_on_storage: 80,
                        position,
                    },
                },
            );
        }
        let positions: Vec<_> = context
            .cluster_groups()
            .iter()
            .map(|group| match group.page_list_link.locator {
                Locator::Inline { position, .. } => position,
                Locator::Url(_) => unreachable!(),
            })
            .collect();
        assert_eq!(positions, vec![10, 20]);
    }
}
