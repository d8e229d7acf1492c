//! Serialization of a dataset descriptor into its metadata envelopes.
//!
//! Four entry points, mirroring the writer's life cycle: the header is
//! serialized once and produces the [`StreamerContext`]; each committed
//! cluster may emit a compact cluster envelope; groups of clusters emit a
//! page-list envelope; the footer seals the dataset. All entry points
//! write through a [`WriteCursor`] and work identically in sizing mode.

use std::collections::VecDeque;

use itertools::Itertools;
use log::trace;
use sheaf_error::{sheaf_err, SheafResult};

use crate::context::StreamerContext;
use crate::descriptor::{ClusterDescriptor, DatasetDescriptor, DescriptorId, PageRange};
use crate::envelope::EnvelopeWriter;
use crate::flags::write_feature_flags;
use crate::frame::FrameWriter;
use crate::record::ClusterSummary;
use crate::schema::{ColumnKind, COLUMN_FLAG_NON_NEGATIVE, FIELD_FLAG_REPETITIVE};
use crate::wire::WriteCursor;

fn wire_id(id: DescriptorId) -> SheafResult<u32> {
    u32::try_from(id).map_err(|_| sheaf_err!(SizeOverflow: "physical id {id}"))
}

fn wire_count(count: usize) -> SheafResult<u32> {
    u32::try_from(count).map_err(|_| sheaf_err!(SizeOverflow: "item count {count}"))
}

fn write_empty_list(sink: &mut WriteCursor) -> SheafResult<usize> {
    FrameWriter::list(sink, 0)?.finish(sink)
}

/// Serializes the header envelope: dataset name and description, the
/// fields list, and the columns list. Returns the [`StreamerContext`]
/// carrying the physical-ID assignment, the header size, and (in write
/// mode) the header CRC32.
pub fn serialize_header(
    desc: &DatasetDescriptor,
    sink: &mut WriteCursor,
) -> SheafResult<StreamerContext> {
    let mut context = StreamerContext::default();

    let envelope = EnvelopeWriter::begin(sink)?;
    write_feature_flags(&[], sink)?;
    sink.put_string(desc.name())?;
    sink.put_string(desc.description())?;

    let frame = FrameWriter::list(sink, wire_count(desc.num_fields())?)?;
    write_fields(desc, &mut context, sink)?;
    frame.finish(sink)?;

    let frame = FrameWriter::list(sink, wire_count(desc.num_columns())?)?;
    write_columns(desc, &mut context, sink)?;
    frame.finish(sink)?;

    // Alias columns are reserved in the format but not populated.
    write_empty_list(sink)?;

    let (size, crc32) = envelope.finish(sink)?;
    context.set_header_size(size);
    if let Some(crc32) = crc32 {
        context.set_header_crc32(crc32);
    }
    trace!(
        "serialized header envelope: {size} bytes, {} fields, {} columns",
        context.num_fields(),
        context.num_columns()
    );
    Ok(context)
}

/// Walks the schema tree breadth-first from the root. Every field is
/// assigned its physical ID when popped from the queue; its children are
/// then emitted in declared order, each as a record frame carrying the
/// parent's physical ID. The root consumes physical ID 0 without being
/// emitted itself.
fn write_fields(
    desc: &DatasetDescriptor,
    context: &mut StreamerContext,
    sink: &mut WriteCursor,
) -> SheafResult<()> {
    let mut queue = VecDeque::from([desc.field_zero_id()]);
    while let Some(parent_id) = queue.pop_front() {
        let phys_parent_id = context.map_field_id(parent_id);
        for field in desc.fields_of(parent_id) {
            let frame = FrameWriter::record(sink)?;
            sink.put_u32(field.field_version)?;
            sink.put_u32(field.type_version)?;
            sink.put_u32(wire_id(phys_parent_id)?)?;
            sink.put_u16(field.structure.to_wire())?;
            if field.n_repetitions > 0 {
                sink.put_u16(FIELD_FLAG_REPETITIVE)?;
                sink.put_u64(field.n_repetitions)?;
            } else {
                sink.put_u16(0)?;
            }
            sink.put_string(&field.field_name)?;
            sink.put_string(&field.type_name)?;
            // Type alias, reserved.
            sink.put_string("")?;
            sink.put_string(&field.description)?;
            frame.finish(sink)?;

            queue.push_back(field.id);
        }
    }
    Ok(())
}

/// Mirrors the field walk: for every field in breadth-first order, the
/// root included, emits that field's columns in declared order. Each
/// column takes the next physical column ID as it is emitted.
fn write_columns(
    desc: &DatasetDescriptor,
    context: &mut StreamerContext,
    sink: &mut WriteCursor,
) -> SheafResult<()> {
    let mut queue = VecDeque::from([desc.field_zero_id()]);
    while let Some(parent_id) = queue.pop_front() {
        for column in desc.columns_of(parent_id) {
            let field_phys_id = context.phys_field_id(column.field_id).ok_or_else(|| {
                sheaf_err!("column {} refers to unknown field {}", column.id, column.field_id)
            })?;

            let frame = FrameWriter::record(sink)?;
            sink.put_u16(column.kind.to_wire())?;
            sink.put_u16(column.kind.bits_on_storage())?;
            sink.put_u32(wire_id(field_phys_id)?)?;
            let mut flags = column.sort.flags();
            if column.kind == ColumnKind::Index {
                flags |= COLUMN_FLAG_NON_NEGATIVE;
            }
            sink.put_u32(flags)?;
            frame.finish(sink)?;

            context.map_column_id(column.id);
        }
        for field in desc.fields_of(parent_id) {
            queue.push_back(field.id);
        }
    }
    Ok(())
}

/// The cluster's page ranges ordered by physical column ID.
fn ranges_by_phys_column<'a>(
    cluster: &'a ClusterDescriptor,
    context: &StreamerContext,
) -> SheafResult<Vec<(DescriptorId, &'a PageRange)>> {
    let pairs = cluster
        .page_ranges()
        .iter()
        .map(|range| {
            let phys_id = context.phys_column_id(range.column_id).ok_or_else(|| {
                sheaf_err!(
                    "cluster {} refers to unknown column {}",
                    cluster.id(),
                    range.column_id
                )
            })?;
            Ok((phys_id, range))
        })
        .collect::<SheafResult<Vec<_>>>()?;
    Ok(pairs
        .into_iter()
        .sorted_by_key(|(phys_id, _)| *phys_id)
        .collect())
}

fn write_page_range(range: &PageRange, sink: &mut WriteCursor) -> SheafResult<()> {
    for page in &range.pages {
        sink.put_u32(page.n_elements)?;
        page.locator.write(sink)?;
    }
    Ok(())
}

/// Serializes the compact per-cluster envelope: one inner list per column
/// present in the cluster, each holding the column's pages. The list
/// frames of this envelope carry no item counts. Returns the envelope
/// size.
pub fn serialize_cluster(
    cluster: &ClusterDescriptor,
    context: &StreamerContext,
    sink: &mut WriteCursor,
) -> SheafResult<usize> {
    let start = sink.pos();
    let envelope = EnvelopeWriter::begin(sink)?;

    let outer = FrameWriter::list(sink, 0)?;
    for (_, range) in ranges_by_phys_column(cluster, context)? {
        let inner = FrameWriter::list(sink, 0)?;
        write_page_range(range, sink)?;
        inner.finish(sink)?;
    }
    outer.finish(sink)?;

    let (size, _) = envelope.finish(sink)?;
    trace!(
        "serialized cluster envelope for cluster {}: {size} bytes",
        cluster.id()
    );
    Ok(sink.pos() - start)
}

/// Serializes a page-list envelope covering the clusters of one group,
/// in the given physical-ID order: per cluster a list of columns, per
/// column a list of `(element count, locator)` pages. Returns the
/// envelope size.
pub fn serialize_page_list(
    desc: &DatasetDescriptor,
    phys_cluster_ids: &[DescriptorId],
    context: &StreamerContext,
    sink: &mut WriteCursor,
) -> SheafResult<usize> {
    let start = sink.pos();
    let envelope = EnvelopeWriter::begin(sink)?;

    let top = FrameWriter::list(sink, wire_count(phys_cluster_ids.len())?)?;
    for &phys_cluster_id in phys_cluster_ids {
        let mem_id = context
            .mem_cluster_id(phys_cluster_id)
            .ok_or_else(|| sheaf_err!("cluster with physical id {phys_cluster_id} was never mapped"))?;
        let cluster = desc
            .cluster(mem_id)
            .ok_or_else(|| sheaf_err!("unknown cluster {mem_id}"))?;

        let ranges = ranges_by_phys_column(cluster, context)?;
        let outer = FrameWriter::list(sink, wire_count(ranges.len())?)?;
        for (_, range) in ranges {
            let inner = FrameWriter::list(sink, wire_count(range.pages.len())?)?;
            write_page_range(range, sink)?;
            inner.finish(sink)?;
        }
        outer.finish(sink)?;
    }
    top.finish(sink)?;

    let (size, _) = envelope.finish(sink)?;
    trace!(
        "serialized page-list envelope: {size} bytes, {} clusters",
        phys_cluster_ids.len()
    );
    Ok(sink.pos() - start)
}

/// Serializes the footer envelope: the header CRC32, the cluster
/// summaries in physical order, and the registered cluster groups. The
/// extension-header, column-group, and meta-data lists are reserved and
/// empty. Returns the envelope size.
pub fn serialize_footer(
    desc: &DatasetDescriptor,
    context: &StreamerContext,
    sink: &mut WriteCursor,
) -> SheafResult<usize> {
    let start = sink.pos();
    let envelope = EnvelopeWriter::begin(sink)?;

    write_feature_flags(&[], sink)?;
    sink.put_u32(context.header_crc32())?;

    // Extension headers, reserved.
    write_empty_list(sink)?;
    // Column groups, reserved.
    write_empty_list(sink)?;

    let frame = FrameWriter::list(sink, wire_count(desc.num_clusters())?)?;
    for phys_id in 0..desc.num_clusters() as DescriptorId {
        let mem_id = context
            .mem_cluster_id(phys_id)
            .ok_or_else(|| sheaf_err!("cluster with physical id {phys_id} was never mapped"))?;
        let cluster = desc
            .cluster(mem_id)
            .ok_or_else(|| sheaf_err!("unknown cluster {mem_id}"))?;
        ClusterSummary {
            first_entry: cluster.first_entry(),
            n_entries: cluster.n_entries(),
            column_group_id: None,
        }
        .write(sink)?;
    }
    frame.finish(sink)?;

    let frame = FrameWriter::list(sink, wire_count(context.cluster_groups().len())?)?;
    for group in context.cluster_groups() {
        group.write(sink)?;
    }
    frame.finish(sink)?;

    // Meta-data, reserved.
    write_empty_list(sink)?;

    let (size, _) = envelope.finish(sink)?;
    trace!(
        "serialized footer envelope: {size} bytes, {} clusters, {} groups",
        desc.num_clusters(),
        context.cluster_groups().len()
    );
    Ok(sink.pos() - start)
}
