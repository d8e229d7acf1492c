//! Read-only descriptor view consumed by the serializer.
//!
//! These types are the thin input surface of the codec: the schema tree
//! (fields and their columns) and the cluster metadata (entry ranges and
//! per-column page ranges), addressed by caller-chosen in-memory IDs.
//! Insertion order is declared order; the serializer visits children and
//! columns exactly as they were added.

use crate::locator::Locator;
use crate::schema::{ColumnKind, ColumnSort, FieldStructure};

/// In-memory identifier for fields, columns, and clusters. Physical IDs
/// share the type but live in separate, densely assigned spaces.
pub type DescriptorId = u64;

/// One field of the schema tree.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// In-memory ID, unique among fields.
    pub id: DescriptorId,
    /// In-memory ID of the parent field; the root for top-level fields.
    pub parent_id: DescriptorId,
    /// Version of the field serialization.
    pub field_version: u32,
    /// Version of the field's type.
    pub type_version: u32,
    /// Structural role in the schema tree.
    pub structure: FieldStructure,
    /// Fixed repetition count; zero when the field is not a fixed-size
    /// array.
    pub n_repetitions: u64,
    /// Field name.
    pub field_name: String,
    /// Name of the field's type.
    pub type_name: String,
    /// Free-form description.
    pub description: String,
}

/// One column backing a field.
#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
    /// In-memory ID, unique among columns.
    pub id: DescriptorId,
    /// In-memory ID of the field this column belongs to.
    pub field_id: DescriptorId,
    /// On-disk element type.
    pub kind: ColumnKind,
    /// Declared value ordering.
    pub sort: ColumnSort,
}

/// A contiguous run of column values at one storage location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Number of logical elements in the page.
    pub n_elements: u32,
    /// Where the page bytes live.
    pub locator: Locator,
}

/// The pages of one column within one cluster.
#[derive(Clone, Debug)]
pub struct PageRange {
    /// In-memory ID of the column.
    pub column_id: DescriptorId,
    /// Pages in entry order.
    pub pages: Vec<PageInfo>,
}

/// A horizontal partition of the dataset's rows.
#[derive(Clone, Debug)]
pub struct ClusterDescriptor {
    id: DescriptorId,
    first_entry: u64,
    n_entries: u64,
    page_ranges: Vec<PageRange>,
}

impl ClusterDescriptor {
    /// A cluster covering entries `first_entry..first_entry + n_entries`.
    pub fn new(id: DescriptorId, first_entry: u64, n_entries: u64) -> Self {
        Self {
            id,
            first_entry,
            n_entries,
            page_ranges: Vec::new(),
        }
    }

    /// Adds the page range of one column.
    pub fn with_page_range(mut self, column_id: DescriptorId, pages: Vec<PageInfo>) -> Self {
        self.page_ranges.push(PageRange { column_id, pages });
        self
    }

    /// In-memory ID of the cluster.
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Index of the first entry covered by this cluster.
    pub fn first_entry(&self) -> u64 {
        self.first_entry
    }

    /// Number of entries covered by this cluster.
    pub fn n_entries(&self) -> u64 {
        self.n_entries
    }

    /// Page ranges of the columns present in this cluster.
    pub fn page_ranges(&self) -> &[PageRange] {
        &self.page_ranges
    }
}

/// The full read-only input to the serializer: schema plus clusters.
///
/// A synthetic root field (the "field zero") anchors the schema tree; it
/// is created with the descriptor and carries no data of its own.
#[derive(Clone, Debug)]
pub struct DatasetDescriptor {
    name: String,
    description: String,
    field_zero_id: DescriptorId,
    fields: Vec<FieldDescriptor>,
    columns: Vec<ColumnDescriptor>,
    clusters: Vec<ClusterDescriptor>,
}

impl DatasetDescriptor {
    /// An empty descriptor with the given dataset name and description.
    /// `field_zero_id` is the in-memory ID reserved for the root field.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        field_zero_id: DescriptorId,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            field_zero_id,
            fields: Vec::new(),
            columns: Vec::new(),
            clusters: Vec::new(),
        }
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dataset description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// In-memory ID of the synthetic root field.
    pub fn field_zero_id(&self) -> DescriptorId {
        self.field_zero_id
    }

    /// Adds a field. Its `parent_id` must name the root or an existing
    /// field.
    pub fn add_field(&mut self, field: FieldDescriptor) {
        debug_assert!(
            field.parent_id == self.field_zero_id
                || self.fields.iter().any(|f| f.id == field.parent_id),
            "field {} declared before its parent {}",
            field.id,
            field.parent_id
        );
        self.fields.push(field);
    }

    /// Adds a column of an existing field.
    pub fn add_column(&mut self, column: ColumnDescriptor) {
        self.columns.push(column);
    }

    /// Adds a cluster.
    pub fn add_cluster(&mut self, cluster: ClusterDescriptor) {
        self.clusters.push(cluster);
    }

    /// Children of `parent_id`, in declared order.
    pub fn fields_of(
        &self,
        parent_id: DescriptorId,
    ) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields
            .iter()
            .filter(move |field| field.parent_id == parent_id)
    }

    /// Columns of `field_id`, in declared order.
    pub fn columns_of(
        &self,
        field_id: DescriptorId,
    ) -> impl Iterator<Item = &ColumnDescriptor> + '_ {
        self.columns
            .iter()
            .filter(move |column| column.field_id == field_id)
    }

    /// Total number of fields, the synthetic root included.
    pub fn num_fields(&self) -> usize {
        self.fields.len() + 1
    }

    /// Total number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Total number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Looks up a cluster by its in-memory ID.
    pub fn cluster(&self, id: DescriptorId) -> Option<&ClusterDescriptor> {
        self.clusters.iter().find(|cluster| cluster.id == id)
    }

    /// All clusters, in declared order.
    pub fn clusters(&self) -> &[ClusterDescriptor] {
        &self.clusters
    }
}
