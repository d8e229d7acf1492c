//! Stable on-disk encodings for schema enumerations.
//!
//! The wire values are fixed by the storage format and mapped explicitly,
//! so rearranging the Rust enums can never change the on-disk numbers.

use sheaf_error::{sheaf_bail, SheafResult};

/// Field flag: a repetition count follows the flag word.
pub const FIELD_FLAG_REPETITIVE: u16 = 0x01;
/// Field flag reserved for alias fields; never emitted today.
pub const FIELD_FLAG_ALIAS: u16 = 0x02;

/// Column flag: values are sorted ascending.
pub const COLUMN_FLAG_SORT_ASC: u32 = 0x01;
/// Column flag: values are sorted descending.
pub const COLUMN_FLAG_SORT_DESC: u32 = 0x02;
/// Column flag: values are non-negative.
pub const COLUMN_FLAG_NON_NEGATIVE: u32 = 0x04;

/// The structural role of a field in the schema tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldStructure {
    /// A plain value backed by columns.
    Leaf,
    /// A variable-length collection of its child field.
    Collection,
    /// A product of its child fields.
    Record,
    /// A sum of its child fields.
    Variant,
    /// A reference to another field.
    Reference,
}

impl FieldStructure {
    /// The on-disk value.
    pub fn to_wire(self) -> u16 {
        match self {
            FieldStructure::Leaf => 0x00,
            FieldStructure::Collection => 0x01,
            FieldStructure::Record => 0x02,
            FieldStructure::Variant => 0x03,
            FieldStructure::Reference => 0x04,
        }
    }

    /// Decodes an on-disk value.
    pub fn from_wire(value: u16) -> SheafResult<Self> {
        Ok(match value {
            0x00 => FieldStructure::Leaf,
            0x01 => FieldStructure::Collection,
            0x02 => FieldStructure::Record,
            0x03 => FieldStructure::Variant,
            0x04 => FieldStructure::Reference,
            _ => sheaf_bail!(UnknownEnum: "field structure {value:#06x}"),
        })
    }
}

/// The on-disk type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Offsets into a sibling column.
    Index,
    /// A (tag, index) dispatch pair for variant fields.
    Switch,
    /// A single bit.
    Bit,
    /// IEEE 754 double precision.
    Real64,
    /// IEEE 754 single precision.
    Real32,
    /// IEEE 754 half precision.
    Real16,
    /// 64-bit integer.
    Int64,
    /// 32-bit integer.
    Int32,
    /// 16-bit integer.
    Int16,
    /// A raw byte.
    Byte,
}

impl ColumnKind {
    /// The on-disk value.
    pub fn to_wire(self) -> u16 {
        match self {
            ColumnKind::Index => 0x02,
            ColumnKind::Switch => 0x03,
            ColumnKind::Bit => 0x06,
            ColumnKind::Real64 => 0x07,
            ColumnKind::Real32 => 0x08,
            ColumnKind::Real16 => 0x09,
            ColumnKind::Int64 => 0x0A,
            ColumnKind::Int32 => 0x0B,
            ColumnKind::Int16 => 0x0C,
            ColumnKind::Byte => 0x0D,
        }
    }

    /// Decodes an on-disk value.
    pub fn from_wire(value: u16) -> SheafResult<Self> {
        Ok(match value {
            0x02 => ColumnKind::Index,
            0x03 => ColumnKind::Switch,
            0x06 => ColumnKind::Bit,
            0x07 => ColumnKind::Real64,
            0x08 => ColumnKind::Real32,
            0x09 => ColumnKind::Real16,
            0x0A => ColumnKind::Int64,
            0x0B => ColumnKind::Int32,
            0x0C => ColumnKind::Int16,
            0x0D => ColumnKind::Byte,
            _ => sheaf_bail!(UnknownEnum: "column type {value:#06x}"),
        })
    }

    /// Bits each element of this column occupies on storage.
    pub fn bits_on_storage(self) -> u16 {
        match self {
            ColumnKind::Bit => 1,
            ColumnKind::Byte => 8,
            ColumnKind::Real16 | ColumnKind::Int16 => 16,
            ColumnKind::Index | ColumnKind::Real32 | ColumnKind::Int32 => 32,
            ColumnKind::Switch | ColumnKind::Real64 | ColumnKind::Int64 => 64,
        }
    }
}

/// Declared ordering of a column's values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnSort {
    /// No ordering.
    #[default]
    Unsorted,
    /// Sorted ascending.
    Ascending,
    /// Sorted descending.
    Descending,
}

impl ColumnSort {
    pub(crate) fn flags(self) -> u32 {
        match self {
            ColumnSort::Unsorted => 0,
            ColumnSort::Ascending => COLUMN_FLAG_SORT_ASC,
            ColumnSort::Descending => COLUMN_FLAG_SORT_DESC,
        }
    }
}

#[cfg(test)]
mod test {
    use sheaf_error::SheafError;

    use super::*;

    const FIELD_STRUCTURES: [(FieldStructure, u16); 5] = [
        (FieldStructure::Leaf, 0x00),
        (FieldStructure::Collection, 0x01),
        (FieldStructure::Record, 0x02),
        (FieldStructure::Variant, 0x03),
        (FieldStructure::Reference, 0x04),
    ];

    const COLUMN_KINDS: [(ColumnKind, u16); 10] = [
        (ColumnKind::Index, 0x02),
        (ColumnKind::Switch, 0x03),
        (ColumnKind::Bit, 0x06),
        (ColumnKind::Real64, 0x07),
        (ColumnKind::Real32, 0x08),
        (ColumnKind::Real16, 0x09),
        (ColumnKind::Int64, 0x0A),
        (ColumnKind::Int32, 0x0B),
        (ColumnKind::Int16, 0x0C),
        (ColumnKind::Byte, 0x0D),
    ];

    #[test]
    fn field_structure_wire_values_are_stable() {
        for (structure, wire) in FIELD_STRUCTURES {
            assert_eq!(structure.to_wire(), wire);
            assert_eq!(FieldStructure::from_wire(wire).unwrap(), structure);
        }
    }

    #[test]
    fn column_kind_wire_values_are_stable() {
        for (kind, wire) in COLUMN_KINDS {
            assert_eq!(kind.to_wire(), wire);
            assert_eq!(ColumnKind::from_wire(wire).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_wire_values_are_rejected() {
        assert!(matches!(
            FieldStructure::from_wire(0x05),
            Err(SheafError::UnknownEnum(_))
        ));
        for gap in [0x00u16, 0x01, 0x04, 0x05, 0x0E, 0xFF] {
            assert!(
                matches!(ColumnKind::from_wire(gap), Err(SheafError::UnknownEnum(_))),
                "column type {gap:#04x} should be unknown"
            );
        }
    }

    #[test]
    fn sort_flags() {
        assert_eq!(ColumnSort::Unsorted.flags(), 0);
        assert_eq!(ColumnSort::Ascending.flags(), COLUMN_FLAG_SORT_ASC);
        assert_eq!(ColumnSort::Descending.flags(), COLUMN_FLAG_SORT_DESC);
    }

    #[test]
    fn storage_widths() {
        assert_eq!(ColumnKind::Bit.bits_on_storage(), 1);
        assert_eq!(ColumnKind::Byte.bits_on_storage(), 8);
        assert_eq!(ColumnKind::Int32.bits_on_storage(), 32);
        assert_eq!(ColumnKind::Index.bits_on_storage(), 32);
        assert_eq!(ColumnKind::Switch.bits_on_storage(), 64);
        assert_eq!(ColumnKind::Real16.bits_on_storage(), 16);
    }
}
