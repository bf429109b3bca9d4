//! Column metadata reported by the native layer.
//!
//! Type tags follow the server's `MYSQL_TYPE_*` numbering so a wire-level
//! collaborator can hand them through unchanged. Tags this crate does not
//! name are preserved as [`FieldType::Unknown`].

use serde::{Deserialize, Serialize};

/// Server-reported column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Decimal,
    Tiny,
    Short,
    Long,
    Float,
    Double,
    Null,
    Timestamp,
    LongLong,
    Int24,
    Date,
    Time,
    DateTime,
    Year,
    VarChar,
    Bit,
    Json,
    NewDecimal,
    Enum,
    Set,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    VarString,
    String,
    Geometry,
    /// A tag not listed above, kept verbatim
    Unknown(u8),
}

impl FieldType {
    /// Parse a type tag.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => FieldType::Decimal,
            0x01 => FieldType::Tiny,
            0x02 => FieldType::Short,
            0x03 => FieldType::Long,
            0x04 => FieldType::Float,
            0x05 => FieldType::Double,
            0x06 => FieldType::Null,
            0x07 => FieldType::Timestamp,
            0x08 => FieldType::LongLong,
            0x09 => FieldType::Int24,
            0x0A => FieldType::Date,
            0x0B => FieldType::Time,
            0x0C => FieldType::DateTime,
            0x0D => FieldType::Year,
            0x0F => FieldType::VarChar,
            0x10 => FieldType::Bit,
            0xF5 => FieldType::Json,
            0xF6 => FieldType::NewDecimal,
            0xF7 => FieldType::Enum,
            0xF8 => FieldType::Set,
            0xF9 => FieldType::TinyBlob,
            0xFA => FieldType::MediumBlob,
            0xFB => FieldType::LongBlob,
            0xFC => FieldType::Blob,
            0xFD => FieldType::VarString,
            0xFE => FieldType::String,
            0xFF => FieldType::Geometry,
            other => FieldType::Unknown(other),
        }
    }

    /// The numeric tag.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            FieldType::Decimal => 0x00,
            FieldType::Tiny => 0x01,
            FieldType::Short => 0x02,
            FieldType::Long => 0x03,
            FieldType::Float => 0x04,
            FieldType::Double => 0x05,
            FieldType::Null => 0x06,
            FieldType::Timestamp => 0x07,
            FieldType::LongLong => 0x08,
            FieldType::Int24 => 0x09,
            FieldType::Date => 0x0A,
            FieldType::Time => 0x0B,
            FieldType::DateTime => 0x0C,
            FieldType::Year => 0x0D,
            FieldType::VarChar => 0x0F,
            FieldType::Bit => 0x10,
            FieldType::Json => 0xF5,
            FieldType::NewDecimal => 0xF6,
            FieldType::Enum => 0xF7,
            FieldType::Set => 0xF8,
            FieldType::TinyBlob => 0xF9,
            FieldType::MediumBlob => 0xFA,
            FieldType::LongBlob => 0xFB,
            FieldType::Blob => 0xFC,
            FieldType::VarString => 0xFD,
            FieldType::String => 0xFE,
            FieldType::Geometry => 0xFF,
            FieldType::Unknown(code) => code,
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldType::Decimal
                | FieldType::NewDecimal
                | FieldType::Tiny
                | FieldType::Short
                | FieldType::Long
                | FieldType::Int24
                | FieldType::LongLong
                | FieldType::Float
                | FieldType::Double
                | FieldType::Year
        )
    }

    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            FieldType::TinyBlob
                | FieldType::MediumBlob
                | FieldType::LongBlob
                | FieldType::Blob
                | FieldType::Bit
                | FieldType::Geometry
        )
    }

    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            FieldType::Date | FieldType::Time | FieldType::DateTime | FieldType::Timestamp
        )
    }
}

/// One column of a result, as described by the native field primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub field_type: FieldType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Column descriptors of one result, in server-reported order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    columns: Vec<ColumnDescriptor>,
}

impl FieldMetadata {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    /// Position of the first column called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDescriptor> {
        self.columns.iter()
    }
}

impl<'a> IntoIterator for &'a FieldMetadata {
    type Item = &'a ColumnDescriptor;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
