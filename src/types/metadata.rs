//! Column metadata reported by the native describe call.
//!
//! This struct preserves the raw describe data.
//! For user-facing API, use `Column` or `ColumnDescription`.

use crate::native::constants::SQLCS_IMPLICIT;

/// Describe information for one select-list column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Wire data type code.
    pub wire_type: u16,
    /// Character set form.
    pub charset_form: u8,
    /// Server-declared size in bytes (0 for long types).
    pub data_size: u32,
    /// Numeric precision.
    pub precision: i16,
    /// Numeric scale.
    pub scale: i8,
    /// Whether NULL values are allowed.
    pub nullable: bool,
}

impl ColumnMetadata {
    /// Create new column metadata with minimal info.
    pub fn new(name: impl Into<String>, wire_type: u16) -> Self {
        Self {
            name: name.into(),
            wire_type,
            charset_form: SQLCS_IMPLICIT,
            data_size: 0,
            precision: 0,
            scale: 0,
            nullable: true,
        }
    }

    pub fn with_data_size(mut self, data_size: u32) -> Self {
        self.data_size = data_size;
        self
    }

    pub fn with_precision(mut self, precision: i16, scale: i8) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn with_charset_form(mut self, charset_form: u8) -> Self {
        self.charset_form = charset_form;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}
