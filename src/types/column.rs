//! Column, ColumnInfo and ColumnDescription types for user-facing API.
//!
//! These types are derived from the describe metadata and the variable type
//! chosen when the column was defined.

use super::data_type::{DataType, VariableType};
use super::metadata::ColumnMetadata;

/// A column in a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Data type of the defining variable.
    pub data_type: DataType,
    /// Raw wire type code.
    pub wire_type: u16,
}

impl Column {
    pub fn from_metadata(meta: &ColumnMetadata, var_type: &VariableType) -> Self {
        Self {
            name: meta.name.clone(),
            nullable: meta.nullable,
            data_type: var_type.data_type,
            wire_type: meta.wire_type,
        }
    }
}

/// Shared column information for all rows in a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnInfo {
    /// Column definitions.
    pub columns: Vec<Column>,
}

impl ColumnInfo {
    /// Create new column info from columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column by index.
    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Find column index by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// One entry of a cursor description: name, type, display size, internal
/// size, precision, scale, nullable.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    pub data_type: DataType,
    pub display_size: i32,
    pub internal_size: i32,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub nullable: bool,
}

impl ColumnDescription {
    pub fn new(meta: &ColumnMetadata, var_type: &VariableType) -> Self {
        let internal_size = meta.data_size as i32;
        let is_number = var_type.is_number();
        let display_size = match var_type.data_type {
            DataType::String
            | DataType::NationalCharString
            | DataType::FixedChar
            | DataType::Rowid
            | DataType::Binary => internal_size,
            _ if is_number => {
                if meta.precision > 0 {
                    let mut size = meta.precision as i32 + 1;
                    if meta.scale > 0 {
                        size += meta.scale as i32 + 1;
                    }
                    size
                } else {
                    127
                }
            }
            DataType::DateTime => 23,
            _ => -1,
        };
        Self {
            name: meta.name.clone(),
            data_type: var_type.data_type,
            display_size,
            internal_size,
            precision: is_number.then_some(meta.precision as i32),
            scale: is_number.then_some(meta.scale as i32),
            nullable: meta.nullable,
        }
    }
}
