//! Variable types and the type registry.
//!
//! Every variable is described by one of a fixed set of [`VariableType`]
//! entries. The registry maps host data types, wire types, and runtime
//! values onto those entries.

use std::fmt;

use super::value::OracleValue;
use crate::error::{Error, Result};
use crate::native::constants::*;

/// Data type families a variable can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    NationalCharString,
    FixedChar,
    Rowid,
    Binary,
    LongString,
    LongBinary,
    /// NUMBER read back as a float.
    Number,
    /// BINARY_DOUBLE.
    NativeFloat,
    Integer,
    /// NUMBER read back as an integer of arbitrary size.
    LongInteger,
    /// NUMBER read back as decimal text.
    Decimal,
    Boolean,
    DateTime,
    Timestamp,
    Clob,
    Nclob,
    Blob,
    Bfile,
    Cursor,
}

/// Immutable description of a variable type.
#[derive(Debug, PartialEq, Eq)]
pub struct VariableType {
    pub data_type: DataType,
    pub name: &'static str,
    pub wire_type: u16,
    pub charset_form: u8,
    /// Default element length; the fixed stride for fixed-length types.
    pub element_length: u32,
    pub is_variable_length: bool,
    pub can_be_copied: bool,
    pub can_be_in_array: bool,
}

impl VariableType {
    pub fn is_character_data(&self) -> bool {
        matches!(
            self.data_type,
            DataType::String
                | DataType::NationalCharString
                | DataType::FixedChar
                | DataType::Rowid
                | DataType::LongString
        )
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self.data_type,
            DataType::Number
                | DataType::Integer
                | DataType::LongInteger
                | DataType::Decimal
                | DataType::Boolean
                | DataType::NativeFloat
        )
    }

    /// Types whose elements hold a native descriptor.
    pub fn holds_handle(&self) -> bool {
        matches!(
            self.data_type,
            DataType::Clob | DataType::Nclob | DataType::Blob | DataType::Bfile | DataType::Cursor
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! variable_type {
    ($ident:ident, $dt:ident, $name:literal, $wire:expr, $form:expr, $len:expr, var = $var:literal, copy = $copy:literal, array = $array:literal) => {
        static $ident: VariableType = VariableType {
            data_type: DataType::$dt,
            name: $name,
            wire_type: $wire,
            charset_form: $form,
            element_length: $len,
            is_variable_length: $var,
            can_be_copied: $copy,
            can_be_in_array: $array,
        };
    };
}

variable_type!(STRING, String, "STRING", SQLT_CHR, SQLCS_IMPLICIT, MAX_STRING_CHARS, var = true, copy = true, array = true);
variable_type!(NCHAR_STRING, NationalCharString, "NCHAR", SQLT_CHR, SQLCS_NCHAR, MAX_STRING_CHARS, var = true, copy = true, array = true);
variable_type!(FIXED_CHAR, FixedChar, "FIXED_CHAR", SQLT_AFC, SQLCS_IMPLICIT, 2000, var = true, copy = true, array = true);
variable_type!(ROWID, Rowid, "ROWID", SQLT_CHR, SQLCS_IMPLICIT, 18, var = true, copy = true, array = true);
variable_type!(BINARY, Binary, "BINARY", SQLT_BIN, SQLCS_IMPLICIT, MAX_BINARY_BYTES, var = true, copy = true, array = true);
variable_type!(LONG_STRING, LongString, "LONG_STRING", SQLT_LVC, SQLCS_IMPLICIT, LONG_ELEMENT_LENGTH, var = true, copy = true, array = false);
variable_type!(LONG_BINARY, LongBinary, "LONG_BINARY", SQLT_LVB, SQLCS_IMPLICIT, LONG_ELEMENT_LENGTH, var = true, copy = true, array = false);
variable_type!(NUMBER, Number, "NUMBER", SQLT_VNU, SQLCS_IMPLICIT, VARNUM_SIZE, var = false, copy = true, array = true);
variable_type!(NATIVE_FLOAT, NativeFloat, "NATIVE_FLOAT", SQLT_BDOUBLE, SQLCS_IMPLICIT, 8, var = false, copy = true, array = true);
variable_type!(INTEGER, Integer, "INTEGER", SQLT_VNU, SQLCS_IMPLICIT, VARNUM_SIZE, var = false, copy = true, array = true);
variable_type!(LONG_INTEGER, LongInteger, "LONG_INTEGER", SQLT_VNU, SQLCS_IMPLICIT, VARNUM_SIZE, var = false, copy = true, array = true);
variable_type!(DECIMAL, Decimal, "DECIMAL", SQLT_VNU, SQLCS_IMPLICIT, VARNUM_SIZE, var = false, copy = true, array = true);
variable_type!(BOOLEAN, Boolean, "BOOLEAN", SQLT_VNU, SQLCS_IMPLICIT, VARNUM_SIZE, var = false, copy = true, array = true);
variable_type!(DATETIME, DateTime, "DATETIME", SQLT_DAT, SQLCS_IMPLICIT, DATE_SIZE, var = false, copy = true, array = true);
variable_type!(TIMESTAMP, Timestamp, "TIMESTAMP", SQLT_TIMESTAMP, SQLCS_IMPLICIT, TIMESTAMP_SIZE, var = false, copy = true, array = true);
variable_type!(CLOB, Clob, "CLOB", SQLT_CLOB, SQLCS_IMPLICIT, HANDLE_SIZE, var = false, copy = false, array = false);
variable_type!(NCLOB, Nclob, "NCLOB", SQLT_CLOB, SQLCS_NCHAR, HANDLE_SIZE, var = false, copy = false, array = false);
variable_type!(BLOB, Blob, "BLOB", SQLT_BLOB, SQLCS_IMPLICIT, HANDLE_SIZE, var = false, copy = false, array = false);
variable_type!(BFILE, Bfile, "BFILE", SQLT_BFILE, SQLCS_IMPLICIT, HANDLE_SIZE, var = false, copy = false, array = false);
variable_type!(CURSOR, Cursor, "CURSOR", SQLT_RSET, SQLCS_IMPLICIT, HANDLE_SIZE, var = false, copy = false, array = false);

impl DataType {
    /// The registry entry for this data type.
    pub fn variable_type(self) -> &'static VariableType {
        match self {
            DataType::String => &STRING,
            DataType::NationalCharString => &NCHAR_STRING,
            DataType::FixedChar => &FIXED_CHAR,
            DataType::Rowid => &ROWID,
            DataType::Binary => &BINARY,
            DataType::LongString => &LONG_STRING,
            DataType::LongBinary => &LONG_BINARY,
            DataType::Number => &NUMBER,
            DataType::NativeFloat => &NATIVE_FLOAT,
            DataType::Integer => &INTEGER,
            DataType::LongInteger => &LONG_INTEGER,
            DataType::Decimal => &DECIMAL,
            DataType::Boolean => &BOOLEAN,
            DataType::DateTime => &DATETIME,
            DataType::Timestamp => &TIMESTAMP,
            DataType::Clob => &CLOB,
            DataType::Nclob => &NCLOB,
            DataType::Blob => &BLOB,
            DataType::Bfile => &BFILE,
            DataType::Cursor => &CURSOR,
        }
    }
}

/// Resolve a declared data type, honouring numbers-as-strings mode.
pub fn resolve_by_host_type(
    data_type: DataType,
    numbers_as_strings: bool,
) -> Result<&'static VariableType> {
    let resolved = match data_type {
        DataType::Number if numbers_as_strings => DataType::Decimal,
        other => other,
    };
    Ok(resolved.variable_type())
}

/// Resolve the variable type used to define a column of the given wire type.
pub fn resolve_by_wire_type(wire_type: u16, charset_form: u8) -> Result<&'static VariableType> {
    let national = charset_form == SQLCS_NCHAR;
    let data_type = match wire_type {
        SQLT_CHR if national => DataType::NationalCharString,
        SQLT_CHR => DataType::String,
        SQLT_AFC if national => DataType::NationalCharString,
        SQLT_AFC => DataType::FixedChar,
        SQLT_RDD => DataType::Rowid,
        SQLT_BIN => DataType::Binary,
        SQLT_LNG | SQLT_LVC => DataType::LongString,
        SQLT_LBI | SQLT_LVB => DataType::LongBinary,
        SQLT_NUM | SQLT_VNU => DataType::Number,
        SQLT_INT => DataType::Integer,
        SQLT_FLT | SQLT_BFLOAT | SQLT_BDOUBLE | SQLT_IBFLOAT | SQLT_IBDOUBLE => {
            DataType::NativeFloat
        }
        SQLT_DAT | SQLT_ODT => DataType::DateTime,
        SQLT_TIMESTAMP | SQLT_TIMESTAMP_TZ | SQLT_TIMESTAMP_LTZ => DataType::Timestamp,
        SQLT_CLOB if national => DataType::Nclob,
        SQLT_CLOB => DataType::Clob,
        SQLT_BLOB => DataType::Blob,
        SQLT_BFILE => DataType::Bfile,
        SQLT_RSET => DataType::Cursor,
        SQLT_NTY => return Err(Error::not_supported("object types are not supported")),
        other => {
            return Err(Error::not_supported(format!(
                "unhandled data type {}",
                other
            )))
        }
    };
    Ok(data_type.variable_type())
}

/// Resolve the variable type for a runtime value.
///
/// Arrays resolve by their first non-null element and default to a string
/// type when empty or all null.
pub fn resolve_by_value(value: &OracleValue) -> Result<&'static VariableType> {
    let data_type = match value {
        OracleValue::Null | OracleValue::String(_) => DataType::String,
        OracleValue::Raw(_) => DataType::Binary,
        OracleValue::Integer(_) => DataType::Integer,
        OracleValue::Float(_) => DataType::Number,
        OracleValue::Number(_) => DataType::Decimal,
        OracleValue::Boolean(_) => DataType::Boolean,
        OracleValue::Date(_) => DataType::DateTime,
        OracleValue::Timestamp(_) => DataType::Timestamp,
        OracleValue::Array(items) => {
            return match items.iter().find(|v| !v.is_null()) {
                Some(OracleValue::Array(_)) => {
                    Err(Error::not_supported("arrays of arrays are not supported"))
                }
                Some(first) => resolve_by_value(first),
                None => Ok(&STRING),
            };
        }
        OracleValue::Lob(_) | OracleValue::Cursor(_) => {
            return Err(Error::not_supported(format!(
                "variable type not supported for {} values; bind the owning variable instead",
                value.type_name()
            )))
        }
    };
    Ok(data_type.variable_type())
}
