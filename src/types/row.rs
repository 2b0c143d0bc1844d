//! Materialized query rows.
//!
//! Every row produced by one define pass shares the same [`ColumnInfo`], so
//! name lookup costs a scan of the column list rather than a map per row.

use std::sync::Arc;

use chrono::NaiveDateTime;

use super::column::{Column, ColumnInfo};
use super::value::OracleValue;
use crate::error::{Error, Result};

/// One fetched row, in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<OracleValue>,
    column_info: Arc<ColumnInfo>,
}

impl Row {
    pub fn new(values: Vec<OracleValue>, column_info: Arc<ColumnInfo>) -> Self {
        Self {
            values,
            column_info,
        }
    }

    /// Value at a 0-based column index.
    pub fn get(&self, index: usize) -> Option<&OracleValue> {
        self.values.get(index)
    }

    /// Convert the value at `index` into a host type.
    pub fn try_get<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| Error::index(format!("column index {} out of range", index)))?;
        T::from_value(value)
    }

    /// Value of the first column whose name matches, ignoring ASCII case.
    pub fn get_by_name(&self, name: &str) -> Option<&OracleValue> {
        self.column_info
            .find_by_name(name)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[OracleValue] {
        &self.values
    }

    /// Take the values, dropping column information.
    pub fn into_values(self) -> Vec<OracleValue> {
        self.values
    }

    pub fn columns(&self) -> &[Column] {
        &self.column_info.columns
    }

    /// Shared column information, for building derived rows.
    pub fn column_info(&self) -> &Arc<ColumnInfo> {
        &self.column_info
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.column_info.column_names()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OracleValue> {
        self.values.iter()
    }
}

impl IntoIterator for Row {
    type Item = OracleValue;
    type IntoIter = std::vec::IntoIter<OracleValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a OracleValue;
    type IntoIter = std::slice::Iter<'a, OracleValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// A type built from one fetched row, for the `fetch_*_as` cursor methods.
///
/// Implement it for a domain type to fetch rows straight into that type.
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self> {
        Ok(row)
    }
}

impl FromRow for Vec<OracleValue> {
    fn from_row(row: Row) -> Result<Self> {
        Ok(row.into_values())
    }
}

macro_rules! from_row_tuple {
    ($len:literal; $($t:ident $i:tt),+) => {
        impl<$($t: FromValue),+> FromRow for ($($t,)+) {
            fn from_row(row: Row) -> Result<Self> {
                if row.len() != $len {
                    return Err(Error::type_error(format!(
                        "expected a row of {} columns, got {}",
                        $len,
                        row.len()
                    )));
                }
                Ok(($(row.try_get::<$t>($i)?,)+))
            }
        }
    };
}

from_row_tuple!(1; T0 0);
from_row_tuple!(2; T0 0, T1 1);
from_row_tuple!(3; T0 0, T1 1, T2 2);
from_row_tuple!(4; T0 0, T1 1, T2 2, T3 3);

/// A host type decoded from a single column value.
pub trait FromValue: Sized {
    fn from_value(value: &OracleValue) -> Result<Self>;
}

fn mismatch(expected: &str, value: &OracleValue) -> Error {
    Error::type_error(format!("expecting {}, got {}", expected, value.type_name()))
}

impl FromValue for OracleValue {
    fn from_value(value: &OracleValue) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &OracleValue) -> Result<Self> {
        value.to_i64().ok_or_else(|| mismatch("integer", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &OracleValue) -> Result<Self> {
        value.to_f64().ok_or_else(|| mismatch("float", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &OracleValue) -> Result<Self> {
        match value {
            OracleValue::Boolean(b) => Ok(*b),
            other => other.to_i64().map(|i| i != 0).ok_or_else(|| mismatch("boolean", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &OracleValue) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &OracleValue) -> Result<Self> {
        value
            .as_raw()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("raw", value))
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &OracleValue) -> Result<Self> {
        value.as_date().ok_or_else(|| mismatch("date", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &OracleValue) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
