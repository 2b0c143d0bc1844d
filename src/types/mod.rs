//! Host-facing data types: values, the type registry, columns, and rows.

mod column;
mod data_type;
mod lob;
mod metadata;
mod row;
mod value;

pub use column::{Column, ColumnDescription, ColumnInfo};
pub use data_type::{
    resolve_by_host_type, resolve_by_value, resolve_by_wire_type, DataType, VariableType,
};
pub use lob::{LobHandle, LobKind};
pub use metadata::ColumnMetadata;
pub use row::{FromRow, FromValue, Row};
pub use value::{OracleValue, Param, Params, RefCursor};
