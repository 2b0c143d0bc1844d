//! Host values and bind parameters.

use chrono::NaiveDateTime;
use std::fmt;

use super::lob::LobHandle;
use crate::native::Handle;
use crate::variable::VarId;

/// Oracle value enum representing a single column or bind value.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleValue {
    /// NULL value.
    Null,
    /// String value (VARCHAR2, CHAR, ROWID, LONG).
    String(String),
    /// Raw binary value (RAW, LONG RAW).
    Raw(Vec<u8>),
    /// Integral NUMBER value.
    Integer(i64),
    /// Floating-point value (NUMBER or BINARY_DOUBLE).
    Float(f64),
    /// Decimal text, used when full precision must be preserved.
    Number(String),
    /// Boolean, carried as NUMBER 1/0.
    Boolean(bool),
    /// Date/time value (DATE type).
    Date(NaiveDateTime),
    /// Date/time with fractional seconds (TIMESTAMP types).
    Timestamp(NaiveDateTime),
    /// LOB locator inside a cursor variable.
    Lob(LobHandle),
    /// Statement handle returned through a REF CURSOR.
    Cursor(RefCursor),
    /// PL/SQL array value.
    Array(Vec<OracleValue>),
}

/// REF CURSOR element of a cursor-typed variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefCursor {
    pub var: VarId,
    pub position: u32,
    pub handle: Handle,
}

impl OracleValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, OracleValue::Null)
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OracleValue::String(s) | OracleValue::Number(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            OracleValue::Integer(i) => Some(*i),
            OracleValue::Boolean(b) => Some(*b as i64),
            OracleValue::Number(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            OracleValue::Float(f) => Some(*f),
            OracleValue::Integer(i) => Some(*i as f64),
            OracleValue::Number(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get the value as a NaiveDateTime.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            OracleValue::Date(dt) | OracleValue::Timestamp(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            OracleValue::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_lob(&self) -> Option<&LobHandle> {
        match self {
            OracleValue::Lob(lob) => Some(lob),
            _ => None,
        }
    }

    pub fn as_cursor(&self) -> Option<&RefCursor> {
        match self {
            OracleValue::Cursor(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[OracleValue]> {
        match self {
            OracleValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the value's runtime type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            OracleValue::Null => "null",
            OracleValue::String(_) => "string",
            OracleValue::Raw(_) => "raw",
            OracleValue::Integer(_) => "integer",
            OracleValue::Float(_) => "float",
            OracleValue::Number(_) => "decimal",
            OracleValue::Boolean(_) => "boolean",
            OracleValue::Date(_) => "date",
            OracleValue::Timestamp(_) => "timestamp",
            OracleValue::Lob(_) => "lob",
            OracleValue::Cursor(_) => "cursor",
            OracleValue::Array(_) => "array",
        }
    }
}

impl fmt::Display for OracleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleValue::Null => write!(f, "NULL"),
            OracleValue::String(s) | OracleValue::Number(s) => write!(f, "{}", s),
            OracleValue::Raw(bytes) => write!(f, "<RAW: {} bytes>", bytes.len()),
            OracleValue::Integer(i) => write!(f, "{}", i),
            OracleValue::Float(v) => write!(f, "{}", v),
            OracleValue::Boolean(b) => write!(f, "{}", b),
            OracleValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            OracleValue::Timestamp(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            OracleValue::Lob(lob) => write!(f, "<{:?} at position {}>", lob.kind, lob.position),
            OracleValue::Cursor(_) => write!(f, "<REF CURSOR>"),
            OracleValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for OracleValue {
                fn from(value: $ty) -> Self {
                    OracleValue::$variant(value.into())
                }
            }
        )*
    };
}

value_from! {
    String => String,
    &str => String,
    Vec<u8> => Raw,
    &[u8] => Raw,
    i64 => Integer,
    i32 => Integer,
    u32 => Integer,
    f64 => Float,
    bool => Boolean,
    NaiveDateTime => Date,
    LobHandle => Lob,
    RefCursor => Cursor,
    Vec<OracleValue> => Array,
}

impl<T: Into<OracleValue>> From<Option<T>> for OracleValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OracleValue::Null, Into::into)
    }
}

/// A single bind parameter: a plain value or a caller-managed variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(OracleValue),
    Var(VarId),
}

impl Param {
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Value(OracleValue::Null))
    }
}

impl From<VarId> for Param {
    fn from(id: VarId) -> Self {
        Param::Var(id)
    }
}

impl From<OracleValue> for Param {
    fn from(value: OracleValue) -> Self {
        Param::Value(value)
    }
}

macro_rules! param_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::Value(value.into())
                }
            }
        )*
    };
}

param_from!(String, &str, Vec<u8>, &[u8], i64, i32, u32, f64, bool, NaiveDateTime, Vec<OracleValue>);

impl<T: Into<OracleValue>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        Param::Value(value.into())
    }
}

/// A parameter collection: purely positional or purely named.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<Param>),
    Named(Vec<(String, Param)>),
}

impl Params {
    pub fn positional<I, P>(params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        Params::Positional(params.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, P>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Param>,
    {
        Params::Named(
            params
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(p) => p.len(),
            Params::Named(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
