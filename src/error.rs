//! Error types for the typed access layer.

use thiserror::Error;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for driver operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Misuse of the API surface (closed cursor, statement not a query, ...).
    #[error("Interface error: {message}")]
    Interface { message: String },

    /// Statement state violation.
    #[error("Programming error: {message}")]
    Programming { message: String },

    /// Value out of range, invalid date, or a fetch status reported for an element.
    #[error("Data error: {message}")]
    Data { message: String },

    /// Host value or wire type that has no variable type.
    #[error("Not supported: {message}")]
    NotSupported { message: String },

    /// Value of the wrong runtime type for a variable.
    #[error("Type error: {message}")]
    Type { message: String },

    /// Position outside a variable's allocated elements.
    #[error("Index error: {message}")]
    Index { message: String },

    /// Requested buffer exceeds the addressable size.
    #[error("array size too large ({requested} bytes requested)")]
    Allocation { requested: u64 },

    /// Buffer allocation failed.
    #[error("Out of memory allocating {requested} bytes")]
    NoMemory { requested: usize },

    /// Error reported by the native layer.
    #[error("ORA-{code:05}: {message}")]
    Oracle { code: u32, message: String },
}

/// Error category, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Interface,
    Programming,
    Data,
    NotSupported,
    Type,
    Index,
    Allocation,
    NoMemory,
    Oracle,
}

impl Error {
    /// Create an interface error.
    pub fn interface(message: impl Into<String>) -> Self {
        Self::Interface {
            message: message.into(),
        }
    }

    /// Create a programming error.
    pub fn programming(message: impl Into<String>) -> Self {
        Self::Programming {
            message: message.into(),
        }
    }

    /// Create a data error.
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a not-supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    /// Create a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    /// Create an index error.
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Create an Oracle database error.
    pub fn oracle(code: u32, message: impl Into<String>) -> Self {
        Self::Oracle {
            code,
            message: message.into(),
        }
    }

    /// Error raised by every operation on a closed cursor or a dead connection.
    pub(crate) fn not_open() -> Self {
        Self::interface("not open")
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Interface { .. } => ErrorKind::Interface,
            Error::Programming { .. } => ErrorKind::Programming,
            Error::Data { .. } => ErrorKind::Data,
            Error::NotSupported { .. } => ErrorKind::NotSupported,
            Error::Type { .. } => ErrorKind::Type,
            Error::Index { .. } => ErrorKind::Index,
            Error::Allocation { .. } => ErrorKind::Allocation,
            Error::NoMemory { .. } => ErrorKind::NoMemory,
            Error::Oracle { .. } => ErrorKind::Oracle,
        }
    }
}
