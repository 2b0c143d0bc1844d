//! Native call-level interface seam.
//!
//! The engine never talks to a database library directly. Everything it
//! needs from the native layer is expressed by three traits:
//!
//! - [`Cli`]: the session. Prepares statements and performs LOB I/O.
//! - [`NativeStatement`]: one prepared statement handle. Records bind and
//!   define layouts and runs execute/fetch against borrowed buffers.
//! - [`HandleAllocator`]: descriptor allocation, shared through the
//!   [`Environment`](crate::environment::Environment) so variables can release
//!   their descriptors when dropped.
//!
//! Execute and fetch are the only blocking operations; they are async and
//! return `Send` futures. Buffers are handed to the native layer for the
//! duration of the call as [`BufferView`]s instead of being registered by
//! address, so a resized variable only needs its layout re-recorded.

pub mod constants;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::ColumnMetadata;
use constants::*;

/// Opaque native handle (descriptor, locator, or statement).
pub type Handle = u64;

/// Kind of descriptor requested from the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Internal LOB locator.
    Lob,
    /// External file locator.
    File,
    /// Statement handle used for REF CURSOR output.
    Statement,
}

/// Statement classification reported by the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Update,
    Delete,
    Insert,
    Create,
    Drop,
    Alter,
    Begin,
    Declare,
    Call,
    Other(u16),
}

impl StatementType {
    /// Map a raw statement type code.
    pub fn from_code(code: u16) -> Self {
        match code {
            STMT_SELECT => StatementType::Select,
            STMT_UPDATE => StatementType::Update,
            STMT_DELETE => StatementType::Delete,
            STMT_INSERT => StatementType::Insert,
            STMT_CREATE => StatementType::Create,
            STMT_DROP => StatementType::Drop,
            STMT_ALTER => StatementType::Alter,
            STMT_BEGIN => StatementType::Begin,
            STMT_DECLARE => StatementType::Declare,
            STMT_CALL => StatementType::Call,
            other => StatementType::Other(other),
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, StatementType::Select)
    }

    /// DDL statements are re-prepared even when the text is unchanged.
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            StatementType::Create | StatementType::Drop | StatementType::Alter
        )
    }

    /// Whether the server reports an affected-row count for this statement.
    pub fn reports_row_count(&self) -> bool {
        matches!(
            self,
            StatementType::Insert | StatementType::Update | StatementType::Delete
        )
    }
}

/// Where a variable is attached inside a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindTarget {
    Name(String),
    /// 1-based position.
    Position(u32),
}

impl fmt::Display for BindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindTarget::Name(name) => write!(f, ":{}", name),
            BindTarget::Position(pos) => write!(f, ":{}", pos),
        }
    }
}

/// Buffer layout recorded by a bind or define call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSpec {
    /// Wire data type of each element.
    pub wire_type: u16,
    /// Stride of one element in bytes.
    pub element_size: u32,
    /// Element capacity for PL/SQL array binds, `None` for scalar binds.
    pub array_capacity: Option<u32>,
}

/// Attribute applied to a bind after the bind call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAttribute {
    CharsetForm(u8),
    MaxDataSize(u32),
}

/// How an execute call should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    Default,
    CommitOnSuccess,
    ParseOnly,
}

/// Outcome of a native fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The requested number of rows was returned.
    Rows,
    /// The result set ended; fewer rows than requested may have been returned.
    NoData,
}

/// Mutable view over one variable's buffers, lent to the native layer for
/// the duration of an execute or fetch.
#[derive(Debug)]
pub struct BufferView<'a> {
    pub target: BindTarget,
    pub wire_type: u16,
    pub element_size: usize,
    pub data: &'a mut [u8],
    pub indicator: &'a mut [i16],
    /// Present for variable-length types only.
    pub actual_length: Option<&'a mut [u32]>,
    /// Present for variable-length types only.
    pub return_code: Option<&'a mut [u16]>,
    /// Present for PL/SQL array binds only.
    pub actual_elements: Option<&'a mut u32>,
}

impl BufferView<'_> {
    /// Number of elements the view can hold.
    pub fn capacity(&self) -> usize {
        self.indicator.len()
    }

    pub fn element(&self, pos: usize) -> &[u8] {
        let start = pos * self.element_size;
        &self.data[start..start + self.element_size]
    }

    pub fn element_mut(&mut self, pos: usize) -> &mut [u8] {
        let start = pos * self.element_size;
        &mut self.data[start..start + self.element_size]
    }

    pub fn is_null(&self, pos: usize) -> bool {
        self.indicator[pos] == IND_NULL
    }

    /// Byte length of a variable-length element.
    pub fn length(&self, pos: usize) -> Option<u32> {
        self.actual_length.as_ref().map(|lengths| lengths[pos])
    }

    /// Store a value of `bytes` at `pos`, flagging truncation when it does not fit.
    pub fn put_bytes(&mut self, pos: usize, bytes: &[u8]) {
        let size = self.element_size;
        let len = bytes.len().min(size);
        self.element_mut(pos)[..len].copy_from_slice(&bytes[..len]);
        self.indicator[pos] = IND_NOT_NULL;
        if let Some(lengths) = self.actual_length.as_mut() {
            lengths[pos] = len as u32;
        }
        if let Some(codes) = self.return_code.as_mut() {
            codes[pos] = if bytes.len() > size { RC_TRUNCATED } else { 0 };
        }
    }

    pub fn put_null(&mut self, pos: usize) {
        self.indicator[pos] = IND_NULL;
    }
}

/// Descriptor allocation, shared by every variable of an environment.
pub trait HandleAllocator: Send + Sync {
    fn alloc_handle(&self, kind: HandleKind) -> Result<Handle>;

    /// Release a handle. Never fails; errors are the allocator's concern.
    fn free_handle(&self, kind: HandleKind, handle: Handle);
}

/// A prepared native statement.
pub trait NativeStatement: Send {
    /// Classify the prepared statement.
    fn statement_type(&self) -> Result<StatementType>;

    /// Record a bind layout for `target`.
    fn bind(&mut self, target: &BindTarget, spec: &BufferSpec) -> Result<()>;

    /// Apply a post-bind attribute.
    fn set_bind_attribute(&mut self, target: &BindTarget, attribute: BindAttribute)
        -> Result<()>;

    /// Record a define layout for the 1-based column `position`.
    fn define(&mut self, position: u32, spec: &BufferSpec) -> Result<()>;

    /// Number of select-list columns.
    fn column_count(&self) -> Result<u32>;

    /// Describe the 1-based column `position`.
    fn describe_column(&self, position: u32) -> Result<ColumnMetadata>;

    /// Bind placeholder names in order of appearance, duplicates included.
    fn bind_names(&self) -> Result<Vec<String>>;

    /// Cumulative row count (rows fetched or rows affected).
    fn row_count(&self) -> Result<u64>;

    /// Execute `iters` iterations with the given bind buffers.
    fn execute(
        &mut self,
        iters: u32,
        mode: ExecuteMode,
        binds: &mut [BufferView<'_>],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetch up to `rows` rows into the define buffers.
    fn fetch(
        &mut self,
        rows: u32,
        defines: &mut [BufferView<'_>],
    ) -> impl Future<Output = Result<FetchStatus>> + Send;
}

/// A native session.
pub trait Cli: Send + Sync {
    type Statement: NativeStatement;

    /// Liveness check consulted before every cursor operation.
    fn is_connected(&self) -> bool;

    /// Allocator used for descriptors owned by variables.
    fn handle_allocator(&self) -> Arc<dyn HandleAllocator>;

    /// Prepare statement text.
    fn prepare(&self, sql: &str) -> impl Future<Output = Result<Self::Statement>> + Send;

    /// Wrap a statement handle opened by the server (REF CURSOR output).
    fn statement_from_handle(&self, handle: Handle) -> Result<Self::Statement>;

    /// LOB length in characters (character LOBs) or bytes.
    fn lob_length(&self, locator: Handle) -> impl Future<Output = Result<u64>> + Send;

    /// Read `amount` units starting at the 1-based `offset` into `buffer`.
    ///
    /// Returns the amount read, in characters for fixed-width character LOBs
    /// and in bytes otherwise.
    fn lob_read(
        &self,
        locator: Handle,
        offset: u64,
        amount: u64,
        charset_form: u8,
        buffer: &mut [u8],
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Write `data` at the 1-based `offset`, returning the amount written.
    fn lob_write(
        &self,
        locator: Handle,
        offset: u64,
        data: &[u8],
        charset_form: u8,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn lob_trim(&self, locator: Handle, new_size: u64)
        -> impl Future<Output = Result<()>> + Send;

    fn file_open(&self, locator: Handle) -> impl Future<Output = Result<()>> + Send;

    fn file_close(&self, locator: Handle) -> impl Future<Output = Result<()>> + Send;

    fn file_exists(&self, locator: Handle) -> impl Future<Output = Result<bool>> + Send;

    /// Directory alias and file name of an external file locator.
    fn file_name(&self, locator: Handle) -> Result<(String, String)>;

    fn set_file_name(&self, locator: Handle, directory: &str, name: &str) -> Result<()>;
}
