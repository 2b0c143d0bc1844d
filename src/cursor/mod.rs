//! Statement cursor: the prepare, bind, execute, define, fetch lifecycle.
//!
//! A [`Cursor`] borrows its [`Connection`] and owns one native statement
//! handle at a time, the statement's bind collection, and the define
//! variables of the current query. Every variable the cursor creates or the
//! caller creates through it lives in the cursor's variable arena and is
//! addressed by [`VarId`].
//!
//! # Lifecycle
//!
//! 1. Created by [`Connection::cursor`] (or [`Cursor::open_ref_cursor`])
//! 2. [`Cursor::execute`] prepares, binds and executes; queries get their
//!    define variables on first execution
//! 3. Rows are pulled through [`Cursor::fetch_one`], [`Cursor::fetch_many`],
//!    [`Cursor::fetch_all`], [`FetchRows::next`] or a stream; the
//!    `fetch_*_as` variants convert each row through [`FromRow`](crate::FromRow)
//! 4. [`Cursor::close`] releases the statement handle; dropping the cursor
//!    releases every variable

mod call;
mod describe;
mod execute;
mod fetch;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::binder::{Binder, BindVariables};
use crate::connection::Connection;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::lob::Lob;
use crate::native::{Cli, StatementType};
use crate::types::{
    resolve_by_host_type, ColumnInfo, ColumnMetadata, DataType, LobHandle, OracleValue, RefCursor,
    Row,
};
use crate::variable::{Origin, VarId, Variable, VariableArena};

pub use fetch::{CursorStreamExt, FetchRows};

/// Callback applied to every produced row.
pub type RowFactory = Box<dyn FnMut(Row) -> Result<Row> + Send + Sync>;

/// Initial contents of an array variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayContents {
    /// Empty array with this many elements of capacity.
    Count(u32),
    /// Capacity and contents taken from the values.
    Values(Vec<OracleValue>),
}

pub struct Cursor<'conn, C: Cli> {
    conn: &'conn Connection<C>,
    env: Arc<Environment>,
    handle: Option<C::Statement>,
    /// Text of the prepared statement.
    statement: Option<String>,
    /// Advances on every native prepare.
    statement_generation: u64,
    /// `None` until classified; REF CURSORs are classified lazily.
    statement_type: Option<StatementType>,
    arena: VariableArena,
    binder: Binder,
    fetch_vars: Option<Vec<VarId>>,
    column_meta: Vec<ColumnMetadata>,
    column_info: Arc<ColumnInfo>,
    row_factory: Option<RowFactory>,
    array_size: u32,
    bind_array_size: u32,
    fetch_array_size: u32,
    numbers_as_strings: bool,
    /// Output size for long columns and the 1-based column it applies to.
    output_size: Option<(u32, Option<u32>)>,
    row_count: i64,
    actual_rows: i64,
    row_num: i64,
    is_open: bool,
}

impl<'conn, C: Cli> Cursor<'conn, C> {
    pub(crate) fn new(conn: &'conn Connection<C>) -> Self {
        Self {
            conn,
            env: conn.environment().clone(),
            handle: None,
            statement: None,
            statement_generation: 0,
            statement_type: None,
            arena: VariableArena::new(),
            binder: Binder::new(),
            fetch_vars: None,
            column_meta: Vec::new(),
            column_info: Arc::new(ColumnInfo::default()),
            row_factory: None,
            array_size: 1,
            bind_array_size: 1,
            fetch_array_size: 1,
            numbers_as_strings: false,
            output_size: None,
            row_count: 0,
            actual_rows: 0,
            row_num: 0,
            is_open: true,
        }
    }

    /// Fails with "not open" when the cursor is closed or the session is gone.
    fn ensure_open(&self) -> Result<()> {
        if !self.is_open {
            return Err(Error::not_open());
        }
        self.conn.ensure_connected()
    }

    fn statement_mut(&mut self) -> Result<&mut C::Statement> {
        self.handle
            .as_mut()
            .ok_or_else(|| Error::programming("no statement prepared"))
    }

    pub fn connection(&self) -> &'conn Connection<C> {
        self.conn
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Rows fetched so far for queries, rows affected for DML, -1 otherwise.
    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    pub fn statement_type(&self) -> Option<StatementType> {
        self.statement_type
    }

    /// Rows fetched per native fetch for queries executed from now on.
    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn set_array_size(&mut self, size: u32) {
        self.array_size = size.max(1);
    }

    /// Element count of variables created for binding.
    pub fn bind_array_size(&self) -> u32 {
        self.bind_array_size
    }

    pub fn set_bind_array_size(&mut self, size: u32) {
        self.bind_array_size = size.max(1);
    }

    pub fn numbers_as_strings(&self) -> bool {
        self.numbers_as_strings
    }

    /// Define NUMBER columns as decimal text.
    pub fn set_numbers_as_strings(&mut self, enabled: bool) {
        self.numbers_as_strings = enabled;
    }

    /// Install a row factory. Cleared by the next prepare.
    pub fn set_row_factory<F>(&mut self, factory: F)
    where
        F: FnMut(Row) -> Result<Row> + Send + Sync + 'static,
    {
        self.row_factory = Some(Box::new(factory));
    }

    pub fn clear_row_factory(&mut self) {
        self.row_factory = None;
    }

    pub fn has_row_factory(&self) -> bool {
        self.row_factory.is_some()
    }

    /// Set the buffer size used for long columns without a declared size,
    /// for every column or only the 1-based `column`.
    pub fn set_output_size(&mut self, size: u32, column: Option<u32>) {
        self.output_size = Some((size, column));
    }

    pub fn bind_variables(&self) -> Option<&BindVariables> {
        self.binder.variables()
    }

    /// Define variables of the current query, one per column.
    pub fn fetch_variables(&self) -> Option<&[VarId]> {
        self.fetch_vars.as_deref()
    }

    pub fn variable(&self, id: VarId) -> Result<&Variable> {
        self.arena.get(id)
    }

    pub fn variable_mut(&mut self, id: VarId) -> Result<&mut Variable> {
        self.arena.get_mut(id)
    }

    /// Release a variable. Returns false when the id was already stale.
    pub fn release_variable(&mut self, id: VarId) -> bool {
        self.arena.release(id)
    }

    /// Create a caller-owned variable with `bind_array_size` elements.
    pub fn create_variable(&mut self, data_type: DataType, length: Option<u32>) -> Result<VarId> {
        self.ensure_open()?;
        let var_type = resolve_by_host_type(data_type, self.numbers_as_strings)?;
        let length = length.filter(|l| *l > 0).unwrap_or(var_type.element_length);
        let var = Variable::new(self.env.clone(), self.bind_array_size, var_type, length)?;
        Ok(self.arena.insert(var, Origin::External))
    }

    /// Create a caller-owned PL/SQL array variable.
    pub fn create_array_variable(
        &mut self,
        data_type: DataType,
        contents: ArrayContents,
        length: Option<u32>,
    ) -> Result<VarId> {
        self.ensure_open()?;
        let var_type = resolve_by_host_type(data_type, self.numbers_as_strings)?;
        let length = length.filter(|l| *l > 0).unwrap_or(var_type.element_length);
        let count = match &contents {
            ArrayContents::Count(n) => *n,
            ArrayContents::Values(values) => values.len() as u32,
        };
        let mut var = Variable::new(self.env.clone(), count, var_type, length)?;
        var.make_array()?;
        if let ArrayContents::Values(values) = &contents {
            var.set_array_value(values)?;
        }
        Ok(self.arena.insert(var, Origin::External))
    }

    /// Copy one element between variables of this cursor.
    pub fn copy_element(
        &mut self,
        target: VarId,
        source: VarId,
        source_pos: u32,
        target_pos: u32,
    ) -> Result<()> {
        let snapshot = self.arena.get(source)?.snapshot(source_pos);
        self.arena.get_mut(target)?.paste(snapshot, target_pos)
    }

    /// Grow a variable's element stride, rebinding it at once when it is
    /// bound to the current statement.
    pub fn resize_variable(&mut self, id: VarId, new_length: u32) -> Result<()> {
        let generation = self.statement_generation;
        let var = self.arena.get_mut(id)?;
        var.resize(new_length)?;
        if let (Some(target), Some(stmt)) = (var.bound_target().cloned(), self.handle.as_mut()) {
            var.bind(stmt, generation, target)?;
        }
        Ok(())
    }

    /// Operate on a LOB value read from one of this cursor's variables.
    ///
    /// Fails when the variable has been refetched since the handle was read.
    pub fn lob(&self, handle: &LobHandle) -> Result<Lob<'_, C>> {
        self.ensure_open()?;
        let var = self.arena.get(handle.var)?;
        if var.fetch_generation() != handle.generation {
            return Err(Error::programming(
                "LOB variable no longer valid after subsequent fetch",
            ));
        }
        Ok(Lob::new(self.conn.cli(), &self.env, handle.kind, handle.locator))
    }

    /// Open a cursor over a REF CURSOR value read from one of this cursor's
    /// variables. The new cursor classifies its statement on first use.
    pub fn open_ref_cursor(&self, cursor: &RefCursor) -> Result<Cursor<'conn, C>> {
        self.ensure_open()?;
        let var = self.arena.get(cursor.var)?;
        if var.data_type() != DataType::Cursor {
            return Err(Error::programming("variable is not a cursor variable"));
        }
        if cursor.handle == 0 {
            return Err(Error::interface("REF CURSOR has no statement handle"));
        }
        let stmt = self.conn.cli().statement_from_handle(cursor.handle)?;
        let mut opened = Cursor::new(self.conn);
        opened.handle = Some(stmt);
        opened.statement_generation = 1;
        debug!(handle = cursor.handle, "opened REF CURSOR");
        Ok(opened)
    }

    fn release_fetch_variables(&mut self) {
        if let Some(vars) = self.fetch_vars.take() {
            for id in vars {
                self.arena.release(id);
            }
        }
        self.column_meta.clear();
        self.column_info = Arc::new(ColumnInfo::default());
    }

    /// Close the cursor, releasing its statement handle and engine-owned
    /// variables. Caller-created variables stay readable until dropped.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.binder.clear(&mut self.arena);
        self.release_fetch_variables();
        self.handle = None;
        self.is_open = false;
        debug!(statement = ?self.statement, "closed cursor");
        Ok(())
    }
}

impl<C: Cli> fmt::Debug for Cursor<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("statement", &self.statement)
            .field("statement_type", &self.statement_type)
            .field("is_open", &self.is_open)
            .field("array_size", &self.array_size)
            .field("bind_array_size", &self.bind_array_size)
            .field("row_count", &self.row_count)
            .finish()
    }
}
