//! Prepare, bind, execute and define.

use tracing::debug;

use super::Cursor;
use crate::binder::{BindVariables, InputSizes};
use crate::error::{Error, Result};
use crate::native::constants::LONG_LENGTH_HEADER;
use crate::native::{Cli, ExecuteMode, NativeStatement, StatementType};
use crate::types::{resolve_by_host_type, resolve_by_wire_type, Column, ColumnInfo, Params};
use crate::variable::{Origin, VarId, Variable};
use std::sync::Arc;

impl<'conn, C: Cli> Cursor<'conn, C> {
    /// Prepare `statement`, or re-prepare the cached one when `None`.
    ///
    /// Identical text is not prepared again unless it is DDL.
    pub(super) async fn internal_prepare(&mut self, statement: Option<&str>) -> Result<()> {
        let is_ddl = self.statement_type.is_some_and(|t| t.is_ddl());
        let text = match (statement, self.statement.as_deref()) {
            (None, None) => {
                return Err(Error::programming(
                    "no statement specified and no prior statement prepared",
                ))
            }
            (None, Some(cached)) => {
                if !is_ddl && self.handle.is_some() {
                    return Ok(());
                }
                cached.to_string()
            }
            (Some(text), cached) => {
                if cached == Some(text) && !is_ddl && self.handle.is_some() {
                    return Ok(());
                }
                text.to_string()
            }
        };

        self.handle = None;
        let stmt = match self.conn.cli().prepare(&text).await {
            Ok(stmt) => stmt,
            Err(err) => {
                self.statement = None;
                self.statement_type = None;
                return Err(err);
            }
        };
        self.handle = Some(stmt);
        self.statement = Some(text);
        self.statement_generation += 1;

        if !self.binder.input_sizes_declared() {
            self.binder.clear(&mut self.arena);
        }
        self.row_factory = None;
        self.classify_statement()?;
        debug!(
            statement = ?self.statement,
            statement_type = ?self.statement_type,
            generation = self.statement_generation,
            "prepared statement"
        );
        Ok(())
    }

    /// Read the statement type and drop the previous query's defines.
    pub(super) fn classify_statement(&mut self) -> Result<()> {
        let statement_type = self.statement_mut()?.statement_type()?;
        self.statement_type = Some(statement_type);
        self.release_fetch_variables();
        Ok(())
    }

    /// Classify a REF CURSOR statement on first use.
    pub(super) fn fixup_bound_cursor(&mut self) -> Result<()> {
        if self.handle.is_some() && self.statement_type.is_none() {
            self.classify_statement()?;
            if self.statement_type == Some(StatementType::Select) {
                self.perform_define()?;
            }
            self.set_row_count()?;
        }
        Ok(())
    }

    pub(super) fn set_row_count(&mut self) -> Result<()> {
        match self.statement_type {
            Some(StatementType::Select) => {
                self.row_count = 0;
                self.actual_rows = -1;
                self.row_num = 0;
            }
            Some(t) if t.reports_row_count() => {
                self.row_count = self.statement_mut()?.row_count()? as i64;
            }
            _ => self.row_count = -1,
        }
        Ok(())
    }

    fn perform_bind(&mut self) -> Result<()> {
        let generation = self.statement_generation;
        let stmt = self
            .handle
            .as_mut()
            .ok_or_else(|| Error::programming("no statement prepared"))?;
        self.binder.commit(&mut self.arena, stmt, generation)
    }

    /// Run `iters` iterations; the row count is refreshed even on failure.
    async fn internal_execute(&mut self, iters: u32) -> Result<()> {
        let mode = if self.conn.autocommit() {
            ExecuteMode::CommitOnSuccess
        } else {
            ExecuteMode::Default
        };
        let targets = self.binder.targets();
        let stmt = self
            .handle
            .as_mut()
            .ok_or_else(|| Error::programming("no statement prepared"))?;
        let mut views = self.arena.views(&targets)?;
        let result = stmt.execute(iters, mode, &mut views).await;
        drop(views);
        debug!(
            iters,
            ?mode,
            statement_type = ?self.statement_type,
            ok = result.is_ok(),
            "executed statement"
        );
        if let Err(err) = result {
            // the execute error wins over any error refreshing the count
            let _ = self.set_row_count();
            return Err(err);
        }
        self.set_row_count()
    }

    /// Create one define variable per select-list column.
    pub(super) fn perform_define(&mut self) -> Result<()> {
        let numbers_as_strings = self.numbers_as_strings;
        let output_size = self.output_size;
        self.fetch_array_size = self.array_size;
        let fetch_array_size = self.fetch_array_size;
        let env = self.env.clone();
        let stmt = self
            .handle
            .as_mut()
            .ok_or_else(|| Error::programming("no statement prepared"))?;

        let count = stmt.column_count()?;
        let mut defined = Vec::with_capacity(count as usize);
        for position in 1..=count {
            let meta = stmt.describe_column(position)?;
            let wire_type = resolve_by_wire_type(meta.wire_type, meta.charset_form)?;
            let var_type = resolve_by_host_type(wire_type.data_type, numbers_as_strings)?;

            let mut length = var_type.element_length;
            if var_type.is_variable_length {
                if meta.data_size > 0 {
                    length = meta.data_size;
                } else if let Some((size, column)) = output_size {
                    if column.map_or(true, |c| c == position) {
                        length = size + LONG_LENGTH_HEADER;
                    }
                }
            }

            let mut var = Variable::new(env.clone(), fetch_array_size, var_type, length)?;
            var.pre_define(&meta);
            var.define(stmt, position)?;
            defined.push((var, meta));
        }

        let mut vars: Vec<VarId> = Vec::with_capacity(defined.len());
        let mut columns = Vec::with_capacity(defined.len());
        let mut metas = Vec::with_capacity(defined.len());
        for (var, meta) in defined {
            columns.push(Column::from_metadata(&meta, var.var_type()));
            vars.push(self.arena.insert(var, Origin::Internal));
            metas.push(meta);
        }
        self.column_info = Arc::new(ColumnInfo::new(columns));
        self.column_meta = metas;
        self.fetch_vars = Some(vars);
        debug!(columns = count, fetch_array_size, "defined select list");
        Ok(())
    }

    /// Prepare a statement without executing it.
    pub async fn prepare(&mut self, statement: &str) -> Result<()> {
        self.ensure_open()?;
        self.internal_prepare(Some(statement)).await
    }

    /// Prepare and parse a statement on the server without executing it.
    pub async fn parse(&mut self, statement: &str) -> Result<()> {
        self.ensure_open()?;
        self.internal_prepare(Some(statement)).await?;
        self.statement_mut()?
            .execute(0, ExecuteMode::ParseOnly, &mut [])
            .await
    }

    /// Execute a statement.
    ///
    /// `statement` of `None` re-executes the prepared statement. For queries
    /// the define variables are returned; rows are fetched on demand.
    pub async fn execute(
        &mut self,
        statement: Option<&str>,
        params: Option<&Params>,
    ) -> Result<Option<Vec<VarId>>> {
        self.ensure_open()?;
        self.internal_prepare(statement).await?;
        if let Some(params) = params {
            self.binder
                .apply_parameters(&mut self.arena, &self.env, params, 1, 0)?;
        }
        self.perform_bind()?;

        let is_query = self.statement_type == Some(StatementType::Select);
        self.internal_execute(if is_query { 0 } else { 1 }).await?;
        if is_query && self.fetch_vars.is_none() {
            self.perform_define()?;
        }
        self.output_size = None;

        Ok(if is_query { self.fetch_vars.clone() } else { None })
    }

    /// Execute a statement once per parameter set, as one array execute.
    pub async fn execute_many(&mut self, statement: Option<&str>, rows: &[Params]) -> Result<()> {
        self.ensure_open()?;
        self.internal_prepare(statement).await?;
        if self.statement_type == Some(StatementType::Select) {
            return Err(Error::not_supported("queries not supported: results undefined"));
        }
        let num_rows = rows.len() as u32;
        for (i, params) in rows.iter().enumerate() {
            self.binder
                .apply_parameters(&mut self.arena, &self.env, params, num_rows, i as u32)?;
        }
        self.perform_bind()?;
        self.internal_execute(num_rows).await
    }

    /// Execute the prepared statement `iters` times with values already set
    /// in its bind variables.
    pub async fn execute_many_prepared(&mut self, iters: u32) -> Result<()> {
        if iters > self.bind_array_size {
            return Err(Error::interface("iterations exceed bind array size"));
        }
        self.ensure_open()?;
        if self.statement_type == Some(StatementType::Select) {
            return Err(Error::not_supported("queries not supported: results undefined"));
        }
        self.perform_bind()?;
        self.internal_execute(iters).await
    }

    /// Declare bind variables ahead of execution. They survive the next
    /// prepare and are filled in place by the next execute.
    pub fn set_input_sizes(&mut self, sizes: &InputSizes) -> Result<BindVariables> {
        self.ensure_open()?;
        self.binder.declare_input_sizes(
            &mut self.arena,
            &self.env,
            sizes,
            self.bind_array_size,
            self.numbers_as_strings,
        )
    }
}
