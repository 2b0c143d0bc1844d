use super::Cursor;
use crate::error::{Error, Result};
use crate::native::{Cli, NativeStatement};
use crate::types::ColumnDescription;

impl<'conn, C: Cli> Cursor<'conn, C> {
    /// Describe the select list of the current query, `None` when the
    /// statement is not a query or has not been executed.
    pub fn description(&mut self) -> Result<Option<Vec<ColumnDescription>>> {
        self.ensure_open()?;
        self.fixup_bound_cursor()?;
        let Some(vars) = self.fetch_vars.as_ref() else {
            return Ok(None);
        };
        vars.iter()
            .zip(&self.column_meta)
            .map(|(id, meta)| Ok(ColumnDescription::new(meta, self.arena.get(*id)?.var_type())))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Unique bind names of the prepared statement in order of appearance.
    pub fn bind_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        let stmt = self
            .handle
            .as_ref()
            .ok_or_else(|| Error::programming("statement must be prepared first"))?;
        let mut names: Vec<String> = Vec::new();
        for name in stmt.bind_names()? {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}
