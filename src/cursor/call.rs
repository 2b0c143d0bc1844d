//! Stored procedure and function calls through anonymous PL/SQL blocks.

use super::Cursor;
use crate::binder::BindVariables;
use crate::error::Result;
use crate::native::Cli;
use crate::types::{resolve_by_host_type, DataType, OracleValue, Param, Params};
use crate::variable::{Origin, VarId, Variable};

/// Build `begin [:0 := ]name(:1,:2,...); end;`. Boolean arguments are
/// compared against 1 so they reach PL/SQL as BOOLEAN.
fn call_statement(name: &str, args: &[Param], returns_value: bool) -> String {
    let mut sql = String::from("begin ");
    if returns_value {
        sql.push_str(":0 := ");
    }
    sql.push_str(name);
    sql.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str(&format!(":{}", i + 1));
        if matches!(arg, Param::Value(OracleValue::Boolean(_))) {
            sql.push_str(" = 1");
        }
    }
    sql.push_str("); end;");
    sql
}

impl<'conn, C: Cli> Cursor<'conn, C> {
    async fn call(&mut self, name: &str, return_var: Option<VarId>, args: Vec<Param>) -> Result<()> {
        self.ensure_open()?;
        let sql = call_statement(name, &args, return_var.is_some());
        let params = match return_var {
            Some(id) => Params::Positional(std::iter::once(Param::Var(id)).chain(args).collect()),
            None => Params::Positional(args),
        };
        self.execute(Some(&sql), Some(&params)).await?;
        Ok(())
    }

    /// Call a stored procedure, returning the argument values after the call
    /// so OUT and IN OUT parameters bound as variables show their new values.
    pub async fn call_procedure(&mut self, name: &str, args: Vec<Param>) -> Result<Vec<OracleValue>> {
        self.call(name, None, args).await?;
        match self.binder.variables() {
            Some(BindVariables::Positional(slots)) => slots
                .iter()
                .map(|slot| match slot {
                    Some(id) => self.arena.get(*id)?.get_value(0),
                    None => Ok(OracleValue::Null),
                })
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    /// Call a stored function and return its value.
    pub async fn call_function(
        &mut self,
        name: &str,
        return_type: DataType,
        args: Vec<Param>,
    ) -> Result<OracleValue> {
        self.ensure_open()?;
        let var_type = resolve_by_host_type(return_type, self.numbers_as_strings)?;
        let var = Variable::new(self.env.clone(), 1, var_type, var_type.element_length)?;
        let id = self.arena.insert(var, Origin::Internal);
        self.call(name, Some(id), args).await?;
        self.arena.get(id)?.get_value(0)
    }
}
