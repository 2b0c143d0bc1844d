//! Turns caller parameters into bind variables.
//!
//! The binder keeps the statement's current bind collection, either
//! positional or named. Applying parameters reuses existing variables where
//! the new value fits, replaces them when the caller passes a variable of its
//! own, and creates fresh ones from the value's runtime type otherwise.

use std::sync::Arc;

use tracing::trace;

use crate::environment::Environment;
use crate::error::{Error, ErrorKind, Result};
use crate::native::constants::MAX_STRING_CHARS;
use crate::native::{BindTarget, NativeStatement};
use crate::types::{resolve_by_host_type, resolve_by_value, DataType, OracleValue, Param, Params};
use crate::variable::{Origin, VarId, Variable, VariableArena};

/// Declared input size for one bind slot.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSize {
    /// A string of at most this many characters; long string beyond 4000.
    Length(u32),
    /// A variable of the given type at its default length.
    Type(DataType),
    /// A PL/SQL array of the given type and element count.
    Array(DataType, u32),
    /// An existing caller-owned variable.
    Var(VarId),
}

/// Input size declarations, positional (with gaps) or named.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSizes {
    Positional(Vec<Option<InputSize>>),
    Named(Vec<(String, InputSize)>),
}

/// The bind collection of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindVariables {
    Positional(Vec<Option<VarId>>),
    Named(Vec<(String, VarId)>),
}

impl BindVariables {
    fn ids(&self) -> Vec<VarId> {
        match self {
            BindVariables::Positional(slots) => slots.iter().flatten().copied().collect(),
            BindVariables::Named(pairs) => pairs.iter().map(|(_, id)| *id).collect(),
        }
    }

    /// Every occupied slot with its bind target.
    pub fn targets(&self) -> Vec<(VarId, BindTarget)> {
        match self {
            BindVariables::Positional(slots) => slots
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.map(|id| (id, BindTarget::Position(i as u32 + 1))))
                .collect(),
            BindVariables::Named(pairs) => pairs
                .iter()
                .map(|(name, id)| (*id, BindTarget::Name(name.clone())))
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Binder {
    vars: Option<BindVariables>,
    input_sizes_declared: bool,
}

/// Detach a variable from its slot, dropping it when the engine owns it.
fn detach(arena: &mut VariableArena, id: VarId) {
    match arena.origin(id) {
        Some(Origin::Internal) => {
            arena.release(id);
        }
        Some(Origin::External) => {
            if let Ok(var) = arena.get_mut(id) {
                var.clear_binding();
            }
        }
        None => {}
    }
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variables(&self) -> Option<&BindVariables> {
        self.vars.as_ref()
    }

    pub fn input_sizes_declared(&self) -> bool {
        self.input_sizes_declared
    }

    /// Drop the bind collection, releasing engine-owned variables.
    pub fn clear(&mut self, arena: &mut VariableArena) {
        if let Some(vars) = self.vars.take() {
            for id in vars.ids() {
                detach(arena, id);
            }
        }
    }

    /// Replace the bind collection with variables created from declarations.
    /// The collection survives the next prepare.
    pub fn declare_input_sizes(
        &mut self,
        arena: &mut VariableArena,
        env: &Arc<Environment>,
        sizes: &InputSizes,
        bind_array_size: u32,
        numbers_as_strings: bool,
    ) -> Result<BindVariables> {
        self.clear(arena);
        let mut create = |size: &InputSize| -> Result<VarId> {
            variable_from_input_size(arena, env, size, bind_array_size, numbers_as_strings)
        };
        let vars = match sizes {
            InputSizes::Positional(slots) => BindVariables::Positional(
                slots
                    .iter()
                    .map(|slot| slot.as_ref().map(&mut create).transpose())
                    .collect::<Result<_>>()?,
            ),
            InputSizes::Named(pairs) => BindVariables::Named(
                pairs
                    .iter()
                    .map(|(name, size)| Ok((name.clone(), create(size)?)))
                    .collect::<Result<_>>()?,
            ),
        };
        self.vars = Some(vars.clone());
        self.input_sizes_declared = true;
        Ok(vars)
    }

    /// Apply one parameter set, writing values at `array_pos` of variables
    /// sized for `num_elements` rows.
    pub fn apply_parameters(
        &mut self,
        arena: &mut VariableArena,
        env: &Arc<Environment>,
        params: &Params,
        num_elements: u32,
        array_pos: u32,
    ) -> Result<()> {
        let vars = self.vars.get_or_insert_with(|| match params {
            Params::Positional(_) => BindVariables::Positional(Vec::new()),
            Params::Named(_) => BindVariables::Named(Vec::new()),
        });
        match (params, vars) {
            (Params::Positional(values), BindVariables::Positional(slots)) => {
                for (i, param) in values.iter().enumerate() {
                    let orig = slots.get(i).copied().flatten();
                    let new = bind_slot(arena, env, orig, param, num_elements, array_pos)?;
                    match slots.get_mut(i) {
                        Some(slot) => {
                            if new.is_some() {
                                *slot = new;
                            }
                        }
                        None => slots.push(new),
                    }
                }
            }
            (Params::Named(values), BindVariables::Named(pairs)) => {
                for (name, param) in values {
                    let index = pairs.iter().position(|(n, _)| n == name);
                    let orig = index.map(|i| pairs[i].1);
                    if let Some(new) = bind_slot(arena, env, orig, param, num_elements, array_pos)? {
                        match index {
                            Some(i) => pairs[i].1 = new,
                            None => pairs.push((name.clone(), new)),
                        }
                    }
                }
            }
            _ => {
                return Err(Error::programming(
                    "positional and named binds cannot be intermixed",
                ))
            }
        }
        Ok(())
    }

    /// Bind every variable of the collection to the prepared statement.
    pub fn commit<S: NativeStatement>(
        &mut self,
        arena: &mut VariableArena,
        stmt: &mut S,
        statement_generation: u64,
    ) -> Result<()> {
        self.input_sizes_declared = false;
        let Some(vars) = self.vars.as_ref() else {
            return Ok(());
        };
        for (id, target) in vars.targets() {
            arena.get_mut(id)?.bind(stmt, statement_generation, target)?;
        }
        Ok(())
    }

    pub fn targets(&self) -> Vec<(VarId, BindTarget)> {
        self.vars.as_ref().map(BindVariables::targets).unwrap_or_default()
    }
}

/// Resolve one slot. Returns the variable that should occupy the slot when
/// it changes, or `None` when the existing variable was updated in place.
fn bind_slot(
    arena: &mut VariableArena,
    env: &Arc<Environment>,
    orig: Option<VarId>,
    param: &Param,
    num_elements: u32,
    array_pos: u32,
) -> Result<Option<VarId>> {
    let orig = orig.filter(|id| arena.contains(*id));
    let value = match param {
        Param::Var(id) => {
            let id = *id;
            arena.get(id)?;
            return Ok(match orig {
                Some(orig) if orig == id => None,
                Some(orig) => {
                    detach(arena, orig);
                    Some(id)
                }
                None => {
                    arena.get_mut(id)?.clear_binding();
                    Some(id)
                }
            });
        }
        Param::Value(value) => value,
    };

    if let Some(orig) = orig {
        let existing = arena.get_mut(orig)?;
        if num_elements > existing.allocated_elements() {
            let mut var = Variable::new(
                env.clone(),
                num_elements,
                existing.var_type(),
                existing.max_length(),
            )?;
            var.set_value(array_pos, value)?;
            detach(arena, orig);
            trace!(?orig, num_elements, "replaced bind variable with larger capacity");
            return Ok(Some(arena.insert(var, Origin::Internal)));
        }
        match existing.set_value(array_pos, value) {
            Ok(()) => return Ok(None),
            Err(err) if array_pos > 0 => return Err(err),
            Err(err) if matches!(err.kind(), ErrorKind::Type | ErrorKind::Index) => {
                trace!(?orig, %err, "recreating bind variable from value");
                detach(arena, orig);
            }
            Err(err) => return Err(err),
        }
    }

    let var = new_by_value(env, value, num_elements, array_pos)?;
    Ok(Some(arena.insert(var, Origin::Internal)))
}

/// Create a variable shaped for `value` and store it at `array_pos`.
pub(crate) fn new_by_value(
    env: &Arc<Environment>,
    value: &OracleValue,
    num_elements: u32,
    array_pos: u32,
) -> Result<Variable> {
    let mut var_type = resolve_by_value(value)?;
    let mut num_elements = num_elements;
    let length = match value {
        OracleValue::Null => 1,
        OracleValue::String(s) => {
            if s.len() as u64 > env.max_string_bytes() as u64 {
                var_type = DataType::LongString.variable_type();
            }
            s.len() as u32
        }
        OracleValue::Raw(bytes) => {
            if bytes.len() as u64 > env.max_string_bytes() as u64 {
                var_type = DataType::LongBinary.variable_type();
            }
            bytes.len() as u32
        }
        OracleValue::Array(items) => {
            num_elements = items.len() as u32;
            var_type.element_length
        }
        _ => var_type.element_length,
    };
    let mut var = Variable::new(env.clone(), num_elements, var_type, length)?;
    if matches!(value, OracleValue::Array(_)) {
        var.make_array()?;
    }
    var.set_value(array_pos, value)?;
    Ok(var)
}

fn variable_from_input_size(
    arena: &mut VariableArena,
    env: &Arc<Environment>,
    size: &InputSize,
    bind_array_size: u32,
    numbers_as_strings: bool,
) -> Result<VarId> {
    let var = match size {
        InputSize::Var(id) => {
            arena.get(*id)?;
            return Ok(*id);
        }
        InputSize::Length(length) => {
            let data_type = if *length > MAX_STRING_CHARS {
                DataType::LongString
            } else {
                DataType::String
            };
            Variable::new(env.clone(), bind_array_size, data_type.variable_type(), *length)?
        }
        InputSize::Type(data_type) => {
            let var_type = resolve_by_host_type(*data_type, numbers_as_strings)?;
            Variable::new(env.clone(), bind_array_size, var_type, var_type.element_length)?
        }
        InputSize::Array(data_type, count) => {
            let var_type = resolve_by_host_type(*data_type, numbers_as_strings)?;
            let mut var = Variable::new(env.clone(), *count, var_type, var_type.element_length)?;
            var.make_array()?;
            var
        }
    };
    Ok(arena.insert(var, Origin::Internal))
}
