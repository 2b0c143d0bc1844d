//! Variables: typed, array-oriented bind and define buffers.
//!
//! A variable owns a contiguous buffer of `allocated_elements` fixed-stride
//! elements plus parallel null-indicator arrays, and (for variable-length
//! types) per-element actual-length and return-code arrays. Per-type
//! behaviour lives in [`hooks`] and is dispatched on the variable's
//! [`DataType`].
//!
//! A variable is attached to at most one bind target at a time. Binding is
//! idempotent for the same target on the same prepared statement; resizing a
//! bound variable marks it for rebinding so the native layer records the new
//! stride before the next execute.

mod arena;
mod hooks;

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tracing::trace;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::native::constants::*;
use crate::native::{BindAttribute, BindTarget, BufferSpec, BufferView, Handle, NativeStatement};
use crate::types::{ColumnMetadata, DataType, OracleValue, VariableType};

pub use arena::VarId;
pub(crate) use arena::{Origin, VariableArena};

/// Current attachment of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    target: BindTarget,
    /// Prepare generation of the statement the bind was recorded against.
    statement: u64,
}

struct ElementCopy {
    indicator: i16,
    actual_length: Option<u32>,
    return_code: Option<u16>,
    bytes: Vec<u8>,
}

/// One element captured for copying between variables, with the source
/// layout needed to validate the copy.
pub(crate) struct ElementSnapshot {
    var_type: &'static VariableType,
    max_length: u32,
    element: Option<ElementCopy>,
}

/// A typed bind or define buffer.
pub struct Variable {
    env: Arc<Environment>,
    var_type: &'static VariableType,
    pub(crate) id: Option<VarId>,
    allocated_elements: u32,
    actual_elements: u32,
    max_length: u32,
    data: Vec<u8>,
    indicator: Vec<i16>,
    actual_length: Option<Vec<u32>>,
    return_code: Option<Vec<u16>>,
    binding: Option<Binding>,
    rebind_pending: bool,
    is_array: bool,
    fetch_generation: u32,
}

fn allocate<T: Clone>(count: usize, fill: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(count).map_err(|_| Error::NoMemory {
        requested: count.saturating_mul(std::mem::size_of::<T>()),
    })?;
    buf.resize(count, fill);
    Ok(buf)
}

fn buffer_size(elements: u32, length: u32) -> Result<usize> {
    let total = elements as u64 * length as u64;
    if total > i32::MAX as u64 {
        return Err(Error::Allocation { requested: total });
    }
    Ok(total as usize)
}

impl Variable {
    /// Allocate a variable of `num_elements` elements (at least one).
    ///
    /// For variable-length types the stride is `element_length` (at least 2)
    /// times the environment's maximum bytes per character; fixed-length types
    /// always use their registry length.
    pub fn new(
        env: Arc<Environment>,
        num_elements: u32,
        var_type: &'static VariableType,
        element_length: u32,
    ) -> Result<Self> {
        let allocated_elements = num_elements.max(1);
        let max_length = if var_type.is_variable_length {
            let requested = element_length.max(2) as u64 * env.max_bytes_per_character() as u64;
            if requested > i32::MAX as u64 {
                return Err(Error::Allocation {
                    requested: requested * allocated_elements as u64,
                });
            }
            requested as u32
        } else {
            var_type.element_length
        };

        let data = allocate(buffer_size(allocated_elements, max_length)?, 0u8)?;
        let indicator = allocate(allocated_elements as usize, IND_NULL)?;
        let (actual_length, return_code) = if var_type.is_variable_length {
            (
                Some(allocate(allocated_elements as usize, 0u32)?),
                Some(allocate(allocated_elements as usize, 0u16)?),
            )
        } else {
            (None, None)
        };

        let mut var = Self {
            env,
            var_type,
            id: None,
            allocated_elements,
            actual_elements: 0,
            max_length,
            data,
            indicator,
            actual_length,
            return_code,
            binding: None,
            rebind_pending: false,
            is_array: false,
            fetch_generation: 0,
        };
        hooks::initialize(&mut var)?;
        trace!(
            var_type = var_type.name,
            elements = allocated_elements,
            max_length,
            "created variable"
        );
        Ok(var)
    }

    pub fn id(&self) -> Option<VarId> {
        self.id
    }

    pub fn var_type(&self) -> &'static VariableType {
        self.var_type
    }

    pub fn data_type(&self) -> DataType {
        self.var_type.data_type
    }

    pub fn allocated_elements(&self) -> u32 {
        self.allocated_elements
    }

    pub fn actual_elements(&self) -> u32 {
        self.actual_elements
    }

    /// Current per-element stride in bytes.
    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Number of fetches that have repopulated this variable.
    pub fn fetch_generation(&self) -> u32 {
        self.fetch_generation
    }

    pub fn bound_target(&self) -> Option<&BindTarget> {
        self.binding.as_ref().map(|b| &b.target)
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// Turn this variable into a PL/SQL array parameter.
    pub fn make_array(&mut self) -> Result<()> {
        if !self.var_type.can_be_in_array {
            return Err(Error::not_supported(format!(
                "variable type {} does not support arrays",
                self.var_type.name
            )));
        }
        self.is_array = true;
        Ok(())
    }

    fn element_range(&self, pos: u32) -> Range<usize> {
        let start = pos as usize * self.max_length as usize;
        start..start + self.max_length as usize
    }

    pub(crate) fn element(&self, pos: u32) -> &[u8] {
        &self.data[self.element_range(pos)]
    }

    pub(crate) fn element_mut(&mut self, pos: u32) -> &mut [u8] {
        let range = self.element_range(pos);
        &mut self.data[range]
    }

    /// Stored byte length of a variable-length element.
    pub(crate) fn length(&self, pos: u32) -> u32 {
        self.actual_length
            .as_ref()
            .map_or(self.max_length, |lengths| lengths[pos as usize])
    }

    pub(crate) fn set_length(&mut self, pos: u32, len: u32) {
        if let Some(lengths) = self.actual_length.as_mut() {
            lengths[pos as usize] = len;
        }
    }

    pub(crate) fn load_handle(&self, pos: u32) -> Handle {
        let mut raw = [0u8; HANDLE_SIZE as usize];
        raw.copy_from_slice(&self.element(pos)[..HANDLE_SIZE as usize]);
        Handle::from_le_bytes(raw)
    }

    pub(crate) fn store_handle(&mut self, pos: u32, handle: Handle) {
        self.element_mut(pos)[..HANDLE_SIZE as usize].copy_from_slice(&handle.to_le_bytes());
    }

    pub fn is_null(&self, pos: u32) -> bool {
        self.indicator
            .get(pos as usize)
            .map_or(true, |ind| *ind == IND_NULL)
    }

    /// Grow the element stride, preserving every element's bytes.
    pub fn resize(&mut self, new_length: u32) -> Result<()> {
        if new_length <= self.max_length {
            return Ok(());
        }
        let old_length = self.max_length as usize;
        let mut data = allocate(buffer_size(self.allocated_elements, new_length)?, 0u8)?;
        for (old, new) in self
            .data
            .chunks_exact(old_length)
            .zip(data.chunks_exact_mut(new_length as usize))
        {
            new[..old_length].copy_from_slice(old);
        }
        self.data = data;
        self.max_length = new_length;
        if self.binding.is_some() {
            self.rebind_pending = true;
        }
        trace!(
            var_type = self.var_type.name,
            old_length,
            new_length,
            "resized variable"
        );
        Ok(())
    }

    /// Set the value at `pos`. Array variables take an array value at position 0.
    pub fn set_value(&mut self, pos: u32, value: &OracleValue) -> Result<()> {
        if self.is_array {
            if pos > 0 {
                return Err(Error::not_supported("arrays of arrays are not supported"));
            }
            return match value {
                OracleValue::Array(items) => self.set_array_value(items),
                other => Err(Error::type_error(format!(
                    "expecting array data, got {}",
                    other.type_name()
                ))),
            };
        }
        self.set_single_value(pos, value)
    }

    fn set_single_value(&mut self, pos: u32, value: &OracleValue) -> Result<()> {
        if pos >= self.allocated_elements {
            return Err(Error::index("array size exceeded"));
        }
        if value.is_null() {
            self.indicator[pos as usize] = IND_NULL;
            return Ok(());
        }
        self.indicator[pos as usize] = IND_NOT_NULL;
        if let Some(codes) = self.return_code.as_mut() {
            codes[pos as usize] = 0;
        }
        hooks::set_value(self, pos, value)
    }

    /// Set every element from `values`, recording how many were supplied.
    pub fn set_array_value(&mut self, values: &[OracleValue]) -> Result<()> {
        if values.len() > self.allocated_elements as usize {
            return Err(Error::index("array size exceeded"));
        }
        self.actual_elements = values.len() as u32;
        for (pos, value) in values.iter().enumerate() {
            self.set_single_value(pos as u32, value)?;
        }
        Ok(())
    }

    /// Get the value at `pos`. Array variables return all populated elements.
    pub fn get_value(&self, pos: u32) -> Result<OracleValue> {
        if self.is_array {
            return self.get_array_value(self.actual_elements);
        }
        self.get_single_value(pos)
    }

    fn get_single_value(&self, pos: u32) -> Result<OracleValue> {
        if pos >= self.allocated_elements {
            return Err(Error::index("array size exceeded"));
        }
        if self.indicator[pos as usize] == IND_NULL {
            return Ok(OracleValue::Null);
        }
        if let Some(code) = self.return_code.as_ref().map(|c| c[pos as usize]) {
            if code != 0 {
                return Err(Error::data(format!(
                    "column at array pos {} fetched with error: {}",
                    pos, code
                )));
            }
        }
        hooks::get_value(self, pos)
    }

    /// The first `count` elements as an array value.
    pub fn get_array_value(&self, count: u32) -> Result<OracleValue> {
        (0..count)
            .map(|pos| self.get_single_value(pos))
            .collect::<Result<Vec<_>>>()
            .map(OracleValue::Array)
    }

    /// Capture one element for a later [`Variable::paste`].
    pub(crate) fn snapshot(&self, pos: u32) -> ElementSnapshot {
        let element = (pos < self.allocated_elements).then(|| {
            let p = pos as usize;
            ElementCopy {
                indicator: self.indicator[p],
                actual_length: self.actual_length.as_ref().map(|l| l[p]),
                return_code: self.return_code.as_ref().map(|c| c[p]),
                bytes: self.element(pos).to_vec(),
            }
        });
        ElementSnapshot {
            var_type: self.var_type,
            max_length: self.max_length,
            element,
        }
    }

    /// Store a captured element at `target_pos`.
    pub(crate) fn paste(&mut self, source: ElementSnapshot, target_pos: u32) -> Result<()> {
        if source.var_type.data_type != self.var_type.data_type {
            return Err(Error::programming("variable types do not match"));
        }
        if !self.var_type.can_be_copied {
            return Err(Error::programming(format!(
                "variable type {} does not support copying",
                self.var_type.name
            )));
        }
        let element = source
            .element
            .ok_or_else(|| Error::index("source array size exceeded"))?;
        if target_pos >= self.allocated_elements {
            return Err(Error::index("target array size exceeded"));
        }
        if self.max_length < source.max_length {
            return Err(Error::programming(
                "target variable has insufficient space to copy source data",
            ));
        }
        let p = target_pos as usize;
        self.indicator[p] = element.indicator;
        if element.indicator != IND_NULL {
            if let (Some(lengths), Some(len)) = (self.actual_length.as_mut(), element.actual_length) {
                lengths[p] = len;
            }
            if let (Some(codes), Some(code)) = (self.return_code.as_mut(), element.return_code) {
                codes[p] = code;
            }
            self.element_mut(target_pos)[..element.bytes.len()].copy_from_slice(&element.bytes);
        }
        Ok(())
    }

    /// Copy one element from `source` into this variable.
    pub fn copy_element(&mut self, source: &Variable, source_pos: u32, target_pos: u32) -> Result<()> {
        self.paste(source.snapshot(source_pos), target_pos)
    }

    fn buffer_spec(&self) -> BufferSpec {
        BufferSpec {
            wire_type: self.var_type.wire_type,
            element_size: self.max_length,
            array_capacity: self.is_array.then_some(self.allocated_elements),
        }
    }

    /// Attach this variable to `target` of the statement prepared as
    /// `statement_generation`. A no-op when already attached there.
    pub fn bind<S: NativeStatement>(
        &mut self,
        stmt: &mut S,
        statement_generation: u64,
        target: BindTarget,
    ) -> Result<()> {
        let binding = Binding {
            target,
            statement: statement_generation,
        };
        if !self.rebind_pending && self.binding.as_ref() == Some(&binding) {
            return Ok(());
        }
        self.internal_bind(stmt, &binding.target)?;
        self.binding = Some(binding);
        Ok(())
    }

    fn internal_bind<S: NativeStatement>(&mut self, stmt: &mut S, target: &BindTarget) -> Result<()> {
        let spec = self.buffer_spec();
        stmt.bind(target, &spec)?;
        if self.var_type.charset_form != SQLCS_IMPLICIT {
            stmt.set_bind_attribute(target, BindAttribute::CharsetForm(self.var_type.charset_form))?;
        }
        if matches!(self.var_type.data_type, DataType::String | DataType::FixedChar)
            && self.max_length > self.var_type.element_length
        {
            stmt.set_bind_attribute(target, BindAttribute::MaxDataSize(self.var_type.element_length))?;
        }
        self.rebind_pending = false;
        trace!(%target, wire_type = spec.wire_type, element_size = spec.element_size, "bound variable");
        Ok(())
    }

    /// Forget the current attachment.
    pub(crate) fn clear_binding(&mut self) {
        self.binding = None;
        self.rebind_pending = false;
    }

    /// Record this variable as the define buffer of a select-list column.
    pub(crate) fn define<S: NativeStatement>(&mut self, stmt: &mut S, position: u32) -> Result<()> {
        stmt.define(position, &self.buffer_spec())
    }

    /// Adjust the type from describe information before defining.
    pub(crate) fn pre_define(&mut self, meta: &ColumnMetadata) {
        hooks::pre_define(self, meta)
    }

    /// Called before each fetch repopulates the buffer.
    pub(crate) fn mark_fetched(&mut self) {
        self.fetch_generation = self.fetch_generation.wrapping_add(1);
    }

    pub(crate) fn buffer_view(&mut self, target: BindTarget) -> BufferView<'_> {
        BufferView {
            target,
            wire_type: self.var_type.wire_type,
            element_size: self.max_length as usize,
            data: &mut self.data,
            indicator: &mut self.indicator,
            actual_length: self.actual_length.as_deref_mut(),
            return_code: self.return_code.as_deref_mut(),
            actual_elements: if self.is_array {
                Some(&mut self.actual_elements)
            } else {
                None
            },
        }
    }
}

impl Drop for Variable {
    fn drop(&mut self) {
        hooks::finalize(self);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("type", &self.var_type.name)
            .field("allocated_elements", &self.allocated_elements)
            .field("actual_elements", &self.actual_elements)
            .field("max_length", &self.max_length)
            .field("is_array", &self.is_array)
            .field("binding", &self.binding)
            .finish()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_value(0) {
            Ok(value) => write!(f, "<{} with value {}>", self.var_type.name, value),
            Err(_) => write!(f, "<{} with unreadable value>", self.var_type.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::native::testing::{test_env, RecordingStatement};
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;

    fn var(data_type: DataType, elements: u32, length: u32) -> Variable {
        let (env, _) = test_env();
        Variable::new(env, elements, data_type.variable_type(), length).unwrap()
    }

    #[test]
    fn test_new_applies_character_width_and_minimum() {
        let v = var(DataType::String, 3, 1);
        assert_eq!(v.max_length(), 8);
        assert_eq!(v.allocated_elements(), 3);
        assert!((0..3).all(|pos| v.is_null(pos)));

        let n = var(DataType::Number, 0, 999);
        assert_eq!(n.allocated_elements(), 1);
        assert_eq!(n.max_length(), VARNUM_SIZE);
    }

    #[test]
    fn test_new_rejects_oversized_buffers() {
        let (env, _) = test_env();
        let err = Variable::new(env, u32::MAX, DataType::String.variable_type(), 4000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Allocation);
    }

    #[test]
    fn test_roundtrip_supported_values() {
        let when = NaiveDate::from_ymd_opt(2021, 7, 4)
            .unwrap()
            .and_hms_nano_opt(10, 11, 12, 500_000_000)
            .unwrap();
        let cases = [
            (DataType::String, OracleValue::String("hello".into())),
            (DataType::NationalCharString, OracleValue::String("grüße".into())),
            (DataType::Binary, OracleValue::Raw(vec![0, 1, 2, 255])),
            (DataType::LongString, OracleValue::String("x".repeat(500))),
            (DataType::LongBinary, OracleValue::Raw(vec![7; 300])),
            (DataType::Number, OracleValue::Float(-12.625)),
            (DataType::Integer, OracleValue::Integer(-987654321)),
            (DataType::LongInteger, OracleValue::Integer(i64::MAX)),
            (DataType::Decimal, OracleValue::Number("1234567890.0987654321".into())),
            (DataType::Boolean, OracleValue::Boolean(true)),
            (DataType::NativeFloat, OracleValue::Float(6.02e23)),
            (DataType::Timestamp, OracleValue::Timestamp(when)),
        ];
        for (data_type, value) in cases {
            let mut v = var(data_type, 2, data_type.variable_type().element_length.min(64));
            v.set_value(1, &value).unwrap();
            assert_eq!(v.get_value(1).unwrap(), value, "roundtrip for {:?}", data_type);
        }

        let date = when.date().and_hms_opt(10, 11, 12).unwrap();
        let mut v = var(DataType::DateTime, 1, 0);
        v.set_value(0, &OracleValue::Date(date)).unwrap();
        assert_eq!(v.get_value(0).unwrap(), OracleValue::Date(date));
    }

    #[test]
    fn test_long_integer_overflow_keeps_text() {
        let mut v = var(DataType::LongInteger, 1, 0);
        let big = "123456789012345678901234567890";
        v.set_value(0, &OracleValue::Number(big.into())).unwrap();
        assert_eq!(v.get_value(0).unwrap(), OracleValue::Number(big.into()));

        v.set_value(0, &OracleValue::Number("2.5".into())).unwrap();
        assert_eq!(v.get_value(0).unwrap(), OracleValue::Float(2.5));
    }

    #[test]
    fn test_null_skips_type_hooks() {
        // LOB set hooks always reject values; a null must never reach them.
        let mut lob = var(DataType::Blob, 2, 0);
        lob.set_value(0, &OracleValue::Null).unwrap();
        assert_eq!(lob.get_value(0).unwrap(), OracleValue::Null);
        assert_eq!(
            lob.set_value(0, &OracleValue::Raw(vec![1])).unwrap_err().kind(),
            ErrorKind::Type
        );

        let mut s = var(DataType::String, 1, 10);
        s.set_value(0, &OracleValue::String("abc".into())).unwrap();
        s.set_value(0, &OracleValue::Null).unwrap();
        assert_eq!(s.get_value(0).unwrap(), OracleValue::Null);
    }

    #[test]
    fn test_type_mismatch_is_type_error() {
        let mut v = var(DataType::Number, 1, 0);
        let err = v.set_value(0, &OracleValue::String("1".into())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(
            v.set_value(0, &OracleValue::Array(vec![])).unwrap_err().kind(),
            ErrorKind::Type
        );
    }

    #[test]
    fn test_position_out_of_range() {
        let mut v = var(DataType::String, 2, 10);
        assert_eq!(
            v.set_value(2, &OracleValue::String("x".into())).unwrap_err().kind(),
            ErrorKind::Index
        );
        assert_eq!(v.get_value(5).unwrap_err().kind(), ErrorKind::Index);
    }

    #[test]
    fn test_fetch_error_status_is_data_error() {
        let mut v = var(DataType::String, 1, 4);
        v.set_value(0, &OracleValue::String("ab".into())).unwrap();
        v.return_code.as_mut().unwrap()[0] = RC_TRUNCATED;
        let err = v.get_value(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.to_string().contains("fetched with error: 1406"));

        // setting a value clears the recorded status
        v.set_value(0, &OracleValue::String("cd".into())).unwrap();
        assert_eq!(v.get_value(0).unwrap(), OracleValue::String("cd".into()));
    }

    #[test]
    fn test_resize_preserves_values_and_nulls() {
        let mut v = var(DataType::String, 3, 2);
        v.set_value(0, &OracleValue::String("ab".into())).unwrap();
        v.set_value(2, &OracleValue::String("cdefgh".into())).unwrap();
        let before = v.max_length();
        v.resize(before * 4).unwrap();
        assert_eq!(v.max_length(), before * 4);
        assert_eq!(v.get_value(0).unwrap(), OracleValue::String("ab".into()));
        assert!(v.is_null(1));
        assert_eq!(v.get_value(2).unwrap(), OracleValue::String("cdefgh".into()));
    }

    #[test]
    fn test_set_grows_stride() {
        let mut v = var(DataType::String, 2, 1);
        v.set_value(0, &OracleValue::String("a".into())).unwrap();
        let long = "z".repeat(50);
        v.set_value(1, &OracleValue::String(long.clone())).unwrap();
        assert_eq!(v.max_length(), 50);
        assert_eq!(v.get_value(0).unwrap(), OracleValue::String("a".into()));
        assert_eq!(v.get_value(1).unwrap(), OracleValue::String(long));
    }

    #[test]
    fn test_string_too_large() {
        let mut v = var(DataType::String, 1, 10);
        let huge = "x".repeat((MAX_STRING_CHARS * 4 + 1) as usize);
        assert_eq!(
            v.set_value(0, &OracleValue::String(huge)).unwrap_err().kind(),
            ErrorKind::Data
        );
    }

    #[test]
    fn test_array_values() {
        let mut v = var(DataType::Integer, 4, 0);
        v.make_array().unwrap();
        let items = vec![OracleValue::Integer(1), OracleValue::Null, OracleValue::Integer(3)];
        v.set_value(0, &OracleValue::Array(items.clone())).unwrap();
        assert_eq!(v.actual_elements(), 3);
        assert_eq!(v.get_value(0).unwrap(), OracleValue::Array(items));

        let too_many = OracleValue::Array(vec![OracleValue::Integer(0); 5]);
        assert_eq!(v.set_value(0, &too_many).unwrap_err().kind(), ErrorKind::Index);
        assert_eq!(
            v.set_value(0, &OracleValue::Integer(1)).unwrap_err().kind(),
            ErrorKind::Type
        );
        assert_eq!(
            v.set_value(1, &OracleValue::Array(vec![])).unwrap_err().kind(),
            ErrorKind::NotSupported
        );
    }

    #[test]
    fn test_make_array_rejected_for_lobs() {
        let mut v = var(DataType::Clob, 1, 0);
        assert_eq!(v.make_array().unwrap_err().kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn test_copy_element() {
        let mut source = var(DataType::String, 2, 10);
        source.set_value(1, &OracleValue::String("copied".into())).unwrap();
        let mut target = var(DataType::String, 3, 10);
        target.copy_element(&source, 1, 2).unwrap();
        assert_eq!(target.get_value(2).unwrap(), OracleValue::String("copied".into()));
        assert_eq!(target.element(2), source.element(1));
        assert_eq!(target.length(2), source.length(1));

        target.copy_element(&source, 0, 2).unwrap();
        assert!(target.is_null(2));

        let number = var(DataType::Number, 1, 0);
        assert_eq!(
            target.copy_element(&number, 0, 0).unwrap_err().kind(),
            ErrorKind::Programming
        );
        assert_eq!(target.copy_element(&source, 2, 0).unwrap_err().kind(), ErrorKind::Index);
        assert_eq!(target.copy_element(&source, 0, 3).unwrap_err().kind(), ErrorKind::Index);

        let mut narrow = var(DataType::String, 1, 2);
        assert_eq!(
            narrow.copy_element(&source, 1, 0).unwrap_err().kind(),
            ErrorKind::Programming
        );
    }

    #[test]
    fn test_copy_element_rejects_uncopyable_types() {
        let source = var(DataType::Cursor, 1, 0);
        let mut target = var(DataType::Cursor, 1, 0);
        let err = target.copy_element(&source, 0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Programming);
        assert!(err.to_string().contains("does not support copying"));
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut stmt = RecordingStatement::default();
        let mut v = var(DataType::Integer, 1, 0);
        v.bind(&mut stmt, 1, BindTarget::Position(1)).unwrap();
        v.bind(&mut stmt, 1, BindTarget::Position(1)).unwrap();
        assert_eq!(stmt.binds.len(), 1);

        v.bind(&mut stmt, 1, BindTarget::Position(2)).unwrap();
        assert_eq!(stmt.binds.len(), 2);

        // a freshly prepared statement needs its own bind
        v.bind(&mut stmt, 2, BindTarget::Position(2)).unwrap();
        assert_eq!(stmt.binds.len(), 3);
    }

    #[test]
    fn test_resize_forces_one_rebind() {
        let mut stmt = RecordingStatement::default();
        let mut v = var(DataType::String, 1, 5);
        v.bind(&mut stmt, 1, BindTarget::Name("x".into())).unwrap();
        v.resize(100).unwrap();
        v.bind(&mut stmt, 1, BindTarget::Name("x".into())).unwrap();
        v.bind(&mut stmt, 1, BindTarget::Name("x".into())).unwrap();
        assert_eq!(stmt.binds.len(), 2);
        assert_eq!(stmt.binds[1].1.element_size, 100);
    }

    #[test]
    fn test_bind_attributes() {
        let mut stmt = RecordingStatement::default();
        let mut v = var(DataType::NationalCharString, 1, 10);
        v.bind(&mut stmt, 1, BindTarget::Position(1)).unwrap();
        assert_eq!(
            stmt.attributes,
            vec![(BindTarget::Position(1), BindAttribute::CharsetForm(SQLCS_NCHAR))]
        );

        let mut stmt = RecordingStatement::default();
        let mut v = var(DataType::String, 1, MAX_STRING_CHARS);
        v.bind(&mut stmt, 1, BindTarget::Position(1)).unwrap();
        assert_eq!(
            stmt.attributes,
            vec![(BindTarget::Position(1), BindAttribute::MaxDataSize(MAX_STRING_CHARS))]
        );
    }

    #[test]
    fn test_array_bind_spec() {
        let mut stmt = RecordingStatement::default();
        let mut v = var(DataType::Integer, 10, 0);
        v.make_array().unwrap();
        v.bind(&mut stmt, 1, BindTarget::Position(1)).unwrap();
        assert_eq!(stmt.binds[0].1.array_capacity, Some(10));
    }

    #[test]
    fn test_descriptors_released_on_drop() {
        let (env, alloc) = test_env();
        let v = Variable::new(env, 3, DataType::Clob.variable_type(), 0).unwrap();
        assert_eq!(alloc.live.load(Ordering::SeqCst), 3);
        drop(v);
        assert_eq!(alloc.live.load(Ordering::SeqCst), 0);
        assert_eq!(alloc.freed.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_pre_define_narrows_numbers() {
        let mut v = var(DataType::Number, 1, 0);
        v.pre_define(&ColumnMetadata::new("N", SQLT_NUM).with_precision(5, 0));
        assert_eq!(v.data_type(), DataType::Integer);

        let mut v = var(DataType::Number, 1, 0);
        v.pre_define(&ColumnMetadata::new("N", SQLT_NUM).with_precision(0, -127));
        assert_eq!(v.data_type(), DataType::LongInteger);

        let mut v = var(DataType::Decimal, 1, 0);
        v.pre_define(&ColumnMetadata::new("N", SQLT_NUM).with_precision(5, 0));
        assert_eq!(v.data_type(), DataType::Decimal);
    }

    #[test]
    fn test_display() {
        let mut v = var(DataType::Integer, 1, 0);
        v.set_value(0, &OracleValue::Integer(5)).unwrap();
        assert_eq!(v.to_string(), "<INTEGER with value 5>");
    }
}
