//! Per-type variable behaviour: descriptor lifetime, value conversion in
//! and out of element buffers, and define-time narrowing.

use tracing::trace;

use super::Variable;
use crate::codec::{
    decode_oracle_date, decode_oracle_number, decode_oracle_timestamp, encode_oracle_date,
    encode_oracle_float, encode_oracle_integer, encode_oracle_number, encode_oracle_timestamp,
};
use crate::error::{Error, Result};
use crate::native::constants::*;
use crate::native::HandleKind;
use crate::types::{ColumnMetadata, DataType, LobHandle, LobKind, OracleValue, RefCursor};

fn handle_kind(data_type: DataType) -> Option<HandleKind> {
    match data_type {
        DataType::Clob | DataType::Nclob | DataType::Blob => Some(HandleKind::Lob),
        DataType::Bfile => Some(HandleKind::File),
        DataType::Cursor => Some(HandleKind::Statement),
        _ => None,
    }
}

/// Allocate one descriptor per element for handle-holding types.
pub(super) fn initialize(var: &mut Variable) -> Result<()> {
    let Some(kind) = handle_kind(var.var_type.data_type) else {
        return Ok(());
    };
    for pos in 0..var.allocated_elements {
        let handle = var.env.alloc_handle(kind)?;
        var.store_handle(pos, handle);
    }
    trace!(?kind, count = var.allocated_elements, "allocated descriptors");
    Ok(())
}

/// Release every descriptor still held by the variable.
pub(super) fn finalize(var: &mut Variable) {
    let Some(kind) = handle_kind(var.var_type.data_type) else {
        return;
    };
    for pos in 0..var.allocated_elements {
        let handle = var.load_handle(pos);
        if handle != 0 {
            var.env.free_handle(kind, handle);
            var.store_handle(pos, 0);
        }
    }
}

pub(super) fn pre_define(var: &mut Variable, meta: &ColumnMetadata) {
    if var.var_type.data_type != DataType::Number {
        return;
    }
    if let Some(narrowed) = var.env.number_narrowing().narrow(meta.precision, meta.scale) {
        trace!(column = %meta.name, ?narrowed, "narrowed NUMBER column");
        var.var_type = narrowed.variable_type();
    }
}

fn expecting(what: &str, value: &OracleValue) -> Error {
    Error::type_error(format!("expecting {} data, got {}", what, value.type_name()))
}

fn set_bytes(var: &mut Variable, pos: u32, bytes: &[u8], limit: u64, what: &str) -> Result<()> {
    if bytes.len() as u64 > limit {
        return Err(Error::data(format!("{} data too large", what)));
    }
    let len = bytes.len() as u32;
    if len > var.max_length {
        var.resize(len)?;
    }
    var.element_mut(pos)[..bytes.len()].copy_from_slice(bytes);
    var.set_length(pos, len);
    Ok(())
}

/// Long values carry a 4-byte little-endian length ahead of the data.
fn set_long(var: &mut Variable, pos: u32, bytes: &[u8]) -> Result<()> {
    let needed = bytes.len() as u64 + LONG_LENGTH_HEADER as u64;
    if needed > i32::MAX as u64 {
        return Err(Error::Allocation { requested: needed });
    }
    if needed as u32 > var.max_length {
        var.resize(needed as u32)?;
    }
    let header = LONG_LENGTH_HEADER as usize;
    let element = var.element_mut(pos);
    element[..header].copy_from_slice(&(bytes.len() as u32).to_le_bytes());
    element[header..header + bytes.len()].copy_from_slice(bytes);
    var.set_length(pos, needed as u32);
    Ok(())
}

fn write_varnum(var: &mut Variable, pos: u32, number: &[u8]) {
    let element = var.element_mut(pos);
    element[0] = number.len() as u8;
    element[1..=number.len()].copy_from_slice(number);
}

pub(super) fn set_value(var: &mut Variable, pos: u32, value: &OracleValue) -> Result<()> {
    match var.var_type.data_type {
        DataType::String | DataType::NationalCharString | DataType::FixedChar | DataType::Rowid => {
            let OracleValue::String(s) = value else {
                return Err(expecting("string", value));
            };
            let limit = MAX_STRING_CHARS as u64 * var.env.max_bytes_per_character() as u64;
            set_bytes(var, pos, s.as_bytes(), limit, "string")
        }
        DataType::Binary => {
            let OracleValue::Raw(bytes) = value else {
                return Err(expecting("binary", value));
            };
            set_bytes(var, pos, bytes, MAX_BINARY_BYTES as u64, "binary")
        }
        DataType::LongString => match value {
            OracleValue::String(s) => set_long(var, pos, s.as_bytes()),
            other => Err(expecting("string", other)),
        },
        DataType::LongBinary => match value {
            OracleValue::Raw(bytes) => set_long(var, pos, bytes),
            other => Err(expecting("binary", other)),
        },
        DataType::Number
        | DataType::Integer
        | DataType::LongInteger
        | DataType::Decimal
        | DataType::Boolean => {
            let number = match value {
                OracleValue::Integer(i) => encode_oracle_integer(*i)?,
                OracleValue::Float(f) => encode_oracle_float(*f)?,
                OracleValue::Number(text) => encode_oracle_number(text)?,
                OracleValue::Boolean(b) => encode_oracle_integer(*b as i64)?,
                other => return Err(expecting("numeric", other)),
            };
            write_varnum(var, pos, &number);
            Ok(())
        }
        DataType::NativeFloat => {
            let OracleValue::Float(f) = value else {
                return Err(expecting("float", value));
            };
            var.element_mut(pos)[..8].copy_from_slice(&f.to_ne_bytes());
            Ok(())
        }
        DataType::DateTime => {
            let (OracleValue::Date(dt) | OracleValue::Timestamp(dt)) = value else {
                return Err(expecting("date", value));
            };
            let encoded = encode_oracle_date(dt)?;
            var.element_mut(pos)[..encoded.len()].copy_from_slice(&encoded);
            Ok(())
        }
        DataType::Timestamp => {
            let (OracleValue::Date(dt) | OracleValue::Timestamp(dt)) = value else {
                return Err(expecting("timestamp", value));
            };
            let encoded = encode_oracle_timestamp(dt)?;
            var.element_mut(pos)[..encoded.len()].copy_from_slice(&encoded);
            Ok(())
        }
        DataType::Clob | DataType::Nclob | DataType::Blob | DataType::Bfile => Err(
            Error::type_error("LOB variables cannot be set directly; write through a LOB handle"),
        ),
        DataType::Cursor => Err(Error::type_error("cursor variables are output only")),
    }
}

fn read_varnum(var: &Variable, pos: u32) -> Result<String> {
    let element = var.element(pos);
    let len = element[0] as usize;
    if len == 0 || len >= element.len() {
        return Err(Error::data(format!("invalid NUMBER length {}", len)));
    }
    decode_oracle_number(&element[1..=len])
}

fn parse_float(text: &str) -> Result<f64> {
    text.parse()
        .map_err(|_| Error::data(format!("cannot convert {} to float", text)))
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::data(format!("invalid character data: {}", e)))
}

fn long_payload(var: &Variable, pos: u32) -> Result<&[u8]> {
    let header = LONG_LENGTH_HEADER as usize;
    let element = var.element(pos);
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&element[..header]);
    let len = u32::from_le_bytes(raw) as usize;
    element
        .get(header..header + len)
        .ok_or_else(|| Error::data(format!("long value length {} exceeds buffer", len)))
}

fn owning_var(var: &Variable) -> Result<crate::variable::VarId> {
    var.id
        .ok_or_else(|| Error::programming("variable is not attached to a cursor"))
}

pub(super) fn get_value(var: &Variable, pos: u32) -> Result<OracleValue> {
    let value = match var.var_type.data_type {
        DataType::String | DataType::NationalCharString | DataType::FixedChar | DataType::Rowid => {
            let len = var.length(pos) as usize;
            OracleValue::String(utf8(&var.element(pos)[..len])?)
        }
        DataType::Binary => {
            let len = var.length(pos) as usize;
            OracleValue::Raw(var.element(pos)[..len].to_vec())
        }
        DataType::LongString => OracleValue::String(utf8(long_payload(var, pos)?)?),
        DataType::LongBinary => OracleValue::Raw(long_payload(var, pos)?.to_vec()),
        DataType::Number => OracleValue::Float(parse_float(&read_varnum(var, pos)?)?),
        DataType::Integer | DataType::LongInteger => {
            let text = read_varnum(var, pos)?;
            match text.parse::<i64>() {
                Ok(i) => OracleValue::Integer(i),
                Err(_) if text.contains('.') => OracleValue::Float(parse_float(&text)?),
                Err(_) => OracleValue::Number(text),
            }
        }
        DataType::Decimal => OracleValue::Number(read_varnum(var, pos)?),
        DataType::Boolean => OracleValue::Boolean(read_varnum(var, pos)? != "0"),
        DataType::NativeFloat => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&var.element(pos)[..8]);
            OracleValue::Float(f64::from_ne_bytes(raw))
        }
        DataType::DateTime => {
            OracleValue::Date(decode_oracle_date(&var.element(pos)[..DATE_SIZE as usize])?)
        }
        DataType::Timestamp => OracleValue::Timestamp(decode_oracle_timestamp(
            &var.element(pos)[..TIMESTAMP_SIZE as usize],
        )?),
        DataType::Clob | DataType::Nclob | DataType::Blob | DataType::Bfile => {
            let kind = LobKind::from_data_type(var.var_type.data_type)
                .ok_or_else(|| Error::programming("not a LOB variable"))?;
            OracleValue::Lob(LobHandle {
                var: owning_var(var)?,
                position: pos,
                generation: var.fetch_generation,
                kind,
                locator: var.load_handle(pos),
            })
        }
        DataType::Cursor => OracleValue::Cursor(RefCursor {
            var: owning_var(var)?,
            position: pos,
            handle: var.load_handle(pos),
        }),
    };
    Ok(value)
}
