//! LOB handle values.
//!
//! A [`LobHandle`] is what reading a LOB-typed variable element yields. It
//! names the variable, the element position, and the fetch generation the
//! locator belongs to; operations go through
//! [`Cursor::lob`](crate::cursor::Cursor::lob), which rejects handles whose
//! variable has since been refetched.

use crate::native::constants::{SQLCS_IMPLICIT, SQLCS_NCHAR};
use crate::native::Handle;
use crate::variable::VarId;

use super::data_type::DataType;

/// LOB flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobKind {
    Clob,
    Nclob,
    Blob,
    Bfile,
}

impl LobKind {
    pub fn from_data_type(data_type: DataType) -> Option<Self> {
        match data_type {
            DataType::Clob => Some(LobKind::Clob),
            DataType::Nclob => Some(LobKind::Nclob),
            DataType::Blob => Some(LobKind::Blob),
            DataType::Bfile => Some(LobKind::Bfile),
            _ => None,
        }
    }

    /// Character LOBs read and write text.
    pub fn is_character(&self) -> bool {
        matches!(self, LobKind::Clob | LobKind::Nclob)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, LobKind::Bfile)
    }

    pub fn charset_form(&self) -> u8 {
        match self {
            LobKind::Nclob => SQLCS_NCHAR,
            _ => SQLCS_IMPLICIT,
        }
    }
}

/// Reference to one LOB element of a variable at a given fetch generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobHandle {
    pub var: VarId,
    pub position: u32,
    pub generation: u32,
    pub kind: LobKind,
    pub locator: Handle,
}
