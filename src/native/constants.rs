//! Call-level interface constants.
//!
//! Values match the native library's headers so that a binding to the real
//! library can pass them through unchanged.

// Wire data types
pub const SQLT_CHR: u16 = 1;
pub const SQLT_NUM: u16 = 2;
pub const SQLT_INT: u16 = 3;
pub const SQLT_FLT: u16 = 4;
pub const SQLT_VNU: u16 = 6;
pub const SQLT_LNG: u16 = 8;
pub const SQLT_DAT: u16 = 12;
pub const SQLT_BFLOAT: u16 = 21;
pub const SQLT_BDOUBLE: u16 = 22;
pub const SQLT_BIN: u16 = 23;
pub const SQLT_LBI: u16 = 24;
pub const SQLT_LVC: u16 = 94;
pub const SQLT_LVB: u16 = 95;
pub const SQLT_AFC: u16 = 96;
pub const SQLT_IBFLOAT: u16 = 100;
pub const SQLT_IBDOUBLE: u16 = 101;
pub const SQLT_RDD: u16 = 104;
pub const SQLT_NTY: u16 = 108;
pub const SQLT_CLOB: u16 = 112;
pub const SQLT_BLOB: u16 = 113;
pub const SQLT_BFILE: u16 = 114;
pub const SQLT_RSET: u16 = 116;
pub const SQLT_ODT: u16 = 156;
pub const SQLT_TIMESTAMP: u16 = 187;
pub const SQLT_TIMESTAMP_TZ: u16 = 188;
pub const SQLT_TIMESTAMP_LTZ: u16 = 232;

// Character set forms
pub const SQLCS_IMPLICIT: u8 = 1;
pub const SQLCS_NCHAR: u8 = 2;

// Statement types reported by the statement type attribute
pub const STMT_SELECT: u16 = 1;
pub const STMT_UPDATE: u16 = 2;
pub const STMT_DELETE: u16 = 3;
pub const STMT_INSERT: u16 = 4;
pub const STMT_CREATE: u16 = 5;
pub const STMT_DROP: u16 = 6;
pub const STMT_ALTER: u16 = 7;
pub const STMT_BEGIN: u16 = 8;
pub const STMT_DECLARE: u16 = 9;
pub const STMT_CALL: u16 = 10;

// Null indicators
pub const IND_NULL: i16 = -1;
pub const IND_NOT_NULL: i16 = 0;

/// Return code recorded when a fetched value did not fit its buffer.
pub const RC_TRUNCATED: u16 = 1406;

/// Largest string, in characters, bound inline before switching to long strings.
pub const MAX_STRING_CHARS: u32 = 4000;
/// Largest inline raw value in bytes.
pub const MAX_BINARY_BYTES: u32 = 4000;
/// Default element size for long string and long binary variables.
pub const LONG_ELEMENT_LENGTH: u32 = 128 * 1024;
/// Length header carried at the start of each long element.
pub const LONG_LENGTH_HEADER: u32 = 4;

/// Size of an Oracle NUMBER in varnum form: one length byte and up to 21 bytes.
pub const VARNUM_SIZE: u32 = 22;
/// Size of an Oracle DATE.
pub const DATE_SIZE: u32 = 7;
/// Size of an Oracle TIMESTAMP with nanosecond fraction.
pub const TIMESTAMP_SIZE: u32 = 11;
/// Size of a native handle stored inside a variable buffer.
pub const HANDLE_SIZE: u32 = 8;
