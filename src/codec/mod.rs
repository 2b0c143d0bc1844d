//! Wire codecs for the fixed-layout Oracle types.
//!
//! | Oracle Type | Module |
//! |-------------|--------|
//! | NUMBER      | `number` |
//! | DATE, TIMESTAMP | `date` |
//!
//! String and raw types are stored as plain bytes and don't require
//! dedicated codecs.

mod date;
mod number;

pub use date::{
    decode_oracle_date, decode_oracle_timestamp, encode_oracle_date, encode_oracle_timestamp,
};
pub use number::{
    decode_oracle_number, encode_oracle_float, encode_oracle_integer, encode_oracle_number,
};
