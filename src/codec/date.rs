//! Oracle DATE and TIMESTAMP codec.
//!
//! Oracle DATE is encoded as 7 bytes (big-endian):
//! - byte[0]: century + 100
//! - byte[1]: year (in century) + 100
//!
//! BC years are negative, so both year bytes fall below 100 for them
//! (-4712 is stored as 53, 88). Years map directly onto chrono's proleptic
//! calendar; Oracle has no year 0.
//! - byte[2]: month (1-12)
//! - byte[3]: day (1-31)
//! - byte[4]: hour + 1 (0-23)
//! - byte[5]: minute + 1 (0-59)
//! - byte[6]: second + 1 (0-59)
//!
//! TIMESTAMP appends the fractional second as a big-endian u32 of
//! nanoseconds, for 11 bytes in total.

use bytes::{Buf, BufMut, BytesMut};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Error, Result};

const DATE_LEN: usize = 7;
const TIMESTAMP_LEN: usize = 11;
const MIN_YEAR: i32 = -4712;
const MAX_YEAR: i32 = 9999;

/// Decode an Oracle DATE from 7 bytes.
///
/// # Errors
/// Returns `Error::Data` if data is not exactly 7 bytes or contains invalid values.
pub fn decode_oracle_date(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != DATE_LEN {
        return Err(Error::data(format!(
            "DATE value must be exactly 7 bytes, got {}",
            data.len()
        )));
    }
    decode_components(data, 0)
}

/// Decode an Oracle TIMESTAMP from 11 bytes (7 is accepted as a zero fraction).
pub fn decode_oracle_timestamp(data: &[u8]) -> Result<NaiveDateTime> {
    match data.len() {
        DATE_LEN => decode_components(data, 0),
        TIMESTAMP_LEN => {
            let nanos = (&data[DATE_LEN..]).get_u32();
            decode_components(&data[..DATE_LEN], nanos)
        }
        n => Err(Error::data(format!(
            "TIMESTAMP value must be 7 or 11 bytes, got {}",
            n
        ))),
    }
}

fn decode_components(data: &[u8], nanos: u32) -> Result<NaiveDateTime> {
    let year = (data[0] as i32 - 100) * 100 + (data[1] as i32 - 100);
    let month = data[2];
    let day = data[3];
    let (hour, minute, second) = (
        data[4].wrapping_sub(1),
        data[5].wrapping_sub(1),
        data[6].wrapping_sub(1),
    );

    let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
        Error::data(format!(
            "invalid date: year={}, month={}, day={}",
            year, month, day
        ))
    })?;
    let time = NaiveTime::from_hms_nano_opt(hour as u32, minute as u32, second as u32, nanos)
        .filter(|_| nanos < 1_000_000_000)
        .ok_or_else(|| {
            Error::data(format!(
                "invalid time: hour={}, minute={}, second={}, nanos={}",
                hour, minute, second, nanos
            ))
        })?;
    Ok(NaiveDateTime::new(date, time))
}

/// Encode a date-time as an Oracle DATE. Fractional seconds are dropped.
///
/// # Errors
/// Returns `Error::Data` for year 0 and years outside -4712..=9999.
pub fn encode_oracle_date(value: &NaiveDateTime) -> Result<[u8; 7]> {
    let year = value.year();
    if year == 0 || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(Error::data(format!("invalid date: year {} out of range", year)));
    }
    Ok([
        (year / 100 + 100) as u8,
        (year % 100 + 100) as u8,
        value.month() as u8,
        value.day() as u8,
        value.hour() as u8 + 1,
        value.minute() as u8 + 1,
        value.second() as u8 + 1,
    ])
}

/// Encode a date-time as an Oracle TIMESTAMP.
pub fn encode_oracle_timestamp(value: &NaiveDateTime) -> Result<[u8; 11]> {
    let date = encode_oracle_date(value)?;
    // Leap-second nanos (>= 1e9) are clamped to the last representable instant.
    let nanos = value.nanosecond().min(999_999_999);
    let mut buf = BytesMut::with_capacity(TIMESTAMP_LEN);
    buf.put_slice(&date);
    buf.put_u32(nanos);
    let mut out = [0u8; TIMESTAMP_LEN];
    out.copy_from_slice(&buf);
    Ok(out)
}
