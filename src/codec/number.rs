//! Oracle NUMBER codec.
//!
//! Oracle NUMBER is a variable-length format where:
//! - First byte is the base-100 exponent biased by 193 (bits inverted for
//!   negative numbers, high bit clear)
//! - Remaining bytes are base-100 digits of the mantissa, stored as
//!   `digit + 1` (positive) or `101 - digit` (negative)
//! - Negative numbers shorter than 21 bytes end with a 102 terminator

use crate::error::{Error, Result};

const EXPONENT_BIAS: i16 = 193;
const MAX_MANTISSA_PAIRS: usize = 20;
const NEGATIVE_TERMINATOR: u8 = 102;

/// Decode Oracle NUMBER bytes to a decimal string.
///
/// Preserves full precision by returning the number as a string.
pub fn decode_oracle_number(bytes: &[u8]) -> Result<String> {
    let Some((&exp_byte, rest)) = bytes.split_first() else {
        return Err(Error::data("empty NUMBER value"));
    };
    let is_positive = (exp_byte & 0x80) != 0;

    if rest.is_empty() {
        return if is_positive {
            Ok("0".to_string())
        } else {
            Err(Error::data("NUMBER value is negative infinity"))
        };
    }
    if is_positive && exp_byte == 0xFF && rest == [101] {
        return Err(Error::data("NUMBER value is positive infinity"));
    }

    let exponent = if is_positive {
        exp_byte as i16 - EXPONENT_BIAS
    } else {
        (!exp_byte) as i16 - EXPONENT_BIAS
    };

    let mantissa = match rest.split_last() {
        Some((&NEGATIVE_TERMINATOR, head)) if !is_positive => head,
        _ => rest,
    };

    let mut digits = Vec::with_capacity(mantissa.len() * 2);
    for &byte in mantissa {
        let pair = if is_positive {
            byte.wrapping_sub(1)
        } else {
            101u8.wrapping_sub(byte)
        };
        if pair > 99 {
            return Err(Error::data(format!("invalid NUMBER mantissa byte {}", byte)));
        }
        digits.push(pair / 10);
        digits.push(pair % 10);
    }

    // Digits before the decimal point.
    let mut decimal_point = (exponent + 1) * 2;
    while digits.first() == Some(&0) {
        digits.remove(0);
        decimal_point -= 1;
    }
    while digits.last() == Some(&0) {
        digits.pop();
    }
    if digits.is_empty() {
        return Ok("0".to_string());
    }

    let mut result = String::with_capacity(digits.len() + 4);
    if !is_positive {
        result.push('-');
    }
    let num_digits = digits.len() as i16;
    if decimal_point <= 0 {
        result.push_str("0.");
        for _ in decimal_point..0 {
            result.push('0');
        }
        result.extend(digits.iter().map(|d| (b'0' + d) as char));
    } else if decimal_point >= num_digits {
        result.extend(digits.iter().map(|d| (b'0' + d) as char));
        for _ in num_digits..decimal_point {
            result.push('0');
        }
    } else {
        for (i, d) in digits.iter().enumerate() {
            if i as i16 == decimal_point {
                result.push('.');
            }
            result.push((b'0' + d) as char);
        }
    }
    Ok(result)
}

/// Encode a decimal string (optionally signed, with optional fraction and
/// exponent) as Oracle NUMBER bytes.
pub fn encode_oracle_number(text: &str) -> Result<Vec<u8>> {
    let invalid = || Error::data(format!("invalid number: {:?}", text));
    let out_of_range = || Error::data(format!("number {} out of range", text));
    let text = text.trim();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (mantissa, exp_shift) = match unsigned.find(['e', 'E']) {
        Some(idx) => (
            &unsigned[..idx],
            unsigned[idx + 1..].parse::<i64>().map_err(|_| invalid())?,
        ),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes())
        .map(|b| b - b'0')
        .collect();
    let mut decimal_point = (int_part.len() as i64)
        .checked_add(exp_shift)
        .ok_or_else(out_of_range)?;
    while digits.first() == Some(&0) {
        digits.remove(0);
        decimal_point = decimal_point.checked_sub(1).ok_or_else(out_of_range)?;
    }
    while digits.last() == Some(&0) {
        digits.pop();
    }
    if digits.is_empty() {
        return Ok(vec![0x80]);
    }

    // Align the decimal point to a base-100 boundary.
    if decimal_point.rem_euclid(2) != 0 {
        digits.insert(0, 0);
        decimal_point = decimal_point.checked_add(1).ok_or_else(out_of_range)?;
    }
    if digits.len() % 2 != 0 {
        digits.push(0);
    }
    let pairs: Vec<u8> = digits.chunks(2).map(|c| c[0] * 10 + c[1]).collect();
    if pairs.len() > MAX_MANTISSA_PAIRS {
        return Err(Error::data(format!(
            "number {} exceeds 40 significant digits",
            text
        )));
    }
    let exponent = decimal_point / 2 - 1;
    if !(-65..=62).contains(&exponent) {
        return Err(out_of_range());
    }

    let exp_byte = (exponent + EXPONENT_BIAS as i64) as u8;
    let mut bytes = Vec::with_capacity(pairs.len() + 2);
    if negative {
        bytes.push(!exp_byte);
        bytes.extend(pairs.iter().map(|p| 101 - p));
        if pairs.len() < MAX_MANTISSA_PAIRS {
            bytes.push(NEGATIVE_TERMINATOR);
        }
    } else {
        bytes.push(exp_byte);
        bytes.extend(pairs.iter().map(|p| p + 1));
    }
    Ok(bytes)
}

pub fn encode_oracle_integer(value: i64) -> Result<Vec<u8>> {
    encode_oracle_number(&value.to_string())
}

/// Encode a float; NaN and infinities are rejected.
pub fn encode_oracle_float(value: f64) -> Result<Vec<u8>> {
    if !value.is_finite() {
        return Err(Error::data(format!("cannot encode {} as NUMBER", value)));
    }
    encode_oracle_number(&value.to_string())
}
