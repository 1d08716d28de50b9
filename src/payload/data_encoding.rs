//! # M-Bus Data Encoding and Decoding
//!
//! This module decodes the value window of a data record according to the
//! encoding selected by the DIF: fixed-width little-endian integers, IEEE
//! floats, BCD digits, variable-length fields and the packed date formats.
//! It also holds the BCD identification and manufacturer-code helpers shared
//! by the fixed and variable data headers and by secondary addressing.

use crate::constants::MBUS_DATA_RECORD_DIF_MASK_DATA;
use crate::error::MBusError;
use chrono::{NaiveDate, NaiveDateTime};
use nom::{
    bytes::complete::take,
    combinator::map,
    number::complete::{le_f32, le_i16, le_i32, le_i64, le_i8, le_u24},
    IResult,
};
use serde::Serialize;

/// The sixteen value encodings selected by the low nibble of the DIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    NoData,
    Int8,
    Int16,
    Int24,
    Int32,
    Float32,
    Int48,
    Int64,
    SelectionForReadout,
    Bcd2,
    Bcd4,
    Bcd6,
    Bcd8,
    VariableLength,
    Bcd12,
    Reserved,
}

impl DataType {
    pub fn from_dif(dif: u8) -> Self {
        match dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
            0x0 => DataType::NoData,
            0x1 => DataType::Int8,
            0x2 => DataType::Int16,
            0x3 => DataType::Int24,
            0x4 => DataType::Int32,
            0x5 => DataType::Float32,
            0x6 => DataType::Int48,
            0x7 => DataType::Int64,
            0x8 => DataType::SelectionForReadout,
            0x9 => DataType::Bcd2,
            0xA => DataType::Bcd4,
            0xB => DataType::Bcd6,
            0xC => DataType::Bcd8,
            0xD => DataType::VariableLength,
            0xE => DataType::Bcd12,
            _ => DataType::Reserved,
        }
    }

    /// Width of the value window in bits; `None` when a length byte decides.
    pub fn bit_len(&self) -> Option<usize> {
        match self {
            DataType::NoData | DataType::SelectionForReadout | DataType::Reserved => Some(0),
            DataType::Int8 | DataType::Bcd2 => Some(8),
            DataType::Int16 | DataType::Bcd4 => Some(16),
            DataType::Int24 | DataType::Bcd6 => Some(24),
            DataType::Int32 | DataType::Float32 | DataType::Bcd8 => Some(32),
            DataType::Int48 | DataType::Bcd12 => Some(48),
            DataType::Int64 => Some(64),
            DataType::VariableLength => None,
        }
    }

    pub fn byte_len(&self) -> Option<usize> {
        self.bit_len().map(|bits| bits / 8)
    }

    pub fn is_bcd(&self) -> bool {
        matches!(
            self,
            DataType::Bcd2 | DataType::Bcd4 | DataType::Bcd6 | DataType::Bcd8 | DataType::Bcd12
        )
    }

    /// Integer windows that may carry a packed date instead of a number.
    pub fn is_date_capable(&self) -> bool {
        matches!(self, DataType::Int16 | DataType::Int32 | DataType::Int48)
    }
}

/// Packed date-time (types F and I) with its flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MBusDateTime {
    pub datetime: NaiveDateTime,
    /// IV bit: the meter marks the time as not valid.
    pub invalid: bool,
    pub summer_time: bool,
}

/// A decoded value window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordValue {
    /// No data, selection for readout, reserved or an undecodable window.
    None,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    Text(String),
    Date(NaiveDate),
    DateTime(MBusDateTime),
    /// A date field with a zero or impossible day, month or time.
    NoDate,
}

impl RecordValue {
    pub fn is_none(&self) -> bool {
        matches!(self, RecordValue::None)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RecordValue::I8(v) => Some(*v as i64),
            RecordValue::I16(v) => Some(*v as i64),
            RecordValue::I32(v) => Some(*v as i64),
            RecordValue::I64(v) => Some(*v),
            _ => None,
        }
    }
}

/// Decodes `data` as `data_type`.
///
/// Windows shorter than the encoding needs yield [`RecordValue::None`].
/// Variable-length data is expected without its length byte.
pub fn parse_value(data_type: DataType, data: &[u8]) -> RecordValue {
    let parsed: IResult<&[u8], RecordValue> = match data_type {
        DataType::NoData | DataType::SelectionForReadout | DataType::Reserved => {
            return RecordValue::None
        }
        DataType::Int8 => map(le_i8, RecordValue::I8)(data),
        DataType::Int16 => map(le_i16, RecordValue::I16)(data),
        DataType::Int24 => map(le_u24, |v| RecordValue::I32(v as i32))(data),
        DataType::Int32 => map(le_i32, RecordValue::I32)(data),
        DataType::Float32 => map(le_f32, RecordValue::F32)(data),
        DataType::Int48 => map(take(6usize), |b: &[u8]| {
            RecordValue::I64(le_bytes_to_u64(b) as i64)
        })(data),
        DataType::Int64 => map(le_i64, RecordValue::I64)(data),
        DataType::Bcd2
        | DataType::Bcd4
        | DataType::Bcd6
        | DataType::Bcd8
        | DataType::Bcd12 => {
            let width = data_type.byte_len().unwrap_or(0);
            map(take(width), |b: &[u8]| decode_bcd_value(data_type, b))(data)
        }
        DataType::VariableLength => return RecordValue::Text(decode_ascii(data)),
    };
    parsed.map(|(_, value)| value).unwrap_or(RecordValue::None)
}

/// Zero-padded little-endian integer of up to eight bytes.
fn le_bytes_to_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

/// BCD digits, most significant byte last, high nibble first within a byte.
pub fn bcd_digits(bytes: &[u8]) -> String {
    bytes.iter().rev().map(|b| format!("{b:02X}")).collect()
}

/// Decodes a BCD window into the integer width of `data_type`, or the digit
/// string when a nibble is not a decimal digit.
fn decode_bcd_value(data_type: DataType, bytes: &[u8]) -> RecordValue {
    let digits = bcd_digits(bytes);
    let value = match data_type {
        DataType::Bcd2 => digits.parse::<i8>().ok().map(RecordValue::I8),
        DataType::Bcd4 => digits.parse::<i16>().ok().map(RecordValue::I16),
        DataType::Bcd6 | DataType::Bcd8 => digits.parse::<i32>().ok().map(RecordValue::I32),
        _ => digits.parse::<i64>().ok().map(RecordValue::I64),
    };
    value.unwrap_or(RecordValue::Text(digits))
}

/// Bytes as text, one char per byte, trailing NULs removed.
pub fn decode_ascii(data: &[u8]) -> String {
    let end = data.iter().rposition(|b| *b != 0).map_or(0, |p| p + 1);
    data[..end].iter().map(|b| *b as char).collect()
}

/// Plain-text VIF units are transmitted last character first.
pub fn decode_reversed_ascii(data: &[u8]) -> String {
    data.iter().rev().map(|b| *b as char).collect()
}

/// Window length announced by an LVAR byte, `None` for reserved values.
///
/// * `0x00..=0xBF` n ASCII bytes
/// * `0xC0..=0xEF` n = low nibble, BCD or binary
/// * `0xF0..=0xF4` 4 * (LVAR - 0xEC) binary bytes
/// * `0xF5` 48 bytes, `0xF6` 64 bytes
pub fn lvar_length(lvar: u8) -> Option<usize> {
    match lvar {
        0x00..=0xBF => Some(lvar as usize),
        0xC0..=0xEF => Some((lvar & 0x0F) as usize),
        0xF0..=0xF4 => Some(4 * (lvar as usize - 0xEC)),
        0xF5 => Some(48),
        0xF6 => Some(64),
        _ => None,
    }
}

/// Decodes the window that followed an LVAR byte.
///
/// * `0x00..=0xBF` ASCII text
/// * `0xC0..=0xCF` positive BCD
/// * `0xD0..=0xDF` negative BCD
/// * `0xE0..=0xF6` binary number, hex text above 8 bytes
pub fn parse_variable_length(lvar: u8, data: &[u8]) -> RecordValue {
    match lvar {
        0x00..=0xBF => RecordValue::Text(decode_ascii(data)),
        0xC0..=0xDF => {
            let digits = bcd_digits(data);
            match digits.parse::<i64>() {
                Ok(v) if lvar >= 0xD0 => RecordValue::I64(-v),
                Ok(v) => RecordValue::I64(v),
                Err(_) => RecordValue::Text(digits),
            }
        }
        0xE0..=0xF6 if data.len() <= 8 => RecordValue::I64(le_bytes_to_u64(data) as i64),
        0xE0..=0xF6 => RecordValue::Text(crate::util::hex::encode_hex(data)),
        _ => RecordValue::None,
    }
}

/// Years 0-69 are 20xx, 70-99 are 19xx; the upper 7-bit range is invalid.
fn century_year(two_digit: u8) -> Option<i32> {
    match two_digit {
        0..=69 => Some(2000 + two_digit as i32),
        70..=99 => Some(1900 + two_digit as i32),
        _ => None,
    }
}

/// Day, month and year packed into two bytes (type G layout).
fn packed_date(low: u8, high: u8) -> Option<NaiveDate> {
    let day = (low & 0x1F) as u32;
    let month = (high & 0x0F) as u32;
    let year = ((low & 0xE0) >> 5) | ((high & 0xF0) >> 1);
    NaiveDate::from_ymd_opt(century_year(year)?, month, day)
}

/// Decodes a packed date (2 bytes, type G) or date-time (4 bytes, type F;
/// 6 bytes, type I). Zero or impossible fields give [`RecordValue::NoDate`];
/// other window sizes give [`RecordValue::None`].
pub fn decode_date(data: &[u8]) -> RecordValue {
    match data.len() {
        2 => packed_date(data[0], data[1]).map_or(RecordValue::NoDate, RecordValue::Date),
        4 => {
            let minute = (data[0] & 0x3F) as u32;
            let hour = (data[1] & 0x1F) as u32;
            packed_date(data[2], data[3])
                .and_then(|date| date.and_hms_opt(hour, minute, 0))
                .map_or(RecordValue::NoDate, |datetime| {
                    RecordValue::DateTime(MBusDateTime {
                        datetime,
                        invalid: data[0] & 0x80 != 0,
                        summer_time: data[1] & 0x80 != 0,
                    })
                })
        }
        6 => {
            let second = (data[0] & 0x3F) as u32;
            let minute = (data[1] & 0x3F) as u32;
            let hour = (data[2] & 0x1F) as u32;
            packed_date(data[3], data[4])
                .and_then(|date| date.and_hms_opt(hour, minute, second))
                .map_or(RecordValue::NoDate, |datetime| {
                    RecordValue::DateTime(MBusDateTime {
                        datetime,
                        invalid: data[1] & 0x80 != 0,
                        summer_time: data[1] & 0x40 != 0,
                    })
                })
        }
        _ => RecordValue::None,
    }
}

/// Decodes a 4-byte identification number.
///
/// Read as eight BCD digits when every nibble is a decimal digit, otherwise
/// as a little-endian binary number.
pub fn decode_identification(bytes: [u8; 4]) -> u32 {
    bcd_digits(&bytes)
        .parse::<u32>()
        .unwrap_or_else(|_| u32::from_le_bytes(bytes))
}

/// Encodes a number below 10^8 as four BCD bytes, least significant first.
pub fn encode_bcd(value: u32) -> Result<[u8; 4], MBusError> {
    if value > 99_999_999 {
        return Err(MBusError::InvalidInput(format!(
            "{value} does not fit in 8 BCD digits"
        )));
    }
    let mut out = [0u8; 4];
    let mut rest = value;
    for byte in out.iter_mut() {
        let low = (rest % 10) as u8;
        rest /= 10;
        let high = (rest % 10) as u8;
        rest /= 10;
        *byte = (high << 4) | low;
    }
    Ok(out)
}

/// Decodes the 2-byte manufacturer field into its three-letter code.
pub fn decode_manufacturer(code: u16) -> String {
    [(code >> 10) & 0x1F, (code >> 5) & 0x1F, code & 0x1F]
        .iter()
        .map(|c| char::from(*c as u8 + 64))
        .collect()
}

/// Encodes a three-letter manufacturer code (`"PAD"` -> `0x4024`).
pub fn encode_manufacturer(manufacturer: &str) -> Result<u16, MBusError> {
    let upper = manufacturer.to_ascii_uppercase();
    if upper.len() != 3 || !upper.bytes().all(|c| c.is_ascii_uppercase()) {
        return Err(MBusError::InvalidManufacturer(manufacturer.to_string()));
    }
    Ok(upper
        .bytes()
        .fold(0u16, |acc, c| (acc << 5) | (c - 64) as u16))
}
