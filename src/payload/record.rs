//! # Data Records
//!
//! Decoding of the variable data record stream (EN 13757-3 clause 6): each
//! record is a DIF with up to eleven DIFEs, a VIF with up to eleven VIFEs, and
//! a value window whose width the DIF selects.
//!
//! Each record is read with nom `complete` parsers. Running out of input
//! inside a record ends the stream and drops that record, since meters in the
//! field cut telegrams short. Overlong DIFE/VIFE chains are the only record
//! level failures and surface as `nom::Err::Failure`.

use crate::constants::{
    MBUS_DATA_RECORD_DIFE_MASK_DEVICE, MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO,
    MBUS_DATA_RECORD_DIFE_MASK_TARIFF, MBUS_DATA_RECORD_DIF_MASK_FUNCTION,
    MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO, MBUS_DIB_DIFE_MAX, MBUS_DIB_DIF_EXTENSION_BIT,
    MBUS_DIB_DIF_IDLE_FILLER, MBUS_DIB_DIF_MANUFACTURER_SPECIFIC,
    MBUS_DIB_DIF_MORE_RECORDS_FOLLOW, MBUS_DIB_VIFE_MAX, MBUS_DIB_VIF_EXTENSION_BIT,
    MBUS_DIB_VIF_WITHOUT_EXTENSION, MBUS_VALUE_INFO_BLOCK_CUSTOM_VIF_SIZE,
    MBUS_VIF_MANUFACTURER_SPECIFIC,
};
use crate::error::MBusError;
use crate::payload::data_encoding::{
    decode_date, decode_reversed_ascii, lvar_length, parse_value, parse_variable_length,
    DataType, RecordValue,
};
use crate::payload::vif::{
    resolve_extension, resolve_primary, ExtensionTable, Quantity, UnitInfo, VifCategory,
};
use log::{debug, warn};
use nom::bytes::complete::take;
use nom::error::{ErrorKind, ParseError};
use nom::number::complete::be_u8;
use nom::IResult;
use serde::Serialize;
use std::fmt;

/// Function field of the DIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Function {
    Instantaneous,
    Maximum,
    Minimum,
    ValueDuringError,
}

impl Function {
    pub fn from_dif(dif: u8) -> Self {
        match dif & MBUS_DATA_RECORD_DIF_MASK_FUNCTION {
            0x00 => Function::Instantaneous,
            0x10 => Function::Maximum,
            0x20 => Function::Minimum,
            _ => Function::ValueDuringError,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Function::Instantaneous => "Instantaneous value",
            Function::Maximum => "Maximum value",
            Function::Minimum => "Minimum value",
            Function::ValueDuringError => "Value during error state",
        };
        f.write_str(text)
    }
}

/// One decoded measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRecord {
    /// Raw DIF byte.
    pub record_type: u8,
    pub function: Function,
    pub storage_number: u64,
    pub tariff: u32,
    pub sub_unit: u32,
    pub value_data_type: DataType,
    pub value: RecordValue,
    /// Primary unit first, then one entry per VIFE.
    pub units: Vec<UnitInfo>,
}

impl DataRecord {
    /// First unit that carries a real description rather than a table marker.
    pub fn primary_unit(&self) -> Option<&UnitInfo> {
        self.units
            .iter()
            .find(|u| !u.quantity.is_marker())
            .or_else(|| self.units.first())
    }

    pub fn quantity(&self) -> Quantity {
        self.primary_unit()
            .map_or(Quantity::Undefined, |u| u.quantity)
    }
}

/// Everything the record loop extracted from one payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordStream {
    pub records: Vec<DataRecord>,
    /// A 0x1F DIF was seen: the slave holds further telegrams.
    pub more_records_follow: bool,
    /// Opaque bytes after a 0x0F DIF.
    pub manufacturer_data: Vec<u8>,
}

/// Why a record could not be read.
#[derive(Debug, PartialEq)]
enum RecordError {
    /// The payload ended inside the record, or the record announced a window
    /// that cannot be read. The stream stops here.
    Dropped,
    /// A hard limit was broken; the whole payload is rejected.
    Invalid(MBusError),
}

impl<'a> ParseError<&'a [u8]> for RecordError {
    fn from_error_kind(_input: &'a [u8], _kind: ErrorKind) -> Self {
        RecordError::Dropped
    }

    fn append(_input: &'a [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type RecordResult<'a, T> = IResult<&'a [u8], T, RecordError>;

fn dropped<'a, T>() -> RecordResult<'a, T> {
    Err(nom::Err::Error(RecordError::Dropped))
}

fn invalid<'a, T>(err: MBusError) -> RecordResult<'a, T> {
    Err(nom::Err::Failure(RecordError::Invalid(err)))
}

fn byte(input: &[u8]) -> RecordResult<'_, u8> {
    be_u8(input)
}

fn window(input: &[u8], len: usize) -> RecordResult<'_, &[u8]> {
    take(len)(input)
}

/// Storage, tariff and sub-unit accumulated over the DIFE chain.
#[derive(Debug, Default)]
struct DataInformation {
    storage_number: u64,
    tariff: u32,
    sub_unit: u32,
}

/// Reads the DIFE chain following `dif`.
fn data_information(mut input: &[u8], dif: u8) -> RecordResult<'_, DataInformation> {
    let mut info = DataInformation {
        storage_number: ((dif & MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO) >> 6) as u64,
        ..DataInformation::default()
    };

    let mut extension = dif & MBUS_DIB_DIF_EXTENSION_BIT != 0;
    let mut count = 0usize;
    while extension {
        if count == MBUS_DIB_DIFE_MAX {
            return invalid(MBusError::TooManyDifes(MBUS_DIB_DIFE_MAX));
        }
        let (rest, dife) = byte(input)?;
        input = rest;

        info.storage_number |=
            ((dife & MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO) as u64) << (4 * count + 1);
        info.tariff |= (((dife & MBUS_DATA_RECORD_DIFE_MASK_TARIFF) >> 4) as u32) << (2 * count);
        info.sub_unit |= (((dife & MBUS_DATA_RECORD_DIFE_MASK_DEVICE) >> 6) as u32) << count;

        extension = dife & MBUS_DIB_DIF_EXTENSION_BIT != 0;
        count += 1;
    }
    Ok((input, info))
}

/// Reads the VIF, an optional plain-text unit and the VIFE chain.
fn value_information(input: &[u8]) -> RecordResult<'_, Vec<UnitInfo>> {
    let (mut input, vif) = byte(input)?;
    let category = VifCategory::of(vif);

    let primary = if category == VifCategory::PlainText {
        let (rest, len) = byte(input)?;
        if len > MBUS_VALUE_INFO_BLOCK_CUSTOM_VIF_SIZE {
            warn!("Plain text VIF of {} bytes exceeds limit", len);
            return dropped();
        }
        let (rest, text) = window(rest, len as usize)?;
        input = rest;
        UnitInfo::plain_text(decode_reversed_ascii(text))
    } else {
        resolve_primary(vif)
    };

    let mut units = vec![primary];
    let mut table = category.extension_table();
    let mut extension = vif & MBUS_DIB_VIF_EXTENSION_BIT != 0;
    let mut count = 0usize;
    while extension {
        if count == MBUS_DIB_VIFE_MAX {
            return invalid(MBusError::TooManyVifes(MBUS_DIB_VIFE_MAX));
        }
        let (rest, vife) = byte(input)?;
        input = rest;

        units.push(resolve_extension(vife, table));

        table = match table {
            ExtensionTable::Manufacturer => ExtensionTable::Manufacturer,
            _ if vife & MBUS_DIB_VIF_WITHOUT_EXTENSION == MBUS_VIF_MANUFACTURER_SPECIFIC => {
                ExtensionTable::Manufacturer
            }
            // Only the first VIFE after 0xFB/0xFD is linear; the rest combine
            _ => ExtensionTable::Combinable,
        };
        extension = vife & MBUS_DIB_VIF_EXTENSION_BIT != 0;
        count += 1;
    }
    Ok((input, units))
}

/// Reads and decodes the value window.
fn value_field(
    input: &[u8],
    data_type: DataType,
    time_point: bool,
) -> RecordResult<'_, RecordValue> {
    match data_type.byte_len() {
        Some(len) => {
            let (input, bytes) = window(input, len)?;
            let value = if time_point && data_type.is_date_capable() {
                decode_date(bytes)
            } else {
                parse_value(data_type, bytes)
            };
            Ok((input, value))
        }
        None => {
            let (input, lvar) = byte(input)?;
            let Some(len) = lvar_length(lvar) else {
                warn!("Reserved LVAR 0x{:02X}", lvar);
                return dropped();
            };
            let (input, bytes) = window(input, len)?;
            Ok((input, parse_variable_length(lvar, bytes)))
        }
    }
}

/// Reads one record whose DIF has already been consumed.
fn data_record(input: &[u8], dif: u8) -> RecordResult<'_, DataRecord> {
    let (input, info) = data_information(input, dif)?;
    let (input, units) = value_information(input)?;

    let data_type = DataType::from_dif(dif);
    let time_point = units
        .iter()
        .find(|u| !u.quantity.is_marker())
        .map_or(false, |u| u.quantity.is_time_point());
    let (input, value) = value_field(input, data_type, time_point)?;

    Ok((
        input,
        DataRecord {
            record_type: dif,
            function: Function::from_dif(dif),
            storage_number: info.storage_number,
            tariff: info.tariff,
            sub_unit: info.sub_unit,
            value_data_type: data_type,
            value,
            units,
        },
    ))
}

/// Decodes the record stream of a variable data payload.
pub fn parse_records(data: &[u8]) -> Result<RecordStream, MBusError> {
    let mut stream = RecordStream::default();
    let mut input = data;

    while let Ok((rest, dif)) = byte(input) {
        let offset = data.len() - input.len();
        input = rest;
        match dif {
            MBUS_DIB_DIF_IDLE_FILLER => {
                debug!("Skipping idle filler at offset {}", offset);
                continue;
            }
            MBUS_DIB_DIF_MORE_RECORDS_FOLLOW => {
                debug!("More records follow in next telegram");
                stream.more_records_follow = true;
                continue;
            }
            MBUS_DIB_DIF_MANUFACTURER_SPECIFIC => {
                stream.manufacturer_data = input.to_vec();
                debug!(
                    "Manufacturer specific data, {} bytes",
                    stream.manufacturer_data.len()
                );
                break;
            }
            _ => {}
        }

        match data_record(input, dif) {
            Ok((rest, record)) => {
                stream.records.push(record);
                input = rest;
            }
            Err(nom::Err::Failure(RecordError::Invalid(err))) => return Err(err),
            Err(_) => {
                warn!("Record at offset {} truncated, dropped", offset);
                break;
            }
        }
    }

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    #[test]
    fn test_storage_tariff_sub_unit() {
        // DIF 0xDA: max, BCD4, storage bit; DIFE 0x02 extends storage
        let stream = parse_records(&[0xDA, 0x02, 0x3B, 0x13, 0x01]).unwrap();
        let record = &stream.records[0];
        assert_eq!(record.function, Function::Maximum);
        assert_eq!(record.storage_number, 5);
        assert_eq!(record.value, RecordValue::I16(113));

        // DIF 0x8B, DIFE 0x60: tariff 2, sub-unit 1
        let stream = parse_records(&[0x8B, 0x60, 0x04, 0x37, 0x18, 0x02]).unwrap();
        let record = &stream.records[0];
        assert_eq!(record.tariff, 2);
        assert_eq!(record.sub_unit, 1);
        assert_eq!(record.storage_number, 0);
        assert_eq!(record.value, RecordValue::I32(21837));
        assert_eq!(record.quantity(), Quantity::Energy);
    }

    #[test]
    fn test_record_errors() {
        assert_eq!(
            data_record(&[0x13], 0x04).unwrap_err(),
            nom::Err::Error(RecordError::Dropped)
        );
        let mut chain = vec![0x80; 11];
        chain.extend([0x13, 0x05]);
        assert_eq!(
            data_record(&chain, 0x81).unwrap_err(),
            nom::Err::Failure(RecordError::Invalid(MBusError::TooManyDifes(11)))
        );
        let (rest, record) = data_record(&[0x13, 0x05, 0x2F], 0x01).unwrap();
        assert_eq!(rest, &[0x2F]);
        assert_eq!(record.value, RecordValue::I8(5));
    }

    #[test]
    fn test_sentinels() {
        let stream = parse_records(&[0x2F, 0x2F, 0x01, 0x13, 0x05, 0x1F, 0x0F, 0xAA, 0xBB]).unwrap();
        assert_eq!(stream.records.len(), 1);
        assert!(stream.more_records_follow);
        assert_eq!(stream.manufacturer_data, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_truncated_trailing_record_dropped() {
        let stream = parse_records(&[0x01, 0x13, 0x05, 0x04, 0x13, 0x01, 0x02]).unwrap();
        assert_eq!(stream.records.len(), 1);
        let stream = parse_records(&[0x01, 0x13, 0x05, 0x84]).unwrap();
        assert_eq!(stream.records.len(), 1);
    }

    #[test]
    fn test_dife_chain_limit() {
        let mut data = vec![0x81];
        data.extend(std::iter::repeat(0x80).take(11));
        data.extend([0x13, 0x05]);
        let err = parse_records(&data).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooManyDifes);

        // Eleven DIFEs with the last one closing the chain are fine
        let mut data = vec![0x81];
        data.extend(std::iter::repeat(0x80).take(10));
        data.extend([0x00, 0x13, 0x05]);
        assert_eq!(parse_records(&data).unwrap().records.len(), 1);
    }

    #[test]
    fn test_vife_chain_limit() {
        let mut data = vec![0x01, 0x93];
        data.extend(std::iter::repeat(0xFF).take(11));
        data.extend([0x00, 0x05]);
        let err = parse_records(&data).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooManyVifes);
    }

    #[test]
    fn test_fd_extension() {
        // 0C FD 0E: BCD8 firmware version
        let stream = parse_records(&[0x0C, 0xFD, 0x0E, 0x01, 0x00, 0x00, 0x00]).unwrap();
        let record = &stream.records[0];
        assert_eq!(record.units.len(), 2);
        assert_eq!(record.units[0].quantity, Quantity::ExtensionFd);
        assert_eq!(record.quantity(), Quantity::FirmwareVersion);
        assert_eq!(record.value, RecordValue::I32(1));
    }

    #[test]
    fn test_combinable_vife() {
        // Volume m^3 * 10^-3, then VIFE 0x7D (x 10^3)
        let stream = parse_records(&[0x01, 0x93, 0x7D, 0x05]).unwrap();
        let units = &stream.records[0].units;
        assert_eq!(units[1].quantity, Quantity::MultiplicativeCorrection);
        assert_eq!(units[1].magnitude, 3);
    }

    #[test]
    fn test_plain_text_vif() {
        let stream = parse_records(&[0x01, 0x7C, 0x03, b'h', b'W', b'k', 0x2A]).unwrap();
        let record = &stream.records[0];
        assert_eq!(record.units[0].quantity, Quantity::PlainText);
        assert_eq!(record.units[0].unit, "kWh");
        assert_eq!(record.value, RecordValue::I8(42));
    }

    #[test]
    fn test_date_record() {
        let stream = parse_records(&[0x02, 0x6C, 0x1F, 0x1C]).unwrap();
        assert_eq!(
            stream.records[0].value,
            RecordValue::Date(NaiveDate::from_ymd_opt(2008, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_variable_length_text() {
        let stream = parse_records(&[0x0D, 0x78, 0x03, b'A', b'B', b'C']).unwrap();
        assert_eq!(stream.records[0].value, RecordValue::Text("ABC".to_string()));
        assert_eq!(stream.records[0].value_data_type, DataType::VariableLength);
    }

    #[test]
    fn test_manufacturer_vif() {
        let stream = parse_records(&[0x01, 0xFF, 0x81, 0x02, 0x07]).unwrap();
        let units = &stream.records[0].units;
        assert_eq!(units.len(), 3);
        assert!(units
            .iter()
            .all(|u| u.quantity == Quantity::ManufacturerSpecific));
    }
}
