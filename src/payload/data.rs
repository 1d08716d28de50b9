//! # Packet Mapper
//!
//! Maps a parsed link-layer frame onto the application-layer packet its
//! control-information byte announces: fixed data, variable data, an alarm
//! status or an application error.

use crate::constants::{
    MBUS_CONTROL_INFO_ERROR_GENERAL, MBUS_CONTROL_INFO_RESP_FIXED,
    MBUS_CONTROL_INFO_RESP_VARIABLE, MBUS_CONTROL_INFO_STATUS_ALARM,
    MBUS_DATA_FIXED_HEADER_LENGTH, MBUS_DATA_FIXED_LENGTH, MBUS_DATA_FIXED_MEDIUM_MASK,
    MBUS_DATA_FIXED_STATUS_COUNTERS_FIXED, MBUS_DATA_FIXED_STATUS_FORMAT_BINARY,
    MBUS_DATA_FIXED_UNIT_MASK, MBUS_DATA_VARIABLE_HEADER_LENGTH,
};
use crate::error::MBusError;
use crate::mbus::frame::MBusFrame;
use crate::payload::data_encoding::{bcd_digits, decode_identification, decode_manufacturer};
use crate::payload::record::{parse_records, DataRecord};
use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Status byte of the variable data header (EN 13757-3 table 4).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const APPLICATION_BUSY = 0x01;
        const APPLICATION_ERROR = 0x02;
        const POWER_LOW = 0x04;
        const PERMANENT_ERROR = 0x08;
        const TEMPORARY_ERROR = 0x10;
        const MANUFACTURER_1 = 0x20;
        const MANUFACTURER_2 = 0x40;
        const MANUFACTURER_3 = 0x80;
    }
}

/// Response to CI 0x73.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedData {
    pub identification: u32,
    pub device_type: u8,
    pub transmission_counter: u8,
    pub status: u8,
    pub counters_fixed: bool,
    pub units1: u8,
    pub units2: u8,
    pub counter1: u32,
    pub counter2: u32,
}

/// Response to CI 0x72.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableData {
    pub identification: u32,
    /// Manufacturer field as transmitted (little-endian).
    pub manufacturer: u16,
    pub version: u8,
    pub device_type: u8,
    pub transmission_counter: u8,
    pub status: u8,
    pub signature: u16,
    pub records: Vec<DataRecord>,
    pub more_records_follow: bool,
    pub manufacturer_data: Vec<u8>,
}

impl VariableData {
    /// Three-letter manufacturer code, e.g. `"PAD"`.
    pub fn manufacturer_code(&self) -> String {
        decode_manufacturer(self.manufacturer)
    }

    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.status)
    }
}

/// Application layer view of a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MBusPacket {
    /// The frame was a bare acknowledgement.
    Empty,
    AlarmStatus { status: u8 },
    ApplicationError { code: u8 },
    FixedData(FixedData),
    VariableData(VariableData),
}

/// Maps a frame onto its application-layer packet.
///
/// Only ACKs and slave-to-master long frames carry a packet; short and
/// control frames are rejected with `UnsupportedFrame`.
pub fn map_to_packet(frame: &MBusFrame) -> Result<MBusPacket, MBusError> {
    let (control, control_information, data) = match frame {
        MBusFrame::Ack => return Ok(MBusPacket::Empty),
        MBusFrame::Long {
            control,
            control_information,
            data,
            ..
        } => (*control, *control_information, data.as_slice()),
        MBusFrame::Short { .. } | MBusFrame::Control { .. } => {
            return Err(MBusError::UnsupportedFrame(frame.frame_type()))
        }
    };

    if !frame.is_slave_to_master() {
        return Err(MBusError::WrongDirection(control));
    }

    match control_information {
        MBUS_CONTROL_INFO_ERROR_GENERAL => Ok(MBusPacket::ApplicationError {
            code: data.first().copied().unwrap_or(0),
        }),
        MBUS_CONTROL_INFO_STATUS_ALARM => Ok(MBusPacket::AlarmStatus {
            status: data.first().copied().unwrap_or(0),
        }),
        MBUS_CONTROL_INFO_RESP_FIXED => parse_fixed_data(data).map(MBusPacket::FixedData),
        MBUS_CONTROL_INFO_RESP_VARIABLE => {
            parse_variable_data(data).map(MBusPacket::VariableData)
        }
        other => Err(MBusError::UnsupportedCi(other)),
    }
}

fn identification(data: &[u8]) -> u32 {
    decode_identification([data[0], data[1], data[2], data[3]])
}

/// Fixed-data counter: binary little-endian or eight BCD digits. Malformed
/// BCD falls back to the binary reading.
fn fixed_counter(bytes: &[u8], binary: bool) -> u32 {
    let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if binary {
        raw
    } else {
        bcd_digits(bytes).parse().unwrap_or(raw)
    }
}

/// Decodes a CI 0x73 payload.
pub fn parse_fixed_data(data: &[u8]) -> Result<FixedData, MBusError> {
    if data.len() < MBUS_DATA_FIXED_HEADER_LENGTH {
        return Err(MBusError::PacketTooShort {
            ci: MBUS_CONTROL_INFO_RESP_FIXED,
            expected: MBUS_DATA_FIXED_HEADER_LENGTH,
            available: data.len(),
        });
    }

    let status = data[5];
    let binary = status & MBUS_DATA_FIXED_STATUS_FORMAT_BINARY != 0;
    let (counter1, counter2) = if data.len() >= MBUS_DATA_FIXED_LENGTH {
        (
            fixed_counter(&data[8..12], binary),
            fixed_counter(&data[12..16], binary),
        )
    } else {
        (0, 0)
    };

    Ok(FixedData {
        identification: identification(&data[0..4]),
        device_type: ((data[6] & MBUS_DATA_FIXED_MEDIUM_MASK) >> 6)
            | (((data[7] & MBUS_DATA_FIXED_MEDIUM_MASK) >> 6) << 2),
        transmission_counter: data[4],
        status,
        counters_fixed: status & MBUS_DATA_FIXED_STATUS_COUNTERS_FIXED != 0,
        units1: data[6] & MBUS_DATA_FIXED_UNIT_MASK,
        units2: data[7] & MBUS_DATA_FIXED_UNIT_MASK,
        counter1,
        counter2,
    })
}

/// Decodes a CI 0x72 payload: the 12-byte header and the record stream.
pub fn parse_variable_data(data: &[u8]) -> Result<VariableData, MBusError> {
    if data.len() < MBUS_DATA_VARIABLE_HEADER_LENGTH {
        return Err(MBusError::PacketTooShort {
            ci: MBUS_CONTROL_INFO_RESP_VARIABLE,
            expected: MBUS_DATA_VARIABLE_HEADER_LENGTH,
            available: data.len(),
        });
    }

    let stream = parse_records(&data[MBUS_DATA_VARIABLE_HEADER_LENGTH..])?;

    Ok(VariableData {
        identification: identification(&data[0..4]),
        manufacturer: u16::from_le_bytes([data[4], data[5]]),
        version: data[6],
        device_type: data[7],
        transmission_counter: data[8],
        status: data[9],
        signature: u16::from_le_bytes([data[10], data[11]]),
        records: stream.records,
        more_records_follow: stream.more_records_follow,
        manufacturer_data: stream.manufacturer_data,
    })
}
