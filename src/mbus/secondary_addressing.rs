//! Secondary Addressing Implementation for M-Bus (EN 13757-2 Section 5.3)
//!
//! This module implements secondary addressing for M-Bus devices, allowing
//! communication with devices using their 8-byte unique identifiers instead
//! of primary addresses (1-250).
//!
//! A selection mask is written as 16 hex digits: eight identification digits
//! (`F` is a wildcard digit), four manufacturer digits, two version digits and
//! two device type digits (`FF`/`FFFF` are wildcards).

use crate::constants::{
    MBUS_ADDRESS_NETWORK_LAYER, MBUS_CONTROL_INFO_SELECT_SLAVE, MBUS_CONTROL_MASK_SND_UD,
};
use crate::error::MBusError;
use crate::mbus::frame::MBusFrame;
use crate::payload::data::VariableData;
use crate::payload::data_encoding::{decode_identification, decode_manufacturer, encode_bcd};
use std::fmt;

const WILDCARD_NIBBLE: u8 = 0x0F;
const ID_DIGITS: usize = 8;

/// 8-byte secondary address as defined in EN 13757-2
/// Contains device identification, manufacturer, version, and device type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecondaryAddress {
    /// Identification number as its decimal value
    pub identification: u32,
    /// Manufacturer code (2 bytes, little-endian on the wire)
    pub manufacturer: u16,
    pub version: u8,
    pub device_type: u8,
}

impl SecondaryAddress {
    pub fn new(identification: u32, manufacturer: u16, version: u8, device_type: u8) -> Self {
        Self {
            identification,
            manufacturer,
            version,
            device_type,
        }
    }

    /// Wire form: BCD identification, manufacturer LE, version, device type.
    pub fn to_bytes(&self) -> Result<[u8; 8], MBusError> {
        let mut bytes = [0u8; 8];
        bytes[0..4].copy_from_slice(&encode_bcd(self.identification)?);
        bytes[4..6].copy_from_slice(&self.manufacturer.to_le_bytes());
        bytes[6] = self.version;
        bytes[7] = self.device_type;
        Ok(bytes)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, MBusError> {
        if data.len() < 8 {
            return Err(MBusError::InvalidInput(format!(
                "secondary address requires 8 bytes, got {}",
                data.len()
            )));
        }

        Ok(SecondaryAddress {
            identification: decode_identification([data[0], data[1], data[2], data[3]]),
            manufacturer: u16::from_le_bytes([data[4], data[5]]),
            version: data[6],
            device_type: data[7],
        })
    }

    pub fn manufacturer_code(&self) -> String {
        decode_manufacturer(self.manufacturer)
    }
}

impl From<&VariableData> for SecondaryAddress {
    fn from(data: &VariableData) -> Self {
        SecondaryAddress::new(
            data.identification,
            data.manufacturer,
            data.version,
            data.device_type,
        )
    }
}

impl fmt::Display for SecondaryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08}{:04X}{:02X}{:02X}",
            self.identification, self.manufacturer, self.version, self.device_type
        )
    }
}

/// Selection pattern in wire order, possibly containing wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressMask([u8; 8]);

impl AddressMask {
    /// Matches every device.
    pub fn wildcard() -> Self {
        AddressMask([0xFF; 8])
    }

    /// Mask selecting exactly `address`.
    pub fn exact(address: &SecondaryAddress) -> Result<Self, MBusError> {
        address.to_bytes().map(AddressMask)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Identification digit `index`, most significant first.
    pub fn id_digit(&self, index: usize) -> u8 {
        let byte = self.0[3 - index / 2];
        if index % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }

    /// Copy of this mask with identification digit `index` set to `digit`.
    pub fn with_id_digit(&self, index: usize, digit: u8) -> Self {
        let mut bytes = self.0;
        let byte = &mut bytes[3 - index / 2];
        if index % 2 == 0 {
            *byte = (*byte & 0x0F) | (digit << 4);
        } else {
            *byte = (*byte & 0xF0) | (digit & 0x0F);
        }
        AddressMask(bytes)
    }

    pub fn first_wildcard_digit(&self) -> Option<usize> {
        (0..ID_DIGITS).find(|&i| self.id_digit(i) == WILDCARD_NIBBLE)
    }
}

impl fmt::Display for AddressMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..ID_DIGITS {
            write!(f, "{:X}", self.id_digit(i))?;
        }
        write!(
            f,
            "{:02X}{:02X}{:02X}{:02X}",
            self.0[5], self.0[4], self.0[6], self.0[7]
        )
    }
}

/// Parses a 16 digit selection mask such as `"1234FFFFFFFFFFFF"`.
pub fn parse_mask(text: &str) -> Result<AddressMask, MBusError> {
    let digits: Vec<u8> = text
        .chars()
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| MBusError::InvalidInput(format!("invalid mask digit '{c}'")))
        })
        .collect::<Result<_, _>>()?;

    if digits.len() != 16 {
        return Err(MBusError::InvalidInput(format!(
            "mask must have 16 hex digits, got {}",
            digits.len()
        )));
    }
    if let Some(&bad) = digits[..ID_DIGITS]
        .iter()
        .find(|&&d| d > 9 && d != WILDCARD_NIBBLE)
    {
        return Err(MBusError::InvalidInput(format!(
            "identification digit {bad:X} is neither decimal nor a wildcard"
        )));
    }

    let pair = |i: usize| (digits[i] << 4) | digits[i + 1];
    Ok(AddressMask([
        pair(6),
        pair(4),
        pair(2),
        pair(0),
        pair(10),
        pair(8),
        pair(12),
        pair(14),
    ]))
}

/// SND_UD to address 0xFD with CI 0x52 carrying the mask.
pub fn build_selection_frame(mask: &AddressMask) -> MBusFrame {
    MBusFrame::Long {
        control: MBUS_CONTROL_MASK_SND_UD,
        address: MBUS_ADDRESS_NETWORK_LAYER,
        control_information: MBUS_CONTROL_INFO_SELECT_SLAVE,
        data: mask.as_bytes().to_vec(),
    }
}
