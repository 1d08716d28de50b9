//! # M-Bus Error Handling
//!
//! This module defines the MBusError enum, which represents the different error
//! types that can occur in the mbus-telegram crate, and the stable [`ErrorCode`]
//! taxonomy each error maps onto.

use crate::mbus::frame::MBusFrameType;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable classification of every failure the crate reports.
///
/// Paired with the `Display` text of [`MBusError`] this gives callers a
/// `{code, message}` view that does not depend on the variant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    Empty,
    UnknownStartByte,
    ShortFrameTooShort,
    LongFrameTooShort,
    InvalidLength,
    LengthMismatch,
    CrcMismatch,
    InvalidStart2,
    InvalidStop,
    WrongDirection,
    UnsupportedCi,
    UnsupportedFrame,
    PacketTooShort,
    TooManyDifes,
    TooManyVifes,
    Transport,
    Timeout,
    Cancelled,
    InvalidInput,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Empty => "Empty",
            ErrorCode::UnknownStartByte => "UnknownStartByte",
            ErrorCode::ShortFrameTooShort => "ShortFrameTooShort",
            ErrorCode::LongFrameTooShort => "LongFrameTooShort",
            ErrorCode::InvalidLength => "InvalidLength",
            ErrorCode::LengthMismatch => "LengthMismatch",
            ErrorCode::CrcMismatch => "CrcMismatch",
            ErrorCode::InvalidStart2 => "InvalidStart2",
            ErrorCode::InvalidStop => "InvalidStop",
            ErrorCode::WrongDirection => "WrongDirection",
            ErrorCode::UnsupportedCi => "UnsupportedCI",
            ErrorCode::UnsupportedFrame => "UnsupportedFrame",
            ErrorCode::PacketTooShort => "TooShort",
            ErrorCode::TooManyDifes => "TooManyDIFEs",
            ErrorCode::TooManyVifes => "TooManyVIFEs",
            ErrorCode::Transport => "Transport",
            ErrorCode::Timeout => "Timeout",
            ErrorCode::Cancelled => "Cancelled",
            ErrorCode::InvalidInput => "InvalidInput",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the different error types that can occur in the M-Bus crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MBusError {
    /// No bytes were supplied.
    #[error("Empty input")]
    Empty,

    /// The first byte is not one of the frame start markers.
    #[error("Unknown start byte: 0x{0:02X}")]
    UnknownStartByte(u8),

    #[error("Short frame too short: need 5 bytes, got {available}")]
    ShortFrameTooShort { available: usize },

    #[error("Long frame too short: need {expected} bytes, got {available}")]
    LongFrameTooShort { expected: usize, available: usize },

    /// The L-field is below the minimum of 3.
    #[error("Invalid length field: {0}")]
    InvalidLength(u8),

    /// The two L-field bytes differ.
    #[error("Length fields differ: 0x{length1:02X} != 0x{length2:02X}")]
    LengthMismatch { length1: u8, length2: u8 },

    /// Indicates a checksum mismatch.
    #[error("Invalid checksum: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    InvalidChecksum { expected: u8, calculated: u8 },

    #[error("Invalid second start byte: 0x{0:02X}")]
    InvalidStart2(u8),

    #[error("Invalid stop byte: 0x{0:02X}")]
    InvalidStop(u8),

    /// The control field marks a master-to-slave frame.
    #[error("Wrong direction: control 0x{0:02X} is not slave to master")]
    WrongDirection(u8),

    #[error("Unsupported control information: 0x{0:02X}")]
    UnsupportedCi(u8),

    #[error("Unsupported frame type for packet mapping: {0:?}")]
    UnsupportedFrame(MBusFrameType),

    /// The payload is shorter than the packet header requires.
    #[error("Payload too short for CI 0x{ci:02X}: need {expected} bytes, got {available}")]
    PacketTooShort {
        ci: u8,
        expected: usize,
        available: usize,
    },

    #[error("Too many DIFEs in data record (limit {0})")]
    TooManyDifes(usize),

    #[error("Too many VIFEs in data record (limit {0})")]
    TooManyVifes(usize),

    /// Indicates an error related to the serial port, socket or other transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No frame arrived within the response timeout.
    #[error("Timeout waiting for response")]
    Timeout,

    /// The pending exchange was cancelled by its token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string: {0}")]
    InvalidHexString(String),

    /// Indicates an invalid manufacturer code.
    #[error("Invalid manufacturer: {0}")]
    InvalidManufacturer(String),

    /// A caller-supplied value cannot be encoded.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MBusError {
    /// Returns the taxonomy code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MBusError::Empty => ErrorCode::Empty,
            MBusError::UnknownStartByte(_) => ErrorCode::UnknownStartByte,
            MBusError::ShortFrameTooShort { .. } => ErrorCode::ShortFrameTooShort,
            MBusError::LongFrameTooShort { .. } => ErrorCode::LongFrameTooShort,
            MBusError::InvalidLength(_) => ErrorCode::InvalidLength,
            MBusError::LengthMismatch { .. } => ErrorCode::LengthMismatch,
            MBusError::InvalidChecksum { .. } => ErrorCode::CrcMismatch,
            MBusError::InvalidStart2(_) => ErrorCode::InvalidStart2,
            MBusError::InvalidStop(_) => ErrorCode::InvalidStop,
            MBusError::WrongDirection(_) => ErrorCode::WrongDirection,
            MBusError::UnsupportedCi(_) => ErrorCode::UnsupportedCi,
            MBusError::UnsupportedFrame(_) => ErrorCode::UnsupportedFrame,
            MBusError::PacketTooShort { .. } => ErrorCode::PacketTooShort,
            MBusError::TooManyDifes(_) => ErrorCode::TooManyDifes,
            MBusError::TooManyVifes(_) => ErrorCode::TooManyVifes,
            MBusError::Transport(_) => ErrorCode::Transport,
            MBusError::Timeout => ErrorCode::Timeout,
            MBusError::Cancelled => ErrorCode::Cancelled,
            MBusError::InvalidHexString(_)
            | MBusError::InvalidManufacturer(_)
            | MBusError::InvalidInput(_) => ErrorCode::InvalidInput,
        }
    }

    /// True for failures caused by the bytes on the wire rather than I/O.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self.code(),
            ErrorCode::Transport | ErrorCode::Timeout | ErrorCode::Cancelled | ErrorCode::InvalidInput
        )
    }
}

impl From<std::io::Error> for MBusError {
    fn from(err: std::io::Error) -> Self {
        MBusError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_message() {
        let err = MBusError::InvalidChecksum {
            expected: 0x18,
            calculated: 0x19,
        };
        assert_eq!(err.code(), ErrorCode::CrcMismatch);
        assert_eq!(err.to_string(), "Invalid checksum: expected 0x18, calculated 0x19");
        assert!(err.is_structural());
    }

    #[test]
    fn test_io_errors_are_not_structural() {
        let err: MBusError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert_eq!(err.code(), ErrorCode::Transport);
        assert!(!err.is_structural());
        assert!(!MBusError::Timeout.is_structural());
    }
}
