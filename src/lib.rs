//! # mbus-telegram - A Rust Crate for Wired M-Bus Telegrams
//!
//! The mbus-telegram crate decodes and encodes wired M-Bus (Meter-Bus,
//! EN 13757-2/3) telegrams, the European standard for reading utility meters
//! such as electricity, gas, water and heat meters.
//!
//! ## Features
//!
//! - Parse and pack ACK, short, control and long frames with checksum validation
//! - Map long frames onto fixed data, variable data, alarm and error packets
//! - Decode data records: DIF/DIFE chains, VIF/VIFE units, BCD, dates and variable length values
//! - Resolve every VIF/VIFE code to a quantity, unit and decimal magnitude
//! - Talk to meters over serial, TCP or UDP with retries, multi-telegram readout and device scans
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```rust
//! use mbus_telegram::{decode_telegram, MBusPacket};
//!
//! let packet = decode_telegram(&[0xE5]).unwrap();
//! assert_eq!(packet, MBusPacket::Empty);
//! ```

pub mod constants;
pub mod error;
pub mod logging;
pub mod mbus;
pub mod payload;
pub mod util;

pub use crate::error::{ErrorCode, MBusError};
pub use crate::logging::{init_logger, log_info};

// Link layer
pub use mbus::{pack_frame, parse_frame, MBusFrame, MBusFrameType};

// Application layer
pub use payload::{
    map_to_packet, normalize_record, DataRecord, MBusPacket, Quantity, RecordValue, UnitInfo,
};

// Master and transports
pub use mbus::{
    MBusMaster, MasterConfig, MockTransport, SecondaryAddress, SelectOutcome, SerialConfig,
    SerialTransport, TcpTransport, Transport, UdpTransport,
};

/// Parse a raw telegram and map it onto its packet.
///
/// # Arguments
/// * `bytes` - One complete frame as received from the bus
///
/// # Returns
/// * `Ok(MBusPacket)` - Decoded packet
/// * `Err(MBusError)` - The frame or its payload is malformed
pub fn decode_telegram(bytes: &[u8]) -> Result<MBusPacket, MBusError> {
    map_to_packet(&parse_frame(bytes)?)
}

/// Like [`decode_telegram`], for a hex string such as `"68 03 03 68 ..."`.
pub fn decode_hex_telegram(text: &str) -> Result<MBusPacket, MBusError> {
    decode_telegram(&util::hex::decode_hex(text)?)
}

/// Open a serial master on `port` with default line settings.
///
/// # Arguments
/// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
///
/// # Returns
/// * `Ok(MBusMaster)` - Connected master
/// * `Err(MBusError)` - The port could not be opened
pub async fn connect(port: &str) -> Result<MBusMaster<SerialTransport>, MBusError> {
    let config = SerialConfig::default();
    let master_config = MasterConfig {
        response_timeout: config.timeout,
        ..MasterConfig::default()
    };
    let mut master = MBusMaster::new(SerialTransport::new(port, config), master_config);
    master.connect().await?;
    Ok(master)
}
