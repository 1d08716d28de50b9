//! M-Bus Protocol Constants
//!
//! This module defines constants used by the link layer (EN 13757-2) and the
//! application layer (EN 13757-3) codecs.

// ----------------------------------------------------------------------------
// Frame markers
// ----------------------------------------------------------------------------

/// Single-character acknowledgement frame
pub const MBUS_FRAME_ACK_START: u8 = 0xE5;

/// Start byte of a short frame (fixed 5 bytes)
pub const MBUS_FRAME_SHORT_START: u8 = 0x10;

/// Start byte of a control or long frame (repeated at offset 3)
pub const MBUS_FRAME_LONG_START: u8 = 0x68;

/// Stop byte terminating short, control and long frames
pub const MBUS_FRAME_STOP: u8 = 0x16;

pub const MBUS_FRAME_ACK_SIZE: usize = 1;
pub const MBUS_FRAME_SHORT_SIZE: usize = 5;
pub const MBUS_FRAME_CONTROL_SIZE: usize = 9;

/// Start, L, L, start plus checksum and stop around the L-field bytes
pub const MBUS_FRAME_LONG_OVERHEAD: usize = 6;

/// Smallest legal L-field: control, address and CI
pub const MBUS_FRAME_MIN_LENGTH: u8 = 3;

/// Largest user payload a single L-field can describe
pub const MBUS_FRAME_MAX_PAYLOAD: usize = 0xFF - MBUS_FRAME_MIN_LENGTH as usize;

// ----------------------------------------------------------------------------
// Addresses
// ----------------------------------------------------------------------------

/// Network layer (secondary addressing) address
pub const MBUS_ADDRESS_NETWORK_LAYER: u8 = 0xFD;

/// Highest primary address that can be polled individually
pub const MBUS_MAX_PRIMARY_SLAVES: u8 = 250;

// ----------------------------------------------------------------------------
// Control field
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_MASK_SND_NKE: u8 = 0x40;
pub const MBUS_CONTROL_MASK_SND_UD: u8 = 0x53;
pub const MBUS_CONTROL_MASK_REQ_UD2: u8 = 0x5B;

pub const MBUS_CONTROL_MASK_FCB: u8 = 0x20;
pub const MBUS_CONTROL_MASK_FCV: u8 = 0x10;
pub const MBUS_CONTROL_MASK_DIR_M2S: u8 = 0x40;

// ----------------------------------------------------------------------------
// Control information (CI) codes
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_INFO_SELECT_SLAVE: u8 = 0x52;
pub const MBUS_CONTROL_INFO_ERROR_GENERAL: u8 = 0x70;
pub const MBUS_CONTROL_INFO_STATUS_ALARM: u8 = 0x71;
pub const MBUS_CONTROL_INFO_RESP_VARIABLE: u8 = 0x72;
pub const MBUS_CONTROL_INFO_RESP_FIXED: u8 = 0x73;

// ----------------------------------------------------------------------------
// Fixed data structure (CI = 0x73)
// ----------------------------------------------------------------------------

/// Header without counters: id(4) + access no(1) + status(1) + units(2)
pub const MBUS_DATA_FIXED_HEADER_LENGTH: usize = 8;

/// Header plus both 4-byte counters
pub const MBUS_DATA_FIXED_LENGTH: usize = 16;

/// Status bit selecting binary (set) or BCD (clear) counters
pub const MBUS_DATA_FIXED_STATUS_FORMAT_BINARY: u8 = 0x01;

/// Status bit marking the counters as fixed (stored) values
pub const MBUS_DATA_FIXED_STATUS_COUNTERS_FIXED: u8 = 0x02;

pub const MBUS_DATA_FIXED_UNIT_MASK: u8 = 0x3F;
pub const MBUS_DATA_FIXED_MEDIUM_MASK: u8 = 0xC0;

// ----------------------------------------------------------------------------
// Variable data structure (CI = 0x72)
// ----------------------------------------------------------------------------

/// id(4) + manufacturer(2) + version(1) + device type(1) + access no(1)
/// + status(1) + signature(2)
pub const MBUS_DATA_VARIABLE_HEADER_LENGTH: usize = 12;

// ----------------------------------------------------------------------------
// Data information block
// ----------------------------------------------------------------------------

/// DIF mask for data length / encoding
pub const MBUS_DATA_RECORD_DIF_MASK_DATA: u8 = 0x0F;

/// DIF mask for function
pub const MBUS_DATA_RECORD_DIF_MASK_FUNCTION: u8 = 0x30;

/// DIF mask for the low storage number bit
pub const MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO: u8 = 0x40;

/// DIFE mask for storage number
pub const MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO: u8 = 0x0F;

/// DIFE mask for tariff
pub const MBUS_DATA_RECORD_DIFE_MASK_TARIFF: u8 = 0x30;

/// DIFE mask for sub-unit (device)
pub const MBUS_DATA_RECORD_DIFE_MASK_DEVICE: u8 = 0x40;

/// DIF idle filler
pub const MBUS_DIB_DIF_IDLE_FILLER: u8 = 0x2F;

/// DIF manufacturer specific, rest of the payload is opaque
pub const MBUS_DIB_DIF_MANUFACTURER_SPECIFIC: u8 = 0x0F;

/// DIF more records follow in the next telegram
pub const MBUS_DIB_DIF_MORE_RECORDS_FOLLOW: u8 = 0x1F;

/// DIF/DIFE extension bit
pub const MBUS_DIB_DIF_EXTENSION_BIT: u8 = 0x80;

/// Upper bound on DIFEs per record
pub const MBUS_DIB_DIFE_MAX: usize = 11;

// ----------------------------------------------------------------------------
// Value information block
// ----------------------------------------------------------------------------

/// VIF without its extension bit
pub const MBUS_DIB_VIF_WITHOUT_EXTENSION: u8 = 0x7F;

/// VIF/VIFE extension bit
pub const MBUS_DIB_VIF_EXTENSION_BIT: u8 = 0x80;

/// Upper bound on VIFEs per record
pub const MBUS_DIB_VIFE_MAX: usize = 11;

/// Linear extension, VIFEs resolve against the 0xFB table
pub const MBUS_VIF_EXTENSION_FB: u8 = 0x7B;

/// Plain text VIF, an ASCII unit follows
pub const MBUS_VIF_PLAIN_TEXT: u8 = 0x7C;

/// Linear extension, VIFEs resolve against the 0xFD table
pub const MBUS_VIF_EXTENSION_FD: u8 = 0x7D;

/// Any VIF (wildcard in readout selection)
pub const MBUS_VIF_ANY: u8 = 0x7E;

/// Manufacturer specific VIF
pub const MBUS_VIF_MANUFACTURER_SPECIFIC: u8 = 0x7F;

/// Longest plain text unit accepted after VIF 0x7C
pub const MBUS_VALUE_INFO_BLOCK_CUSTOM_VIF_SIZE: u8 = 16;
