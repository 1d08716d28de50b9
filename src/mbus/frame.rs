//! # M-Bus Link Layer Frames
//!
//! This module decodes and encodes the four EN 13757-2 frame shapes exchanged on
//! a wired M-Bus: the single-character acknowledgement, the short frame, the
//! control frame and the long frame.
//!
//! ## Features
//! - Parse a byte slice into a [`MBusFrame`], validating start bytes, the
//!   repeated L-field, the checksum and the stop byte.
//! - Pack a frame back into bytes, recomputing the checksum every time and
//!   refusing long frames whose payload does not fit the L-field.
//! - Pre-size destination buffers with [`packed_len`] and stream into a
//!   `BytesMut` with [`pack_frame_into`].
//!
//! ## Usage
//!
//! ```
//! use mbus_telegram::mbus::frame::{pack_frame, parse_frame, MBusFrame};
//!
//! let frame = parse_frame(&[0x10, 0x40, 0x0A, 0x4A, 0x16]).unwrap();
//! assert_eq!(frame, MBusFrame::snd_nke(0x0A));
//! assert_eq!(pack_frame(&frame).unwrap(), vec![0x10, 0x40, 0x0A, 0x4A, 0x16]);
//! ```
//!
//! ## Error Handling
//! Every rejection is a structured [`MBusError`]; truncated, garbage and empty
//! input never panic and never yield a partial frame.

use crate::constants::{
    MBUS_CONTROL_MASK_DIR_M2S, MBUS_CONTROL_MASK_FCB, MBUS_CONTROL_MASK_FCV,
    MBUS_CONTROL_MASK_REQ_UD2, MBUS_CONTROL_MASK_SND_NKE, MBUS_FRAME_ACK_SIZE,
    MBUS_FRAME_ACK_START, MBUS_FRAME_CONTROL_SIZE, MBUS_FRAME_LONG_OVERHEAD,
    MBUS_FRAME_LONG_START, MBUS_FRAME_MAX_PAYLOAD, MBUS_FRAME_MIN_LENGTH,
    MBUS_FRAME_SHORT_SIZE, MBUS_FRAME_SHORT_START, MBUS_FRAME_STOP,
};
use crate::error::MBusError;
use bitflags::bitflags;
use bytes::{BufMut, BytesMut};
use serde::Serialize;

/// Represents an M-Bus frame.
///
/// Checksums are not stored: they are validated by the parser and derived
/// again by the packer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MBusFrame {
    /// Single character 0xE5.
    Ack,
    /// `10 C A CS 16`
    Short { control: u8, address: u8 },
    /// `68 03 03 68 C A CI CS 16`
    Control {
        control: u8,
        address: u8,
        control_information: u8,
    },
    /// `68 L L 68 C A CI data CS 16`
    Long {
        control: u8,
        address: u8,
        control_information: u8,
        data: Vec<u8>,
    },
}

/// Represents the different types of M-Bus frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MBusFrameType {
    Ack,
    Short,
    Control,
    Long,
}

bitflags! {
    /// Flag bits of the C-field.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        /// Frame count valid
        const FCV = MBUS_CONTROL_MASK_FCV;
        /// Frame count bit
        const FCB = MBUS_CONTROL_MASK_FCB;
        /// Master to slave
        const DIR_M2S = MBUS_CONTROL_MASK_DIR_M2S;
    }
}

impl MBusFrame {
    /// Builds a short frame.
    pub fn short(control: u8, address: u8) -> Self {
        MBusFrame::Short { control, address }
    }

    /// SND_NKE: link reset / ping.
    pub fn snd_nke(address: u8) -> Self {
        MBusFrame::short(MBUS_CONTROL_MASK_SND_NKE, address)
    }

    /// REQ_UD2: request class 2 user data, with the frame count bit set when
    /// `fcb` is true.
    pub fn req_ud2(address: u8, fcb: bool) -> Self {
        let control = if fcb {
            MBUS_CONTROL_MASK_REQ_UD2 | MBUS_CONTROL_MASK_FCB
        } else {
            MBUS_CONTROL_MASK_REQ_UD2
        };
        MBusFrame::short(control, address)
    }

    /// Builds a long frame, or a control frame when `data` is empty.
    pub fn long(
        control: u8,
        address: u8,
        control_information: u8,
        data: Vec<u8>,
    ) -> Result<Self, MBusError> {
        if data.len() > MBUS_FRAME_MAX_PAYLOAD {
            return Err(MBusError::InvalidInput(format!(
                "payload of {} bytes exceeds {} byte limit",
                data.len(),
                MBUS_FRAME_MAX_PAYLOAD
            )));
        }
        if data.is_empty() {
            return Ok(MBusFrame::Control {
                control,
                address,
                control_information,
            });
        }
        Ok(MBusFrame::Long {
            control,
            address,
            control_information,
            data,
        })
    }

    pub fn frame_type(&self) -> MBusFrameType {
        match self {
            MBusFrame::Ack => MBusFrameType::Ack,
            MBusFrame::Short { .. } => MBusFrameType::Short,
            MBusFrame::Control { .. } => MBusFrameType::Control,
            MBusFrame::Long { .. } => MBusFrameType::Long,
        }
    }

    /// C-field, `None` for an ACK.
    pub fn control(&self) -> Option<u8> {
        match self {
            MBusFrame::Ack => None,
            MBusFrame::Short { control, .. }
            | MBusFrame::Control { control, .. }
            | MBusFrame::Long { control, .. } => Some(*control),
        }
    }

    /// A-field, `None` for an ACK.
    pub fn address(&self) -> Option<u8> {
        match self {
            MBusFrame::Ack => None,
            MBusFrame::Short { address, .. }
            | MBusFrame::Control { address, .. }
            | MBusFrame::Long { address, .. } => Some(*address),
        }
    }

    /// CI-field, present on control and long frames only.
    pub fn control_information(&self) -> Option<u8> {
        match self {
            MBusFrame::Control {
                control_information,
                ..
            }
            | MBusFrame::Long {
                control_information,
                ..
            } => Some(*control_information),
            MBusFrame::Ack | MBusFrame::Short { .. } => None,
        }
    }

    /// User data bytes; empty for everything but a long frame.
    pub fn payload(&self) -> &[u8] {
        match self {
            MBusFrame::Long { data, .. } => data,
            _ => &[],
        }
    }

    pub fn control_flags(&self) -> ControlFlags {
        ControlFlags::from_bits_truncate(self.control().unwrap_or(0))
    }

    /// True when the DIR bit marks a slave-to-master frame. An ACK carries no
    /// direction and always answers the master.
    pub fn is_slave_to_master(&self) -> bool {
        !self.control_flags().contains(ControlFlags::DIR_M2S)
    }
}

/// Unsigned byte sum modulo 256, the checksum of short, control and long frames.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Calculates the checksum of an M-Bus frame from its fields.
pub fn calculate_checksum(frame: &MBusFrame) -> u8 {
    match frame {
        MBusFrame::Ack => 0,
        MBusFrame::Short { control, address } => control.wrapping_add(*address),
        MBusFrame::Control {
            control,
            address,
            control_information,
        } => checksum(&[*control, *address, *control_information]),
        MBusFrame::Long {
            control,
            address,
            control_information,
            data,
        } => checksum(&[*control, *address, *control_information]).wrapping_add(checksum(data)),
    }
}

/// Parses one frame from the start of `input`.
///
/// Trailing bytes after a complete frame are ignored; use [`packed_len`] on
/// the result to learn how many bytes were consumed.
pub fn parse_frame(input: &[u8]) -> Result<MBusFrame, MBusError> {
    let start = *input.first().ok_or(MBusError::Empty)?;
    match start {
        MBUS_FRAME_ACK_START => Ok(MBusFrame::Ack),
        MBUS_FRAME_SHORT_START => parse_short_frame(input),
        MBUS_FRAME_LONG_START => parse_control_or_long_frame(input),
        other => Err(MBusError::UnknownStartByte(other)),
    }
}

/// Parses a short M-Bus frame: start, control, address, checksum, stop.
fn parse_short_frame(input: &[u8]) -> Result<MBusFrame, MBusError> {
    if input.len() < MBUS_FRAME_SHORT_SIZE {
        return Err(MBusError::ShortFrameTooShort {
            available: input.len(),
        });
    }

    let control = input[1];
    let address = input[2];
    let expected = input[3];
    let calculated = control.wrapping_add(address);
    if expected != calculated {
        return Err(MBusError::InvalidChecksum {
            expected,
            calculated,
        });
    }
    if input[4] != MBUS_FRAME_STOP {
        return Err(MBusError::InvalidStop(input[4]));
    }

    Ok(MBusFrame::Short { control, address })
}

/// Parses a control or long M-Bus frame.
fn parse_control_or_long_frame(input: &[u8]) -> Result<MBusFrame, MBusError> {
    if input.len() < 3 {
        return Err(MBusError::LongFrameTooShort {
            expected: MBUS_FRAME_CONTROL_SIZE,
            available: input.len(),
        });
    }

    let length1 = input[1];
    let length2 = input[2];
    if length1 < MBUS_FRAME_MIN_LENGTH {
        return Err(MBusError::InvalidLength(length1));
    }
    if length1 != length2 {
        return Err(MBusError::LengthMismatch { length1, length2 });
    }

    let total = length1 as usize + MBUS_FRAME_LONG_OVERHEAD;
    if input.len() < total {
        return Err(MBusError::LongFrameTooShort {
            expected: total,
            available: input.len(),
        });
    }
    if input[3] != MBUS_FRAME_LONG_START {
        return Err(MBusError::InvalidStart2(input[3]));
    }

    let control = input[4];
    let address = input[5];
    let control_information = input[6];
    let data = &input[7..total - 2];

    // Checksum covers C, A, CI and the user data
    let expected = input[total - 2];
    let calculated = checksum(&input[4..total - 2]);
    if expected != calculated {
        return Err(MBusError::InvalidChecksum {
            expected,
            calculated,
        });
    }
    if input[total - 1] != MBUS_FRAME_STOP {
        return Err(MBusError::InvalidStop(input[total - 1]));
    }

    if data.is_empty() {
        Ok(MBusFrame::Control {
            control,
            address,
            control_information,
        })
    } else {
        Ok(MBusFrame::Long {
            control,
            address,
            control_information,
            data: data.to_vec(),
        })
    }
}

/// Number of bytes [`pack_frame`] will produce for `frame`.
pub fn packed_len(frame: &MBusFrame) -> usize {
    match frame {
        MBusFrame::Ack => MBUS_FRAME_ACK_SIZE,
        MBusFrame::Short { .. } => MBUS_FRAME_SHORT_SIZE,
        MBusFrame::Control { .. } => MBUS_FRAME_CONTROL_SIZE,
        MBusFrame::Long { data, .. } => {
            MBUS_FRAME_LONG_OVERHEAD + MBUS_FRAME_MIN_LENGTH as usize + data.len()
        }
    }
}

/// Checks that `frame` can be put on the wire.
///
/// A hand-built [`MBusFrame::Long`] must carry between 1 and 252 payload
/// bytes: the L-field is a single byte and an empty payload is a control frame.
pub fn verify_frame(frame: &MBusFrame) -> Result<(), MBusError> {
    if let MBusFrame::Long { data, .. } = frame {
        if data.is_empty() {
            return Err(MBusError::InvalidInput(
                "long frame without payload, use a control frame".to_string(),
            ));
        }
        if data.len() > MBUS_FRAME_MAX_PAYLOAD {
            return Err(MBusError::InvalidInput(format!(
                "payload of {} bytes exceeds {} byte limit",
                data.len(),
                MBUS_FRAME_MAX_PAYLOAD
            )));
        }
    }
    Ok(())
}

/// Packs an M-Bus frame into a byte vector.
pub fn pack_frame(frame: &MBusFrame) -> Result<Vec<u8>, MBusError> {
    let mut buf = BytesMut::with_capacity(packed_len(frame));
    pack_frame_into(frame, &mut buf)?;
    Ok(buf.to_vec())
}

/// Appends the wire form of `frame` to `buf`.
///
/// Fails without touching `buf` when [`verify_frame`] rejects the frame.
pub fn pack_frame_into(frame: &MBusFrame, buf: &mut BytesMut) -> Result<(), MBusError> {
    verify_frame(frame)?;
    buf.reserve(packed_len(frame));
    match frame {
        MBusFrame::Ack => buf.put_u8(MBUS_FRAME_ACK_START),
        MBusFrame::Short { control, address } => {
            buf.put_u8(MBUS_FRAME_SHORT_START);
            buf.put_u8(*control);
            buf.put_u8(*address);
            buf.put_u8(calculate_checksum(frame));
            buf.put_u8(MBUS_FRAME_STOP);
        }
        MBusFrame::Control {
            control,
            address,
            control_information,
        } => pack_control_or_long_frame(buf, *control, *address, *control_information, &[]),
        MBusFrame::Long {
            control,
            address,
            control_information,
            data,
        } => pack_control_or_long_frame(buf, *control, *address, *control_information, data),
    }
    Ok(())
}

/// Packs a control or long M-Bus frame.
fn pack_control_or_long_frame(
    buf: &mut BytesMut,
    control: u8,
    address: u8,
    control_information: u8,
    data: &[u8],
) {
    let length = (data.len() + MBUS_FRAME_MIN_LENGTH as usize) as u8;
    buf.put_u8(MBUS_FRAME_LONG_START);
    buf.put_u8(length);
    buf.put_u8(length);
    buf.put_u8(MBUS_FRAME_LONG_START);
    buf.put_u8(control);
    buf.put_u8(address);
    buf.put_u8(control_information);
    buf.put_slice(data);
    buf.put_u8(checksum(&[control, address, control_information]).wrapping_add(checksum(data)));
    buf.put_u8(MBUS_FRAME_STOP);
}
