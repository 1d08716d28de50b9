//! # Hex Utilities
//!
//! Helpers for turning telegram bytes into text and back, used by the CLI,
//! the log helpers and the test fixtures.
//!
//! ```rust
//! use mbus_telegram::util::hex::{decode_hex, encode_hex, format_hex_compact};
//!
//! let data = decode_hex("68 03 03 68").unwrap();
//! assert_eq!(data, [0x68, 0x03, 0x03, 0x68]);
//! assert_eq!(encode_hex(&data), "68030368");
//! assert_eq!(format_hex_compact(&data), "68 03 03 68");
//! ```

use crate::error::MBusError;

/// Encode bytes to an uppercase hex string without separators.
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode a hex string to bytes.
///
/// Whitespace, `:` and `-` separators are stripped, so both `"68 1F 1F 68"`
/// and `"681f1f68"` are accepted.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, MBusError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();

    if cleaned.is_empty() {
        return Err(MBusError::InvalidHexString("empty string".to_string()));
    }
    if cleaned.len() % 2 != 0 {
        return Err(MBusError::InvalidHexString(format!(
            "odd number of hex digits: {}",
            cleaned.len()
        )));
    }

    hex::decode(&cleaned).map_err(|e| MBusError::InvalidHexString(e.to_string()))
}

/// Format bytes as `"68 1F 1F 68"` for log lines.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex dump with offsets and an ASCII column, `bytes_per_line` bytes a row.
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    let width = bytes_per_line.max(1);
    data.chunks(width)
        .enumerate()
        .map(|(row, chunk)| {
            let hex = format_hex_compact(chunk);
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!("{:04X}: {:<pad$} |{}|", row * width, hex, ascii, pad = width * 3 - 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_separators() {
        assert_eq!(decode_hex("E5").unwrap(), vec![0xE5]);
        assert_eq!(decode_hex("10:40:0a-4a 16").unwrap(), vec![0x10, 0x40, 0x0A, 0x4A, 0x16]);
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode_hex("").is_err());
        assert!(decode_hex("   ").is_err());
        assert!(decode_hex("ABC").is_err());
        assert!(decode_hex("ZZ").is_err());
    }

    #[test]
    fn test_pretty_hex_rows() {
        let dump = pretty_hex(&[0x68, 0x41, 0x42, 0x16], 2);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0000: 68 41 |hA|");
        assert_eq!(lines[1], "0002: 42 16 |B.|");
        assert_eq!(pretty_hex(&[], 16), "");
    }
}
