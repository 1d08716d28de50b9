//! # Utility Modules
//!
//! Hex helpers shared by the link layer, the CLI and the tests.

pub mod hex;

pub use hex::{decode_hex, encode_hex, format_hex_compact, pretty_hex};
