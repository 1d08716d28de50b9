//! The mbus module contains the link layer (frame parsing and packing) and the
//! I/O side of the protocol: transports, secondary addressing and the master.

pub mod frame;
pub mod mbus_protocol;
pub mod secondary_addressing;
pub mod serial;
pub mod serial_mock;
pub mod tcp;
pub mod transport;
pub mod udp;

pub use frame::*;
pub use mbus_protocol::{MBusMaster, MasterConfig, SelectOutcome};
pub use secondary_addressing::{
    build_selection_frame, parse_mask, AddressMask, SecondaryAddress,
};
pub use serial::{response_timeout, SerialConfig, SerialTransport};
pub use serial_mock::MockTransport;
pub use tcp::TcpTransport;
pub use transport::{read_frame_bytes, Transport};
pub use udp::UdpTransport;
