//! UDP transport. Each datagram carries exactly one frame.

use crate::constants::{MBUS_FRAME_LONG_OVERHEAD, MBUS_FRAME_MAX_PAYLOAD};
use crate::error::MBusError;
use crate::mbus::transport::{not_connected, Transport};
use async_trait::async_trait;
use log::debug;
use tokio::net::UdpSocket;

const MAX_DATAGRAM: usize = MBUS_FRAME_MAX_PAYLOAD + 3 + MBUS_FRAME_LONG_OVERHEAD;

pub struct UdpTransport {
    remote: String,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            socket: None,
        }
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn connect(&mut self) -> Result<(), MBusError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.set_broadcast(true)?;
        socket.connect(&self.remote).await?;
        debug!("UDP socket {} -> {}", socket.local_addr()?, self.remote);
        self.socket = Some(socket);
        Ok(())
    }

    async fn send_frame(&mut self, data: &[u8]) -> Result<(), MBusError> {
        let socket = self.socket.as_ref().ok_or_else(not_connected)?;
        socket.send(data).await?;
        Ok(())
    }

    async fn receive_frame(&mut self) -> Result<Vec<u8>, MBusError> {
        let socket = self.socket.as_ref().ok_or_else(not_connected)?;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let len = socket.recv(&mut buf).await?;
        buf.truncate(len);
        Ok(buf)
    }

    async fn disconnect(&mut self) -> Result<(), MBusError> {
        self.socket = None;
        Ok(())
    }
}
