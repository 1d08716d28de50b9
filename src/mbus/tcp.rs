//! TCP transport for M-Bus gateways that bridge a serial segment to a socket.

use crate::error::MBusError;
use crate::mbus::transport::{not_connected, read_frame_bytes, Transport};
use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: None,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<(), MBusError> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        debug!("Connected to {}", self.addr);
        self.stream = Some(stream);
        Ok(())
    }

    async fn send_frame(&mut self, data: &[u8]) -> Result<(), MBusError> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        stream.write_all(data).await?;
        Ok(())
    }

    async fn receive_frame(&mut self) -> Result<Vec<u8>, MBusError> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        read_frame_bytes(stream).await
    }

    async fn disconnect(&mut self) -> Result<(), MBusError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_exchange_with_gateway() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let gateway = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 5];
            socket.read_exact(&mut request).await.unwrap();
            socket.write_all(&[0xE5]).await.unwrap();
            request
        });

        let mut transport = TcpTransport::new(addr.to_string());
        transport.connect().await.unwrap();
        transport
            .send_frame(&[0x10, 0x40, 0x01, 0x41, 0x16])
            .await
            .unwrap();
        assert_eq!(transport.receive_frame().await.unwrap(), vec![0xE5]);
        transport.disconnect().await.unwrap();

        assert_eq!(gateway.await.unwrap(), [0x10, 0x40, 0x01, 0x41, 0x16]);
    }
}
