//! # M-Bus Serial Communication
//!
//! This module provides the serial line transport: the port is opened with
//! the M-Bus line settings (8 data bits, even parity, one stop bit) and frames
//! are delimited from the byte stream by their start byte and length field.

use crate::error::MBusError;
use crate::mbus::transport::{not_connected, read_frame_bytes, Transport};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_serial::SerialPortBuilderExt;

/// Configuration for serial connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub baudrate: u32,
    pub timeout: Duration,
}

impl SerialConfig {
    /// Configuration for `baudrate` with the matching response timeout.
    pub fn new(baudrate: u32) -> Self {
        SerialConfig {
            baudrate,
            timeout: response_timeout(baudrate),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig::new(2400)
    }
}

/// How long a slave may take to answer at `baudrate`.
pub fn response_timeout(baudrate: u32) -> Duration {
    match baudrate {
        300 => Duration::from_millis(1300),
        600 => Duration::from_millis(800),
        1200 => Duration::from_millis(500),
        2400 | 4800 => Duration::from_millis(300),
        b if b >= 9600 => Duration::from_millis(200),
        _ => Duration::from_millis(500),
    }
}

/// Serial port transport, wrapping a `tokio_serial::SerialStream`.
pub struct SerialTransport {
    port_name: String,
    config: SerialConfig,
    port: Option<tokio_serial::SerialStream>,
}

impl SerialTransport {
    pub fn new(port_name: impl Into<String>, config: SerialConfig) -> Self {
        SerialTransport {
            port_name: port_name.into(),
            config,
            port: None,
        }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<(), MBusError> {
        let port = tokio_serial::new(&self.port_name, self.config.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::Even)
            .timeout(self.config.timeout)
            .open_native_async()
            .map_err(|e| MBusError::Transport(e.to_string()))?;

        debug!(
            "Opened {} at {} Bd (8E1)",
            self.port_name, self.config.baudrate
        );
        self.port = Some(port);
        Ok(())
    }

    async fn send_frame(&mut self, data: &[u8]) -> Result<(), MBusError> {
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        port.write_all(data).await?;
        port.flush().await?;
        Ok(())
    }

    async fn receive_frame(&mut self) -> Result<Vec<u8>, MBusError> {
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        read_frame_bytes(port).await
    }

    async fn disconnect(&mut self) -> Result<(), MBusError> {
        // SerialStream has no close method; dropping it closes the port
        self.port = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_follows_baudrate() {
        assert_eq!(response_timeout(300), Duration::from_millis(1300));
        assert_eq!(response_timeout(600), Duration::from_millis(800));
        assert_eq!(response_timeout(1200), Duration::from_millis(500));
        assert_eq!(response_timeout(2400), Duration::from_millis(300));
        assert_eq!(response_timeout(4800), Duration::from_millis(300));
        assert_eq!(response_timeout(9600), Duration::from_millis(200));
        assert_eq!(response_timeout(38400), Duration::from_millis(200));
        assert_eq!(response_timeout(110), Duration::from_millis(500));
    }

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert_eq!(config.baudrate, 2400);
        assert_eq!(config.timeout, Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_io_before_connect_fails() {
        let mut transport = SerialTransport::new("/dev/null-mbus", SerialConfig::default());
        let err = transport.send_frame(&[0xE5]).await.unwrap_err();
        assert_eq!(err, MBusError::Transport("not connected".to_string()));
        assert!(transport.disconnect().await.is_ok());
    }
}
