//! # Transport Abstraction
//!
//! Every link the master talks over (serial line, TCP gateway, UDP gateway or
//! the in-memory mock) implements [`Transport`]. A transport moves raw frame
//! bytes only; parsing and timeouts belong to the master.

use crate::constants::{
    MBUS_FRAME_ACK_SIZE, MBUS_FRAME_ACK_START, MBUS_FRAME_LONG_OVERHEAD, MBUS_FRAME_LONG_START,
    MBUS_FRAME_SHORT_SIZE, MBUS_FRAME_SHORT_START,
};
use crate::error::MBusError;
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A byte link to one or more M-Bus slaves.
#[async_trait]
pub trait Transport: Send {
    /// Opens the underlying port or socket.
    async fn connect(&mut self) -> Result<(), MBusError>;

    /// Writes one packed frame.
    async fn send_frame(&mut self, data: &[u8]) -> Result<(), MBusError>;

    /// Waits for the bytes of exactly one frame.
    ///
    /// Implementations may wait forever; the caller bounds the wait.
    async fn receive_frame(&mut self) -> Result<Vec<u8>, MBusError>;

    /// Closes the link. Closing a closed link is not an error.
    async fn disconnect(&mut self) -> Result<(), MBusError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn connect(&mut self) -> Result<(), MBusError> {
        (**self).connect().await
    }

    async fn send_frame(&mut self, data: &[u8]) -> Result<(), MBusError> {
        (**self).send_frame(data).await
    }

    async fn receive_frame(&mut self) -> Result<Vec<u8>, MBusError> {
        (**self).receive_frame().await
    }

    async fn disconnect(&mut self) -> Result<(), MBusError> {
        (**self).disconnect().await
    }
}

pub(crate) fn not_connected() -> MBusError {
    MBusError::Transport("not connected".to_string())
}

async fn read_exact_into<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), MBusError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(MBusError::Transport("connection closed".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delimits one frame from a byte stream using its start byte and L-field.
///
/// ACK is one byte, a short frame five, a long or control frame `L + 6`.
/// The returned bytes are not validated beyond the start byte; hand them to
/// [`parse_frame`](crate::mbus::frame::parse_frame).
pub async fn read_frame_bytes<R>(reader: &mut R) -> Result<Vec<u8>, MBusError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut start = [0u8; 1];
    read_exact_into(reader, &mut start).await?;

    let mut frame = match start[0] {
        MBUS_FRAME_ACK_START => return Ok(vec![MBUS_FRAME_ACK_START]),
        MBUS_FRAME_SHORT_START => {
            let mut frame = vec![0u8; MBUS_FRAME_SHORT_SIZE];
            read_exact_into(reader, &mut frame[MBUS_FRAME_ACK_SIZE..]).await?;
            frame
        }
        MBUS_FRAME_LONG_START => {
            let mut length = [0u8; 2];
            read_exact_into(reader, &mut length).await?;
            let total = length[0] as usize + MBUS_FRAME_LONG_OVERHEAD;
            let mut frame = vec![0u8; total];
            frame[1] = length[0];
            frame[2] = length[1];
            read_exact_into(reader, &mut frame[3..]).await?;
            frame
        }
        other => return Err(MBusError::UnknownStartByte(other)),
    };

    frame[0] = start[0];
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delimits_consecutive_frames() {
        let stream: Vec<u8> = vec![
            0xE5, // ack
            0x10, 0x40, 0x01, 0x41, 0x16, // short
            0x68, 0x03, 0x03, 0x68, 0x08, 0x01, 0x72, 0x7B, 0x16, // control
        ];
        let mut reader = stream.as_slice();

        assert_eq!(read_frame_bytes(&mut reader).await.unwrap(), vec![0xE5]);
        assert_eq!(read_frame_bytes(&mut reader).await.unwrap().len(), 5);
        let control = read_frame_bytes(&mut reader).await.unwrap();
        assert_eq!(control.len(), 9);
        assert_eq!(control[0], 0x68);
        assert_eq!(control[8], 0x16);
        assert!(reader.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_start_and_eof() {
        let mut reader: &[u8] = &[0x42];
        assert_eq!(
            read_frame_bytes(&mut reader).await.unwrap_err(),
            MBusError::UnknownStartByte(0x42)
        );

        let mut truncated: &[u8] = &[0x68, 0x05, 0x05, 0x68, 0x08];
        let err = read_frame_bytes(&mut truncated).await.unwrap_err();
        assert_eq!(err, MBusError::Transport("connection closed".to_string()));
    }
}
