//! Mock transport for testing
//!
//! This module provides a scripted in-memory transport that can be used to
//! test the master without requiring actual hardware. Replies are handed out
//! in order, one per `receive_frame` call; a scripted silence (or an empty
//! script) never answers, so the caller's response timeout fires.

use crate::error::MBusError;
use crate::mbus::frame::{pack_frame, MBusFrame};
use crate::mbus::transport::{not_connected, Transport};
use async_trait::async_trait;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MockReply {
    Bytes(Vec<u8>),
    Silence,
    Error(String),
}

/// Scripted transport: queued replies in, recorded writes out.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: VecDeque<MockReply>,
    written: Vec<Vec<u8>>,
    connected: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw reply bytes, valid or not.
    pub fn queue_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.replies.push_back(MockReply::Bytes(data.to_vec()));
        self
    }

    /// Queue a packed frame reply. A frame that cannot be packed is queued
    /// as a transport error carrying the packing failure.
    pub fn queue_frame(&mut self, frame: &MBusFrame) -> &mut Self {
        let reply = match pack_frame(frame) {
            Ok(bytes) => MockReply::Bytes(bytes),
            Err(err) => MockReply::Error(err.to_string()),
        };
        self.replies.push_back(reply);
        self
    }

    pub fn queue_ack(&mut self) -> &mut Self {
        self.queue_frame(&MBusFrame::Ack)
    }

    /// The next receive never completes.
    pub fn queue_silence(&mut self) -> &mut Self {
        self.replies.push_back(MockReply::Silence);
        self
    }

    /// The next receive fails with a transport error.
    pub fn queue_error(&mut self, message: &str) -> &mut Self {
        self.replies.push_back(MockReply::Error(message.to_string()));
        self
    }

    /// Every frame written so far, in order.
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), MBusError> {
        self.connected = true;
        Ok(())
    }

    async fn send_frame(&mut self, data: &[u8]) -> Result<(), MBusError> {
        if !self.connected {
            return Err(not_connected());
        }
        self.written.push(data.to_vec());
        Ok(())
    }

    async fn receive_frame(&mut self) -> Result<Vec<u8>, MBusError> {
        if !self.connected {
            return Err(not_connected());
        }
        match self.replies.pop_front() {
            Some(MockReply::Bytes(bytes)) => Ok(bytes),
            Some(MockReply::Error(message)) => Err(MBusError::Transport(message)),
            Some(MockReply::Silence) | None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) -> Result<(), MBusError> {
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_replies_in_order() {
        let mut mock = MockTransport::new();
        mock.queue_ack().queue_bytes(&[0x10, 0x5B, 0x01, 0x5C, 0x16]);
        mock.connect().await.unwrap();

        assert_eq!(mock.receive_frame().await.unwrap(), vec![0xE5]);
        assert_eq!(mock.receive_frame().await.unwrap().len(), 5);
        assert_eq!(mock.pending_replies(), 0);
    }

    #[tokio::test]
    async fn test_records_writes() {
        let mut mock = MockTransport::new();
        mock.connect().await.unwrap();
        mock.send_frame(&pack_frame(&MBusFrame::snd_nke(3)).unwrap())
            .await
            .unwrap();
        assert_eq!(mock.written(), &[vec![0x10, 0x40, 0x03, 0x43, 0x16]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_never_answers() {
        let mut mock = MockTransport::new();
        mock.queue_silence().queue_ack();
        mock.connect().await.unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(300), mock.receive_frame()).await;
        assert!(waited.is_err());
        assert_eq!(mock.receive_frame().await.unwrap(), vec![0xE5]);
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let mut mock = MockTransport::new();
        mock.queue_error("line down");
        assert!(mock.send_frame(&[0xE5]).await.is_err());
        mock.connect().await.unwrap();
        assert_eq!(
            mock.receive_frame().await.unwrap_err(),
            MBusError::Transport("line down".to_string())
        );
        mock.disconnect().await.unwrap();
        assert!(!mock.is_connected());
    }
}
