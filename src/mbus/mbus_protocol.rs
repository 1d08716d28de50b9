//! # M-Bus Protocol Implementation
//!
//! This module provides the master side of the wired M-Bus link: one
//! request/response exchange at a time over a [`Transport`], with response
//! timeouts, retries on silence, frame count bit bookkeeping, multi-telegram
//! readout and primary/secondary device discovery.
//!
//! ```rust,no_run
//! use mbus_telegram::mbus::{MBusMaster, MasterConfig, SerialConfig, SerialTransport};
//!
//! # async fn run() -> Result<(), mbus_telegram::MBusError> {
//! let transport = SerialTransport::new("/dev/ttyUSB0", SerialConfig::default());
//! let mut master = MBusMaster::new(transport, MasterConfig::default());
//! master.connect().await?;
//! let packet = master.request_data(5).await?;
//! println!("{packet:?}");
//! # Ok(())
//! # }
//! ```

use crate::constants::MBUS_ADDRESS_NETWORK_LAYER;
use crate::error::MBusError;
use crate::logging::log_frame_hex;
use crate::mbus::frame::{pack_frame, parse_frame, MBusFrame};
use crate::mbus::secondary_addressing::{build_selection_frame, AddressMask, SecondaryAddress};
use crate::mbus::serial::SerialConfig;
use crate::mbus::transport::Transport;
use crate::payload::data::{map_to_packet, MBusPacket};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Timing and retry policy of the master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterConfig {
    /// How long to wait for the first byte of a reply.
    pub response_timeout: Duration,
    /// Extra attempts after a timed out request. Parse failures are never retried.
    pub retries: u32,
    /// Upper bound on telegrams fetched by [`MBusMaster::request_all`].
    pub max_telegrams: usize,
}

impl Default for MasterConfig {
    fn default() -> Self {
        MasterConfig {
            response_timeout: SerialConfig::default().timeout,
            retries: 3,
            max_telegrams: 16,
        }
    }
}

/// Result of a secondary address selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// No device matched the mask.
    Nothing,
    /// Exactly one device acknowledged.
    Single,
    /// Several devices answered at once.
    Collision,
}

/// Drives the request/response cycle over a transport.
pub struct MBusMaster<T: Transport> {
    transport: T,
    config: MasterConfig,
    cancel: CancellationToken,
    fcb: HashMap<u8, bool>,
}

impl<T: Transport> MBusMaster<T> {
    pub fn new(transport: T, config: MasterConfig) -> Self {
        MBusMaster {
            transport,
            config,
            cancel: CancellationToken::new(),
            fcb: HashMap::new(),
        }
    }

    /// Aborts pending and future exchanges when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub async fn connect(&mut self) -> Result<(), MBusError> {
        self.transport.connect().await
    }

    pub async fn disconnect(&mut self) -> Result<(), MBusError> {
        self.transport.disconnect().await
    }

    /// Packs and writes one frame.
    pub async fn send(&mut self, frame: &MBusFrame) -> Result<(), MBusError> {
        if self.cancel.is_cancelled() {
            return Err(MBusError::Cancelled);
        }
        let bytes = pack_frame(frame)?;
        log_frame_hex("TX", &bytes);
        self.transport.send_frame(&bytes).await
    }

    /// Waits for one frame, bounded by the response timeout and the token.
    pub async fn receive(&mut self) -> Result<MBusFrame, MBusError> {
        let cancel = self.cancel.clone();
        let wait = tokio::time::timeout(self.config.response_timeout, self.transport.receive_frame());

        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MBusError::Cancelled),
            received = wait => match received {
                Ok(bytes) => bytes?,
                Err(_) => return Err(MBusError::Timeout),
            },
        };

        log_frame_hex("RX", &bytes);
        parse_frame(&bytes)
    }

    /// Sends `frame` and waits for the reply, resending after a timeout.
    async fn exchange(&mut self, frame: &MBusFrame) -> Result<MBusFrame, MBusError> {
        let mut attempt = 0;
        loop {
            self.send(frame).await?;
            match self.receive().await {
                Err(MBusError::Timeout) if attempt < self.config.retries => {
                    attempt += 1;
                    warn!(
                        "No reply from address {}, retry {}/{}",
                        frame.address().unwrap_or_default(),
                        attempt,
                        self.config.retries
                    );
                }
                other => return other,
            }
        }
    }

    /// SND_NKE to `address`; true when something answered.
    ///
    /// A garbled reply still counts as a device being present.
    pub async fn ping(&mut self, address: u8) -> Result<bool, MBusError> {
        self.send(&MBusFrame::snd_nke(address)).await?;
        match self.receive().await {
            Ok(MBusFrame::Ack) => {
                self.fcb.remove(&address);
                Ok(true)
            }
            Ok(other) => {
                debug!("Address {address} answered SND_NKE with {:?}", other.frame_type());
                Ok(true)
            }
            Err(MBusError::Timeout) => Ok(false),
            Err(e) if e.is_structural() => {
                warn!("Address {address}: unreadable reply ({e})");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// REQ_UD2 to `address`, mapped onto its packet.
    ///
    /// The frame count bit alternates per address after every answered
    /// request and stays put while a request is repeated.
    pub async fn request_data(&mut self, address: u8) -> Result<MBusPacket, MBusError> {
        let fcb = *self.fcb.get(&address).unwrap_or(&true);
        let reply = self.exchange(&MBusFrame::req_ud2(address, fcb)).await?;
        self.fcb.insert(address, !fcb);
        map_to_packet(&reply)
    }

    /// Reads every telegram of a multi-telegram response.
    pub async fn request_all(&mut self, address: u8) -> Result<Vec<MBusPacket>, MBusError> {
        let mut packets = Vec::new();
        while packets.len() < self.config.max_telegrams {
            let packet = self.request_data(address).await?;
            let more = matches!(&packet, MBusPacket::VariableData(data) if data.more_records_follow);
            packets.push(packet);
            if !more {
                return Ok(packets);
            }
        }
        warn!(
            "Address {address} still announces more records after {} telegrams",
            self.config.max_telegrams
        );
        Ok(packets)
    }

    /// Selects the device(s) matching `mask` at address 0xFD.
    pub async fn select_secondary(&mut self, mask: &AddressMask) -> Result<SelectOutcome, MBusError> {
        self.send(&build_selection_frame(mask)).await?;
        match self.receive().await {
            Ok(MBusFrame::Ack) => Ok(SelectOutcome::Single),
            Ok(_) => Ok(SelectOutcome::Collision),
            Err(MBusError::Timeout) => Ok(SelectOutcome::Nothing),
            Err(e) if e.is_structural() => {
                debug!("Selection {mask}: overlapping replies ({e})");
                Ok(SelectOutcome::Collision)
            }
            Err(e) => Err(e),
        }
    }

    /// Pings every address in `range` and returns the ones that answered.
    pub async fn scan_primary(&mut self, range: RangeInclusive<u8>) -> Result<Vec<u8>, MBusError> {
        let mut found = Vec::new();
        for address in range {
            if self.ping(address).await? {
                info!("Found device at primary address {address}");
                found.push(address);
            }
        }
        Ok(found)
    }

    /// Depth-first wildcard search over the identification digits.
    ///
    /// A collision splits the first wildcard digit into 0-9; a selected
    /// device is read at address 0xFD to learn its full address.
    pub async fn scan_secondary(&mut self) -> Result<Vec<SecondaryAddress>, MBusError> {
        self.scan_secondary_from(AddressMask::wildcard()).await
    }

    /// Wildcard search restricted to the devices matching `start`.
    pub async fn scan_secondary_from(
        &mut self,
        start: AddressMask,
    ) -> Result<Vec<SecondaryAddress>, MBusError> {
        let mut found: Vec<SecondaryAddress> = Vec::new();
        let mut pending = vec![start];

        while let Some(mask) = pending.pop() {
            match self.select_secondary(&mask).await? {
                SelectOutcome::Nothing => {}
                SelectOutcome::Single => match self.request_data(MBUS_ADDRESS_NETWORK_LAYER).await {
                    Ok(MBusPacket::VariableData(data)) => {
                        let address = SecondaryAddress::from(&data);
                        if !found.contains(&address) {
                            info!("Found device {address}");
                            found.push(address);
                        }
                    }
                    Ok(other) => warn!("Selected device under {mask} sent {other:?}"),
                    Err(e) if e.is_structural() || e == MBusError::Timeout => {
                        warn!("Selected device under {mask} unreadable: {e}")
                    }
                    Err(e) => return Err(e),
                },
                SelectOutcome::Collision => match mask.first_wildcard_digit() {
                    Some(index) => {
                        pending.extend((0..=9u8).rev().map(|d| mask.with_id_digit(index, d)));
                    }
                    None => warn!("Unresolvable collision under {mask}"),
                },
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mbus::serial_mock::MockTransport;

    async fn master(mock: MockTransport) -> MBusMaster<MockTransport> {
        let mut master = MBusMaster::new(mock, MasterConfig::default());
        master.connect().await.unwrap();
        master
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping() {
        let mut mock = MockTransport::new();
        mock.queue_ack().queue_silence();
        let mut master = master(mock).await;

        assert!(master.ping(1).await.unwrap());
        assert!(!master.ping(2).await.unwrap());
        assert_eq!(
            master.transport().written(),
            &[vec![0x10, 0x40, 0x01, 0x41, 0x16], vec![0x10, 0x40, 0x02, 0x42, 0x16]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_retries_on_timeout_only() {
        let mut mock = MockTransport::new();
        for _ in 0..4 {
            mock.queue_silence();
        }
        let mut master = master(mock).await;
        assert_eq!(master.request_data(1).await.unwrap_err(), MBusError::Timeout);
        assert_eq!(master.transport().written().len(), 4);

        let mut mock = MockTransport::new();
        mock.queue_bytes(&[0x68, 0x03, 0x03, 0x68, 0x08, 0x01, 0x72, 0x00, 0x16]);
        let mut master = self::master(mock).await;
        let err = master.request_data(1).await.unwrap_err();
        assert!(matches!(err, MBusError::InvalidChecksum { .. }));
        assert_eq!(master.transport().written().len(), 1);
    }

    #[tokio::test]
    async fn test_fcb_toggles() {
        let mut mock = MockTransport::new();
        mock.queue_ack().queue_ack();
        let mut master = master(mock).await;

        assert_eq!(master.request_data(7).await.unwrap(), MBusPacket::Empty);
        assert_eq!(master.request_data(7).await.unwrap(), MBusPacket::Empty);
        let written = master.transport().written();
        assert_eq!(written[0][1], 0x7B);
        assert_eq!(written[1][1], 0x5B);
    }

    #[tokio::test]
    async fn test_cancelled_token() {
        let token = CancellationToken::new();
        let mut master = MBusMaster::new(MockTransport::new(), MasterConfig::default())
            .with_cancellation(token.clone());
        master.connect().await.unwrap();
        token.cancel();
        assert_eq!(master.ping(1).await.unwrap_err(), MBusError::Cancelled);
    }
}
