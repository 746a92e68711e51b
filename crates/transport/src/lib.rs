// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sds-transport: the pub/sub boundary of the SDS runtime.
//!
//! The runtime consumes a small capability surface: connect with a last
//! will, publish, subscribe, unsubscribe, drain inbound messages, and
//! disconnect. [`Transport`] is that surface; the in-process
//! [`fake::FakeBroker`] implements it for tests and the `rumqttc` feature
//! provides a real MQTT client behind the same trait.

use sds_core::SdsError;
use thiserror::Error;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(feature = "rumqttc")]
pub mod mqtt;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBroker, FakeTransport};
#[cfg(feature = "rumqttc")]
pub use mqtt::MqttTransport;

/// MQTT quality-of-service levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QoS {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Last-will registration: published by the broker when the client's
/// session ends without a clean disconnect.
#[derive(Debug, Clone)]
pub struct LastWill {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retained: bool,
}

/// Connection parameters handed to [`Transport::connect`]. Credentials are
/// opaque to the runtime and passed straight through.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: u64,
    pub last_will: Option<LastWill>,
}

/// One inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retained: bool,
}

/// Errors from transport operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("not connected")]
    Disconnected,
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
    #[error("transport not available")]
    NotAvailable,
}

impl From<TransportError> for SdsError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::ConnectFailed(m) => SdsError::ConnectFailed(m),
            TransportError::Disconnected => SdsError::Disconnected,
            TransportError::PublishFailed(m) => SdsError::PublishFailed(m),
            TransportError::SubscribeFailed(m) => SdsError::SubscribeFailed(m),
            TransportError::NotAvailable => SdsError::TransportUnavailable,
        }
    }
}

/// Capability surface the runtime needs from a pub/sub client.
///
/// Implementations queue inbound messages internally; [`Transport::drain`]
/// is non-blocking and must preserve per-topic delivery order.
pub trait Transport: Send {
    /// Connect, registering the last will. Blocks until the session is
    /// established or the configured timeout elapses.
    fn connect(&mut self, opts: &ConnectOptions) -> Result<(), TransportError>;

    /// Clean disconnect; discards the registered will.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retained: bool,
    ) -> Result<(), TransportError>;

    fn subscribe(&mut self, filter: &str, qos: QoS) -> Result<(), TransportError>;

    fn unsubscribe(&mut self, filter: &str) -> Result<(), TransportError>;

    /// Take every message received since the last call.
    fn drain(&mut self) -> Vec<Inbound>;
}
