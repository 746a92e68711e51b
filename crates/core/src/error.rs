// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the runtime.

use thiserror::Error;

/// Errors surfaced by the runtime.
///
/// Every fallible public operation returns one of these tagged variants;
/// errors arising in background work (receive, eviction) are additionally
/// delivered through the error callback together with a context string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SdsError {
    // Initialization
    #[error("not initialized")]
    NotInitialized,
    #[error("already initialized")]
    AlreadyInitialized,
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // Validation
    #[error("invalid node id: {0:?}")]
    InvalidNodeId(String),
    #[error("invalid qos: {0}")]
    InvalidQos(u8),
    #[error("reserved topic: {0}")]
    ReservedTopic(String),

    // Transport
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("disconnected")]
    Disconnected,
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),

    // Registry
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("table already registered: {0}")]
    TableAlreadyRegistered(String),
    #[error("max tables reached")]
    MaxTablesReached,

    // Role
    #[error("{operation} requires {required} role")]
    WrongRole {
        operation: &'static str,
        required: &'static str,
    },

    // Capacity
    #[error("max devices reached")]
    MaxDevicesReached,
    #[error("output buffer full")]
    BufferFull,
    #[error("section too large")]
    SectionTooLarge,

    // Decode / schema
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("type mismatch for field {0}")]
    TypeMismatch(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("schema version rejected: local {local}, remote {remote}")]
    VersionRejected { local: String, remote: String },

    // Platform
    #[error("transport not available")]
    TransportUnavailable,
}
