// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sds-engine: the synchronized-data-structures runtime.
//!
//! A [`Node`] joins one or more schema-typed tables over a pub/sub
//! transport, each in one of two roles: the table's single **Owner**
//! (publishes configuration, receives state and status from devices) or a
//! **Device** (receives configuration, publishes state and status). Field
//! access is local against per-table shadow buffers; `poll()` drives
//! change detection, publishing, inbound merging, device liveness, and
//! eviction.
//!
//! The whole runtime is single-threaded and cooperative: every piece of
//! work happens inside `poll()` on the calling thread. Hosts that share a
//! node across threads serialize access themselves.

mod events;
mod liveness;
mod node;
mod receive;
mod slot;
mod sync;
mod table;

#[cfg(test)]
mod test_support;

pub use node::{DeviceView, Node};
pub use slot::StatusSlot;
pub use table::{Role, TableOptions};

pub use sds_core::{
    find_table_meta, install_registry, install_schema_version, schema_version, Clock, FakeClock,
    FieldType, FieldValue, JsonReader, JsonWriter, LogLevel, NodeConfig, NodeId, SdsError,
    SectionBuilder, SectionKind, SectionLayout, Stats, SystemClock, TableMeta, TableMetaBuilder,
};
pub use sds_transport::{ConnectOptions, Inbound, LastWill, QoS, Transport, TransportError};
