// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node lifecycle and the public runtime surface.

use crate::events::{Callbacks, RawCallback};
use crate::slot::StatusSlot;
use crate::table::{RegisteredTable, Role, TableOptions};
use sds_core::layout::read_field;
use sds_core::{
    topic, Clock, FieldValue, NodeConfig, NodeId, SdsError, SectionKind, SectionLayout, Stats,
    SystemClock, MAX_TABLES,
};
use sds_transport::{ConnectOptions, LastWill, QoS, Transport};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry delays double per failed connect attempt, capped here.
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// A node participating in one or more synchronized tables.
///
/// Single-threaded and poll-driven: every publish, inbound merge, and
/// eviction check happens inside [`Node::poll`] on the calling thread.
pub struct Node<T: Transport, C: Clock = SystemClock> {
    pub(crate) config: NodeConfig,
    pub(crate) node_id: NodeId,
    pub(crate) transport: T,
    pub(crate) clock: C,
    pub(crate) initialized: bool,
    pub(crate) connected_seen: bool,
    pub(crate) tables: Vec<RegisteredTable>,
    pub(crate) callbacks: Callbacks,
    pub(crate) raw_subs: Vec<(String, RawCallback)>,
    pub(crate) stats: Stats,
}

impl<T: Transport> Node<T> {
    pub fn new(config: NodeConfig, transport: T) -> Result<Self, SdsError> {
        Self::with_clock(config, transport, SystemClock)
    }
}

impl<T: Transport, C: Clock> Node<T, C> {
    pub fn with_clock(config: NodeConfig, transport: T, clock: C) -> Result<Self, SdsError> {
        config.validate()?;
        let node_id = NodeId::parse(&config.node_id)?;
        Ok(Self {
            config,
            node_id,
            transport,
            clock,
            initialized: false,
            connected_seen: false,
            tables: Vec::new(),
            callbacks: Callbacks::default(),
            raw_subs: Vec::new(),
            stats: Stats::default(),
        })
    }

    pub fn node_id(&self) -> &str {
        self.node_id.as_str()
    }

    /// Initialized and currently connected.
    pub fn is_ready(&self) -> bool {
        self.initialized && self.transport.is_connected()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Connect to the broker, registering the last will that flags this
    /// node's departure on every table it serves.
    ///
    /// Connect failures retry with exponential backoff: the first retry
    /// waits the configured base delay, each further failure doubles it
    /// (capped at 30 s). Only transport connect failures retry; anything
    /// else aborts immediately.
    pub fn init(&mut self) -> Result<(), SdsError> {
        if self.initialized {
            return Err(SdsError::AlreadyInitialized);
        }
        let opts = ConnectOptions {
            host: self.config.broker_host.clone(),
            port: self.config.broker_port,
            client_id: self.node_id.as_str().to_string(),
            username: self.config.username.clone(),
            password: self.config.password.clone(),
            timeout_ms: self.config.connect_timeout_ms,
            last_will: Some(LastWill {
                topic: topic::will_topic(self.node_id.as_str()),
                payload: Vec::new(),
                qos: QoS::AtLeastOnce,
                retained: true,
            }),
        };

        let mut delay_ms = self.config.retry_base_delay_ms;
        let mut retries = 0u32;
        loop {
            match self.transport.connect(&opts) {
                Ok(()) => break,
                Err(e) => {
                    let e = SdsError::from(e);
                    let retryable =
                        matches!(e, SdsError::ConnectFailed(_) | SdsError::Disconnected);
                    if !retryable || retries >= self.config.connect_retries {
                        return Err(e);
                    }
                    retries += 1;
                    warn!(%e, retries, delay_ms, "connect failed, backing off");
                    std::thread::sleep(Duration::from_millis(delay_ms));
                    delay_ms = (delay_ms * 2).min(MAX_RETRY_DELAY_MS);
                }
            }
        }
        self.initialized = true;
        self.connected_seen = true;
        info!(node = %self.node_id, host = %self.config.broker_host, "connected");
        Ok(())
    }

    /// Disconnect and drop every registration. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.transport.disconnect();
        self.tables.clear();
        self.raw_subs.clear();
        self.callbacks.clear();
        self.initialized = false;
        info!(node = %self.node_id, "shut down");
    }

    pub fn register_table(&mut self, name: &str, role: Role) -> Result<(), SdsError> {
        self.register_table_with(name, role, TableOptions::default())
    }

    /// Join a table in the given role. Subscribes to the topics the role
    /// consumes; the first `poll()` afterwards starts publishing.
    pub fn register_table_with(
        &mut self,
        name: &str,
        role: Role,
        opts: TableOptions,
    ) -> Result<(), SdsError> {
        self.require_init()?;
        if self.tables.iter().any(|t| t.meta.name == name) {
            return Err(SdsError::TableAlreadyRegistered(name.to_string()));
        }
        if self.tables.len() >= MAX_TABLES {
            return Err(SdsError::MaxTablesReached);
        }
        let meta = sds_core::find_table_meta(name)
            .ok_or_else(|| SdsError::TableNotFound(name.to_string()))?;
        let table = RegisteredTable::new(meta, role, opts)?;
        match role {
            Role::Device => {
                self.transport.subscribe(&topic::config_topic(name), QoS::AtLeastOnce)?;
            }
            Role::Owner => {
                // the retained config subscription recovers our own config
                // after a cold start
                self.transport.subscribe(&topic::config_topic(name), QoS::AtLeastOnce)?;
                self.transport.subscribe(&topic::state_wildcard(name), QoS::AtLeastOnce)?;
                self.transport.subscribe(&topic::status_wildcard(name), QoS::AtLeastOnce)?;
            }
        }
        self.tables.push(table);
        debug!(table = name, %role, "table registered");
        Ok(())
    }

    pub fn unregister_table(&mut self, name: &str) -> Result<(), SdsError> {
        self.require_init()?;
        let idx = self
            .tables
            .iter()
            .position(|t| t.meta.name == name)
            .ok_or_else(|| SdsError::TableNotFound(name.to_string()))?;
        let role = self.tables[idx].role;
        match role {
            Role::Device => {
                let _ = self.transport.unsubscribe(&topic::config_topic(name));
            }
            Role::Owner => {
                let _ = self.transport.unsubscribe(&topic::config_topic(name));
                let _ = self.transport.unsubscribe(&topic::state_wildcard(name));
                let _ = self.transport.unsubscribe(&topic::status_wildcard(name));
            }
        }
        self.tables.remove(idx);
        debug!(table = name, "table unregistered");
        Ok(())
    }

    /// Drive the runtime: drain inbound traffic, publish due sections,
    /// and run liveness/eviction. Non-blocking.
    pub fn poll(&mut self) -> Result<(), SdsError> {
        self.require_init()?;
        let connected = self.transport.is_connected();
        if connected && !self.connected_seen {
            self.stats.reconnect_count += 1;
            debug!("transport reconnected");
        }
        self.connected_seen = connected;

        for msg in self.transport.drain() {
            self.stats.messages_received += 1;
            self.handle_message(&msg);
        }
        self.run_sync();
        self.run_liveness();
        Ok(())
    }

    // ---- typed field access -------------------------------------------------

    /// Write one field of a section this role owns. The change reaches the
    /// wire on the next due sync cycle.
    pub fn set_field(
        &mut self,
        table: &str,
        section: SectionKind,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), SdsError> {
        self.require_init()?;
        let t = self.table_mut(table)?;
        if !t.writable(section) {
            return Err(wrong_role_write(section));
        }
        let def = t
            .meta
            .section(section)
            .field(field)
            .ok_or_else(|| SdsError::UnknownField(field.to_string()))?
            .clone();
        let bytes = t
            .section_bytes_mut(section)
            .ok_or_else(|| SdsError::UnknownField(field.to_string()))?;
        sds_core::layout::write_field(bytes, &def, &value.into())
    }

    /// Read one field of a section this role may read directly.
    pub fn get_field(
        &self,
        table: &str,
        section: SectionKind,
        field: &str,
    ) -> Result<FieldValue, SdsError> {
        self.require_init()?;
        let t = self.table(table)?;
        if !t.readable(section) {
            return Err(wrong_role_read(section));
        }
        let def = t
            .meta
            .section(section)
            .field(field)
            .ok_or_else(|| SdsError::UnknownField(field.to_string()))?;
        let bytes = t
            .section_bytes(section)
            .ok_or_else(|| SdsError::UnknownField(field.to_string()))?;
        Ok(read_field(bytes, def))
    }

    // ---- owner-side device queries ------------------------------------------

    /// Number of devices currently holding a slot.
    pub fn device_count(&self, table: &str) -> Result<usize, SdsError> {
        let t = self.owner_table(table, "device_count")?;
        Ok(t.slots.as_ref().map_or(0, |s| s.count()))
    }

    /// Snapshot of every known device for a table.
    pub fn devices(&self, table: &str) -> Result<Vec<DeviceView<'_>>, SdsError> {
        let t = self.owner_table(table, "devices")?;
        let now = self.clock.epoch_ms();
        let timeout = default_liveness_timeout(t.meta.liveness_interval_ms);
        let Some(slots) = t.slots.as_ref() else { return Ok(Vec::new()) };
        Ok(slots
            .occupied()
            .map(|slot| DeviceView::new(slot, &t.meta.status, now, timeout))
            .collect())
    }

    /// One device's latest status, or `None` if it never reported.
    pub fn get_device(&self, table: &str, node: &str) -> Result<Option<DeviceView<'_>>, SdsError> {
        let t = self.owner_table(table, "get_device")?;
        let now = self.clock.epoch_ms();
        let timeout = default_liveness_timeout(t.meta.liveness_interval_ms);
        Ok(t.slots
            .as_ref()
            .and_then(|s| s.find(node))
            .map(|slot| DeviceView::new(slot, &t.meta.status, now, timeout)))
    }

    /// Whether a device holds a slot, is flagged online, and reported
    /// within `timeout_ms` (default 1.5× the table's liveness interval).
    pub fn is_device_online(
        &self,
        table: &str,
        node: &str,
        timeout_ms: Option<u64>,
    ) -> Result<bool, SdsError> {
        let t = self.owner_table(table, "is_device_online")?;
        let timeout = timeout_ms.unwrap_or(default_liveness_timeout(t.meta.liveness_interval_ms));
        let now = self.clock.epoch_ms();
        Ok(t.slots
            .as_ref()
            .and_then(|s| s.find(node))
            .is_some_and(|slot| {
                slot.online && now.saturating_sub(slot.last_seen_ms) <= timeout
            }))
    }

    pub fn liveness_interval_ms(&self, table: &str) -> Result<u64, SdsError> {
        Ok(self.table(table)?.meta.liveness_interval_ms)
    }

    // ---- raw passthrough ----------------------------------------------------

    /// Publish outside the reserved hierarchy. Topics under `sds/` are
    /// rejected before anything reaches the wire.
    pub fn publish_raw(
        &mut self,
        topic_str: &str,
        payload: &[u8],
        qos: u8,
        retained: bool,
    ) -> Result<(), SdsError> {
        self.require_init()?;
        if topic::is_reserved(topic_str) {
            return Err(SdsError::ReservedTopic(topic_str.to_string()));
        }
        let qos = QoS::from_u8(qos).ok_or(SdsError::InvalidQos(qos))?;
        match self.transport.publish(topic_str, payload, qos, retained) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.stats.errors += 1;
                Err(e.into())
            }
        }
    }

    /// Subscribe to a topic or filter outside the reserved hierarchy.
    pub fn subscribe_raw(
        &mut self,
        filter: &str,
        cb: impl FnMut(&str, &[u8]) + Send + 'static,
    ) -> Result<(), SdsError> {
        self.require_init()?;
        if topic::is_reserved(filter) {
            return Err(SdsError::ReservedTopic(filter.to_string()));
        }
        self.transport.subscribe(filter, QoS::AtLeastOnce)?;
        self.raw_subs.retain(|(f, _)| f != filter);
        self.raw_subs.push((filter.to_string(), Box::new(cb)));
        Ok(())
    }

    pub fn unsubscribe_raw(&mut self, filter: &str) -> Result<(), SdsError> {
        self.require_init()?;
        self.raw_subs.retain(|(f, _)| f != filter);
        self.transport.unsubscribe(filter)?;
        Ok(())
    }

    // ---- callback registration ----------------------------------------------

    /// Fires after a config update lands in the local shadow (device role).
    pub fn on_config(&mut self, table: &str, cb: impl FnMut(&str) + Send + 'static) {
        self.callbacks.set_config(table, Box::new(cb));
    }

    /// Fires after a device's state merges at the owner: `(table, from)`.
    pub fn on_state(&mut self, table: &str, cb: impl FnMut(&str, &str) + Send + 'static) {
        self.callbacks.set_state(table, Box::new(cb));
    }

    /// Fires after a device's status lands in its slot: `(table, from)`.
    pub fn on_status(&mut self, table: &str, cb: impl FnMut(&str, &str) + Send + 'static) {
        self.callbacks.set_status(table, Box::new(cb));
    }

    /// Fires when an offline device's slot is vacated: `(table, node)`.
    pub fn on_device_evicted(&mut self, cb: impl FnMut(&str, &str) + Send + 'static) {
        self.callbacks.set_evicted(Box::new(cb));
    }

    /// Fires for errors in background work, with a context string.
    pub fn on_error(&mut self, cb: impl FnMut(&SdsError, &str) + Send + 'static) {
        self.callbacks.set_error(Box::new(cb));
    }

    /// Decides whether to accept payloads with a differing `__version`:
    /// `(table, device, local, remote) -> accept`.
    pub fn on_version_mismatch(
        &mut self,
        cb: impl FnMut(&str, &str, &str, &str) -> bool + Send + 'static,
    ) {
        self.callbacks.set_version_mismatch(Box::new(cb));
    }

    // ---- internals ----------------------------------------------------------

    pub(crate) fn require_init(&self) -> Result<(), SdsError> {
        if self.initialized {
            Ok(())
        } else {
            Err(SdsError::NotInitialized)
        }
    }

    fn table(&self, name: &str) -> Result<&RegisteredTable, SdsError> {
        self.tables
            .iter()
            .find(|t| t.meta.name == name)
            .ok_or_else(|| SdsError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut RegisteredTable, SdsError> {
        self.tables
            .iter_mut()
            .find(|t| t.meta.name == name)
            .ok_or_else(|| SdsError::TableNotFound(name.to_string()))
    }

    fn owner_table(
        &self,
        name: &str,
        operation: &'static str,
    ) -> Result<&RegisteredTable, SdsError> {
        let t = self.table(name)?;
        if t.role != Role::Owner {
            return Err(SdsError::WrongRole { operation, required: "owner" });
        }
        Ok(t)
    }
}

fn wrong_role_write(section: SectionKind) -> SdsError {
    let (operation, required) = match section {
        SectionKind::Config => ("writing config", "owner"),
        SectionKind::State => ("writing state", "device"),
        SectionKind::Status => ("writing status", "device"),
    };
    SdsError::WrongRole { operation, required }
}

fn wrong_role_read(section: SectionKind) -> SdsError {
    let (operation, required) = match section {
        SectionKind::Config => ("reading config", "owner"),
        SectionKind::State => ("reading state", "device"),
        SectionKind::Status => ("reading status", "device"),
    };
    SdsError::WrongRole { operation, required }
}

pub(crate) fn default_liveness_timeout(liveness_interval_ms: u64) -> u64 {
    liveness_interval_ms + liveness_interval_ms / 2
}

/// Read-only view of one device at the owner: latest status payload plus
/// liveness.
pub struct DeviceView<'a> {
    slot: &'a StatusSlot,
    layout: &'a SectionLayout,
    online: bool,
}

impl<'a> DeviceView<'a> {
    fn new(slot: &'a StatusSlot, layout: &'a SectionLayout, now_ms: u64, timeout_ms: u64) -> Self {
        let online = slot.online && now_ms.saturating_sub(slot.last_seen_ms) <= timeout_ms;
        Self { slot, layout, online }
    }

    pub fn node_id(&self) -> &str {
        self.slot.node_id.as_str()
    }

    pub fn online(&self) -> bool {
        self.online
    }

    pub fn last_seen_ms(&self) -> u64 {
        self.slot.last_seen_ms
    }

    pub fn eviction_pending(&self) -> bool {
        self.slot.eviction_pending
    }

    /// Read one field of the device's latest status.
    pub fn status(&self, field: &str) -> Result<FieldValue, SdsError> {
        let def = self
            .layout
            .field(field)
            .ok_or_else(|| SdsError::UnknownField(field.to_string()))?;
        Ok(read_field(&self.slot.payload, def))
    }
}

impl std::fmt::Debug for DeviceView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceView")
            .field("node_id", &self.node_id())
            .field("online", &self.online)
            .field("last_seen_ms", &self.last_seen_ms())
            .finish()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
