// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The inbound pipeline: classify, guard, merge, notify.

use crate::events::{Callbacks, Event};
use crate::node::Node;
use crate::table::Role;
use sds_core::codec::deserialize_section;
use sds_core::topic::{self, TopicClass};
use sds_core::{Clock, JsonReader, NodeId, SdsError, SectionKind};
use sds_transport::{Inbound, Transport};
use std::sync::Arc;
use tracing::{debug, trace};

/// True when the payload's `__version` (if any) should be applied.
/// A differing version asks the host; without a registered callback the
/// tolerant reader accepts.
fn version_accepted(
    callbacks: &mut Callbacks,
    reader: &JsonReader,
    table: &str,
    device: &str,
    local: &str,
) -> bool {
    match reader.version() {
        Some(remote) if remote != local => callbacks.version_gate(table, device, local, remote),
        _ => true,
    }
}

impl<T: Transport, C: Clock> Node<T, C> {
    /// Route one inbound message. Messages outside the reserved hierarchy
    /// go to raw subscription handlers; everything else dispatches by
    /// `(section, role)`.
    pub(crate) fn handle_message(&mut self, msg: &Inbound) {
        match topic::classify(&msg.topic) {
            None => {
                if topic::is_reserved(&msg.topic) {
                    self.stats.errors += 1;
                    let e = SdsError::Malformed(format!("unroutable topic {}", msg.topic));
                    self.callbacks.dispatch(Event::Error { error: &e, context: &msg.topic });
                } else {
                    self.dispatch_raw(msg);
                }
            }
            Some(TopicClass::Config { table }) => self.handle_config(table, msg),
            Some(TopicClass::OwnerState { table }) => self.handle_owner_state(table, msg),
            Some(TopicClass::DeviceState { table, node }) => {
                self.handle_device_state(table, node, msg)
            }
            Some(TopicClass::Status { table, node }) => self.handle_status(table, node, msg),
        }
    }

    fn dispatch_raw(&mut self, msg: &Inbound) {
        for (filter, cb) in self.raw_subs.iter_mut() {
            if topic::filter_matches(filter, &msg.topic) {
                cb(&msg.topic, &msg.payload);
            }
        }
    }

    /// Owner-authored config. At a device it updates the local shadow and
    /// fires the config callback; at an owner it is the retained echo of
    /// our own publish, merged silently so a cold start recovers the last
    /// published config.
    fn handle_config(&mut self, table: &str, msg: &Inbound) {
        let local_version = sds_core::schema_version();
        let Node { tables, callbacks, stats, .. } = self;
        let Some(t) = tables.iter_mut().find(|t| t.meta.name == table) else {
            stats.errors += 1;
            return;
        };
        let reader = match JsonReader::parse(&msg.payload) {
            Ok(reader) => reader,
            Err(e) => {
                stats.errors += 1;
                callbacks.dispatch(Event::Error { error: &e, context: &msg.topic });
                return;
            }
        };
        if !version_accepted(callbacks, &reader, table, "", local_version.as_str()) {
            stats.errors += 1;
            debug!(table, "config rejected on version mismatch");
            return;
        }
        let meta = Arc::clone(&t.meta);
        match t.role {
            Role::Device => {
                if let Some(bytes) = t.section_bytes_mut(SectionKind::Config) {
                    deserialize_section(&meta.config, &reader, bytes);
                }
                trace!(table, "config updated");
                callbacks.dispatch(Event::ConfigUpdated { table });
            }
            Role::Owner => {
                // only the retained replay counts: live echoes of our own
                // publishes must not clobber newer local writes
                if msg.retained {
                    if let Some(bytes) = t.section_bytes_mut(SectionKind::Config) {
                        deserialize_section(&meta.config, &reader, bytes);
                    }
                    trace!(table, "config recovered from retained replay");
                }
            }
        }
    }

    /// A device's state landing at the owner, merged field-by-field.
    fn handle_device_state(&mut self, table: &str, node: &str, msg: &Inbound) {
        let local_version = sds_core::schema_version();
        let local_id = self.node_id;
        let Node { tables, callbacks, stats, .. } = self;
        if node == local_id.as_str() {
            // self-sourced echo
            return;
        }
        let Some(t) = tables.iter_mut().find(|t| t.meta.name == table) else {
            stats.errors += 1;
            return;
        };
        if t.role != Role::Owner {
            return;
        }
        let reader = match JsonReader::parse(&msg.payload) {
            Ok(reader) => reader,
            Err(e) => {
                stats.errors += 1;
                callbacks.dispatch(Event::Error { error: &e, context: &msg.topic });
                return;
            }
        };
        if !version_accepted(callbacks, &reader, table, node, local_version.as_str()) {
            stats.errors += 1;
            debug!(table, node, "state rejected on version mismatch");
            return;
        }
        let meta = Arc::clone(&t.meta);
        if let Some(bytes) = t.section_bytes_mut(SectionKind::State) {
            deserialize_section(&meta.state, &reader, bytes);
        }
        trace!(table, from = node, "state merged");
        callbacks.dispatch(Event::StateReceived { table, from: node });
    }

    /// Owner's merged-state snapshot landing at a device that chose to
    /// subscribe to it.
    fn handle_owner_state(&mut self, table: &str, msg: &Inbound) {
        let local_version = sds_core::schema_version();
        let Node { tables, callbacks, stats, .. } = self;
        let Some(t) = tables.iter_mut().find(|t| t.meta.name == table) else {
            stats.errors += 1;
            return;
        };
        if t.role != Role::Device {
            return;
        }
        let reader = match JsonReader::parse(&msg.payload) {
            Ok(reader) => reader,
            Err(e) => {
                stats.errors += 1;
                callbacks.dispatch(Event::Error { error: &e, context: &msg.topic });
                return;
            }
        };
        if !version_accepted(callbacks, &reader, table, "", local_version.as_str()) {
            stats.errors += 1;
            return;
        }
        let meta = Arc::clone(&t.meta);
        if let Some(bytes) = t.section_bytes_mut(SectionKind::State) {
            deserialize_section(&meta.state, &reader, bytes);
        }
        callbacks.dispatch(Event::StateReceived { table, from: "" });
    }

    /// A device's status landing at the owner: populate or refresh its
    /// slot. An empty payload is the departure notice (last will) and
    /// flips the device offline instead of deserializing.
    fn handle_status(&mut self, table: &str, node: &str, msg: &Inbound) {
        let now = self.clock.epoch_ms();
        let grace = self.config.eviction_grace_ms;
        let local_version = sds_core::schema_version();
        let Node { tables, callbacks, stats, .. } = self;

        if msg.payload.is_empty() {
            // Departure notice. The will topic carries `+` for the table
            // segment so one testament covers every table the node served.
            for t in tables.iter_mut().filter(|t| t.role == Role::Owner) {
                if table != "+" && t.meta.name != table {
                    continue;
                }
                let name = t.meta.name.clone();
                let Some(slots) = t.slots.as_mut() else { continue };
                let Some(slot) = slots.find_mut(node) else { continue };
                slot.online = false;
                if grace > 0 {
                    slot.eviction_pending = true;
                    slot.eviction_deadline_ms = now + grace;
                    debug!(table = %name, node, deadline = slot.eviction_deadline_ms, "device offline, eviction pending");
                } else {
                    slots.vacate(node);
                    debug!(table = %name, node, "device departed, slot vacated");
                    callbacks.dispatch(Event::DeviceEvicted { table: &name, node });
                }
            }
            return;
        }

        let Some(t) = tables.iter_mut().find(|t| t.meta.name == table) else {
            stats.errors += 1;
            return;
        };
        if t.role != Role::Owner {
            return;
        }
        let reader = match JsonReader::parse(&msg.payload) {
            Ok(reader) => reader,
            Err(e) => {
                stats.errors += 1;
                callbacks.dispatch(Event::Error { error: &e, context: &msg.topic });
                return;
            }
        };
        if !version_accepted(callbacks, &reader, table, node, local_version.as_str()) {
            stats.errors += 1;
            debug!(table, node, "status rejected on version mismatch");
            return;
        }
        let source = match NodeId::parse(node) {
            Ok(id) => id,
            Err(e) => {
                stats.errors += 1;
                callbacks.dispatch(Event::Error { error: &e, context: &msg.topic });
                return;
            }
        };
        let meta = Arc::clone(&t.meta);
        let Some(slots) = t.slots.as_mut() else { return };
        match slots.find_or_insert(source) {
            Ok(slot) => {
                deserialize_section(&meta.status, &reader, &mut slot.payload);
                slot.online = true;
                slot.eviction_pending = false;
                slot.eviction_deadline_ms = 0;
                slot.last_seen_ms = now;
                trace!(table, from = node, "status updated");
                callbacks.dispatch(Event::StatusReceived { table, from: node });
            }
            Err(e) => {
                stats.errors += 1;
                let context = format!("status slot for {node} on {table}");
                callbacks.dispatch(Event::Error { error: &e, context: &context });
            }
        }
    }
}

#[cfg(test)]
#[path = "receive_tests.rs"]
mod tests;
