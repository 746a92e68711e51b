// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The periodic publisher: cadence gates, change detection, publish,
//! baseline update.

use crate::events::Event;
use crate::node::Node;
use crate::table::Role;
use sds_core::codec::{serialize_delta, serialize_section};
use sds_core::{topic, Clock, JsonWriter, SdsError, SectionKind};
use sds_transport::{QoS, Transport};
use std::sync::Arc;
use tracing::{debug, trace};

/// Bound on one encoded payload; sections are small by construction.
const MAX_PAYLOAD_BYTES: usize = 4096;

fn publish_target(table: &str, kind: SectionKind, role: Role, node: &str) -> (String, bool) {
    match (kind, role) {
        (SectionKind::Config, _) => (topic::config_topic(table), true),
        (SectionKind::State, Role::Owner) => (topic::owner_state_topic(table), true),
        (SectionKind::State, Role::Device) => (topic::device_state_topic(table, node), false),
        (SectionKind::Status, _) => (topic::status_topic(table, node), true),
    }
}

impl<T: Transport, C: Clock> Node<T, C> {
    /// One publisher pass over every registered table.
    ///
    /// For each section the role publishes: skip inside the cadence
    /// window; with delta-sync, skip when nothing changed against the
    /// baseline; otherwise serialize, publish at QoS 1, and copy the
    /// published bytes into the baseline.
    pub(crate) fn run_sync(&mut self) {
        let now = self.clock.epoch_ms();
        let delta_enabled = self.config.delta_sync;
        let tol = self.config.float_tolerance;
        let node_id = self.node_id;
        let Node { tables, transport, stats, callbacks, .. } = self;

        for t in tables.iter_mut() {
            let meta = Arc::clone(&t.meta);
            for &kind in t.publishable() {
                let layout = meta.section(kind);
                if layout.fields.is_empty() || !t.due(kind, now) {
                    continue;
                }
                let Some(range) = t.section_range(kind) else { continue };

                let mut writer = JsonWriter::with_capacity(MAX_PAYLOAD_BYTES);
                if delta_enabled {
                    serialize_delta(
                        layout,
                        &t.shadow[range.clone()],
                        &t.baseline[range.clone()],
                        tol,
                        &mut writer,
                    );
                    if writer.is_empty() {
                        trace!(table = %meta.name, section = %kind, "no delta, skipping");
                        continue;
                    }
                } else {
                    serialize_section(layout, &t.shadow[range], &mut writer);
                }

                let payload = match writer.finish() {
                    Ok(payload) => payload,
                    Err(e) => {
                        stats.errors += 1;
                        let context = format!("serializing {}/{kind}", meta.name);
                        callbacks.dispatch(Event::Error { error: &e, context: &context });
                        continue;
                    }
                };

                let (target, retained) =
                    publish_target(&meta.name, kind, t.role, node_id.as_str());
                match transport.publish(&target, &payload, QoS::AtLeastOnce, retained) {
                    Ok(()) => {
                        stats.messages_sent += 1;
                        t.update_baseline(kind);
                        t.mark_published(kind, now);
                        trace!(topic = %target, bytes = payload.len(), "published");
                    }
                    Err(e) => {
                        stats.errors += 1;
                        let e = SdsError::from(e);
                        debug!(topic = %target, %e, "publish failed");
                        callbacks.dispatch(Event::Error { error: &e, context: &target });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
