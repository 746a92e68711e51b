// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Miss-based liveness and slot eviction, run once per poll.

use crate::events::Event;
use crate::node::{default_liveness_timeout, Node};
use crate::table::Role;
use sds_core::{Clock, NodeId};
use sds_transport::Transport;
use tracing::debug;

impl<T: Transport, C: Clock> Node<T, C> {
    /// Walk every owner table's slots.
    ///
    /// A device that has not reported within 1.5× the liveness interval
    /// goes offline; with a nonzero grace it also gets an eviction
    /// deadline. Slots whose deadline has passed are vacated and the
    /// eviction callback fires. A zero grace disables timer-based
    /// eviction (departure notices still vacate immediately).
    pub(crate) fn run_liveness(&mut self) {
        let now = self.clock.epoch_ms();
        let grace = self.config.eviction_grace_ms;
        let Node { tables, callbacks, .. } = self;

        for t in tables.iter_mut().filter(|t| t.role == Role::Owner) {
            let timeout = default_liveness_timeout(t.meta.liveness_interval_ms);
            let name = t.meta.name.clone();
            let Some(slots) = t.slots.as_mut() else { continue };

            let mut evicted: Vec<NodeId> = Vec::new();
            for slot in slots.occupied_mut() {
                if slot.online && now.saturating_sub(slot.last_seen_ms) > timeout {
                    slot.online = false;
                    if grace > 0 {
                        slot.eviction_pending = true;
                        slot.eviction_deadline_ms = now + grace;
                        debug!(table = %name, node = %slot.node_id, "missed liveness, eviction pending");
                    } else {
                        debug!(table = %name, node = %slot.node_id, "missed liveness, offline");
                    }
                }
                if slot.eviction_pending && now >= slot.eviction_deadline_ms {
                    evicted.push(slot.node_id);
                }
            }
            for node in evicted {
                slots.vacate(node.as_str());
                debug!(table = %name, node = %node, "evicted");
                callbacks.dispatch(Event::DeviceEvicted { table: &name, node: node.as_str() });
            }
        }
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
