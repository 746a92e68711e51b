// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owner-side status slots.
//!
//! Each owner table keeps a fixed-capacity array of slots, one per device
//! that has reported status. A slot moves through: empty → populated
//! (online) → offline (possibly eviction-pending) → vacated. Fresh status
//! revives an offline slot; the eviction deadline empties it.

use sds_core::{NodeId, SdsError};

/// One device's latest status payload plus liveness bookkeeping.
#[derive(Debug, Clone)]
pub struct StatusSlot {
    pub node_id: NodeId,
    pub online: bool,
    pub eviction_pending: bool,
    pub last_seen_ms: u64,
    pub eviction_deadline_ms: u64,
    /// Deserialized status section bytes for this device.
    pub payload: Vec<u8>,
}

/// Fixed-capacity, unordered slot array. Occupied slots never share a
/// node id.
#[derive(Debug)]
pub(crate) struct SlotTable {
    slots: Vec<Option<StatusSlot>>,
    payload_size: usize,
}

impl SlotTable {
    pub fn new(capacity: usize, payload_size: usize) -> Self {
        Self { slots: vec![None; capacity], payload_size }
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn find(&self, node: &str) -> Option<&StatusSlot> {
        self.slots
            .iter()
            .flatten()
            .find(|s| s.node_id == node)
    }

    pub fn find_mut(&mut self, node: &str) -> Option<&mut StatusSlot> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|s| s.node_id == node)
    }

    /// The slot for `node`, inserting into the first vacant slot when the
    /// device is new. `MaxDevicesReached` when the array is full.
    pub fn find_or_insert(&mut self, node: NodeId) -> Result<&mut StatusSlot, SdsError> {
        let existing = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.node_id == node.as_str()));
        let idx = match existing {
            Some(idx) => idx,
            None => self
                .slots
                .iter()
                .position(Option::is_none)
                .ok_or(SdsError::MaxDevicesReached)?,
        };
        let payload_size = self.payload_size;
        Ok(self.slots[idx].get_or_insert_with(|| StatusSlot {
            node_id: node,
            online: false,
            eviction_pending: false,
            last_seen_ms: 0,
            eviction_deadline_ms: 0,
            payload: vec![0; payload_size],
        }))
    }

    /// Empty the slot for `node`. Returns whether a slot was vacated.
    pub fn vacate(&mut self, node: &str) -> bool {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|s| s.node_id == node) {
                *slot = None;
                return true;
            }
        }
        false
    }

    pub fn occupied(&self) -> impl Iterator<Item = &StatusSlot> {
        self.slots.iter().flatten()
    }

    pub fn occupied_mut(&mut self) -> impl Iterator<Item = &mut StatusSlot> {
        self.slots.iter_mut().flatten()
    }
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;
