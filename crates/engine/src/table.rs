// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered table instances: shadow buffer, delta baseline, cadence
//! bookkeeping, and role-based access rules.

use crate::slot::SlotTable;
use sds_core::{SdsError, SectionKind, TableMeta};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

/// Role of a node for a particular table.
///
/// Determines which sections the node may write, which topics it
/// subscribes to, and which it publishes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Publishes config, receives state/status from devices.
    Owner,
    /// Receives config, publishes state/status.
    Device,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Device => "device",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "device" => Ok(Role::Device),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Per-registration overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    pub sync_interval_ms: Option<u64>,
}

pub(crate) struct RegisteredTable {
    pub meta: Arc<TableMeta>,
    pub role: Role,
    /// Effective config/state publish cadence (meta default or override).
    pub sync_interval_ms: u64,
    /// Current local values; the source of truth for reads and writes.
    pub shadow: Vec<u8>,
    /// Bytes last successfully published, per the whole buffer. Starts
    /// zeroed so the first publish is a full send.
    pub baseline: Vec<u8>,
    pub last_publish: [Option<u64>; 3],
    /// Owner role only: per-device status slots.
    pub slots: Option<SlotTable>,
}

impl RegisteredTable {
    pub fn new(meta: Arc<TableMeta>, role: Role, opts: TableOptions) -> Result<Self, SdsError> {
        let size = match role {
            Role::Device => meta.device_buf_size(),
            Role::Owner => meta.owner_buf_size(),
        };
        let mut shadow = vec![0u8; size];
        for kind in SectionKind::ALL {
            if let Some(range) = section_range(&meta, role, kind) {
                meta.section(kind).write_defaults(&mut shadow[range])?;
            }
        }
        let slots = match role {
            Role::Owner => Some(SlotTable::new(meta.max_devices, meta.status.size)),
            Role::Device => None,
        };
        Ok(Self {
            sync_interval_ms: opts.sync_interval_ms.unwrap_or(meta.sync_interval_ms),
            shadow,
            baseline: vec![0u8; size],
            last_publish: [None; 3],
            slots,
            meta,
            role,
        })
    }

    /// Byte range of a section within the shadow buffer, when the role
    /// stores that section there at all.
    pub fn section_range(&self, kind: SectionKind) -> Option<Range<usize>> {
        section_range(&self.meta, self.role, kind)
    }

    pub fn section_bytes(&self, kind: SectionKind) -> Option<&[u8]> {
        self.section_range(kind).map(|r| &self.shadow[r])
    }

    pub fn section_bytes_mut(&mut self, kind: SectionKind) -> Option<&mut [u8]> {
        let range = self.section_range(kind)?;
        Some(&mut self.shadow[range])
    }

    /// Sections the local role is allowed to write.
    pub fn writable(&self, kind: SectionKind) -> bool {
        match self.role {
            Role::Owner => kind == SectionKind::Config,
            Role::Device => matches!(kind, SectionKind::State | SectionKind::Status),
        }
    }

    /// Sections the local role may read directly. Owners read device
    /// status through device views, and their merged state is internal.
    pub fn readable(&self, kind: SectionKind) -> bool {
        match self.role {
            Role::Owner => kind == SectionKind::Config,
            Role::Device => true,
        }
    }

    /// Sections the local role publishes.
    pub fn publishable(&self) -> &'static [SectionKind] {
        match self.role {
            Role::Owner => &[SectionKind::Config, SectionKind::State],
            Role::Device => &[SectionKind::State, SectionKind::Status],
        }
    }

    /// Publish cadence for a section: status heartbeats on the liveness
    /// interval, everything else on the sync interval.
    pub fn cadence_ms(&self, kind: SectionKind) -> u64 {
        match kind {
            SectionKind::Status => self.meta.liveness_interval_ms,
            _ => self.sync_interval_ms,
        }
    }

    pub fn due(&self, kind: SectionKind, now_ms: u64) -> bool {
        match self.last_publish[kind.index()] {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.cadence_ms(kind),
        }
    }

    pub fn mark_published(&mut self, kind: SectionKind, now_ms: u64) {
        self.last_publish[kind.index()] = Some(now_ms);
    }

    /// Copy the section's shadow bytes into the baseline after a
    /// successful publish.
    pub fn update_baseline(&mut self, kind: SectionKind) {
        if let Some(range) = self.section_range(kind) {
            self.baseline[range.clone()].copy_from_slice(&self.shadow[range]);
        }
    }
}

fn section_range(meta: &TableMeta, role: Role, kind: SectionKind) -> Option<Range<usize>> {
    let config = meta.config.size;
    let state = meta.state.size;
    match (role, kind) {
        (_, SectionKind::Config) => Some(0..config),
        (_, SectionKind::State) => Some(config..config + state),
        (Role::Device, SectionKind::Status) => {
            Some(config + state..config + state + meta.status.size)
        }
        (Role::Owner, SectionKind::Status) => None,
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
