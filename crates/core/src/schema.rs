// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table metadata and the process-global schema registry.
//!
//! The registry is installed once at startup, either by a generated schema
//! artifact or by runtime registration through [`TableMetaBuilder`]. Installs
//! replace the registry wholesale; lookups are linear scans over a handful
//! of tables.

use crate::error::SdsError;
use crate::layout::SectionLayout;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::Arc;

/// Upper bound on registered tables per process.
pub const MAX_TABLES: usize = 32;

/// Upper bound on a single section's buffer size.
pub const MAX_SECTION_SIZE: usize = 1024;

pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_MAX_DEVICES: usize = 16;

/// The three section kinds of every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Config,
    State,
    Status,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Config, SectionKind::State, SectionKind::Status];

    pub fn index(self) -> usize {
        match self {
            SectionKind::Config => 0,
            SectionKind::State => 1,
            SectionKind::Status => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Config => "config",
            SectionKind::State => "state",
            SectionKind::Status => "status",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of one table: section layouts, sync cadence,
/// liveness cadence, and the owner-side device capacity.
#[derive(Debug, Clone)]
pub struct TableMeta {
    pub name: SmolStr,
    pub sync_interval_ms: u64,
    pub liveness_interval_ms: u64,
    pub max_devices: usize,
    pub config: SectionLayout,
    pub state: SectionLayout,
    pub status: SectionLayout,
}

impl TableMeta {
    pub fn section(&self, kind: SectionKind) -> &SectionLayout {
        match kind {
            SectionKind::Config => &self.config,
            SectionKind::State => &self.state,
            SectionKind::Status => &self.status,
        }
    }

    /// Shadow buffer size for a device registration: config + state + status.
    pub fn device_buf_size(&self) -> usize {
        self.config.size + self.state.size + self.status.size
    }

    /// Shadow buffer size for an owner registration: config + merged state.
    /// Device status lives in the per-device slots, not the shadow buffer.
    pub fn owner_buf_size(&self) -> usize {
        self.config.size + self.state.size
    }
}

/// Fluent construction of a [`TableMeta`]. Used both by generated schema
/// artifacts and by hosts that register schemas at runtime.
#[derive(Debug)]
pub struct TableMetaBuilder {
    meta: TableMeta,
}

impl TableMetaBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            meta: TableMeta {
                name: SmolStr::new(name),
                sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
                liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
                max_devices: DEFAULT_MAX_DEVICES,
                config: SectionLayout::default(),
                state: SectionLayout::default(),
                status: SectionLayout::default(),
            },
        }
    }

    pub fn sync_interval_ms(mut self, ms: u64) -> Self {
        self.meta.sync_interval_ms = ms;
        self
    }

    pub fn liveness_interval_ms(mut self, ms: u64) -> Self {
        self.meta.liveness_interval_ms = ms;
        self
    }

    pub fn max_devices(mut self, n: usize) -> Self {
        self.meta.max_devices = n;
        self
    }

    pub fn config(mut self, layout: SectionLayout) -> Self {
        self.meta.config = layout;
        self
    }

    pub fn state(mut self, layout: SectionLayout) -> Self {
        self.meta.state = layout;
        self
    }

    pub fn status(mut self, layout: SectionLayout) -> Self {
        self.meta.status = layout;
        self
    }

    pub fn build(self) -> Result<TableMeta, SdsError> {
        for kind in SectionKind::ALL {
            if self.meta.section(kind).size > MAX_SECTION_SIZE {
                return Err(SdsError::SectionTooLarge);
            }
        }
        Ok(self.meta)
    }
}

static REGISTRY: RwLock<Vec<Arc<TableMeta>>> = RwLock::new(Vec::new());
static SCHEMA_VERSION: RwLock<Option<SmolStr>> = RwLock::new(None);

/// Replace the registry wholesale. Intended for a single call at startup.
pub fn install_registry(metas: Vec<TableMeta>) -> Result<(), SdsError> {
    if metas.len() > MAX_TABLES {
        return Err(SdsError::MaxTablesReached);
    }
    for (i, meta) in metas.iter().enumerate() {
        if metas[..i].iter().any(|m| m.name == meta.name) {
            return Err(SdsError::TableAlreadyRegistered(meta.name.to_string()));
        }
    }
    *REGISTRY.write() = metas.into_iter().map(Arc::new).collect();
    Ok(())
}

/// Look up a table descriptor by name. Linear scan.
pub fn find_table_meta(name: &str) -> Option<Arc<TableMeta>> {
    REGISTRY.read().iter().find(|m| m.name == name).cloned()
}

/// Set the process-wide schema version string.
pub fn install_schema_version(version: &str) {
    *SCHEMA_VERSION.write() = Some(SmolStr::new(version));
}

/// The process-wide schema version string; `"0.0.0"` until installed.
pub fn schema_version() -> SmolStr {
    SCHEMA_VERSION
        .read()
        .clone()
        .unwrap_or_else(|| SmolStr::new_static("0.0.0"))
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
