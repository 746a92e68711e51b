// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime events and callback dispatch.
//!
//! Everything the runtime can tell a host is one of the sealed [`Event`]
//! variants, routed through a single dispatch point to the registered
//! closures. Callbacks fire synchronously on the polling thread; the
//! `&mut` receiver on the node makes reentry impossible, so a callback
//! that wants to drive the node queues work for after `poll()` returns.

use sds_core::SdsError;
use smol_str::SmolStr;
use std::collections::HashMap;

pub(crate) type ConfigCallback = Box<dyn FnMut(&str) + Send>;
pub(crate) type SectionCallback = Box<dyn FnMut(&str, &str) + Send>;
pub(crate) type EvictionCallback = Box<dyn FnMut(&str, &str) + Send>;
pub(crate) type ErrorCallback = Box<dyn FnMut(&SdsError, &str) + Send>;
/// `(table, device, local version, remote version) -> accept`
pub(crate) type VersionMismatchCallback = Box<dyn FnMut(&str, &str, &str, &str) -> bool + Send>;
pub(crate) type RawCallback = Box<dyn FnMut(&str, &[u8]) + Send>;

/// Sealed set of runtime events.
pub(crate) enum Event<'a> {
    ConfigUpdated { table: &'a str },
    StateReceived { table: &'a str, from: &'a str },
    StatusReceived { table: &'a str, from: &'a str },
    DeviceEvicted { table: &'a str, node: &'a str },
    Error { error: &'a SdsError, context: &'a str },
}

#[derive(Default)]
pub(crate) struct Callbacks {
    config: HashMap<SmolStr, ConfigCallback>,
    state: HashMap<SmolStr, SectionCallback>,
    status: HashMap<SmolStr, SectionCallback>,
    evicted: Option<EvictionCallback>,
    error: Option<ErrorCallback>,
    version_mismatch: Option<VersionMismatchCallback>,
}

impl Callbacks {
    pub fn set_config(&mut self, table: &str, cb: ConfigCallback) {
        self.config.insert(SmolStr::new(table), cb);
    }

    pub fn set_state(&mut self, table: &str, cb: SectionCallback) {
        self.state.insert(SmolStr::new(table), cb);
    }

    pub fn set_status(&mut self, table: &str, cb: SectionCallback) {
        self.status.insert(SmolStr::new(table), cb);
    }

    pub fn set_evicted(&mut self, cb: EvictionCallback) {
        self.evicted = Some(cb);
    }

    pub fn set_error(&mut self, cb: ErrorCallback) {
        self.error = Some(cb);
    }

    pub fn set_version_mismatch(&mut self, cb: VersionMismatchCallback) {
        self.version_mismatch = Some(cb);
    }

    /// Single dispatch point for every event.
    pub fn dispatch(&mut self, event: Event<'_>) {
        match event {
            Event::ConfigUpdated { table } => {
                if let Some(cb) = self.config.get_mut(table) {
                    cb(table);
                }
            }
            Event::StateReceived { table, from } => {
                if let Some(cb) = self.state.get_mut(table) {
                    cb(table, from);
                }
            }
            Event::StatusReceived { table, from } => {
                if let Some(cb) = self.status.get_mut(table) {
                    cb(table, from);
                }
            }
            Event::DeviceEvicted { table, node } => {
                if let Some(cb) = self.evicted.as_mut() {
                    cb(table, node);
                }
            }
            Event::Error { error, context } => {
                if let Some(cb) = self.error.as_mut() {
                    cb(error, context);
                }
            }
        }
    }

    /// Ask the host whether to accept a payload whose schema version
    /// differs from ours. Without a registered callback the tolerant
    /// reader takes over and the payload is accepted.
    pub fn version_gate(&mut self, table: &str, device: &str, local: &str, remote: &str) -> bool {
        match self.version_mismatch.as_mut() {
            Some(cb) => cb(table, device, local, remote),
            None => true,
        }
    }

    pub fn clear(&mut self) {
        self.config.clear();
        self.state.clear();
        self.status.clear();
        self.evicted = None;
        self.error = None;
        self.version_mismatch = None;
    }
}
