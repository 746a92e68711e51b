// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process broker for tests: retained messages, wildcard routing, and
//! last-will delivery on abrupt disconnect.
//!
//! Deterministic and single-threaded friendly; every client sees messages
//! in publish order.

use crate::{ConnectOptions, Inbound, LastWill, QoS, Transport, TransportError};
use parking_lot::Mutex;
use sds_core::topic::filter_matches;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct ClientSlot {
    connected: bool,
    subscriptions: Vec<String>,
    queue: VecDeque<Inbound>,
    will: Option<LastWill>,
    connect_failures_remaining: u32,
}

#[derive(Default)]
struct BrokerCore {
    retained: Vec<(String, Vec<u8>)>,
    clients: Vec<ClientSlot>,
}

impl BrokerCore {
    fn route(&mut self, topic: &str, payload: &[u8], retained: bool) {
        if retained {
            self.retained.retain(|(t, _)| t != topic);
            if !payload.is_empty() {
                self.retained.push((topic.to_string(), payload.to_vec()));
            }
        }
        for client in &mut self.clients {
            if client.connected
                && client.subscriptions.iter().any(|f| filter_matches(f, topic))
            {
                client.queue.push_back(Inbound {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                    retained: false,
                });
            }
        }
    }

    fn fire_will(&mut self, idx: usize) {
        if let Some(will) = self.clients[idx].will.take() {
            self.route(&will.topic, &will.payload, will.retained);
        }
    }
}

/// Shared in-process broker. Clone handles freely; all clients created via
/// [`FakeBroker::client`] talk to the same core.
#[derive(Clone, Default)]
pub struct FakeBroker {
    core: Arc<Mutex<BrokerCore>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport bound to this broker.
    pub fn client(&self) -> FakeTransport {
        let mut core = self.core.lock();
        core.clients.push(ClientSlot::default());
        FakeTransport { core: Arc::clone(&self.core), idx: core.clients.len() - 1 }
    }

    /// Inject a message as if published by some external party.
    pub fn inject(&self, topic: &str, payload: &[u8], retained: bool) {
        self.core.lock().route(topic, payload, retained);
    }

    /// The retained payload currently stored for a topic, if any.
    pub fn retained(&self, topic: &str) -> Option<Vec<u8>> {
        self.core
            .lock()
            .retained
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
    }

    pub fn retained_topics(&self) -> Vec<String> {
        self.core.lock().retained.iter().map(|(t, _)| t.clone()).collect()
    }
}

/// One client of a [`FakeBroker`]. Clones share the same session, which
/// lets a test keep a control handle to a transport it handed to a node.
#[derive(Clone)]
pub struct FakeTransport {
    core: Arc<Mutex<BrokerCore>>,
    idx: usize,
}

impl FakeTransport {
    /// Make the next `n` connect attempts fail, for retry/backoff tests.
    pub fn fail_next_connects(&self, n: u32) {
        self.core.lock().clients[self.idx].connect_failures_remaining = n;
    }

    /// Sever the session without a clean disconnect: the broker fires the
    /// registered will, exactly like a real broker noticing a dead client.
    pub fn drop_abruptly(&mut self) {
        let mut core = self.core.lock();
        core.fire_will(self.idx);
        core.clients[self.idx].connected = false;
    }

    /// Number of messages waiting to be drained (test introspection).
    pub fn pending(&self) -> usize {
        self.core.lock().clients[self.idx].queue.len()
    }
}

impl Transport for FakeTransport {
    fn connect(&mut self, opts: &ConnectOptions) -> Result<(), TransportError> {
        let mut core = self.core.lock();
        let client = &mut core.clients[self.idx];
        if client.connect_failures_remaining > 0 {
            client.connect_failures_remaining -= 1;
            return Err(TransportError::ConnectFailed(format!(
                "{}:{} refused",
                opts.host, opts.port
            )));
        }
        client.connected = true;
        client.will = opts.last_will.clone();
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut core = self.core.lock();
        let client = &mut core.clients[self.idx];
        client.connected = false;
        // clean disconnect discards the will
        client.will = None;
    }

    fn is_connected(&self) -> bool {
        self.core.lock().clients[self.idx].connected
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        _qos: QoS,
        retained: bool,
    ) -> Result<(), TransportError> {
        let mut core = self.core.lock();
        if !core.clients[self.idx].connected {
            return Err(TransportError::Disconnected);
        }
        core.route(topic, payload, retained);
        Ok(())
    }

    fn subscribe(&mut self, filter: &str, _qos: QoS) -> Result<(), TransportError> {
        let mut core = self.core.lock();
        if !core.clients[self.idx].connected {
            return Err(TransportError::Disconnected);
        }
        // replay retained messages matching the new filter
        let matching: Vec<Inbound> = core
            .retained
            .iter()
            .filter(|(t, _)| filter_matches(filter, t))
            .map(|(t, p)| Inbound { topic: t.clone(), payload: p.clone(), retained: true })
            .collect();
        let client = &mut core.clients[self.idx];
        if !client.subscriptions.iter().any(|f| f == filter) {
            client.subscriptions.push(filter.to_string());
            client.queue.extend(matching);
        }
        Ok(())
    }

    fn unsubscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        let mut core = self.core.lock();
        core.clients[self.idx].subscriptions.retain(|f| f != filter);
        Ok(())
    }

    fn drain(&mut self) -> Vec<Inbound> {
        let mut core = self.core.lock();
        core.clients[self.idx].queue.drain(..).collect()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
