// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the end-to-end scenarios.

use sds_core::{
    install_registry, install_schema_version, FakeClock, FieldType, NodeConfig, SectionBuilder,
    TableMetaBuilder,
};
use sds_engine::{Node, Role};
use sds_transport::{FakeBroker, FakeTransport};
use std::sync::Once;

pub const SCHEMA_VERSION: &str = "1.2.0";

/// One `SensorData` table: config `{threshold}`, state
/// `{temperature, humidity}`, status `{battery}`. Sections publish on
/// every poll; liveness window is 100 ms.
pub fn install_schema() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        install_schema_version(SCHEMA_VERSION);
        install_registry(vec![TableMetaBuilder::new("SensorData")
            .sync_interval_ms(0)
            .liveness_interval_ms(100)
            .config(SectionBuilder::new().field("threshold", FieldType::F32).build())
            .state(
                SectionBuilder::new()
                    .field("temperature", FieldType::F32)
                    .field("humidity", FieldType::F32)
                    .build(),
            )
            .status(SectionBuilder::new().field("battery", FieldType::U8).build())
            .build()
            .unwrap()])
        .unwrap();
    });
}

pub struct TestNode {
    pub node: Node<FakeTransport, FakeClock>,
    pub clock: FakeClock,
    pub transport: FakeTransport,
}

/// A connected node registered for `SensorData`.
pub fn spawn(
    broker: &FakeBroker,
    id: &str,
    role: Role,
    mutate: impl FnOnce(&mut NodeConfig),
) -> TestNode {
    install_schema();
    let mut cfg = NodeConfig::new(id, "localhost");
    mutate(&mut cfg);
    let clock = FakeClock::new();
    let transport = broker.client();
    let mut node = Node::with_clock(cfg, transport.clone(), clock.clone()).unwrap();
    node.init().unwrap();
    node.register_table("SensorData", role).unwrap();
    TestNode { node, clock, transport }
}

pub fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}
