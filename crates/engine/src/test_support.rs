// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the runtime tests.
//!
//! The schema registry is process-global, so the test schema is installed
//! exactly once and covers every table the tests touch.

use crate::node::Node;
use crate::table::Role;
use sds_core::{
    install_registry, install_schema_version, FakeClock, FieldType, NodeConfig, SectionBuilder,
    TableMetaBuilder,
};
use sds_transport::{FakeBroker, FakeTransport};
use std::sync::Once;

pub const TEST_SCHEMA_VERSION: &str = "1.2.0";

pub fn install_test_schema() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        install_schema_version(TEST_SCHEMA_VERSION);
        install_registry(vec![
            TableMetaBuilder::new("SensorData")
                .config(
                    SectionBuilder::new()
                        .field("threshold", FieldType::F32)
                        .field("command", FieldType::U8)
                        .build(),
                )
                .state(
                    SectionBuilder::new()
                        .field("temperature", FieldType::F32)
                        .field("humidity", FieldType::F32)
                        .build(),
                )
                .status(
                    SectionBuilder::new()
                        .field("battery", FieldType::U8)
                        .field("error_code", FieldType::U8)
                        .build(),
                )
                .build()
                .unwrap(),
            // publishes every poll, short liveness, two slots
            TableMetaBuilder::new("Fast")
                .sync_interval_ms(0)
                .liveness_interval_ms(100)
                .max_devices(2)
                .config(SectionBuilder::new().field("limit", FieldType::U16).build())
                .state(SectionBuilder::new().field("value", FieldType::F32).build())
                .status(SectionBuilder::new().field("battery", FieldType::U8).build())
                .build()
                .unwrap(),
            // state only; config and status sections are empty
            TableMetaBuilder::new("Sparse")
                .sync_interval_ms(0)
                .state(SectionBuilder::new().field("value", FieldType::F32).build())
                .build()
                .unwrap(),
        ])
        .unwrap();
    });
}

/// A bare transport connected to the broker and subscribed to `filter`,
/// for observing traffic from outside the runtime.
pub fn observer(broker: &FakeBroker, id: &str, filter: &str) -> FakeTransport {
    use sds_transport::{ConnectOptions, QoS, Transport};
    let mut t = broker.client();
    t.connect(&ConnectOptions {
        host: "localhost".into(),
        port: 1883,
        client_id: id.into(),
        username: None,
        password: None,
        timeout_ms: 1000,
        last_will: None,
    })
    .unwrap();
    t.subscribe(filter, QoS::AtLeastOnce).unwrap();
    t
}

/// A connected node on the broker, with its shared fake clock.
pub fn connected_node(
    broker: &FakeBroker,
    id: &str,
    mutate: impl FnOnce(&mut NodeConfig),
) -> (Node<FakeTransport, FakeClock>, FakeClock) {
    install_test_schema();
    let mut cfg = NodeConfig::new(id, "localhost");
    mutate(&mut cfg);
    let clock = FakeClock::new();
    let mut node = Node::with_clock(cfg, broker.client(), clock.clone()).unwrap();
    node.init().unwrap();
    (node, clock)
}

/// A connected node already registered for one table.
pub fn registered_node(
    broker: &FakeBroker,
    id: &str,
    table: &str,
    role: Role,
    mutate: impl FnOnce(&mut NodeConfig),
) -> (Node<FakeTransport, FakeClock>, FakeClock) {
    let (mut node, clock) = connected_node(broker, id, mutate);
    node.register_table(table, role).unwrap();
    (node, clock)
}
