// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delta sync: unchanged sections stay off the wire, float changes within
//! tolerance are suppressed, real changes publish only the changed field.

use super::support::{json, spawn};
use sds_engine::{QoS, Role, SectionKind, Transport};
use sds_transport::{ConnectOptions, FakeBroker, FakeTransport};

fn watcher(broker: &FakeBroker) -> FakeTransport {
    let mut t = broker.client();
    t.connect(&ConnectOptions {
        host: "localhost".into(),
        port: 1883,
        client_id: "watcher".into(),
        username: None,
        password: None,
        timeout_ms: 1000,
        last_will: None,
    })
    .unwrap();
    t.subscribe("sds/SensorData/state/+", QoS::AtLeastOnce).unwrap();
    t
}

#[test]
fn unchanged_state_publishes_exactly_once() {
    let broker = FakeBroker::new();
    let mut watcher = watcher(&broker);
    let mut device = spawn(&broker, "dev_01", Role::Device, |cfg| cfg.delta_sync = true);

    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 23.5f32)
        .unwrap();
    device.node.poll().unwrap();
    assert_eq!(watcher.drain().len(), 1);

    // same value, repeated polls: nothing new on the wire
    device.node.poll().unwrap();
    device.node.poll().unwrap();
    assert!(watcher.drain().is_empty());
}

#[test]
fn change_within_float_tolerance_is_suppressed() {
    let broker = FakeBroker::new();
    let mut watcher = watcher(&broker);
    let mut device = spawn(&broker, "dev_01", Role::Device, |cfg| {
        cfg.delta_sync = true;
        cfg.float_tolerance = 0.001;
    });

    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 23.5f32)
        .unwrap();
    device.node.poll().unwrap();
    watcher.drain();

    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 23.5003f32)
        .unwrap();
    device.node.poll().unwrap();
    assert!(watcher.drain().is_empty());
}

#[test]
fn change_beyond_tolerance_publishes_only_that_field() {
    let broker = FakeBroker::new();
    let mut watcher = watcher(&broker);
    let mut device = spawn(&broker, "dev_01", Role::Device, |cfg| cfg.delta_sync = true);

    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 23.5f32)
        .unwrap();
    device.node.poll().unwrap();
    watcher.drain();

    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 23.51f32)
        .unwrap();
    device.node.poll().unwrap();

    let inbound = watcher.drain();
    assert_eq!(inbound.len(), 1);
    assert_eq!(json(&inbound[0].payload), serde_json::json!({ "temperature": 23.51 }));
}
