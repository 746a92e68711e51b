// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device state upload: non-retained per-device topic, owner callback
//! with the source node id.

use super::support::{json, spawn};
use sds_engine::{QoS, Role, SectionKind, Transport};
use sds_transport::{ConnectOptions, FakeBroker};
use std::sync::{Arc, Mutex};

#[test]
fn device_state_reaches_owner_with_source() {
    let broker = FakeBroker::new();
    let mut owner = spawn(&broker, "owner_01", Role::Owner, |_| {});
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = Arc::clone(&seen);
    owner.node.on_state("SensorData", move |table, from| {
        seen_in_cb.lock().unwrap().push((table.to_string(), from.to_string()));
    });

    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 23.5f32)
        .unwrap();
    device
        .node
        .set_field("SensorData", SectionKind::State, "humidity", 65.0f32)
        .unwrap();
    device.node.poll().unwrap();
    owner.node.poll().unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("SensorData".to_string(), "dev_01".to_string())]
    );
}

#[test]
fn device_state_payload_and_retention() {
    let broker = FakeBroker::new();
    let mut watcher = broker.client();
    watcher
        .connect(&ConnectOptions {
            host: "localhost".into(),
            port: 1883,
            client_id: "watcher".into(),
            username: None,
            password: None,
            timeout_ms: 1000,
            last_will: None,
        })
        .unwrap();
    watcher.subscribe("sds/SensorData/state/+", QoS::AtLeastOnce).unwrap();

    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 23.5f32)
        .unwrap();
    device
        .node
        .set_field("SensorData", SectionKind::State, "humidity", 65.0f32)
        .unwrap();
    device.node.poll().unwrap();

    let inbound = watcher.drain();
    let state: Vec<_> = inbound
        .iter()
        .filter(|m| m.topic == "sds/SensorData/state/dev_01")
        .collect();
    assert_eq!(state.len(), 1);
    assert_eq!(
        json(&state[0].payload),
        serde_json::json!({ "temperature": 23.5, "humidity": 65.0 })
    );
    // device state is never retained
    assert_eq!(broker.retained("sds/SensorData/state/dev_01"), None);
}
