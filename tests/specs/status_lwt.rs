// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status, last-will departure, and grace-period eviction.

use super::support::{json, spawn};
use sds_engine::{FieldValue, Role, SectionKind};
use sds_transport::FakeBroker;
use std::sync::{Arc, Mutex};

#[test]
fn status_populates_owner_slot_and_is_retained() {
    let broker = FakeBroker::new();
    let mut owner = spawn(&broker, "owner_01", Role::Owner, |_| {});
    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device
        .node
        .set_field("SensorData", SectionKind::Status, "battery", 100u32)
        .unwrap();
    device.node.poll().unwrap();
    owner.node.poll().unwrap();

    let payload = broker.retained("sds/SensorData/status/dev_01").unwrap();
    assert_eq!(json(&payload), serde_json::json!({ "battery": 100 }));

    let view = owner.node.get_device("SensorData", "dev_01").unwrap().unwrap();
    assert!(view.online());
    assert_eq!(view.status("battery").unwrap(), FieldValue::Uint(100));
}

#[test]
fn lwt_marks_offline_then_grace_evicts() {
    let broker = FakeBroker::new();
    let mut owner = spawn(&broker, "owner_01", Role::Owner, |cfg| {
        cfg.eviction_grace_ms = 2000;
    });
    let evicted: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let evicted_in_cb = Arc::clone(&evicted);
    owner.node.on_device_evicted(move |table, node| {
        evicted_in_cb.lock().unwrap().push((table.to_string(), node.to_string()));
    });

    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device
        .node
        .set_field("SensorData", SectionKind::Status, "battery", 100u32)
        .unwrap();
    device.node.poll().unwrap();
    owner.node.poll().unwrap();
    assert!(owner.node.is_device_online("SensorData", "dev_01", None).unwrap());

    // the device drops off; the broker publishes the empty-payload will
    device.transport.drop_abruptly();
    owner.node.poll().unwrap();

    let view = owner.node.get_device("SensorData", "dev_01").unwrap().unwrap();
    assert!(!view.online());
    assert!(view.eviction_pending());
    assert!(evicted.lock().unwrap().is_empty());

    // two seconds later the slot is vacated
    owner.clock.advance_ms(2000);
    owner.node.poll().unwrap();
    assert!(owner.node.get_device("SensorData", "dev_01").unwrap().is_none());
    assert_eq!(owner.node.device_count("SensorData").unwrap(), 0);
    assert_eq!(
        evicted.lock().unwrap().as_slice(),
        &[("SensorData".to_string(), "dev_01".to_string())]
    );
}

#[test]
fn zero_grace_vacates_in_the_same_poll() {
    let broker = FakeBroker::new();
    let mut owner = spawn(&broker, "owner_01", Role::Owner, |_| {});
    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device
        .node
        .set_field("SensorData", SectionKind::Status, "battery", 42u32)
        .unwrap();
    device.node.poll().unwrap();
    owner.node.poll().unwrap();
    assert_eq!(owner.node.device_count("SensorData").unwrap(), 1);

    device.transport.drop_abruptly();
    owner.node.poll().unwrap();
    assert_eq!(owner.node.device_count("SensorData").unwrap(), 0);
}
