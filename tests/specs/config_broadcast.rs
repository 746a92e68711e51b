// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config broadcast: owner publishes retained config, late-joining
//! devices pick it up immediately.

use super::support::{json, spawn};
use sds_engine::{FieldValue, Role, SectionKind};
use sds_transport::FakeBroker;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn owner_config_write_appears_retained() {
    let broker = FakeBroker::new();
    let mut owner = spawn(&broker, "owner_01", Role::Owner, |_| {});
    owner
        .node
        .set_field("SensorData", SectionKind::Config, "threshold", 25.0f32)
        .unwrap();
    owner.node.poll().unwrap();

    let payload = broker.retained("sds/SensorData/config").unwrap();
    assert_eq!(json(&payload), serde_json::json!({ "threshold": 25.0 }));
}

#[test]
fn later_joining_device_receives_config_immediately() {
    let broker = FakeBroker::new();
    let mut owner = spawn(&broker, "owner_01", Role::Owner, |_| {});
    owner
        .node
        .set_field("SensorData", SectionKind::Config, "threshold", 25.0f32)
        .unwrap();
    owner.node.poll().unwrap();

    // the device joins only after the owner already published
    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_in_cb = Arc::clone(&fired);
    device.node.on_config("SensorData", move |_| {
        fired_in_cb.fetch_add(1, Ordering::SeqCst);
    });
    device.node.poll().unwrap();

    assert_eq!(
        device
            .node
            .get_field("SensorData", SectionKind::Config, "threshold")
            .unwrap(),
        FieldValue::Float(25.0)
    );
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
