// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cold-start recovery from broker-retained messages: a restarted owner
//! gets its config and every device's status back on resubscribe.

use super::support::{spawn, TestNode};
use sds_engine::{FieldValue, Role, SectionKind};
use sds_transport::FakeBroker;

fn first_owner_lifetime(broker: &FakeBroker) {
    let mut owner = spawn(broker, "owner_01", Role::Owner, |_| {});
    owner
        .node
        .set_field("SensorData", SectionKind::Config, "threshold", 31.5f32)
        .unwrap();
    owner.node.poll().unwrap();
    owner.node.shutdown();
}

#[test]
fn restarted_owner_recovers_config_and_device_status() {
    let broker = FakeBroker::new();

    // a device leaves its retained status behind
    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device
        .node
        .set_field("SensorData", SectionKind::Status, "battery", 88u32)
        .unwrap();
    device.node.poll().unwrap();

    first_owner_lifetime(&broker);

    // a fresh owner process comes up with default config values
    let TestNode { mut node, .. } = spawn(&broker, "owner_01", Role::Owner, |_| {});
    node.poll().unwrap();

    assert_eq!(
        node.get_field("SensorData", SectionKind::Config, "threshold").unwrap(),
        FieldValue::Float(31.5)
    );
    let view = node.get_device("SensorData", "dev_01").unwrap().unwrap();
    assert_eq!(view.status("battery").unwrap(), FieldValue::Uint(88));
}

#[test]
fn device_state_is_not_recovered_after_owner_restart() {
    let broker = FakeBroker::new();
    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 19.0f32)
        .unwrap();
    device.node.poll().unwrap();

    first_owner_lifetime(&broker);

    let mut owner = spawn(&broker, "owner_01", Role::Owner, |_| {});
    let seen_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let seen_in_cb = std::sync::Arc::clone(&seen_flag);
    owner.node.on_state("SensorData", move |_, _| {
        seen_in_cb.store(true, std::sync::atomic::Ordering::SeqCst);
    });
    owner.node.poll().unwrap();

    // non-retained state is gone until the device publishes again
    assert!(!seen_flag.load(std::sync::atomic::Ordering::SeqCst));
    device
        .node
        .set_field("SensorData", SectionKind::State, "temperature", 19.5f32)
        .unwrap();
    device.node.poll().unwrap();
    owner.node.poll().unwrap();
    assert!(seen_flag.load(std::sync::atomic::Ordering::SeqCst));
}
