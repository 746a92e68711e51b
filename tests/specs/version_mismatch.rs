// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema-version negotiation on inbound payloads.

use super::support::{spawn, SCHEMA_VERSION};
use sds_engine::{FieldValue, Role, SectionKind};
use sds_transport::FakeBroker;
use std::sync::{Arc, Mutex};

#[test]
fn rejected_version_leaves_fields_unapplied_and_counts_an_error() {
    let broker = FakeBroker::new();
    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    let seen: Arc<Mutex<Vec<(String, String, String, String)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = Arc::clone(&seen);
    device.node.on_version_mismatch(move |table, from, local, remote| {
        seen_in_cb.lock().unwrap().push((
            table.to_string(),
            from.to_string(),
            local.to_string(),
            remote.to_string(),
        ));
        false
    });

    let errors_before = device.node.stats().errors;
    broker.inject(
        "sds/SensorData/config",
        br#"{"__version":"1.3.0","threshold":30.0}"#,
        false,
    );
    device.node.poll().unwrap();

    assert_eq!(
        device
            .node
            .get_field("SensorData", SectionKind::Config, "threshold")
            .unwrap(),
        FieldValue::Float(0.0)
    );
    assert_eq!(device.node.stats().errors, errors_before + 1);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[(
            "SensorData".to_string(),
            String::new(),
            SCHEMA_VERSION.to_string(),
            "1.3.0".to_string()
        )]
    );
}

#[test]
fn accepted_version_applies_fields() {
    let broker = FakeBroker::new();
    let mut device = spawn(&broker, "dev_01", Role::Device, |_| {});
    device.node.on_version_mismatch(|_, _, _, _| true);

    broker.inject(
        "sds/SensorData/config",
        br#"{"__version":"1.3.0","threshold":30.0}"#,
        false,
    );
    device.node.poll().unwrap();
    assert_eq!(
        device
            .node
            .get_field("SensorData", SectionKind::Config, "threshold")
            .unwrap(),
        FieldValue::Float(30.0)
    );
}

#[test]
fn owner_gate_sees_the_reporting_device() {
    let broker = FakeBroker::new();
    let mut owner = spawn(&broker, "owner_01", Role::Owner, |_| {});
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = Arc::clone(&seen);
    owner.node.on_version_mismatch(move |_table, from, _local, remote| {
        seen_in_cb.lock().unwrap().push(format!("{from}@{remote}"));
        false
    });

    broker.inject(
        "sds/SensorData/status/dev_07",
        br#"{"__version":"2.0.0","battery":10}"#,
        true,
    );
    owner.node.poll().unwrap();
    assert_eq!(owner.node.device_count("SensorData").unwrap(), 0);
    assert_eq!(seen.lock().unwrap().as_slice(), &["dev_07@2.0.0".to_string()]);
}
