// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw passthrough outside the reserved hierarchy.

use super::support::spawn;
use sds_engine::{Role, SdsError};
use sds_transport::FakeBroker;
use std::sync::{Arc, Mutex};

#[test]
fn reserved_topics_are_rejected_with_no_side_effects() {
    let broker = FakeBroker::new();
    let mut node = spawn(&broker, "node_01", Role::Device, |_| {});
    let sent_before = node.node.stats().messages_sent;

    assert!(matches!(
        node.node.publish_raw("sds/foo", b"x", 1, false),
        Err(SdsError::ReservedTopic(_))
    ));
    assert!(matches!(
        node.node.subscribe_raw("sds/foo", |_, _| {}),
        Err(SdsError::ReservedTopic(_))
    ));
    assert_eq!(node.node.stats().messages_sent, sent_before);
    assert_eq!(broker.retained("sds/foo"), None);
}

#[test]
fn raw_round_trip_between_nodes() {
    let broker = FakeBroker::new();
    let mut a = spawn(&broker, "node_a", Role::Device, |_| {});
    let mut b = spawn(&broker, "node_b", Role::Device, |_| {});

    let seen: Arc<Mutex<Vec<(String, Vec<u8>)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = Arc::clone(&seen);
    b.node
        .subscribe_raw("app/alerts/#", move |topic, payload| {
            seen_in_cb.lock().unwrap().push((topic.to_string(), payload.to_vec()));
        })
        .unwrap();

    a.node.publish_raw("app/alerts/low_battery", b"dev_01", 1, false).unwrap();
    b.node.poll().unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("app/alerts/low_battery".to_string(), b"dev_01".to_vec())]
    );
}
