// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic layout: builders for the reserved `sds/` hierarchy and the
//! classifier for inbound topics.
//!
//! | purpose          | topic                          | retained |
//! |------------------|--------------------------------|----------|
//! | config broadcast | `sds/<table>/config`           | yes      |
//! | owner state      | `sds/<table>/state`            | yes      |
//! | device state     | `sds/<table>/state/<node>`     | no       |
//! | status           | `sds/<table>/status/<node>`    | yes      |
//!
//! The will topic is `sds/+/status/<node>`: the `+` table segment lets a
//! single testament cover every table the departing node participated in.

/// Prefix reserved for runtime traffic; raw publishes and subscriptions
/// under it are rejected.
pub const RESERVED_PREFIX: &str = "sds/";

pub fn is_reserved(topic: &str) -> bool {
    topic.starts_with(RESERVED_PREFIX) || topic == "sds"
}

pub fn config_topic(table: &str) -> String {
    format!("sds/{table}/config")
}

pub fn owner_state_topic(table: &str) -> String {
    format!("sds/{table}/state")
}

pub fn device_state_topic(table: &str, node: &str) -> String {
    format!("sds/{table}/state/{node}")
}

pub fn status_topic(table: &str, node: &str) -> String {
    format!("sds/{table}/status/{node}")
}

/// Subscription filter covering every device's state topic for a table.
pub fn state_wildcard(table: &str) -> String {
    format!("sds/{table}/state/+")
}

/// Subscription filter covering every device's status topic for a table.
pub fn status_wildcard(table: &str) -> String {
    format!("sds/{table}/status/+")
}

/// Will topic registered at connect time for a node.
pub fn will_topic(node: &str) -> String {
    format!("sds/+/status/{node}")
}

/// Classification of an inbound topic under the reserved prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicClass<'a> {
    Config { table: &'a str },
    OwnerState { table: &'a str },
    DeviceState { table: &'a str, node: &'a str },
    Status { table: &'a str, node: &'a str },
}

/// Extract `(table, section, source node)` from the trailing path
/// components. Returns `None` for anything that is not a well-formed
/// runtime topic.
pub fn classify(topic: &str) -> Option<TopicClass<'_>> {
    let rest = topic.strip_prefix(RESERVED_PREFIX)?;
    let mut parts = rest.split('/');
    let table = parts.next().filter(|t| !t.is_empty())?;
    let section = parts.next()?;
    let node = parts.next();
    if parts.next().is_some() {
        return None;
    }
    match (section, node) {
        ("config", None) => Some(TopicClass::Config { table }),
        ("state", None) => Some(TopicClass::OwnerState { table }),
        ("state", Some(node)) if !node.is_empty() => {
            Some(TopicClass::DeviceState { table, node })
        }
        ("status", Some(node)) if !node.is_empty() => Some(TopicClass::Status { table, node }),
        _ => None,
    }
}

/// MQTT filter matching with `+` (one segment) and `#` (rest).
///
/// A `+` segment inside the *topic* also matches any filter segment, so
/// testaments published under a wildcard table segment fan out to every
/// per-table status subscription.
pub fn filter_matches(filter: &str, topic: &str) -> bool {
    let mut f = filter.split('/');
    let mut t = topic.split('/');
    loop {
        match (f.next(), t.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(fs), Some(ts)) => {
                if fs != ts && ts != "+" {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
