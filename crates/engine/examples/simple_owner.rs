// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owner demo: publishes config for the `SensorData` table and watches
//! device state/status roll in.
//!
//! Run against a local broker:
//!
//! ```sh
//! cargo run --example simple_owner --features rumqttc -- localhost owner_01
//! ```

use sds_engine::{
    install_registry, install_schema_version, FieldType, LogLevel, Node, NodeConfig, Role,
    SectionBuilder, SectionKind, TableMetaBuilder,
};
use sds_transport::MqttTransport;
use std::time::{Duration, Instant};
use tracing::level_filters::LevelFilter;

fn install_demo_schema() -> Result<(), Box<dyn std::error::Error>> {
    install_schema_version("1.0.0");
    install_registry(vec![TableMetaBuilder::new("SensorData")
        .sync_interval_ms(1000)
        .liveness_interval_ms(5000)
        .config(
            SectionBuilder::new()
                .field("command", FieldType::U8)
                .field_with_default("threshold", FieldType::F32, 25.0f32)
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
                .field("battery_percent", FieldType::U8)
                .field("error_code", FieldType::U8)
                .build(),
        )
        .build()?])?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(LogLevel::Info))
        .init();

    let mut args = std::env::args().skip(1);
    let broker = args.next().unwrap_or_else(|| "localhost".into());
    let node_id = args.next().unwrap_or_else(|| "owner_01".into());
    println!("SDS owner demo: node {node_id}, broker {broker}:1883");

    install_demo_schema()?;

    let mut node = Node::new(NodeConfig::new(node_id, broker), MqttTransport::new())?;
    node.init()?;
    node.register_table("SensorData", Role::Owner)?;

    node.set_field("SensorData", SectionKind::Config, "command", 0u32)?;
    node.set_field("SensorData", SectionKind::Config, "threshold", 25.0f32)?;

    node.on_state("SensorData", |_table, from| {
        println!("[state] update from {from}");
    });
    node.on_status("SensorData", |_table, from| {
        println!("[status] update from {from}");
    });
    node.on_device_evicted(|table, device| {
        println!("[evicted] {device} left {table}");
    });
    node.on_error(|error, context| {
        eprintln!("[error] {error} ({context})");
    });

    let mut last_summary = Instant::now();
    loop {
        node.poll()?;

        if last_summary.elapsed() >= Duration::from_secs(10) {
            last_summary = Instant::now();
            println!("--- {} device(s) known ---", node.device_count("SensorData")?);
            for device in node.devices("SensorData")? {
                let battery = device.status("battery_percent")?;
                let state = if device.online() { "ONLINE" } else { "OFFLINE" };
                println!("  - {}: {state}, battery={battery:?}", device.node_id());
            }
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}
