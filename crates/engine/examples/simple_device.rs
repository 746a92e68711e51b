// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device demo: joins `SensorData`, streams synthetic measurements, and
//! reacts to owner config changes.
//!
//! ```sh
//! cargo run --example simple_device --features rumqttc -- localhost dev_01
//! ```

use sds_engine::{
    install_registry, install_schema_version, FieldType, LogLevel, Node, NodeConfig, Role,
    SectionBuilder, SectionKind, TableMetaBuilder,
};
use sds_transport::MqttTransport;
use std::time::Duration;
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
    let node_id = args.next().unwrap_or_else(|| "dev_01".into());
    println!("SDS device demo: node {node_id}, broker {broker}:1883");

    install_demo_schema()?;

    let mut config = NodeConfig::new(node_id, broker);
    config.delta_sync = true;
    let mut node = Node::new(config, MqttTransport::new())?;
    node.init()?;
    node.register_table("SensorData", Role::Device)?;

    node.on_config("SensorData", |table| {
        println!("[config] update for {table}");
    });
    node.on_error(|error, context| {
        eprintln!("[error] {error} ({context})");
    });

    node.set_field("SensorData", SectionKind::Status, "battery_percent", 100u32)?;

    let mut tick: u32 = 0;
    loop {
        // a slow triangle wave around 22 °C
        let phase = (tick % 40) as f32;
        let temperature = 22.0 + (phase - 20.0).abs() / 10.0;
        node.set_field("SensorData", SectionKind::State, "temperature", temperature)?;
        node.set_field("SensorData", SectionKind::State, "humidity", 65.0f32)?;

        if tick % 100 == 0 {
            let battery = 100u32.saturating_sub(tick / 100);
            node.set_field("SensorData", SectionKind::Status, "battery_percent", battery)?;
        }

        let threshold = node.get_field("SensorData", SectionKind::Config, "threshold")?;
        if tick % 50 == 0 {
            println!("tick {tick}: temperature={temperature:.2}, threshold={threshold:?}");
        }

        node.poll()?;
        tick += 1;
        std::thread::sleep(Duration::from_millis(100));
    }
}
