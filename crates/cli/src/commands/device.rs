// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device management

use anyhow::Result;
use clap::ValueEnum;
use hearth_core::{SensorKind, Value};
use std::path::PathBuf;

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Wifi,
    Serial,
}

impl From<KindArg> for SensorKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Wifi => SensorKind::Wifi,
            KindArg::Serial => SensorKind::Serial,
        }
    }
}

#[derive(clap::Subcommand)]
pub enum DeviceCommand {
    /// Register a sensor; prints its push token
    AddSensor {
        name: String,

        /// Network host or serial port (omit for a push-only device)
        #[arg(long, default_value = "")]
        address: String,

        /// How a sensor with an address is polled
        #[arg(long, value_enum, default_value_t = KindArg::Wifi)]
        kind: KindArg,
    },
    /// Register a camera
    AddCamera {
        name: String,

        /// Capture device index, stream URL, or user:pass@host:port
        address: String,
    },
    /// Remove a device and its readings
    Remove { name: String },
    /// Rename a device, keeping its readings and push token
    Rename { old: String, new: String },
    /// List registered devices
    List,
    /// Show the latest stored value per subchannel of one sensor
    Data { name: String },
    /// Save one frame from a camera as a JPEG file
    Image {
        name: String,

        /// Output path (defaults to <name>.jpg)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub async fn handle(client: &DaemonClient, args: DeviceArgs) -> Result<()> {
    match args.command {
        DeviceCommand::AddSensor {
            name,
            address,
            kind,
        } => {
            let token = client.add_sensor(&name, &address, kind.into()).await?;
            println!("Registered sensor '{}'", name);
            println!("Push token: {}", token);
        }
        DeviceCommand::AddCamera { name, address } => {
            client.add_camera(&name, &address).await?;
            println!("Registered camera '{}'", name);
        }
        DeviceCommand::Remove { name } => {
            client.remove_device(&name).await?;
            println!("Removed '{}'", name);
        }
        DeviceCommand::Rename { old, new } => {
            client.rename_device(&old, &new).await?;
            println!("Renamed '{}' to '{}'", old, new);
        }
        DeviceCommand::List => {
            let devices = client.device_list().await?;
            if devices.is_empty() {
                println!("No devices");
            } else {
                println!("{:<20} {:<8} {:<28} LAST ONLINE", "NAME", "KIND", "ADDRESS");
                for device in devices {
                    let last_online = device
                        .last_online
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<20} {:<8} {:<28} {}",
                        device.name, device.kind, device.address, last_online
                    );
                }
            }
        }
        DeviceCommand::Image { name, out } => {
            let jpeg = client.camera_image(&name).await?;
            let path = out.unwrap_or_else(|| PathBuf::from(format!("{name}.jpg")));
            std::fs::write(&path, &jpeg)?;
            println!("Saved {} bytes to {}", jpeg.len(), path.display());
        }
        DeviceCommand::Data { name } => {
            let values = client.latest_data(&name).await?;
            if values.is_empty() {
                println!("No data for '{}'", name);
            } else {
                for (subchannel, value) in values {
                    println!("{}: {}", subchannel, value_label(value));
                }
            }
        }
    }
    Ok(())
}

fn value_label(value: Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}
