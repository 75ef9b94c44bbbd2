// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hearth - home automation hub CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod completions;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::DaemonClient;
use commands::{daemon, device, push, schedule, security};

#[derive(Parser)]
#[command(name = "hearth", version, about = "Hearth - home automation hub")]
struct Cli {
    /// Hub data directory (default: $HEARTH_HOME or ~/.hearth)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hub status summary
    Status,
    /// Push sensor readings on behalf of a device
    Push(push::PushArgs),
    /// Security system control
    Security(security::SecurityArgs),
    /// Schedule management
    Schedule(schedule::ScheduleArgs),
    /// Device management
    Device(device::DeviceArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Completions don't need the daemon at all
        Commands::Completions(args) => {
            completions::generate_completions::<Cli>(args.shell);
            Ok(())
        }

        // Daemon management handles its own connections
        Commands::Daemon(args) => {
            let data_dir = client::resolve_data_dir(cli.data_dir)?;
            daemon::handle(args, data_dir).await
        }

        // Everything else goes through the daemon, auto-starting it
        command => {
            let data_dir = client::resolve_data_dir(cli.data_dir)?;
            let client = DaemonClient::connect_or_start(data_dir)?;

            match command {
                Commands::Status => {
                    let (status, uptime_secs) = client.status().await?;
                    println!("Daemon uptime: {}", format_uptime(uptime_secs));
                    println!("Security: {}", security::phase_label(status.security));
                    println!("Sensors: {}", status.sensors);
                    println!("Cameras: {}", status.cameras);
                    println!("Schedule entries: {}", status.schedule_entries);
                    println!(
                        "Next poll: {}",
                        status.next_poll.format("%Y-%m-%d %H:%M:%S")
                    );
                    Ok(())
                }
                Commands::Push(args) => push::handle(&client, args).await,
                Commands::Security(args) => security::handle(&client, args).await,
                Commands::Schedule(args) => schedule::handle(&client, args).await,
                Commands::Device(args) => device::handle(&client, args).await,
                Commands::Daemon(_) | Commands::Completions(_) => unreachable!(),
            }
        }
    }
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
