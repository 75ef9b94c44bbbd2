// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management

use std::path::PathBuf;

use anyhow::Result;

use crate::client::{self, DaemonClient};

#[derive(clap::Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(clap::Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon if it is not already running
    Start,
    /// Stop the daemon (graceful first, then forceful)
    Stop,
    /// Stop and start the daemon
    Restart,
}

pub async fn handle(args: DaemonArgs, data_dir: PathBuf) -> Result<()> {
    match args.command {
        DaemonCommand::Start => {
            DaemonClient::connect_or_start(data_dir)?;
            println!("Daemon running");
        }
        DaemonCommand::Stop => {
            if client::daemon_stop(&data_dir).await? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }
        DaemonCommand::Restart => {
            client::daemon_stop(&data_dir).await?;
            DaemonClient::connect_or_start(data_dir)?;
            println!("Daemon restarted");
        }
    }
    Ok(())
}
