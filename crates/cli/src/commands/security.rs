// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security system control

use anyhow::Result;
use hearth_core::AlarmPhase;

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct SecurityArgs {
    #[command(subcommand)]
    pub command: SecurityCommand,
}

#[derive(clap::Subcommand)]
pub enum SecurityCommand {
    /// Arm the security system (alarm after the grace period)
    Arm,
    /// Disarm the security system and drop pending evidence
    Disarm,
    /// Show the security event history, oldest first
    History,
}

pub async fn handle(client: &DaemonClient, args: SecurityArgs) -> Result<()> {
    match args.command {
        SecurityCommand::Arm => {
            let phase = client.set_security(true).await?;
            println!("Security armed ({})", phase_label(phase));
        }
        SecurityCommand::Disarm => {
            let phase = client.set_security(false).await?;
            println!("Security {}", phase_label(phase));
        }
        SecurityCommand::History => {
            let entries = client.history().await?;
            if entries.is_empty() {
                println!("No security events");
            } else {
                for line in entries {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}

pub fn phase_label(phase: AlarmPhase) -> &'static str {
    match phase {
        AlarmPhase::Disarmed => "disarmed",
        AlarmPhase::Waiting => "waiting",
        AlarmPhase::Triggered => "triggered",
    }
}
