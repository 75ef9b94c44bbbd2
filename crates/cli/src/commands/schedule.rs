// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule management

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, NaiveTime, Utc};
use hearth_core::{Command, ScheduleEntry};

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(clap::Subcommand)]
pub enum ScheduleCommand {
    /// Add a schedule entry
    Add {
        /// Entry name (repeatable; remove takes every entry with the name)
        name: String,

        /// When to fire: RFC 3339, "YYYY-MM-DD HH:MM", or "HH:MM" (UTC)
        #[arg(long, value_parser = parse_time)]
        at: DateTime<Utc>,

        /// Repeat period, e.g. "24h" or "90m" (omit for one-shot)
        #[arg(long, value_parser = parse_repeat)]
        every: Option<Duration>,

        /// The command to run, e.g. "security.arm"
        #[arg(value_parser = parse_command)]
        command: Command,
    },
    /// List schedule entries, soonest first
    List,
    /// Remove every schedule entry with this name
    Remove { name: String },
}

pub async fn handle(client: &DaemonClient, args: ScheduleArgs) -> Result<()> {
    match args.command {
        ScheduleCommand::Add {
            name,
            at,
            every,
            command,
        } => {
            let entry = ScheduleEntry {
                name: name.clone(),
                time: at,
                repeat: every.unwrap_or(Duration::ZERO),
                command,
                annotation: None,
            };
            client.schedule_add(entry).await?;
            println!("Scheduled '{}' at {}", name, at.format("%Y-%m-%d %H:%M:%S"));
        }
        ScheduleCommand::List => {
            let entries = client.schedule_list().await?;
            if entries.is_empty() {
                println!("No schedule entries");
            } else {
                println!("{:<20} {:<20} {:<10} COMMAND", "NAME", "TIME", "REPEAT");
                for entry in entries {
                    println!(
                        "{:<20} {:<20} {:<10} {}",
                        entry.name,
                        entry.time.format("%Y-%m-%d %H:%M:%S"),
                        repeat_label(entry.repeat),
                        entry.command
                    );
                }
            }
        }
        ScheduleCommand::Remove { name } => {
            let count = client.schedule_remove(&name).await?;
            if count == 0 {
                println!("No entries named '{}'", name);
            } else {
                println!("Removed {} entries", count);
            }
        }
    }
    Ok(())
}

fn repeat_label(repeat: Duration) -> String {
    if repeat.is_zero() {
        "-".to_string()
    } else {
        humantime::format_duration(repeat).to_string()
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    parse_time_from(Utc::now(), s)
}

/// Accepts RFC 3339, "YYYY-MM-DD HH:MM", or a bare "HH:MM" meaning the
/// next occurrence of that time of day
fn parse_time_from(now: DateTime<Utc>, s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Ok(time.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    if let Ok(time_of_day) = NaiveTime::parse_from_str(s, "%H:%M") {
        let mut time = now.date_naive().and_time(time_of_day).and_utc();
        if time <= now {
            time += ChronoDuration::days(1);
        }
        return Ok(time);
    }
    Err(format!(
        "expected RFC 3339, 'YYYY-MM-DD HH:MM', or 'HH:MM' (UTC): '{}'",
        s
    ))
}

fn parse_repeat(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

fn parse_command(s: &str) -> Result<Command, String> {
    s.parse().map_err(|e: hearth_core::CommandError| e.to_string())
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
