// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle: job orchestration for the library manager.

mod color;
mod commands;
mod control;
mod env;
mod exit_error;
mod logging;
mod output;

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use crate::commands::job::{self, parse_age, ListArgs, SubmitArgs};
use crate::commands::{run, Session};
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "spindle", version, about = "Background job orchestration", styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a job (and queue it unless --no-enqueue)
    Submit(SubmitArgs),
    /// Queue a job left in `created`
    Enqueue {
        /// Job ID (supports prefix matching)
        id: String,
    },
    /// List jobs, newest first
    List(ListArgs),
    /// Show details of a job
    Show {
        /// Job ID (supports prefix matching)
        id: String,
    },
    /// Count jobs per status
    Stats,
    /// Cancel one or more queued or running jobs
    Cancel {
        /// Job IDs (prefix match)
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Re-queue a failed or timed-out job that has attempts left
    Retry {
        /// Job ID (supports prefix matching)
        id: String,
    },
    /// Delete finished jobs older than a given age
    Cleanup {
        /// Age threshold (e.g. "30s", "15m", "12h", "7d")
        #[arg(long, value_parser = parse_age)]
        older_than: Duration,
    },
    /// Report what crash recovery did when the store was opened
    Recover,
    /// Execute queued jobs until Ctrl-C
    Run {
        /// Concurrent executions (overrides config and SPINDLE_WORKERS)
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("error: {}", exit.message);
                exit.code
            }
            None => {
                eprintln!("error: {e:#}");
                1
            }
        },
    };
    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    let format = cli.format;

    if let Command::Run { workers } = command {
        let state_dir = env::state_dir()?;
        let _guard = logging::init("info", Some(&state_dir.join("logs")))?;
        let session = Session::open_exclusive(state_dir)?;
        return run::run(session, workers).await;
    }

    let _guard = logging::init("warn", None)?;
    let session = Session::open()?;
    match command {
        Command::Submit(args) => job::submit(&session, args, format).await,
        Command::Enqueue { id } => job::enqueue(&session, &id, format).await,
        Command::List(args) => job::list(&session, args, format).await,
        Command::Show { id } => job::show(&session, &id, format).await,
        Command::Stats => job::stats(&session, format).await,
        Command::Cancel { ids } => job::cancel(&session, &ids, format).await,
        Command::Retry { id } => job::retry(&session, &id, format).await,
        Command::Cleanup { older_than } => job::cleanup(&session, older_than, format).await,
        Command::Recover => run::recover(&session, format).await,
        Command::Run { .. } => Ok(()),
    }
}
