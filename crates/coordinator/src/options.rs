// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup options: parsed once from CLI flags and environment fallbacks into
//! one immutable record, threaded through construction. Nothing downstream
//! reads the environment directly.

use clap::Parser;

use crate::env;
use crate::error::CoordinatorError;

#[derive(Debug, Parser)]
#[command(name = "dmtcp_coordinator", version, about = "DMTCP checkpoint/restart coordinator")]
struct Cli {
    /// Port to listen on (also settable via DMTCP_PORT).
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Checkpoint image directory; also exported as DMTCP_CHECKPOINT_DIR for children.
    #[arg(short = 'c', long = "ckptdir")]
    ckptdir: Option<String>,

    /// Scratch directory; also exported as DMTCP_TMPDIR for children.
    #[arg(short = 't', long = "tmpdir")]
    tmpdir: Option<String>,

    /// Periodic checkpoint interval in seconds; also exported as DMTCP_CHECKPOINT_INTERVAL.
    #[arg(short = 'i', long = "interval")]
    interval: Option<u32>,

    /// Exit the process once the last client disconnects.
    #[arg(long = "exit-on-last")]
    exit_on_last: bool,

    /// Fork and detach, redirecting stdio to /dev/null.
    #[arg(long = "background", conflicts_with = "batch")]
    background: bool,

    /// Redirect stdio to /dev/null and default the checkpoint interval to 3600s.
    #[arg(long = "batch", conflicts_with = "background")]
    batch: bool,
}

/// Fully-resolved, immutable startup configuration.
#[derive(Debug, Clone)]
pub struct Options {
    pub port: u16,
    pub checkpoint_dir: std::path::PathBuf,
    pub tmp_dir: std::path::PathBuf,
    pub checkpoint_interval_seconds: u32,
    pub exit_on_last: bool,
    pub background: bool,
    pub batch: bool,
}

const BATCH_DEFAULT_INTERVAL_SECONDS: u32 = 3600;

impl Options {
    /// Parses `argv`, resolving any flag not given against environment fallbacks.
    pub fn parse_from<I, T>(argv: I) -> Result<Self, CoordinatorError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(argv).map_err(|e| CoordinatorError::InvalidArgs(e.to_string()))?;

        if let Some(dir) = &cli.ckptdir {
            env::set_checkpoint_dir(dir);
        }
        if let Some(dir) = &cli.tmpdir {
            env::set_tmp_dir(dir);
        }
        if let Some(interval) = cli.interval {
            env::set_checkpoint_interval_seconds(interval);
        }

        let port = cli.port.or_else(env::port).unwrap_or(env::DEFAULT_PORT);
        let checkpoint_interval_seconds = if cli.interval.is_some() {
            env::checkpoint_interval_seconds()
        } else if cli.batch {
            BATCH_DEFAULT_INTERVAL_SECONDS
        } else {
            env::checkpoint_interval_seconds()
        };

        Ok(Self {
            port,
            checkpoint_dir: env::checkpoint_dir(),
            tmp_dir: env::tmp_dir(),
            checkpoint_interval_seconds,
            exit_on_last: cli.exit_on_last,
            background: cli.background,
            batch: cli.batch,
        })
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
