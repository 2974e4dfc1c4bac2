// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup. Interactive runs log to stderr; `--background`/`--batch`
//! runs redirect stdio away from the terminal, so logs go to a file under
//! the coordinator's tmp directory instead.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const ENV_FILTER_DEFAULT: &str = "info";

/// Initializes the global subscriber. Returns the file-appender guard when
/// logging to a file; the caller must keep it alive for the process lifetime.
pub fn init(tmp_dir: &Path, to_file: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(ENV_FILTER_DEFAULT));

    if to_file {
        let file_appender = tracing_appender::rolling::never(tmp_dir, "dmtcp_coordinator.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(non_blocking).with_ansi(false).init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        None
    }
}
