// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dmtcp_coordinator::event_loop::EventLoop;
use dmtcp_coordinator::Options;
use tracing::error;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let options = match Options::parse_from(std::env::args_os()) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let to_file = options.background || options.batch;
    let _guard = dmtcp_coordinator::logging::init(&options.tmp_dir, to_file);

    let event_loop = match EventLoop::bind(options, dmtcp_core::SystemClock::default()).await {
        Ok(event_loop) => event_loop,
        Err(err) => {
            error!(%err, "failed to start coordinator");
            return 1;
        }
    };

    tracing::info!(port = event_loop.bound_port(), "coordinator listening");
    event_loop.run().await
}
