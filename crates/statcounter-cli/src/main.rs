// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod args;
mod run;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	// Logs go to stderr so stdout stays valid JSON.
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_writer(std::io::stderr)
		.init();

	let cli = Cli::parse();
	run::run(cli).await
}
