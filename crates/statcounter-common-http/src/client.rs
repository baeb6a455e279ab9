// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `reqwest` client every StatCounter request goes through.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

/// Client builder preset with the crate User-Agent. Call sites add their
/// own timeouts and proxies.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Builds a client whose requests give up after `timeout`, connect included.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	debug!(timeout_secs = timeout.as_secs(), "building HTTP client");
	builder().timeout(timeout).build()
}

/// `statcounter-rs/{version}/{os}-{arch}`
pub fn user_agent() -> String {
	format!(
		"statcounter-rs/{}/{}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
