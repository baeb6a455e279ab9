// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport: one GET per call, no retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, instrument, trace};

use crate::error::{Result, StatcounterError};

/// Fetches a raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn get_raw(&self, url: &str) -> Result<String>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	http_client: Client,
}

impl HttpTransport {
	pub fn new(timeout: Duration) -> Result<Self> {
		let http_client = statcounter_common_http::new_client_with_timeout(timeout)?;
		Ok(Self { http_client })
	}

	pub fn with_client(http_client: Client) -> Self {
		Self { http_client }
	}
}

#[async_trait]
impl Transport for HttpTransport {
	#[instrument(skip_all)]
	async fn get_raw(&self, url: &str) -> Result<String> {
		debug!("sending request to StatCounter");

		let response = self.http_client.get(url).send().await.map_err(|e| {
			let e = e.without_url();
			error!(error = %e, "network error during StatCounter request");
			StatcounterError::from(e)
		})?;

		let status = response.status();
		debug!(status = %status, "received response");

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			error!(status = status.as_u16(), "StatCounter returned an error status");
			return Err(StatcounterError::HttpStatus {
				status: status.as_u16(),
				body,
			});
		}

		let body = response.text().await?;
		trace!(bytes = body.len(), "response body");
		Ok(body)
	}
}
