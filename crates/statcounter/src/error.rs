// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the StatCounter client.

use statcounter_config::ConfigError;
use statcounter_core::CoreError;
use thiserror::Error;

/// StatCounter client errors.
#[derive(Debug, Error)]
pub enum StatcounterError {
	/// Caller input was rejected.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// A required configuration key is missing or invalid.
	#[error("configuration error: {0}")]
	Config(String),

	/// The response body could not be parsed.
	#[error("error decoding API response ({reason}): {body}")]
	Decode { reason: String, body: String },

	/// The API reported a failure.
	#[error("StatCounter API error: {message}")]
	Api { message: String },

	/// HTTP request failed before a response arrived.
	#[error("HTTP request failed: {0}")]
	Request(reqwest::Error),

	/// Request timed out.
	#[error("request timed out")]
	Timeout,

	/// The server answered with a non-success status.
	#[error("HTTP status {status}: {body}")]
	HttpStatus { status: u16, body: String },
}

impl From<CoreError> for StatcounterError {
	fn from(err: CoreError) -> Self {
		match err {
			CoreError::InvalidArgument(msg) => Self::InvalidArgument(msg),
			CoreError::Config(msg) => Self::Config(msg),
			CoreError::Decode { reason, body } => Self::Decode { reason, body },
			CoreError::Api { message } => Self::Api { message },
		}
	}
}

impl From<ConfigError> for StatcounterError {
	fn from(err: ConfigError) -> Self {
		Self::Config(err.to_string())
	}
}

impl From<reqwest::Error> for StatcounterError {
	/// The URL is dropped because it carries the request signature.
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			return Self::Timeout;
		}
		Self::Request(err.without_url())
	}
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, StatcounterError>;
