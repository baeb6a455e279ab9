// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for query construction, compilation and response decoding.

use thiserror::Error;

/// Errors raised by the query engine before or after the network round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
	/// Caller input was rejected (bad enum value, zero limit, malformed raw query).
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// A required configuration key (project label, username) is missing.
	#[error("configuration error: {0}")]
	Config(String),

	/// The response body could not be parsed.
	#[error("error decoding API response ({reason}): {body}")]
	Decode { reason: String, body: String },

	/// The API answered with a non-ok status.
	#[error("StatCounter API error: {message}")]
	Api { message: String },
}

impl CoreError {
	pub fn invalid_argument(msg: impl Into<String>) -> Self {
		Self::InvalidArgument(msg.into())
	}

	pub fn config(msg: impl Into<String>) -> Self {
		Self::Config(msg.into())
	}
}

pub type Result<T> = std::result::Result<T, CoreError>;
