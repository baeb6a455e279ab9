// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

use crate::env::SecretEnvError;

/// Errors raised while loading or checking StatCounter configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The config file exists but could not be read.
	#[error("failed to read {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The config file is not valid TOML for this schema.
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// A `STATCOUNTER_*` variable holds an unusable value.
	#[error("environment error: {0}")]
	Env(String),

	/// The API password could not be loaded from `VAR` / `VAR_FILE`.
	#[error(transparent)]
	Secret(#[from] SecretEnvError),

	/// Settings that are individually valid but inconsistent together.
	#[error("validation error: {0}")]
	Validation(String),

	/// A key the caller asked for is not configured.
	#[error("could not find {0} in config")]
	MissingField(String),

	#[error("invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// Neither `XDG_CONFIG_HOME` nor a home directory is available.
	#[error("could not determine home directory")]
	HomeDirNotFound,
}

impl ConfigError {
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}

	pub fn missing_field(key: impl Into<String>) -> Self {
		Self::MissingField(key.into())
	}

	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}
