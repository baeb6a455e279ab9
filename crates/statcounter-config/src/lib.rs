// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the StatCounter client.
//!
//! This crate provides:
//! - XDG Base Directory compliant path resolution
//! - TOML configuration file parsing
//! - Environment variable overrides, with `*_FILE` support for the password
//! - Configuration validation

pub mod env;
pub mod error;
pub mod layer;
pub mod paths;
pub mod runtime;
pub mod sources;
pub mod validation;

use std::path::Path;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use runtime::{StatcounterConfig, DEFAULT_TIMEOUT_SECS};

/// Load configuration from the resolved config file and the environment.
pub fn load_config() -> Result<StatcounterConfig, ConfigError> {
	let path = paths::resolve_config_path()?;
	load_config_from(&path)
}

/// Load configuration from `path`, with environment overrides on top.
pub fn load_config_from(path: &Path) -> Result<StatcounterConfig, ConfigError> {
	let mut layer = sources::file_layer(path)?;
	layer.merge(sources::env_layer()?);
	StatcounterConfig::from_layer(layer)
}

/// Parse configuration from a TOML string, without environment overrides.
pub fn from_toml_str(content: &str) -> Result<StatcounterConfig, ConfigError> {
	let layer: ConfigLayer = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
		path: "<inline>".into(),
		source: e,
	})?;
	StatcounterConfig::from_layer(layer)
}
