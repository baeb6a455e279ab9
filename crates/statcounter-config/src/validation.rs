// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use tracing::warn;
use url::Url;

use crate::runtime::StatcounterConfig;
use crate::ConfigError;

/// Validate the configuration.
pub fn validate_config(config: &StatcounterConfig) -> Result<(), ConfigError> {
	validate_credentials(config)?;
	validate_projects(config)?;
	validate_transport(config)?;
	Ok(())
}

fn validate_credentials(config: &StatcounterConfig) -> Result<(), ConfigError> {
	if config.username.trim().is_empty() {
		return Err(ConfigError::invalid_value("username", "username cannot be empty"));
	}
	if config.api_password.expose().is_empty() {
		return Err(ConfigError::invalid_value(
			"api_password",
			"api_password cannot be empty",
		));
	}
	Ok(())
}

fn validate_projects(config: &StatcounterConfig) -> Result<(), ConfigError> {
	for (label, id) in &config.projects {
		if id.trim().is_empty() {
			return Err(ConfigError::invalid_value(
				format!("projects.{label}"),
				"project id cannot be empty",
			));
		}
	}

	match &config.default_project {
		Some(label) if !config.projects.contains_key(label) => {
			return Err(ConfigError::validation(format!(
				"default_project '{label}' is not listed in [projects]"
			)));
		}
		None if !config.projects.is_empty() => {
			warn!("no default_project configured; stats queries must name a project");
		}
		_ => {}
	}

	for label in config.security_codes.keys() {
		if !config.projects.contains_key(label) {
			warn!(label = %label, "security code configured for unknown project");
		}
	}
	Ok(())
}

fn validate_transport(config: &StatcounterConfig) -> Result<(), ConfigError> {
	let url = Url::parse(&config.base_url)
		.map_err(|e| ConfigError::invalid_value("base_url", e.to_string()))?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::invalid_value(
			"base_url",
			format!("unsupported scheme '{}'", url.scheme()),
		));
	}
	if config.timeout_secs == 0 {
		return Err(ConfigError::invalid_value(
			"timeout_secs",
			"timeout must be greater than zero",
		));
	}
	Ok(())
}
