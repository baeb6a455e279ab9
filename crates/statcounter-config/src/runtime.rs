// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Final runtime configuration after merging all layers.

use std::collections::BTreeMap;
use std::time::Duration;

use statcounter_core::{
	Credentials, ProjectRegistry, SecretString, SignatureAlgorithm, DEFAULT_BASE_URL,
};

use crate::layer::ConfigLayer;
use crate::validation::validate_config;
use crate::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct StatcounterConfig {
	pub username: String,
	pub api_password: SecretString,
	pub default_project: Option<String>,
	pub projects: BTreeMap<String, String>,
	pub security_codes: BTreeMap<String, String>,
	pub base_url: String,
	pub timeout_secs: u64,
	/// Default cache duration for queries; negative means forever.
	pub cache_minutes: Option<i64>,
	pub signature: SignatureAlgorithm,
}

impl StatcounterConfig {
	/// Apply defaults to a merged layer and validate the result.
	pub fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
		let config = Self {
			username: layer
				.username
				.ok_or_else(|| ConfigError::missing_field("username"))?,
			api_password: layer
				.api_password
				.ok_or_else(|| ConfigError::missing_field("api_password"))?,
			default_project: layer.default_project,
			projects: layer.projects.unwrap_or_default(),
			security_codes: layer.security_codes.unwrap_or_default(),
			base_url: layer
				.base_url
				.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
			timeout_secs: layer.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
			cache_minutes: layer.cache_minutes,
			signature: layer.signature.unwrap_or_default(),
		};
		validate_config(&config)?;
		Ok(config)
	}

	/// Look up a value by dotted key.
	///
	/// Recognised keys: `username`, `default`, `base-url`, `timeout`,
	/// `projects.<label>` and `security-codes.<label>`. The password is not
	/// readable this way.
	pub fn get(&self, key: &str) -> Result<String, ConfigError> {
		let found = match key.split_once('.') {
			Some(("projects", label)) => self.projects.get(label).cloned(),
			Some(("security-codes", label)) => self.security_codes.get(label).cloned(),
			Some(_) => None,
			None => match key {
				"username" => Some(self.username.clone()),
				"default" => self.default_project.clone(),
				"base-url" => Some(self.base_url.clone()),
				"timeout" => Some(self.timeout_secs.to_string()),
				_ => None,
			},
		};
		found.ok_or_else(|| ConfigError::missing_field(key))
	}

	pub fn credentials(&self) -> Credentials {
		Credentials::new(self.username.clone(), self.api_password.clone())
	}

	pub fn registry(&self) -> ProjectRegistry {
		let mut registry = ProjectRegistry::new();
		for (label, id) in &self.projects {
			registry.insert(label.clone(), id.clone());
		}
		match &self.default_project {
			Some(label) => registry.with_default(label.clone()),
			None => registry,
		}
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> StatcounterConfig {
		let layer: ConfigLayer = toml::from_str(
			r#"
username = "DaFlyinJ"
api_password = "xemYzgqT"
default_project = "mmc"

[projects]
mmc = "9917949"
test = "1234567"

[security_codes]
mmc = "d420b3cd"
"#,
		)
		.unwrap();
		StatcounterConfig::from_layer(layer).unwrap()
	}

	#[test]
	fn defaults_are_applied() {
		let config = sample();
		assert_eq!(config.base_url, DEFAULT_BASE_URL);
		assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
		assert_eq!(config.signature, SignatureAlgorithm::Sha1);
		assert_eq!(config.cache_minutes, None);
	}

	#[test]
	fn get_reads_dotted_keys() {
		let config = sample();
		assert_eq!(config.get("username").unwrap(), "DaFlyinJ");
		assert_eq!(config.get("default").unwrap(), "mmc");
		assert_eq!(config.get("projects.test").unwrap(), "1234567");
		assert_eq!(config.get("security-codes.mmc").unwrap(), "d420b3cd");
		assert_eq!(config.get("base-url").unwrap(), DEFAULT_BASE_URL);
	}

	#[test]
	fn get_missing_key_is_missing_field() {
		let config = sample();
		for key in ["projects.nope", "security-codes.test", "api_password", "nope.x"] {
			assert!(matches!(config.get(key), Err(ConfigError::MissingField(k)) if k == key));
		}
	}

	#[test]
	fn registry_resolves_default_and_reverse() {
		let registry = sample().registry();
		assert_eq!(registry.resolve(None).unwrap().as_str(), "9917949");
		assert_eq!(registry.label_for(&"1234567".into()), Some("test"));
	}

	#[test]
	fn missing_username_is_reported() {
		let layer: ConfigLayer = toml::from_str(r#"api_password = "x""#).unwrap();
		let err = StatcounterConfig::from_layer(layer).unwrap_err();
		assert!(matches!(err, ConfigError::MissingField(f) if f == "username"));
	}
}
