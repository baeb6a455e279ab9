// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use std::collections::BTreeMap;

use serde::Deserialize;
use statcounter_core::{SecretString, SignatureAlgorithm};

/// Partial configuration - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub api_password: Option<SecretString>,
	#[serde(default)]
	pub default_project: Option<String>,
	#[serde(default)]
	pub projects: Option<BTreeMap<String, String>>,
	#[serde(default)]
	pub security_codes: Option<BTreeMap<String, String>>,
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub cache_minutes: Option<i64>,
	#[serde(default)]
	pub signature: Option<SignatureAlgorithm>,
}

impl ConfigLayer {
	/// Overlay `other` on top of `self`. Maps merge per label.
	pub fn merge(&mut self, other: ConfigLayer) {
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.api_password.is_some() {
			self.api_password = other.api_password;
		}
		if other.default_project.is_some() {
			self.default_project = other.default_project;
		}
		merge_map(&mut self.projects, other.projects);
		merge_map(&mut self.security_codes, other.security_codes);
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.cache_minutes.is_some() {
			self.cache_minutes = other.cache_minutes;
		}
		if other.signature.is_some() {
			self.signature = other.signature;
		}
	}
}

fn merge_map(target: &mut Option<BTreeMap<String, String>>, source: Option<BTreeMap<String, String>>) {
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => t.extend(s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn later_layer_overrides_scalars_and_extends_maps() {
		let mut base: ConfigLayer = toml::from_str(
			r#"
username = "DaFlyinJ"
default_project = "mmc"

[projects]
mmc = "9917949"
"#,
		)
		.unwrap();
		let top: ConfigLayer = toml::from_str(
			r#"
username = "someone"

[projects]
test = "1234567"
"#,
		)
		.unwrap();
		base.merge(top);
		assert_eq!(base.username.as_deref(), Some("someone"));
		assert_eq!(base.default_project.as_deref(), Some("mmc"));
		assert_eq!(base.projects.unwrap().len(), 2);
	}

	#[test]
	fn password_debug_is_redacted() {
		let layer: ConfigLayer = toml::from_str(r#"api_password = "xemYzgqT""#).unwrap();
		assert!(!format!("{layer:?}").contains("xemYzgqT"));
	}

	#[test]
	fn signature_parses_lowercase() {
		let layer: ConfigLayer = toml::from_str(r#"signature = "sha256""#).unwrap();
		assert_eq!(layer.signature, Some(SignatureAlgorithm::Sha256));
	}
}
