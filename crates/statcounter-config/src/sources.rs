// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: the TOML file and the environment.

use std::path::Path;

use tracing::{debug, trace};

use crate::env::load_secret_with;
use crate::layer::ConfigLayer;
use crate::ConfigError;

/// Load a TOML file as a layer. A missing file yields an empty layer.
pub fn file_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
	if !path.exists() {
		debug!(path = %path.display(), "config file not found, skipping");
		return Ok(ConfigLayer::default());
	}

	debug!(path = %path.display(), "loading config file");
	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
		path: path.to_path_buf(),
		source: e,
	})?;

	trace!("parsed config layer");
	Ok(layer)
}

/// Load the `STATCOUNTER_*` environment variables as a layer.
pub fn env_layer() -> Result<ConfigLayer, ConfigError> {
	env_layer_with(|key| std::env::var(key).ok())
}

/// [`env_layer`] against an arbitrary variable lookup.
pub fn env_layer_with<F>(lookup: F) -> Result<ConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	debug!("loading environment variables");
	let non_empty = |key: &str| {
		lookup(key)
			.map(|v| v.trim().to_string())
			.filter(|v| !v.is_empty())
	};

	let mut layer = ConfigLayer {
		username: non_empty("STATCOUNTER_USERNAME"),
		default_project: non_empty("STATCOUNTER_DEFAULT_PROJECT"),
		base_url: non_empty("STATCOUNTER_BASE_URL"),
		..ConfigLayer::default()
	};

	if let Some(timeout) = non_empty("STATCOUNTER_TIMEOUT_SECS") {
		let secs = timeout.parse::<u64>().map_err(|e| {
			ConfigError::Env(format!("STATCOUNTER_TIMEOUT_SECS must be an integer: {e}"))
		})?;
		layer.timeout_secs = Some(secs);
	}

	if let Some(secret) = load_secret_with("STATCOUNTER_API_PASSWORD", &lookup)? {
		trace!("loaded API password from environment");
		layer.api_password = Some(secret);
	}

	Ok(layer)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn missing_file_is_empty_layer() {
		let layer = file_layer(Path::new("/nonexistent/statcounter.toml")).unwrap();
		assert!(layer.username.is_none());
	}

	#[test]
	fn bad_toml_reports_path() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "username = ").unwrap();
		let err = file_layer(file.path()).unwrap_err();
		match err {
			ConfigError::TomlParse { path, .. } => assert_eq!(path, file.path()),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn env_vars_populate_layer() {
		let env = vars(&[
			("STATCOUNTER_USERNAME", " DaFlyinJ "),
			("STATCOUNTER_API_PASSWORD", "xemYzgqT"),
			("STATCOUNTER_DEFAULT_PROJECT", "mmc"),
			("STATCOUNTER_BASE_URL", ""),
			("STATCOUNTER_TIMEOUT_SECS", "5"),
		]);
		let layer = env_layer_with(|k| env.get(k).cloned()).unwrap();
		assert_eq!(layer.username.as_deref(), Some("DaFlyinJ"));
		assert_eq!(layer.api_password.unwrap().expose(), "xemYzgqT");
		assert_eq!(layer.default_project.as_deref(), Some("mmc"));
		assert!(layer.base_url.is_none());
		assert_eq!(layer.timeout_secs, Some(5));
	}

	#[test]
	fn bad_timeout_is_env_error() {
		let env = vars(&[("STATCOUNTER_TIMEOUT_SECS", "soon")]);
		let err = env_layer_with(|k| env.get(k).cloned()).unwrap_err();
		assert!(matches!(err, ConfigError::Env(_)));
	}
}
