// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::PathBuf;

use crate::ConfigError;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "STATCOUNTER_CONFIG";

/// Resolve the config file path.
///
/// `$STATCOUNTER_CONFIG` wins; otherwise
/// `$XDG_CONFIG_HOME/statcounter/config.toml`, with `XDG_CONFIG_HOME`
/// defaulting to `~/.config`.
pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
	resolve_config_path_with(|key| std::env::var_os(key).map(PathBuf::from))
}

pub(crate) fn resolve_config_path_with<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
	F: Fn(&str) -> Option<PathBuf>,
{
	if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|p| !p.as_os_str().is_empty()) {
		tracing::debug!(path = %path.display(), "config path from environment");
		return Ok(path);
	}

	let config_home = match lookup("XDG_CONFIG_HOME") {
		Some(dir) => dir,
		None => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};

	let path = config_home.join("statcounter/config.toml");
	tracing::debug!(path = %path.display(), "resolved XDG config path");
	Ok(path)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_path_wins() {
		let path = resolve_config_path_with(|key| match key {
			CONFIG_PATH_ENV => Some(PathBuf::from("/tmp/sc.toml")),
			"XDG_CONFIG_HOME" => Some(PathBuf::from("/xdg")),
			_ => None,
		})
		.unwrap();
		assert_eq!(path, PathBuf::from("/tmp/sc.toml"));
	}

	#[test]
	fn xdg_config_home_is_used() {
		let path = resolve_config_path_with(|key| match key {
			"XDG_CONFIG_HOME" => Some(PathBuf::from("/xdg")),
			_ => None,
		})
		.unwrap();
		assert_eq!(path, PathBuf::from("/xdg/statcounter/config.toml"));
	}

	#[test]
	fn falls_back_to_home_config() {
		let result = resolve_config_path_with(|_| None);
		if let Ok(path) = result {
			assert!(path.ends_with(".config/statcounter/config.toml"));
		}
	}
}
