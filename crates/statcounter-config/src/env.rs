// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Environment variable helpers for loading secrets.
//!
//! Secrets may be given directly in `VAR` or as a path in `VAR_FILE`, the
//! convention used by Docker and Kubernetes secret mounts.

use std::path::PathBuf;
use std::{env, fs};

use statcounter_core::SecretString;
use thiserror::Error;

/// Errors that can occur when loading secrets from environment variables.
#[derive(Debug, Error)]
pub enum SecretEnvError {
	/// Failed to read the secret file.
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The secret file path was empty.
	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load a secret from the process environment using `VAR` / `VAR_FILE`.
///
/// `VAR_FILE` wins over `VAR`. A single trailing newline is stripped from
/// file contents.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	load_secret_with(var, |key| env::var(key).ok())
}

/// [`load_secret_env`] against an arbitrary variable lookup.
pub fn load_secret_with<F>(var: &str, lookup: F) -> Result<Option<SecretString>, SecretEnvError>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");

	if let Some(path_str) = lookup(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|e| SecretEnvError::Io {
			path: path.clone(),
			source: e,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(secret)));
	}

	Ok(lookup(var).map(SecretString::new))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn lookup(vars: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
		move |key| vars.get(key).cloned()
	}

	#[test]
	fn returns_none_when_not_set() {
		let vars = HashMap::new();
		assert!(load_secret_with("PW", lookup(&vars)).unwrap().is_none());
	}

	#[test]
	fn reads_direct_value() {
		let vars = HashMap::from([("PW".to_string(), "hunter2".to_string())]);
		let secret = load_secret_with("PW", lookup(&vars)).unwrap().unwrap();
		assert_eq!(secret.expose(), "hunter2");
	}

	#[test]
	fn file_takes_precedence_and_strips_one_newline() {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "from-file\n\n").unwrap();
		let vars = HashMap::from([
			("PW".to_string(), "direct".to_string()),
			(
				"PW_FILE".to_string(),
				file.path().to_string_lossy().into_owned(),
			),
		]);
		let secret = load_secret_with("PW", lookup(&vars)).unwrap().unwrap();
		assert_eq!(secret.expose(), "from-file\n");
	}

	#[test]
	fn empty_file_path_is_an_error() {
		let vars = HashMap::from([("PW_FILE".to_string(), String::new())]);
		let err = load_secret_with("PW", lookup(&vars)).unwrap_err();
		assert!(matches!(err, SecretEnvError::EmptyPath { var } if var == "PW_FILE"));
	}

	#[test]
	fn missing_file_is_io_error() {
		let vars = HashMap::from([(
			"PW_FILE".to_string(),
			"/nonexistent/statcounter/secret".to_string(),
		)]);
		let err = load_secret_with("PW", lookup(&vars)).unwrap_err();
		assert!(matches!(err, SecretEnvError::Io { .. }));
	}
}
