// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deterministic URL compilation and request signing.
//!
//! Two forms exist per query. The live form carries the request time and a
//! trailing signature. The cache form omits both so that identical parameter
//! sets map to the same key regardless of when they run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::form_urlencoded;

use crate::error::{CoreError, Result};
use crate::params::{ParamKey, ParameterSet};
use crate::query::{Query, SIGNATURE_KEY};
use crate::registry::{Credentials, ProjectRegistry};

pub const DEFAULT_BASE_URL: &str = "https://api.statcounter.com";

/// Digest used for the request signature and the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
	#[default]
	Sha1,
	Sha256,
}

impl SignatureAlgorithm {
	/// Lowercase hex digest of `input`.
	pub fn hex_digest(&self, input: &[u8]) -> String {
		match self {
			SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(input)),
			SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(input)),
		}
	}
}

impl fmt::Display for SignatureAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SignatureAlgorithm::Sha1 => f.write_str("sha1"),
			SignatureAlgorithm::Sha256 => f.write_str("sha256"),
		}
	}
}

impl FromStr for SignatureAlgorithm {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_lowercase().as_str() {
			"sha1" => Ok(SignatureAlgorithm::Sha1),
			"sha256" => Ok(SignatureAlgorithm::Sha256),
			other => Err(CoreError::invalid_argument(format!(
				"unknown signature algorithm '{other}'"
			))),
		}
	}
}

/// Turns a [`Query`] into request URLs.
#[derive(Debug, Clone)]
pub struct UrlCompiler {
	base_url: String,
	algorithm: SignatureAlgorithm,
}

impl Default for UrlCompiler {
	fn default() -> Self {
		Self::new(DEFAULT_BASE_URL)
	}
}

impl UrlCompiler {
	pub fn new(base_url: impl Into<String>) -> Self {
		let base_url = base_url.into().trim_end_matches('/').to_string();
		Self {
			base_url,
			algorithm: SignatureAlgorithm::default(),
		}
	}

	pub fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
		self.algorithm = algorithm;
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn algorithm(&self) -> SignatureAlgorithm {
		self.algorithm
	}

	/// Copies the query parameters and fills in the default project and
	/// username. The query itself is left untouched.
	pub fn resolve(
		&self,
		query: &Query,
		credentials: &Credentials,
		registry: &ProjectRegistry,
	) -> Result<ParameterSet> {
		let command = query
			.command()
			.ok_or_else(|| CoreError::invalid_argument("no statistic or command selected"))?;

		let mut params = query.params().clone();
		if command.is_project_scoped() && !params.is_set(ParamKey::ProjectId) {
			let id = registry.resolve(None)?;
			params.set(ParamKey::ProjectId, id.as_str());
		}
		if !params.is_set(ParamKey::Username) {
			if credentials.username.is_empty() {
				return Err(CoreError::config("could not find username in config"));
			}
			params.set(ParamKey::Username, credentials.username.as_str());
		}
		Ok(params)
	}

	/// The signed live URL, stamped with `timestamp`.
	///
	/// A raw URL override is returned unchanged.
	#[instrument(skip_all, fields(command = ?query.command()))]
	pub fn compile(
		&self,
		query: &Query,
		credentials: &Credentials,
		registry: &ProjectRegistry,
		timestamp: i64,
	) -> Result<String> {
		if let Some(raw) = query.raw_url() {
			debug!("using raw URL override");
			return Ok(raw.to_string());
		}

		let mut params = self.resolve(query, credentials, registry)?;
		params.set(ParamKey::Time, timestamp.to_string());
		let qs = encode(&params, &[]);
		let password = query.password_override().unwrap_or(&credentials.password);
		let signature = self.sign(&qs, password.expose());

		let path = self.path(query)?;
		debug!(path = %path, timestamp, "compiled signed request");
		Ok(format!(
			"{}/{}/?{}&{}={}",
			self.base_url, path, qs, SIGNATURE_KEY, signature
		))
	}

	/// The URL without time or signature, used to derive cache keys.
	pub fn compile_unsigned(
		&self,
		query: &Query,
		credentials: &Credentials,
		registry: &ProjectRegistry,
	) -> Result<String> {
		if let Some(raw) = query.raw_url() {
			return Ok(raw.to_string());
		}

		let params = self.resolve(query, credentials, registry)?;
		let qs = encode(&params, &[ParamKey::Time]);
		Ok(format!("{}/{}/?{}", self.base_url, self.path(query)?, qs))
	}

	/// Digest of the unsigned URL with the password appended.
	pub fn cache_key(
		&self,
		query: &Query,
		credentials: &Credentials,
		registry: &ProjectRegistry,
	) -> Result<String> {
		let unsigned = self.compile_unsigned(query, credentials, registry)?;
		let password = query.password_override().unwrap_or(&credentials.password);
		let mut input = unsigned.into_bytes();
		input.extend_from_slice(password.expose().as_bytes());
		Ok(self.algorithm.hex_digest(&input))
	}

	/// Signs an encoded query string (without its leading `?`).
	pub fn sign(&self, qs: &str, password: &str) -> String {
		let input = format!("?{qs}{password}");
		self.algorithm.hex_digest(input.as_bytes())
	}

	fn path(&self, query: &Query) -> Result<String> {
		query
			.command()
			.map(|command| command.path().to_string())
			.ok_or_else(|| CoreError::invalid_argument("no statistic or command selected"))
	}
}

/// Form-encodes parameters in canonical order.
fn encode(params: &ParameterSet, excluded: &[ParamKey]) -> String {
	form_urlencoded::Serializer::new(String::new())
		.extend_pairs(params.pairs(excluded))
		.finish()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::options::{Command, Statistic};
	use crate::params::{ProjectId, ProjectSelection};
	use proptest::prelude::*;

	fn credentials() -> Credentials {
		Credentials::new("DaFlyinJ", "xemYzgqT")
	}

	fn registry() -> ProjectRegistry {
		ProjectRegistry::new()
			.with_project("mmc", "9917949")
			.with_project("test", "1234567")
			.with_default("mmc")
	}

	fn stats(statistic: Statistic) -> Query {
		let mut query = Query::new();
		query.set_command(Command::Stats);
		query.params_mut().set(ParamKey::Stats, statistic.code());
		query
	}

	fn unsigned_part(url: &str) -> &str {
		url.split("&sha1=").next().unwrap()
	}

	#[test]
	fn summary_uses_defaults() {
		let url = UrlCompiler::default()
			.compile(&stats(Statistic::Summary), &credentials(), &registry(), 1234)
			.unwrap();
		assert_eq!(
			unsigned_part(&url),
			"https://api.statcounter.com/stats/?vn=3&s=summary&pi=9917949&u=DaFlyinJ&t=1234"
		);
	}

	#[test]
	fn signature_covers_question_mark_query_and_password() {
		let url = UrlCompiler::default()
			.compile(&stats(Statistic::Summary), &credentials(), &registry(), 1234)
			.unwrap();
		let qs = "vn=3&s=summary&pi=9917949&u=DaFlyinJ&t=1234";
		let expected = hex::encode(Sha1::digest(format!("?{qs}xemYzgqT").as_bytes()));
		assert!(url.ends_with(&format!("&sha1={expected}")));
	}

	#[test]
	fn sha256_signature_is_configurable() {
		let compiler = UrlCompiler::default().with_algorithm(SignatureAlgorithm::Sha256);
		let url = compiler
			.compile(&stats(Statistic::Summary), &credentials(), &registry(), 1)
			.unwrap();
		let signature = url.rsplit("&sha1=").next().unwrap();
		assert_eq!(signature.len(), 64);
	}

	#[test]
	fn values_are_form_encoded() {
		let mut query = Query::new();
		query.set_command(Command::AddProject);
		let params = query.params_mut();
		params.set(ParamKey::WebsiteTitle, "Archon Crafters");
		params.set(ParamKey::WebsiteUrl, "http://archoncrafters.com");
		params.set(ParamKey::TimeZone, "America/Chicago");
		params.set(ParamKey::PublicStats, "0");
		let url = UrlCompiler::default()
			.compile(&query, &credentials(), &registry(), 5)
			.unwrap();
		assert_eq!(
			unsigned_part(&url),
			"https://api.statcounter.com/add_project/?vn=3&u=DaFlyinJ&wt=Archon+Crafters&wu=http%3A%2F%2Farchoncrafters.com&t=5&tz=America%2FChicago&ps=0"
		);
	}

	#[test]
	fn account_commands_skip_default_project() {
		let mut query = Query::new();
		query.set_command(Command::UserProjects);
		let url = UrlCompiler::default()
			.compile(&query, &credentials(), &registry(), 5)
			.unwrap();
		assert_eq!(
			unsigned_part(&url),
			"https://api.statcounter.com/user_projects/?vn=3&u=DaFlyinJ&t=5"
		);
	}

	#[test]
	fn password_override_changes_signature() {
		let mut query = Query::new();
		query.set_command(Command::UserDetails);
		query.params_mut().set(ParamKey::Username, "banana");
		query.set_password_override("Pa55w0rd".into());
		let url = UrlCompiler::default()
			.compile(&query, &credentials(), &registry(), 5)
			.unwrap();
		let qs = "vn=3&u=banana&t=5";
		let expected = hex::encode(Sha1::digest(format!("?{qs}Pa55w0rd").as_bytes()));
		assert_eq!(
			url,
			format!("https://api.statcounter.com/user_details/?{qs}&sha1={expected}")
		);
	}

	#[test]
	fn multi_project_repeats_bare_keys() {
		let mut query = stats(Statistic::Summary);
		query.params_mut().set_project(ProjectSelection::Multiple(vec![
			ProjectId::new("9917949"),
			ProjectId::new("1234567"),
		]));
		let url = UrlCompiler::default()
			.compile(&query, &credentials(), &registry(), 9)
			.unwrap();
		assert!(unsigned_part(&url).contains("&pi=9917949&pi=1234567&"));
		assert!(!url.contains("%5B"));
	}

	#[test]
	fn compile_leaves_query_untouched() {
		let query = stats(Statistic::Summary);
		let before = query.params().clone();
		UrlCompiler::default()
			.compile(&query, &credentials(), &registry(), 9)
			.unwrap();
		assert_eq!(query.params(), &before);
	}

	#[test]
	fn cache_form_has_no_time_or_signature() {
		let unsigned = UrlCompiler::default()
			.compile_unsigned(&stats(Statistic::Summary), &credentials(), &registry())
			.unwrap();
		assert_eq!(
			unsigned,
			"https://api.statcounter.com/stats/?vn=3&s=summary&pi=9917949&u=DaFlyinJ"
		);
		let key = UrlCompiler::default()
			.cache_key(&stats(Statistic::Summary), &credentials(), &registry())
			.unwrap();
		let expected = hex::encode(Sha1::digest(format!("{unsigned}xemYzgqT").as_bytes()));
		assert_eq!(key, expected);
	}

	#[test]
	fn raw_override_is_returned_verbatim() {
		let raw = "https://api.statcounter.com/stats/?vn=3&s=summary&pi=1&sha1=abc";
		let mut query = Query::new();
		query.apply_raw(raw.into()).unwrap();
		let url = UrlCompiler::default()
			.compile(&query, &credentials(), &registry(), 1)
			.unwrap();
		assert_eq!(url, raw);
	}

	#[test]
	fn stripped_raw_signature_is_reproduced() {
		let original = UrlCompiler::default()
			.compile(&stats(Statistic::Summary), &credentials(), &registry(), 77)
			.unwrap();
		let (_, after_path) = original.split_once("/stats/").unwrap();
		let mut query = Query::new();
		query.apply_raw(format!("stats/{after_path}").into()).unwrap();
		let recompiled = UrlCompiler::default()
			.compile(&query, &credentials(), &registry(), 77)
			.unwrap();
		assert_eq!(recompiled, original);
	}

	#[test]
	fn missing_command_is_invalid() {
		let err = UrlCompiler::default()
			.compile(&Query::new(), &credentials(), &registry(), 1)
			.unwrap_err();
		assert!(matches!(err, CoreError::InvalidArgument(_)));
	}

	#[test]
	fn missing_default_project_is_config_error() {
		let err = UrlCompiler::default()
			.compile(
				&stats(Statistic::Summary),
				&credentials(),
				&ProjectRegistry::new(),
				1,
			)
			.unwrap_err();
		assert!(matches!(err, CoreError::Config(_)));
	}

	#[test]
	fn missing_username_is_config_error() {
		let err = UrlCompiler::default()
			.compile(
				&stats(Statistic::Summary),
				&Credentials::new("", "pw"),
				&registry(),
				1,
			)
			.unwrap_err();
		assert!(matches!(err, CoreError::Config(_)));
	}

	#[test]
	fn algorithm_parses_case_insensitively() {
		assert_eq!("SHA256".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Sha256);
		assert!("md5".parse::<SignatureAlgorithm>().is_err());
	}

	proptest! {
		#[test]
		fn signature_is_deterministic_per_timestamp(t1 in 0i64..2_000_000_000, t2 in 0i64..2_000_000_000) {
			let compiler = UrlCompiler::default();
			let query = stats(Statistic::RecentVisitors);
			let a = compiler.compile(&query, &credentials(), &registry(), t1).unwrap();
			let b = compiler.compile(&query, &credentials(), &registry(), t1).unwrap();
			prop_assert_eq!(&a, &b);
			let c = compiler.compile(&query, &credentials(), &registry(), t2).unwrap();
			prop_assert_eq!(a == c, t1 == t2);
		}
	}
}
