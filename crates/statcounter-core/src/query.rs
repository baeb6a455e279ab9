// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The in-flight query: selected command, parameters and result shaping.

use std::collections::BTreeSet;

use serde_json::Value;
use url::Url;

use crate::error::{CoreError, Result};
use crate::options::Command;
use crate::params::{ParamKey, ParameterSet, ProjectId, ProjectSelection};
use crate::secret::SecretString;

/// Parameter carrying the request signature.
pub const SIGNATURE_KEY: &str = "sha1";

/// Columns to keep in each result row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Columns {
	#[default]
	All,
	Only(BTreeSet<String>),
}

impl Columns {
	/// Builds a column set; `*` anywhere in the list means all columns.
	pub fn from_names<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
		if names.is_empty() || names.contains("*") {
			Columns::All
		} else {
			Columns::Only(names)
		}
	}

	pub fn is_all(&self) -> bool {
		matches!(self, Columns::All)
	}

	pub fn contains(&self, name: &str) -> bool {
		match self {
			Columns::All => true,
			Columns::Only(names) => names.contains(name),
		}
	}
}

/// Raw input merged into a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawQuery {
	/// A full URL, a path with a query string, or a bare query string.
	Url(String),
	/// Flat key/value pairs. A `query` key names the command path.
	Params(Vec<(String, String)>),
}

impl From<&str> for RawQuery {
	fn from(value: &str) -> Self {
		RawQuery::Url(value.to_string())
	}
}

impl From<String> for RawQuery {
	fn from(value: String) -> Self {
		RawQuery::Url(value)
	}
}

impl<K, V> From<Vec<(K, V)>> for RawQuery
where
	K: Into<String>,
	V: Into<String>,
{
	fn from(value: Vec<(K, V)>) -> Self {
		RawQuery::Params(
			value
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

impl TryFrom<Value> for RawQuery {
	type Error = CoreError;

	/// Accepts a string or a flat object of scalars.
	fn try_from(value: Value) -> Result<Self> {
		match value {
			Value::String(s) => Ok(RawQuery::Url(s)),
			Value::Object(map) => {
				let mut pairs = Vec::with_capacity(map.len());
				for (key, value) in map {
					let value = match value {
						Value::String(s) => s,
						Value::Number(n) => n.to_string(),
						Value::Bool(b) => if b { "1" } else { "0" }.to_string(),
						other => {
							return Err(CoreError::invalid_argument(format!(
								"raw parameter '{key}' must be a scalar, got {other}"
							)))
						}
					};
					pairs.push((key, value));
				}
				Ok(RawQuery::Params(pairs))
			}
			other => Err(CoreError::invalid_argument(format!(
				"invalid raw value submitted: {other}"
			))),
		}
	}
}

/// One logical request.
#[derive(Debug, Clone)]
pub struct Query {
	command: Option<Command>,
	params: ParameterSet,
	limit: Option<usize>,
	offset: usize,
	columns: Columns,
	raw_url: Option<String>,
	password_override: Option<SecretString>,
}

impl Default for Query {
	fn default() -> Self {
		Self::new()
	}
}

impl Query {
	pub fn new() -> Self {
		Self {
			command: None,
			params: ParameterSet::template(),
			limit: None,
			offset: 0,
			columns: Columns::All,
			raw_url: None,
			password_override: None,
		}
	}

	/// Returns every field to its fresh state.
	pub fn reset(&mut self) {
		*self = Self::new();
	}

	pub fn command(&self) -> Option<&Command> {
		self.command.as_ref()
	}

	pub fn set_command(&mut self, command: Command) {
		self.command = Some(command);
	}

	pub fn params(&self) -> &ParameterSet {
		&self.params
	}

	pub fn params_mut(&mut self) -> &mut ParameterSet {
		&mut self.params
	}

	pub fn limit(&self) -> Option<usize> {
		self.limit
	}

	pub fn set_limit(&mut self, limit: usize) -> Result<()> {
		if limit == 0 {
			return Err(CoreError::invalid_argument("limit must be greater than zero"));
		}
		self.limit = Some(limit);
		Ok(())
	}

	pub fn offset(&self) -> usize {
		self.offset
	}

	pub fn set_offset(&mut self, offset: usize) {
		self.offset = offset;
	}

	pub fn columns(&self) -> &Columns {
		&self.columns
	}

	pub fn set_columns(&mut self, columns: Columns) {
		self.columns = columns;
	}

	/// Clears limit, offset and column narrowing.
	pub fn clear_constraints(&mut self) {
		self.limit = None;
		self.offset = 0;
		self.columns = Columns::All;
	}

	pub fn raw_url(&self) -> Option<&str> {
		self.raw_url.as_deref()
	}

	pub fn password_override(&self) -> Option<&SecretString> {
		self.password_override.as_ref()
	}

	pub fn set_password_override(&mut self, password: SecretString) {
		self.password_override = Some(password);
	}

	/// Whether the response is expected in the multi-project shape.
	pub fn is_multi_project(&self) -> bool {
		self
			.params
			.project()
			.is_some_and(ProjectSelection::is_multiple)
	}

	/// Merges raw input into the query.
	///
	/// A complete URL carrying a signature is kept verbatim and bypasses
	/// compilation. Otherwise any `sha1` is dropped before merging, since it
	/// would no longer match the mutated parameters.
	pub fn apply_raw(&mut self, raw: RawQuery) -> Result<()> {
		match raw {
			RawQuery::Url(value) => self.apply_raw_url(&value),
			RawQuery::Params(pairs) => {
				let mut path = None;
				let mut rest = Vec::with_capacity(pairs.len());
				for (key, value) in pairs {
					if key == "query" {
						path = Some(value);
					} else {
						rest.push((key, value));
					}
				}
				self.merge_pairs(rest)?;
				self.command = Some(Command::from_path(path.as_deref().unwrap_or_default()));
				Ok(())
			}
		}
	}

	fn apply_raw_url(&mut self, value: &str) -> Result<()> {
		let value = value.trim();
		if value.is_empty() {
			return Err(CoreError::invalid_argument("raw query is empty"));
		}

		if let Ok(url) = Url::parse(value) {
			if url.has_host() {
				let pairs: Vec<(String, String)> = url
					.query_pairs()
					.map(|(k, v)| (k.into_owned(), v.into_owned()))
					.collect();
				if url.query().is_some() && pairs.iter().any(|(k, _)| k == SIGNATURE_KEY) {
					self.raw_url = Some(value.to_string());
					return Ok(());
				}
				self.merge_pairs(pairs)?;
				self.command = Some(Command::from_path(url.path()));
				return Ok(());
			}
			return Err(CoreError::invalid_argument(format!(
				"raw URL '{value}' has no host"
			)));
		}

		let (path, query) = match value.split_once('?') {
			Some((path, query)) => (path, query),
			None if value.contains('=') => ("", value),
			None => {
				self.command = Some(Command::from_path(value));
				return Ok(());
			}
		};
		let pairs = url::form_urlencoded::parse(query.as_bytes())
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect();
		self.merge_pairs(pairs)?;
		self.command = Some(Command::from_path(path));
		Ok(())
	}

	/// Merges into a copy and swaps it in, so a rejected pair leaves the
	/// parameters untouched.
	fn merge_pairs(&mut self, pairs: Vec<(String, String)>) -> Result<()> {
		let mut params = self.params.clone();
		let mut projects: Vec<ProjectId> = Vec::new();
		for (key, value) in pairs {
			if key == SIGNATURE_KEY {
				continue;
			}
			match ParamKey::from_code(&key) {
				Some(ParamKey::ProjectId) => projects.push(ProjectId::new(value)),
				Some(ParamKey::NumberOfResults) if value.parse::<u64>().is_err() => {
					return Err(CoreError::invalid_argument(format!(
						"number of results must be numeric, got '{value}'"
					)));
				}
				Some(known) => params.set(known, value),
				None => params.set_extra(key, value),
			}
		}
		match projects.len() {
			0 => {}
			1 => params.set_project(ProjectSelection::Single(projects.remove(0))),
			_ => params.set_project(ProjectSelection::Multiple(projects)),
		}
		self.params = params;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn columns_wildcard_means_all() {
		assert!(Columns::from_names(["*"]).is_all());
		assert!(Columns::from_names(["a", "*"]).is_all());
		assert!(Columns::from_names(Vec::<String>::new()).is_all());
		assert!(!Columns::from_names(["a"]).contains("b"));
	}

	#[test]
	fn zero_limit_is_rejected() {
		let mut query = Query::new();
		assert!(matches!(
			query.set_limit(0),
			Err(CoreError::InvalidArgument(_))
		));
		assert_eq!(query.limit(), None);
	}

	#[test]
	fn reset_clears_everything() {
		let mut query = Query::new();
		query.set_command(Command::Stats);
		query.params_mut().set(ParamKey::Stats, "summary");
		query.set_limit(3).unwrap();
		query.set_offset(2);
		query.set_password_override("pw".into());
		query.reset();
		assert!(query.command().is_none());
		assert_eq!(query.params(), &ParameterSet::template());
		assert_eq!(query.limit(), None);
		assert_eq!(query.offset(), 0);
		assert!(query.password_override().is_none());
	}

	#[test]
	fn signed_full_url_is_kept_verbatim() {
		let url = "https://api.statcounter.com/stats/?vn=3&s=summary&pi=1&u=me&t=5&sha1=abc";
		let mut query = Query::new();
		query.apply_raw(url.into()).unwrap();
		assert_eq!(query.raw_url(), Some(url));
	}

	#[test]
	fn unsigned_full_url_merges_params_and_path() {
		let mut query = Query::new();
		query
			.apply_raw("https://api.statcounter.com/user_projects/?vn=3&u=banana&t=5".into())
			.unwrap();
		assert!(query.raw_url().is_none());
		assert_eq!(query.command(), Some(&Command::UserProjects));
		assert_eq!(query.params().get(ParamKey::Username), Some("banana"));
	}

	#[test]
	fn bare_query_string_strips_signature_and_defaults_to_stats() {
		let mut query = Query::new();
		query
			.apply_raw("?vn=3&s=summary&pi=9917949&sha1=deadbeef".into())
			.unwrap();
		assert_eq!(query.command(), Some(&Command::Stats));
		assert_eq!(
			query.params().pairs(&[]),
			vec![("vn", "3"), ("s", "summary"), ("pi", "9917949")]
		);
	}

	#[test]
	fn repeated_pi_becomes_multi_project() {
		let mut query = Query::new();
		query.apply_raw("?pi=1&pi=2".into()).unwrap();
		assert!(query.is_multi_project());
	}

	#[test]
	fn params_map_uses_query_key_as_path() {
		let mut query = Query::new();
		query
			.apply_raw(vec![("query", "select_project"), ("pi", "7"), ("x", "y")].into())
			.unwrap();
		assert_eq!(query.command(), Some(&Command::SelectProject));
		assert_eq!(query.params().get(ParamKey::ProjectId), Some("7"));
		assert_eq!(query.params().extra(), &[("x".to_string(), "y".to_string())]);
	}

	#[test]
	fn non_numeric_result_count_is_rejected() {
		let mut query = Query::new();
		let err = query.apply_raw("?n=lots".into()).unwrap_err();
		assert!(matches!(err, CoreError::InvalidArgument(_)));
	}

	#[test]
	fn rejected_result_count_leaves_params_untouched() {
		let mut query = Query::new();
		query.apply_raw("?pi=7".into()).unwrap();
		let before = query.params().clone();
		assert!(query.apply_raw("?s=summary&pi=8&n=lots&x=y".into()).is_err());
		assert_eq!(query.params(), &before);
	}

	#[test]
	fn path_only_raw_value_selects_the_command() {
		let mut query = Query::new();
		query.params_mut().set(ParamKey::Username, "banana");
		query.apply_raw("user_projects/".into()).unwrap();
		assert_eq!(query.command(), Some(&Command::UserProjects));
		assert_eq!(query.params().get(ParamKey::Username), Some("banana"));

		query.apply_raw("/account_logsizes".into()).unwrap();
		assert_eq!(query.command(), Some(&Command::AccountLogsizes));
	}

	#[test]
	fn malformed_raw_inputs_are_rejected() {
		let mut query = Query::new();
		assert!(query.apply_raw("".into()).is_err());
		assert!(RawQuery::try_from(serde_json::json!(42)).is_err());
		assert!(RawQuery::try_from(serde_json::json!({"s": {"nested": 1}})).is_err());
	}

	#[test]
	fn json_object_converts_scalars() {
		let raw = RawQuery::try_from(serde_json::json!({"n": 10, "s": "summary"})).unwrap();
		let RawQuery::Params(pairs) = raw else {
			panic!("expected params");
		};
		assert!(pairs.contains(&("n".to_string(), "10".to_string())));
	}
}
