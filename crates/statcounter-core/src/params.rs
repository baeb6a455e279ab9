// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The parameter table: every query key the API recognises, in the order the
//! signature is computed over.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// API version sent as `vn` on every request.
pub const API_VERSION: &str = "3";

/// A recognised query parameter.
///
/// Declaration order is the canonical serialisation order; `Ord` is derived
/// from it, so a `BTreeMap<ParamKey, _>` iterates canonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamKey {
	Version,
	Format,
	Stats,
	ProjectId,
	Username,
	WebsiteTitle,
	WebsiteUrl,
	LogSize,
	Time,
	TimeZone,
	PublicStats,
	NumberOfResults,
	ChopUrl,
	CountType,
	Granularity,
	StartHour,
	StartDay,
	StartMonth,
	StartYear,
	StartWeek,
	StartQuarter,
	EndHour,
	EndDay,
	EndMonth,
	EndYear,
	EndWeek,
	EndQuarter,
	ExcludeExternal,
	ExcludeSearchEngines,
	ExcludeEncryptedKeywords,
	CombineKeywords,
	GroupByDomain,
	Device,
	IpAddress,
	IpLabel,
}

impl ParamKey {
	pub const ALL: [ParamKey; 35] = [
		ParamKey::Version,
		ParamKey::Format,
		ParamKey::Stats,
		ParamKey::ProjectId,
		ParamKey::Username,
		ParamKey::WebsiteTitle,
		ParamKey::WebsiteUrl,
		ParamKey::LogSize,
		ParamKey::Time,
		ParamKey::TimeZone,
		ParamKey::PublicStats,
		ParamKey::NumberOfResults,
		ParamKey::ChopUrl,
		ParamKey::CountType,
		ParamKey::Granularity,
		ParamKey::StartHour,
		ParamKey::StartDay,
		ParamKey::StartMonth,
		ParamKey::StartYear,
		ParamKey::StartWeek,
		ParamKey::StartQuarter,
		ParamKey::EndHour,
		ParamKey::EndDay,
		ParamKey::EndMonth,
		ParamKey::EndYear,
		ParamKey::EndWeek,
		ParamKey::EndQuarter,
		ParamKey::ExcludeExternal,
		ParamKey::ExcludeSearchEngines,
		ParamKey::ExcludeEncryptedKeywords,
		ParamKey::CombineKeywords,
		ParamKey::GroupByDomain,
		ParamKey::Device,
		ParamKey::IpAddress,
		ParamKey::IpLabel,
	];

	/// Date sub-fields written by a range constraint.
	pub const DATE_FIELDS: [ParamKey; 12] = [
		ParamKey::StartHour,
		ParamKey::StartDay,
		ParamKey::StartMonth,
		ParamKey::StartYear,
		ParamKey::StartWeek,
		ParamKey::StartQuarter,
		ParamKey::EndHour,
		ParamKey::EndDay,
		ParamKey::EndMonth,
		ParamKey::EndYear,
		ParamKey::EndWeek,
		ParamKey::EndQuarter,
	];

	/// The short wire code.
	pub fn code(&self) -> &'static str {
		match self {
			ParamKey::Version => "vn",
			ParamKey::Format => "f",
			ParamKey::Stats => "s",
			ParamKey::ProjectId => "pi",
			ParamKey::Username => "u",
			ParamKey::WebsiteTitle => "wt",
			ParamKey::WebsiteUrl => "wu",
			ParamKey::LogSize => "ls",
			ParamKey::Time => "t",
			ParamKey::TimeZone => "tz",
			ParamKey::PublicStats => "ps",
			ParamKey::NumberOfResults => "n",
			ParamKey::ChopUrl => "c",
			ParamKey::CountType => "ct",
			ParamKey::Granularity => "g",
			ParamKey::StartHour => "sh",
			ParamKey::StartDay => "sd",
			ParamKey::StartMonth => "sm",
			ParamKey::StartYear => "sy",
			ParamKey::StartWeek => "sw",
			ParamKey::StartQuarter => "sq",
			ParamKey::EndHour => "eh",
			ParamKey::EndDay => "ed",
			ParamKey::EndMonth => "em",
			ParamKey::EndYear => "ey",
			ParamKey::EndWeek => "ew",
			ParamKey::EndQuarter => "eq",
			ParamKey::ExcludeExternal => "e",
			ParamKey::ExcludeSearchEngines => "ese",
			ParamKey::ExcludeEncryptedKeywords => "eek",
			ParamKey::CombineKeywords => "ck",
			ParamKey::GroupByDomain => "gbd",
			ParamKey::Device => "de",
			ParamKey::IpAddress => "ip",
			ParamKey::IpLabel => "ipl",
		}
	}

	pub fn from_code(code: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|k| k.code() == code)
	}
}

impl fmt::Display for ParamKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

/// Opaque StatCounter project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ProjectId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl From<String> for ProjectId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl fmt::Display for ProjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// The `pi` parameter: one project, or several for a multi-project query.
///
/// Multi-project responses are demultiplexed per project, so the two shapes
/// must stay distinct even when `Multiple` holds a single id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectSelection {
	Single(ProjectId),
	Multiple(Vec<ProjectId>),
}

impl ProjectSelection {
	/// Appends an id, promoting `Single` into `Multiple`.
	pub fn push(&mut self, id: ProjectId) {
		match self {
			ProjectSelection::Single(existing) => {
				let first = existing.clone();
				*self = ProjectSelection::Multiple(vec![first, id]);
			}
			ProjectSelection::Multiple(ids) => ids.push(id),
		}
	}

	pub fn is_multiple(&self) -> bool {
		matches!(self, ProjectSelection::Multiple(_))
	}

	pub fn ids(&self) -> Vec<&ProjectId> {
		match self {
			ProjectSelection::Single(id) => vec![id],
			ProjectSelection::Multiple(ids) => ids.iter().collect(),
		}
	}
}

/// Ordered query parameters for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterSet {
	values: BTreeMap<ParamKey, String>,
	project: Option<ProjectSelection>,
	/// Keys outside the table, from raw input, in insertion order.
	extra: Vec<(String, String)>,
}

impl ParameterSet {
	/// A fresh copy of the default table: only the version marker is set.
	pub fn template() -> Self {
		let mut values = BTreeMap::new();
		values.insert(ParamKey::Version, API_VERSION.to_string());
		Self {
			values,
			project: None,
			extra: Vec::new(),
		}
	}

	pub fn get(&self, key: ParamKey) -> Option<&str> {
		if key == ParamKey::ProjectId {
			return match &self.project {
				Some(ProjectSelection::Single(id)) => Some(id.as_str()),
				_ => None,
			};
		}
		self.values.get(&key).map(String::as_str)
	}

	pub fn is_set(&self, key: ParamKey) -> bool {
		if key == ParamKey::ProjectId {
			return self.project.is_some();
		}
		self.values.contains_key(&key)
	}

	/// Sets a scalar value. Setting `pi` replaces the project selection.
	pub fn set(&mut self, key: ParamKey, value: impl Into<String>) {
		if key == ParamKey::ProjectId {
			self.project = Some(ProjectSelection::Single(ProjectId::new(value)));
			return;
		}
		self.values.insert(key, value.into());
	}

	pub fn remove(&mut self, key: ParamKey) {
		if key == ParamKey::ProjectId {
			self.project = None;
			return;
		}
		self.values.remove(&key);
	}

	pub fn project(&self) -> Option<&ProjectSelection> {
		self.project.as_ref()
	}

	pub fn set_project(&mut self, selection: ProjectSelection) {
		self.project = Some(selection);
	}

	/// Adds a project: scalar when unset, promoted to a list otherwise.
	pub fn push_project(&mut self, id: ProjectId) {
		match &mut self.project {
			Some(selection) => selection.push(id),
			None => self.project = Some(ProjectSelection::Single(id)),
		}
	}

	/// Sets a key outside the table, replacing an earlier value for it.
	pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();
		match self.extra.iter_mut().find(|(k, _)| *k == key) {
			Some(entry) => entry.1 = value,
			None => self.extra.push((key, value)),
		}
	}

	pub fn extra(&self) -> &[(String, String)] {
		&self.extra
	}

	/// Wire pairs in canonical order, skipping `excluded` keys.
	///
	/// Multi-project selections expand to repeated bare `pi` keys.
	pub fn pairs(&self, excluded: &[ParamKey]) -> Vec<(&str, &str)> {
		let mut pairs = Vec::new();
		for key in ParamKey::ALL {
			if excluded.contains(&key) {
				continue;
			}
			if key == ParamKey::ProjectId {
				if let Some(selection) = &self.project {
					for id in selection.ids() {
						pairs.push((key.code(), id.as_str()));
					}
				}
				continue;
			}
			if let Some(value) = self.values.get(&key) {
				pairs.push((key.code(), value.as_str()));
			}
		}
		for (key, value) in &self.extra {
			pairs.push((key.as_str(), value.as_str()));
		}
		pairs
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn template_only_has_version() {
		let params = ParameterSet::template();
		assert_eq!(params.pairs(&[]), vec![("vn", "3")]);
	}

	#[test]
	fn templates_are_independent() {
		let mut a = ParameterSet::template();
		a.set(ParamKey::Stats, "summary");
		let b = ParameterSet::template();
		assert!(!b.is_set(ParamKey::Stats));
	}

	#[test]
	fn pairs_follow_canonical_order_not_insertion_order() {
		let mut params = ParameterSet::template();
		params.set(ParamKey::Device, "all");
		params.set(ParamKey::Time, "100");
		params.set(ParamKey::Username, "me");
		params.set(ParamKey::Stats, "browsers");
		params.set(ParamKey::ProjectId, "42");
		assert_eq!(
			params.pairs(&[]),
			vec![
				("vn", "3"),
				("s", "browsers"),
				("pi", "42"),
				("u", "me"),
				("t", "100"),
				("de", "all"),
			]
		);
	}

	#[test]
	fn excluded_keys_are_skipped() {
		let mut params = ParameterSet::template();
		params.set(ParamKey::Time, "100");
		assert_eq!(params.pairs(&[ParamKey::Time]), vec![("vn", "3")]);
	}

	#[test]
	fn push_project_promotes_scalar_to_list() {
		let mut params = ParameterSet::template();
		params.push_project(ProjectId::new("1"));
		assert_eq!(
			params.project(),
			Some(&ProjectSelection::Single(ProjectId::new("1")))
		);

		params.push_project(ProjectId::new("2"));
		params.push_project(ProjectId::new("3"));
		assert_eq!(
			params.project(),
			Some(&ProjectSelection::Multiple(vec![
				ProjectId::new("1"),
				ProjectId::new("2"),
				ProjectId::new("3"),
			]))
		);
		assert_eq!(
			params.pairs(&[]),
			vec![("vn", "3"), ("pi", "1"), ("pi", "2"), ("pi", "3")]
		);
	}

	#[test]
	fn extras_come_after_canonical_keys() {
		let mut params = ParameterSet::template();
		params.set_extra("zz", "1");
		params.set(ParamKey::IpLabel, "Home");
		params.set_extra("aa", "2");
		params.set_extra("zz", "3");
		assert_eq!(
			params.pairs(&[]),
			vec![("vn", "3"), ("ipl", "Home"), ("zz", "3"), ("aa", "2")]
		);
	}

	#[test]
	fn param_codes_are_unique() {
		for key in ParamKey::ALL {
			assert_eq!(ParamKey::from_code(key.code()), Some(key));
		}
	}
}
