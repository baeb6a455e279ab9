// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enumerated query options and the report/command selectors.
//!
//! Every option is a closed enum with a `wire_value()` accessor returning the
//! exact string the API expects, and a `FromStr` impl that rejects anything
//! outside the variant set with [`CoreError::InvalidArgument`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Device filter for reports that split by device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
	#[default]
	All,
	Desktop,
	Mobile,
}

impl Device {
	pub fn wire_value(&self) -> &'static str {
		match self {
			Device::All => "all",
			Device::Desktop => "desktop",
			Device::Mobile => "mobile",
		}
	}
}

impl FromStr for Device {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"all" => Ok(Device::All),
			"desktop" => Ok(Device::Desktop),
			"mobile" => Ok(Device::Mobile),
			other => Err(CoreError::invalid_argument(format!("unknown device '{other}'"))),
		}
	}
}

/// Calendar bucketing resolution for a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
	Hourly,
	Daily,
	Weekly,
	Monthly,
	Quarterly,
	Yearly,
}

impl Granularity {
	pub fn wire_value(&self) -> &'static str {
		match self {
			Granularity::Hourly => "hourly",
			Granularity::Daily => "daily",
			Granularity::Weekly => "weekly",
			Granularity::Monthly => "monthly",
			Granularity::Quarterly => "quarterly",
			Granularity::Yearly => "yearly",
		}
	}
}

impl FromStr for Granularity {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"hourly" => Ok(Granularity::Hourly),
			"daily" => Ok(Granularity::Daily),
			"weekly" => Ok(Granularity::Weekly),
			"monthly" => Ok(Granularity::Monthly),
			"quarterly" => Ok(Granularity::Quarterly),
			"yearly" => Ok(Granularity::Yearly),
			other => Err(CoreError::invalid_argument(format!(
				"unknown granularity '{other}'"
			))),
		}
	}
}

/// How keyword analysis groups keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEngine {
	#[default]
	Host,
	Name,
	Together,
}

impl SearchEngine {
	pub fn wire_value(&self) -> &'static str {
		match self {
			SearchEngine::Host => "search_engine_host",
			SearchEngine::Name => "search_engine_name",
			SearchEngine::Together => "together",
		}
	}
}

impl FromStr for SearchEngine {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"host" | "search_engine_host" => Ok(SearchEngine::Host),
			"name" | "search_engine_name" => Ok(SearchEngine::Name),
			"together" => Ok(SearchEngine::Together),
			other => Err(CoreError::invalid_argument(format!(
				"unknown keyword combination '{other}'"
			))),
		}
	}
}

/// Level of public access to a project's stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicStats {
	#[default]
	None,
	All,
	Summary,
}

impl PublicStats {
	pub fn wire_value(&self) -> &'static str {
		match self {
			PublicStats::None => "0",
			PublicStats::All => "1",
			PublicStats::Summary => "2",
		}
	}
}

impl FromStr for PublicStats {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"none" | "0" => Ok(PublicStats::None),
			"all" | "1" => Ok(PublicStats::All),
			"summary" | "2" => Ok(PublicStats::Summary),
			other => Err(CoreError::invalid_argument(format!(
				"unknown public stats level '{other}'"
			))),
		}
	}
}

/// A report served by the `stats` endpoint, selected with the `s` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
	Summary,
	RecentVisitors,
	PopularPages,
	EntryPages,
	ExitPages,
	CameFrom,
	RecentKeywords,
	Browsers,
	OperatingSystems,
	SearchEngines,
	Country,
	RecentPageload,
	ExitLink,
	DownloadLink,
	VisitLength,
	ReturningVisits,
	KeywordAnalysis,
	LookupVisitor,
	MobileDevices,
	Platform,
	Export,
	IncomingTraffic,
	Language,
}

impl Statistic {
	pub const ALL: [Statistic; 23] = [
		Statistic::Summary,
		Statistic::RecentVisitors,
		Statistic::PopularPages,
		Statistic::EntryPages,
		Statistic::ExitPages,
		Statistic::CameFrom,
		Statistic::RecentKeywords,
		Statistic::Browsers,
		Statistic::OperatingSystems,
		Statistic::SearchEngines,
		Statistic::Country,
		Statistic::RecentPageload,
		Statistic::ExitLink,
		Statistic::DownloadLink,
		Statistic::VisitLength,
		Statistic::ReturningVisits,
		Statistic::KeywordAnalysis,
		Statistic::LookupVisitor,
		Statistic::MobileDevices,
		Statistic::Platform,
		Statistic::Export,
		Statistic::IncomingTraffic,
		Statistic::Language,
	];

	/// The `s` parameter value for this report.
	pub fn code(&self) -> &'static str {
		match self {
			Statistic::Summary => "summary",
			Statistic::RecentVisitors => "visitor",
			Statistic::PopularPages => "popular",
			Statistic::EntryPages => "entry",
			Statistic::ExitPages => "exit",
			Statistic::CameFrom => "camefrom",
			Statistic::RecentKeywords => "keyword-activity",
			Statistic::Browsers => "browsers",
			Statistic::OperatingSystems => "os",
			Statistic::SearchEngines => "search_engine",
			Statistic::Country => "country",
			Statistic::RecentPageload => "pageload",
			Statistic::ExitLink => "exit-link-activity",
			Statistic::DownloadLink => "download-link-activity",
			Statistic::VisitLength => "visit_length",
			Statistic::ReturningVisits => "returning_visits",
			Statistic::KeywordAnalysis => "keyword_analysis",
			Statistic::LookupVisitor => "lookup_visitor",
			Statistic::MobileDevices => "mobile_device",
			Statistic::Platform => "platform",
			Statistic::Export => "export",
			Statistic::IncomingTraffic => "incoming",
			Statistic::Language => "language",
		}
	}

	pub fn from_code(code: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|s| s.code() == code)
	}
}

impl fmt::Display for Statistic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

impl FromStr for Statistic {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_code(s)
			.ok_or_else(|| CoreError::invalid_argument(format!("unknown statistic '{s}'")))
	}
}

/// An API endpoint. Its path is the first URL segment after the origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
	Stats,
	AddProject,
	UpdateProject,
	UpdateLogsize,
	AccountLogsizes,
	UserDetails,
	UserProjects,
	SelectProject,
	CreateIpLabel,
	DeleteIpLabel,
	/// A path taken verbatim from a raw query.
	Custom(String),
}

impl Command {
	pub fn path(&self) -> &str {
		match self {
			Command::Stats => "stats",
			Command::AddProject => "add_project",
			Command::UpdateProject => "update_project",
			Command::UpdateLogsize => "update_logsize",
			Command::AccountLogsizes => "account_logsizes",
			Command::UserDetails => "user_details",
			Command::UserProjects => "user_projects",
			Command::SelectProject => "select_project",
			Command::CreateIpLabel => "create_ip_label",
			Command::DeleteIpLabel => "delete_ip_label",
			Command::Custom(path) => path,
		}
	}

	/// Resolves a URL path (with or without slashes) to a command.
	pub fn from_path(path: &str) -> Self {
		let trimmed = path.trim_matches('/');
		match trimmed {
			"" | "stats" => Command::Stats,
			"add_project" => Command::AddProject,
			"update_project" => Command::UpdateProject,
			"update_logsize" => Command::UpdateLogsize,
			"account_logsizes" => Command::AccountLogsizes,
			"user_details" => Command::UserDetails,
			"user_projects" => Command::UserProjects,
			"select_project" => Command::SelectProject,
			"create_ip_label" => Command::CreateIpLabel,
			"delete_ip_label" => Command::DeleteIpLabel,
			other => Command::Custom(other.to_string()),
		}
	}

	/// Whether the default project is injected when no `pi` is set.
	pub fn is_project_scoped(&self) -> bool {
		matches!(
			self,
			Command::Stats
				| Command::UpdateProject
				| Command::UpdateLogsize
				| Command::SelectProject
				| Command::CreateIpLabel
				| Command::DeleteIpLabel
		)
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.path())
	}
}
