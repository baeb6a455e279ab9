// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use statcounter::{Device, Granularity, PublicStats, SearchEngine};

#[derive(Debug, Parser)]
#[command(name = "statcounter", version, about = "Query StatCounter reports")]
pub struct Cli {
	/// Config file to read instead of the default location
	#[arg(long, global = true, env = "STATCOUNTER_CONFIG")]
	pub config: Option<PathBuf>,

	/// Print the signed request URL instead of sending it
	#[arg(long, global = true)]
	pub print_url: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
	/// Page views and visitors per period
	Summary(QueryArgs),
	/// Most recent visitors
	RecentVisitors(QueryArgs),
	/// Most viewed pages
	PopularPages {
		/// Keep query strings in page URLs
		#[arg(long)]
		no_chop_url: bool,
		/// Count type passed through to the API
		#[arg(long)]
		count_type: Option<String>,
		#[command(flatten)]
		query: QueryArgs,
	},
	/// Landing pages
	EntryPages(QueryArgs),
	/// Last pages before leaving
	ExitPages(QueryArgs),
	/// Referring sites
	CameFrom {
		/// Only internal referrers
		#[arg(long)]
		internal_only: bool,
		#[arg(long)]
		exclude_search_engines: bool,
		#[arg(long)]
		group_by_domain: bool,
		#[command(flatten)]
		query: QueryArgs,
	},
	/// Search keywords of recent visits
	RecentKeywords {
		#[arg(long)]
		exclude_encrypted: bool,
		/// Leave out external search engines
		#[arg(long)]
		internal_only: bool,
		#[command(flatten)]
		query: QueryArgs,
	},
	/// Browser share
	Browsers(DeviceArgs),
	/// Operating system share
	OperatingSystems(DeviceArgs),
	/// Search engine share
	SearchEngines(QueryArgs),
	/// Visitor countries
	Country(QueryArgs),
	/// Recent page loads
	RecentPageload(DeviceArgs),
	/// Outbound link clicks
	ExitLink(DeviceArgs),
	/// File download clicks
	DownloadLink(DeviceArgs),
	/// Visit duration buckets
	VisitLength(QueryArgs),
	/// Returning visit counts
	ReturningVisits(QueryArgs),
	/// Keyword breakdown per search engine
	KeywordAnalysis {
		#[arg(long, default_value = "host")]
		combine: SearchEngine,
		#[arg(long)]
		exclude_encrypted: bool,
		#[command(flatten)]
		query: QueryArgs,
	},
	/// Visits from one IP address
	LookupVisitor {
		ip: String,
		#[command(flatten)]
		query: QueryArgs,
	},
	/// Mobile device share
	MobileDevices(QueryArgs),
	/// Platform share
	Platform(QueryArgs),
	/// Raw log export
	Export(QueryArgs),
	/// Incoming traffic sources
	IncomingTraffic(QueryArgs),
	/// Visitor languages
	Language(QueryArgs),
	/// A raw query string, or a fully signed URL sent as-is
	Raw {
		query: String,
		#[command(flatten)]
		shape: ShapeArgs,
	},
	/// Details of the configured account
	UserDetails(AccountArgs),
	/// Projects of the configured account
	UserProjects(AccountArgs),
	/// Log size usage across the account
	AccountLogsizes,
	/// Settings of one project
	ProjectDetails {
		#[arg(long)]
		project: Option<String>,
	},
	/// Create a new project
	AddProject {
		title: String,
		url: String,
		/// IANA time zone, e.g. `Europe/London`
		timezone: String,
		#[arg(long, default_value = "none")]
		public_stats: PublicStats,
	},
	/// Change a project's public stats setting
	UpdateProject {
		public_stats: PublicStats,
		#[arg(long)]
		project: Option<String>,
	},
	/// Change a project's log size
	UpdateLogsize {
		log_size: u64,
		#[arg(long)]
		project: Option<String>,
	},
	/// Name an IP address
	CreateIpLabel {
		ip: String,
		label: String,
		#[arg(long)]
		project: Option<String>,
	},
	/// Remove an IP label
	DeleteIpLabel {
		label: String,
		#[arg(long)]
		project: Option<String>,
	},
	/// Print the tracking snippet for a project
	Tracker {
		#[arg(long)]
		project: Option<String>,
		/// Load the counter over plain HTTP
		#[arg(long)]
		http: bool,
		/// Show a visible counter
		#[arg(long)]
		visible: bool,
	},
	/// Print the guest URL for a project's public stats
	PublicUrl {
		#[arg(long)]
		project: Option<String>,
	},
	/// Print one configuration value
	Config {
		/// e.g. `username`, `default`, `projects.<label>`
		key: String,
	},
}

/// Options shared by every report.
#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
	/// Project label; repeat for a multi-project query
	#[arg(short, long = "project")]
	pub projects: Vec<String>,

	/// Granularity of the date range
	#[arg(long, requires_all = ["start", "end"])]
	pub range: Option<Granularity>,

	/// Range start: a date, a datetime or a Unix timestamp
	#[arg(long, requires = "range")]
	pub start: Option<String>,

	/// Range end
	#[arg(long, requires = "range")]
	pub end: Option<String>,

	/// Number of results the API should return
	#[arg(short, long)]
	pub number: Option<u32>,

	#[command(flatten)]
	pub shape: ShapeArgs,
}

/// Client-side shaping of the result.
#[derive(Debug, Clone, Args)]
pub struct ShapeArgs {
	/// Columns to keep
	#[arg(long, value_delimiter = ',')]
	pub select: Vec<String>,

	#[arg(long)]
	pub limit: Option<usize>,

	#[arg(long)]
	pub offset: Option<usize>,

	/// Page number, with --per-page
	#[arg(long, requires = "per_page")]
	pub page: Option<usize>,

	#[arg(long)]
	pub per_page: Option<usize>,

	/// Cache the response for this many minutes; negative caches forever
	#[arg(long, allow_negative_numbers = true)]
	pub cache_minutes: Option<i64>,
}

#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
	#[arg(long, default_value = "all")]
	pub device: Device,

	#[command(flatten)]
	pub query: QueryArgs,
}

#[derive(Debug, Clone, Args)]
pub struct AccountArgs {
	/// Another account's username
	#[arg(long, requires = "password")]
	pub username: Option<String>,

	/// That account's API password
	#[arg(long, env = "STATCOUNTER_OTHER_PASSWORD", hide_env_values = true)]
	pub password: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn report_args_parse() {
		let cli = Cli::try_parse_from([
			"statcounter",
			"summary",
			"-p",
			"mmc",
			"-p",
			"test",
			"--range",
			"daily",
			"--start",
			"2024-01-01",
			"--end",
			"2024-01-31",
			"--select",
			"date,page_views",
		])
		.unwrap();
		let Commands::Summary(args) = cli.command else {
			panic!("expected summary");
		};
		assert_eq!(args.projects, vec!["mmc", "test"]);
		assert_eq!(args.range, Some(Granularity::Daily));
		assert_eq!(args.shape.select, vec!["date", "page_views"]);
	}

	#[test]
	fn range_needs_both_ends() {
		let result = Cli::try_parse_from(["statcounter", "summary", "--range", "daily"]);
		assert!(result.is_err());
	}

	#[test]
	fn device_defaults_to_all() {
		let cli = Cli::try_parse_from(["statcounter", "browsers"]).unwrap();
		let Commands::Browsers(args) = cli.command else {
			panic!("expected browsers");
		};
		assert_eq!(args.device, Device::All);
	}

	#[test]
	fn negative_cache_minutes_are_accepted() {
		let cli = Cli::try_parse_from(["statcounter", "country", "--cache-minutes", "-1"]).unwrap();
		let Commands::Country(args) = cli.command else {
			panic!("expected country");
		};
		assert_eq!(args.shape.cache_minutes, Some(-1));
	}
}
