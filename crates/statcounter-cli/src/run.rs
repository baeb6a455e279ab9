// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use anyhow::{bail, Context};
use serde::Serialize;
use statcounter::{StatQuery, StatcounterClient};
use statcounter_config::StatcounterConfig;
use tracing::{debug, instrument};

use crate::args::{Cli, Commands, QueryArgs, ShapeArgs};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
	let config = load_config(&cli)?;
	let client = StatcounterClient::from_config(&config)?;

	match cli.command {
		Commands::Tracker {
			project,
			http,
			visible,
		} => {
			println!("{}", client.tracker(project.as_deref(), !http, visible)?);
		}
		Commands::PublicUrl { project } => {
			println!("{}", client.public_stats_url(project.as_deref())?);
		}
		Commands::Config { key } => {
			println!("{}", config.get(&key)?);
		}
		command => run_query(&client, command, cli.print_url).await?,
	}
	Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<StatcounterConfig> {
	let config = match &cli.config {
		Some(path) => statcounter_config::load_config_from(path)
			.with_context(|| format!("loading {}", path.display()))?,
		None => statcounter_config::load_config()?,
	};
	Ok(config)
}

#[instrument(skip_all)]
async fn run_query(client: &StatcounterClient, command: Commands, print_url: bool) -> anyhow::Result<()> {
	let mut query = client.query();
	let shape = select_report(&mut query, command)?;
	if let Some(shape) = &shape {
		apply_shape(&mut query, shape)?;
	}

	if print_url {
		println!("{}", query.to_url()?);
		return Ok(());
	}

	let page = shape
		.as_ref()
		.and_then(|s| s.per_page.map(|per_page| (per_page, s.page.unwrap_or(1))));
	match page {
		Some((per_page, page)) => {
			debug!(per_page, page, "fetching one page");
			print_json(&query.paginate(per_page, page).await?)
		}
		None => print_json(&query.get().await?),
	}
}

/// Points the query at one report or command. Returns the shaping options
/// when the command takes them.
fn select_report(query: &mut StatQuery<'_>, command: Commands) -> anyhow::Result<Option<ShapeArgs>> {
	let args = match command {
		Commands::Summary(args) => {
			query.summary();
			args
		}
		Commands::RecentVisitors(args) => {
			query.recent_visitors();
			args
		}
		Commands::PopularPages {
			no_chop_url,
			count_type,
			query: args,
		} => {
			query.popular_pages(!no_chop_url, count_type.as_deref());
			args
		}
		Commands::EntryPages(args) => {
			query.entry_pages();
			args
		}
		Commands::ExitPages(args) => {
			query.exit_pages();
			args
		}
		Commands::CameFrom {
			internal_only,
			exclude_search_engines,
			group_by_domain,
			query: args,
		} => {
			query.came_from(!internal_only, exclude_search_engines, group_by_domain);
			args
		}
		Commands::RecentKeywords {
			exclude_encrypted,
			internal_only,
			query: args,
		} => {
			query.recent_keywords(exclude_encrypted, !internal_only);
			args
		}
		Commands::Browsers(args) => {
			query.browsers(args.device);
			args.query
		}
		Commands::OperatingSystems(args) => {
			query.operating_systems(args.device);
			args.query
		}
		Commands::SearchEngines(args) => {
			query.search_engines();
			args
		}
		Commands::Country(args) => {
			query.country();
			args
		}
		Commands::RecentPageload(args) => {
			query.recent_pageload(args.device);
			args.query
		}
		Commands::ExitLink(args) => {
			query.exit_link(args.device);
			args.query
		}
		Commands::DownloadLink(args) => {
			query.download_link(args.device);
			args.query
		}
		Commands::VisitLength(args) => {
			query.visit_length();
			args
		}
		Commands::ReturningVisits(args) => {
			query.returning_visits();
			args
		}
		Commands::KeywordAnalysis {
			combine,
			exclude_encrypted,
			query: args,
		} => {
			query.keyword_analysis(combine, exclude_encrypted);
			args
		}
		Commands::LookupVisitor { ip, query: args } => {
			query.lookup_visitor(&ip);
			args
		}
		Commands::MobileDevices(args) => {
			query.mobile_devices();
			args
		}
		Commands::Platform(args) => {
			query.platform();
			args
		}
		Commands::Export(args) => {
			query.export();
			args
		}
		Commands::IncomingTraffic(args) => {
			query.incoming_traffic();
			args
		}
		Commands::Language(args) => {
			query.language();
			args
		}
		Commands::Raw { query: raw, shape } => {
			query.raw(raw.as_str())?;
			return Ok(Some(shape));
		}
		Commands::UserDetails(account) => {
			query.user_details(account.username.as_deref(), account.password.as_deref());
			return Ok(None);
		}
		Commands::UserProjects(account) => {
			query.user_projects(account.username.as_deref(), account.password.as_deref());
			return Ok(None);
		}
		Commands::AccountLogsizes => {
			query.account_logsizes();
			return Ok(None);
		}
		Commands::ProjectDetails { project } => {
			query.project_details(project.as_deref())?;
			return Ok(None);
		}
		Commands::AddProject {
			title,
			url,
			timezone,
			public_stats,
		} => {
			query.add_project(&title, &url, &timezone, public_stats);
			return Ok(None);
		}
		Commands::UpdateProject {
			public_stats,
			project,
		} => {
			query.update_project(public_stats, project.as_deref())?;
			return Ok(None);
		}
		Commands::UpdateLogsize { log_size, project } => {
			query.update_logsize(log_size, project.as_deref())?;
			return Ok(None);
		}
		Commands::CreateIpLabel { ip, label, project } => {
			query.create_ip_label(&ip, &label, project.as_deref())?;
			return Ok(None);
		}
		Commands::DeleteIpLabel { label, project } => {
			query.delete_ip_label(&label, project.as_deref())?;
			return Ok(None);
		}
		Commands::Tracker { .. } | Commands::PublicUrl { .. } | Commands::Config { .. } => {
			bail!("not a query command")
		}
	};
	apply_query_args(query, args).map(Some)
}

fn apply_query_args(query: &mut StatQuery<'_>, args: QueryArgs) -> anyhow::Result<ShapeArgs> {
	for label in &args.projects {
		query.project(label)?;
	}
	if let (Some(granularity), Some(start), Some(end)) = (args.range, args.start, args.end) {
		query.set_range(granularity, start, end)?;
	}
	if let Some(n) = args.number {
		query.number_of_results(n);
	}
	Ok(args.shape)
}

fn apply_shape(query: &mut StatQuery<'_>, shape: &ShapeArgs) -> anyhow::Result<()> {
	if !shape.select.is_empty() {
		query.select(shape.select.iter().map(String::as_str));
	}
	if let Some(limit) = shape.limit {
		query.limit(limit)?;
	}
	if let Some(offset) = shape.offset {
		query.offset(offset);
	}
	if let Some(minutes) = shape.cache_minutes {
		query.remember(minutes);
	}
	Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;
	use proptest::prelude::*;
	use statcounter::{Credentials, FixedClock};
	use std::sync::Arc;

	fn client() -> StatcounterClient {
		StatcounterClient::builder(Credentials::new("DaFlyinJ", "xemYzgqT"))
			.with_project("mmc", "9917949")
			.with_project("test", "1234567")
			.with_default_project("mmc")
			.with_clock(Arc::new(FixedClock(1_400_000_000)))
			.build()
			.unwrap()
	}

	fn compiled(argv: &[&str]) -> String {
		let cli = Cli::try_parse_from(argv).unwrap();
		let client = client();
		let mut query = client.query();
		if let Some(shape) = select_report(&mut query, cli.command).unwrap() {
			apply_shape(&mut query, &shape).unwrap();
		}
		let url = query.to_url().unwrap();
		url.split("&sha1=").next().unwrap().to_string()
	}

	#[test]
	fn summary_uses_the_default_project() {
		assert_eq!(
			compiled(&["statcounter", "summary"]),
			"https://api.statcounter.com/stats/?vn=3&s=summary&pi=9917949&u=DaFlyinJ&t=1400000000"
		);
	}

	#[test]
	fn report_flags_default_to_the_api_defaults() {
		let base = "https://api.statcounter.com/stats/?vn=3";
		assert_eq!(
			compiled(&["statcounter", "popular-pages"]),
			format!("{base}&s=popular&pi=9917949&u=DaFlyinJ&t=1400000000")
		);
		assert!(compiled(&["statcounter", "popular-pages", "--no-chop-url"]).ends_with("&t=1400000000&c=0"));
		assert!(!compiled(&["statcounter", "recent-keywords"]).contains("&e=0"));
		assert!(compiled(&["statcounter", "recent-keywords", "--internal-only"]).ends_with("&t=1400000000&e=0"));
	}

	#[test]
	fn repeated_projects_become_multi_project() {
		let url = compiled(&["statcounter", "country", "-p", "mmc", "-p", "test"]);
		assert!(url.contains("&pi=9917949&pi=1234567&"));
	}

	#[test]
	fn unknown_project_label_is_rejected() {
		let cli = Cli::try_parse_from(["statcounter", "summary", "-p", "nope"]).unwrap();
		let client = client();
		let mut query = client.query();
		assert!(select_report(&mut query, cli.command).is_err());
	}

	#[test]
	fn zero_limit_is_rejected() {
		let cli = Cli::try_parse_from(["statcounter", "summary", "--limit", "0"]).unwrap();
		let client = client();
		let mut query = client.query();
		let shape = select_report(&mut query, cli.command).unwrap().unwrap();
		assert!(apply_shape(&mut query, &shape).is_err());
	}

	#[test]
	fn account_commands_take_no_shaping() {
		let cli = Cli::try_parse_from(["statcounter", "user-projects"]).unwrap();
		let client = client();
		let mut query = client.query();
		assert!(select_report(&mut query, cli.command).unwrap().is_none());
	}

	proptest! {
		#[test]
		fn project_flags_keep_their_order(labels in prop::collection::vec(prop::bool::ANY, 2..6)) {
			let mut argv = vec!["statcounter", "summary"];
			for use_mmc in &labels {
				argv.push("-p");
				argv.push(if *use_mmc { "mmc" } else { "test" });
			}
			let url = compiled(&argv);
			let expected: Vec<String> = labels
				.iter()
				.map(|use_mmc| format!("pi={}", if *use_mmc { "9917949" } else { "1234567" }))
				.collect();
			let sent: Vec<&str> = url.split('&').filter(|pair| pair.starts_with("pi=")).collect();
			prop_assert_eq!(sent, expected);
		}
	}

	#[test]
	fn local_commands_are_not_queries() {
		let cli = Cli::try_parse_from(["statcounter", "tracker"]).unwrap();
		let client = client();
		let mut query = client.query();
		assert!(select_report(&mut query, cli.command).is_err());
	}
}
