// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fluent query builder and terminal calls.
//!
//! A [`StatQuery`] mutates in place and returns `&mut Self`, so one chain
//! builds one request. Calls that can reject their input return
//! `Result<&mut Self>` and chain with `?`. Every terminal call resets the
//! builder afterwards, whether it succeeded or not. The cache duration
//! survives the reset; a cache key override does not.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use serde_json::Value;
use statcounter_core::{
	apply_range, Columns, Command, DateInput, Device, Granularity, ParamKey,
	PublicStats, Query, QueryResult, RawQuery, SearchEngine, SecretString, Statistic,
};
use tracing::{debug, instrument};

use crate::cache::CacheDuration;
use crate::client::StatcounterClient;
use crate::error::{Result, StatcounterError};
use crate::paginate::{Page, SimplePage, UnboundedScope};

/// A query under construction against a [`StatcounterClient`].
#[derive(Debug)]
pub struct StatQuery<'a> {
	client: &'a StatcounterClient,
	query: Query,
	cache_duration: Option<CacheDuration>,
	cache_key: Option<String>,
}

impl<'a> StatQuery<'a> {
	pub(crate) fn new(client: &'a StatcounterClient) -> Self {
		Self {
			client,
			query: Query::new(),
			cache_duration: client.default_cache(),
			cache_key: None,
		}
	}

	/// The accumulated query.
	pub fn query(&self) -> &Query {
		&self.query
	}

	pub fn cache_duration(&self) -> Option<CacheDuration> {
		self.cache_duration
	}

	/// Returns the query to a fresh state. The cache duration is kept.
	pub fn reset(&mut self) -> &mut Self {
		self.query.reset();
		self.cache_key = None;
		self
	}

	fn stats(&mut self, statistic: Statistic) -> &mut Self {
		self.query.set_command(Command::Stats);
		self.query.params_mut().set(ParamKey::Stats, statistic.code());
		self
	}

	fn stats_for_device(&mut self, statistic: Statistic, device: Device) -> &mut Self {
		self.stats(statistic);
		self.query.params_mut().set(ParamKey::Device, device.wire_value());
		self
	}

	fn set(&mut self, key: ParamKey, value: impl Into<String>) {
		self.query.params_mut().set(key, value);
	}

	/// Pins `pi` to a labelled project, or leaves it for the default.
	fn uses_project(&mut self, label: Option<&str>) -> Result<()> {
		if let Some(label) = label {
			let id = self.client.registry().resolve(Some(label))?.clone();
			self.set(ParamKey::ProjectId, id.as_str());
		}
		Ok(())
	}

	// Stats reports

	pub fn summary(&mut self) -> &mut Self {
		self.stats(Statistic::Summary)
	}

	pub fn recent_visitors(&mut self) -> &mut Self {
		self.stats(Statistic::RecentVisitors)
	}

	/// `chop_url` strips query strings from page URLs, the API default.
	pub fn popular_pages(&mut self, chop_url: bool, count_type: Option<&str>) -> &mut Self {
		self.stats(Statistic::PopularPages);
		if !chop_url {
			self.set(ParamKey::ChopUrl, "0");
		}
		if let Some(count_type) = count_type {
			self.set(ParamKey::CountType, count_type);
		}
		self
	}

	pub fn entry_pages(&mut self) -> &mut Self {
		self.stats(Statistic::EntryPages)
	}

	pub fn exit_pages(&mut self) -> &mut Self {
		self.stats(Statistic::ExitPages)
	}

	pub fn came_from(
		&mut self,
		external: bool,
		exclude_search_engines: bool,
		group_by_domain: bool,
	) -> &mut Self {
		self.stats(Statistic::CameFrom);
		if !external {
			self.set(ParamKey::ExcludeExternal, "0");
		}
		if exclude_search_engines {
			self.set(ParamKey::ExcludeSearchEngines, "1");
		}
		if group_by_domain {
			self.set(ParamKey::GroupByDomain, "1");
		}
		self
	}

	pub fn recent_keywords(&mut self, exclude_encrypted: bool, external: bool) -> &mut Self {
		self.stats(Statistic::RecentKeywords);
		if !external {
			self.set(ParamKey::ExcludeExternal, "0");
		}
		if exclude_encrypted {
			self.set(ParamKey::ExcludeEncryptedKeywords, "1");
		}
		self
	}

	pub fn browsers(&mut self, device: Device) -> &mut Self {
		self.stats_for_device(Statistic::Browsers, device)
	}

	pub fn operating_systems(&mut self, device: Device) -> &mut Self {
		self.stats_for_device(Statistic::OperatingSystems, device)
	}

	pub fn search_engines(&mut self) -> &mut Self {
		self.stats(Statistic::SearchEngines)
	}

	pub fn country(&mut self) -> &mut Self {
		self.stats(Statistic::Country)
	}

	pub fn recent_pageload(&mut self, device: Device) -> &mut Self {
		self.stats_for_device(Statistic::RecentPageload, device)
	}

	pub fn exit_link(&mut self, device: Device) -> &mut Self {
		self.stats_for_device(Statistic::ExitLink, device)
	}

	pub fn download_link(&mut self, device: Device) -> &mut Self {
		self.stats_for_device(Statistic::DownloadLink, device)
	}

	pub fn visit_length(&mut self) -> &mut Self {
		self.stats(Statistic::VisitLength)
	}

	pub fn returning_visits(&mut self) -> &mut Self {
		self.stats(Statistic::ReturningVisits)
	}

	pub fn keyword_analysis(&mut self, combine: SearchEngine, exclude_encrypted: bool) -> &mut Self {
		self.stats(Statistic::KeywordAnalysis);
		self.set(ParamKey::CombineKeywords, combine.wire_value());
		if exclude_encrypted {
			self.set(ParamKey::ExcludeEncryptedKeywords, "1");
		}
		self
	}

	pub fn lookup_visitor(&mut self, ip: &str) -> &mut Self {
		self.stats(Statistic::LookupVisitor);
		self.set(ParamKey::IpAddress, ip);
		self
	}

	pub fn mobile_devices(&mut self) -> &mut Self {
		self.stats(Statistic::MobileDevices)
	}

	pub fn platform(&mut self) -> &mut Self {
		self.stats(Statistic::Platform)
	}

	pub fn export(&mut self) -> &mut Self {
		self.stats(Statistic::Export)
	}

	pub fn incoming_traffic(&mut self) -> &mut Self {
		self.stats(Statistic::IncomingTraffic)
	}

	pub fn language(&mut self) -> &mut Self {
		self.stats(Statistic::Language)
	}

	// Account commands

	pub fn add_project(
		&mut self,
		title: &str,
		url: &str,
		timezone: &str,
		public_stats: PublicStats,
	) -> &mut Self {
		self.query.set_command(Command::AddProject);
		self.set(ParamKey::WebsiteTitle, title);
		self.set(ParamKey::WebsiteUrl, url);
		self.set(ParamKey::TimeZone, timezone);
		self.set(ParamKey::PublicStats, public_stats.wire_value());
		self
	}

	pub fn update_project(
		&mut self,
		public_stats: PublicStats,
		label: Option<&str>,
	) -> Result<&mut Self> {
		self.query.set_command(Command::UpdateProject);
		self.set(ParamKey::PublicStats, public_stats.wire_value());
		self.uses_project(label)?;
		Ok(self)
	}

	pub fn update_logsize(&mut self, log_size: u64, label: Option<&str>) -> Result<&mut Self> {
		self.query.set_command(Command::UpdateLogsize);
		self.set(ParamKey::LogSize, log_size.to_string());
		self.uses_project(label)?;
		Ok(self)
	}

	pub fn account_logsizes(&mut self) -> &mut Self {
		self.query.set_command(Command::AccountLogsizes);
		self
	}

	/// Details of the configured user, or of another account when both a
	/// username and its API password are supplied.
	pub fn user_details(&mut self, username: Option<&str>, password: Option<&str>) -> &mut Self {
		self.query.set_command(Command::UserDetails);
		self.for_account(username, password)
	}

	pub fn user_projects(&mut self, username: Option<&str>, password: Option<&str>) -> &mut Self {
		self.query.set_command(Command::UserProjects);
		self.for_account(username, password)
	}

	fn for_account(&mut self, username: Option<&str>, password: Option<&str>) -> &mut Self {
		if let Some(username) = username {
			self.set(ParamKey::Username, username);
		}
		if let Some(password) = password {
			self.query.set_password_override(SecretString::from(password));
		}
		self
	}

	pub fn project_details(&mut self, label: Option<&str>) -> Result<&mut Self> {
		self.query.set_command(Command::SelectProject);
		self.uses_project(label)?;
		Ok(self)
	}

	pub fn create_ip_label(&mut self, ip: &str, label: &str, project: Option<&str>) -> Result<&mut Self> {
		self.query.set_command(Command::CreateIpLabel);
		self.set(ParamKey::IpAddress, ip);
		self.set(ParamKey::IpLabel, label);
		self.uses_project(project)?;
		Ok(self)
	}

	pub fn delete_ip_label(&mut self, label: &str, project: Option<&str>) -> Result<&mut Self> {
		self.query.set_command(Command::DeleteIpLabel);
		self.set(ParamKey::IpLabel, label);
		self.uses_project(project)?;
		Ok(self)
	}

	// Constraints

	/// Restricts the report to one granularity tier between two dates.
	pub fn set_range(
		&mut self,
		granularity: Granularity,
		start: impl Into<DateInput>,
		end: impl Into<DateInput>,
	) -> Result<&mut Self> {
		apply_range(
			self.query.params_mut(),
			granularity,
			&start.into(),
			&end.into(),
		)?;
		Ok(self)
	}

	pub fn number_of_results(&mut self, n: u32) -> &mut Self {
		self.set(ParamKey::NumberOfResults, n.to_string());
		self
	}

	/// Adds a project by label. A second call turns this into a
	/// multi-project query.
	pub fn project(&mut self, label: &str) -> Result<&mut Self> {
		let id = self.client.registry().resolve(Some(label))?.clone();
		self.query.params_mut().push_project(id);
		Ok(self)
	}

	pub fn set_username(&mut self, username: &str) -> &mut Self {
		self.set(ParamKey::Username, username);
		self
	}

	/// Signs this query with a different API password.
	pub fn set_password(&mut self, password: &str) -> &mut Self {
		self.query.set_password_override(SecretString::from(password));
		self
	}

	/// Keeps only these columns in each row; `*` keeps all.
	pub fn select<I, S>(&mut self, columns: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.query.set_columns(Columns::from_names(columns));
		self
	}

	pub fn limit(&mut self, limit: usize) -> Result<&mut Self> {
		self.query.set_limit(limit)?;
		Ok(self)
	}

	pub fn take(&mut self, limit: usize) -> Result<&mut Self> {
		self.limit(limit)
	}

	pub fn offset(&mut self, offset: usize) -> &mut Self {
		self.query.set_offset(offset);
		self
	}

	pub fn skip(&mut self, offset: usize) -> &mut Self {
		self.offset(offset)
	}

	/// Offset and limit for a 1-based page.
	pub fn for_page(&mut self, page: usize, per_page: usize) -> Result<&mut Self> {
		if page == 0 {
			return Err(StatcounterError::InvalidArgument(
				"page numbers start at 1".to_string(),
			));
		}
		let offset = (page - 1).checked_mul(per_page).ok_or_else(|| {
			StatcounterError::InvalidArgument(format!(
				"page {page} of {per_page} items is out of range"
			))
		})?;
		self.query.set_limit(per_page)?;
		self.query.set_offset(offset);
		Ok(self)
	}

	/// Merges a raw URL, query string or key/value list.
	pub fn raw(&mut self, raw: impl Into<RawQuery>) -> Result<&mut Self> {
		self.query.apply_raw(raw.into())?;
		Ok(self)
	}

	/// [`raw`](Self::raw) for a JSON string or flat object.
	pub fn raw_json(&mut self, value: Value) -> Result<&mut Self> {
		self.query.apply_raw(RawQuery::try_from(value)?)?;
		Ok(self)
	}

	/// Caches results for `minutes`; negative means forever.
	pub fn remember(&mut self, minutes: i64) -> &mut Self {
		self.cache_duration = Some(CacheDuration::from_minutes(minutes));
		self
	}

	pub fn remember_forever(&mut self) -> &mut Self {
		self.cache_duration = Some(CacheDuration::Forever);
		self
	}

	pub fn dont_remember(&mut self) -> &mut Self {
		self.cache_duration = None;
		self
	}

	/// Uses `key` instead of the generated cache key for the next call.
	pub fn cache_key(&mut self, key: impl Into<String>) -> &mut Self {
		self.cache_key = Some(key.into());
		self
	}

	// Compiled forms

	/// The signed URL the next terminal call would request.
	pub fn to_url(&self) -> Result<String> {
		self.client.signed_url(&self.query)
	}

	/// The cache key derived from the unsigned URL.
	pub fn generate_cache_key(&self) -> Result<String> {
		self.client.cache_key(&self.query)
	}

	// Terminal calls

	pub async fn get(&mut self) -> Result<QueryResult> {
		let outcome = self.execute(&self.query).await;
		self.reset();
		outcome
	}

	/// The first row, if any.
	pub async fn first(&mut self) -> Result<Option<Value>> {
		if let Err(e) = self.query.set_limit(1) {
			self.reset();
			return Err(e.into());
		}
		Ok(self.get().await?.into_first())
	}

	/// One column of the first row.
	pub async fn value(&mut self, column: &str) -> Result<Option<Value>> {
		Ok(self
			.first()
			.await?
			.and_then(|row| row.get(column).cloned()))
	}

	pub async fn count(&mut self) -> Result<usize> {
		Ok(self.get().await?.len())
	}

	pub async fn exists(&mut self) -> Result<bool> {
		Ok(self.count().await? > 0)
	}

	/// Values of `column` from every row; missing values are null.
	pub async fn pluck(&mut self, column: &str) -> Result<Vec<Value>> {
		Ok(self
			.get()
			.await?
			.into_rows()
			.into_iter()
			.map(|row| row.get(column).cloned().unwrap_or(Value::Null))
			.collect())
	}

	pub async fn implode(&mut self, column: &str, glue: &str) -> Result<String> {
		let parts: Vec<String> = self
			.pluck(column)
			.await?
			.into_iter()
			.map(|value| match value {
				Value::String(s) => s,
				Value::Null => String::new(),
				other => other.to_string(),
			})
			.collect();
		Ok(parts.join(glue))
	}

	/// Column names across all rows, in first-seen order.
	pub async fn columns(&mut self) -> Result<Vec<String>> {
		let mut seen = BTreeSet::new();
		let mut columns = Vec::new();
		for row in self.get().await?.into_rows() {
			if let Value::Object(map) = row {
				for key in map.keys() {
					if seen.insert(key.clone()) {
						columns.push(key.clone());
					}
				}
			}
		}
		Ok(columns)
	}

	/// Total items with limit, offset and columns ignored. The query is left
	/// exactly as it was, and is not reset.
	#[instrument(skip(self))]
	pub async fn count_for_pagination(&mut self) -> Result<usize> {
		let client = self.client;
		let cache_duration = self.cache_duration;
		let cache_key = self.cache_key.clone();
		let scope = UnboundedScope::enter(&mut self.query);
		let result = execute(client, &scope, cache_duration, cache_key.as_deref()).await?;
		Ok(result.len())
	}

	pub async fn paginate(&mut self, per_page: usize, page: usize) -> Result<Page> {
		if let Err(e) = self.for_page(page, per_page) {
			self.reset();
			return Err(e);
		}
		let total = match self.count_for_pagination().await {
			Ok(total) => total,
			Err(e) => {
				self.reset();
				return Err(e);
			}
		};
		let items = self.get().await?;
		Ok(Page {
			items,
			total,
			per_page,
			current_page: page,
		})
	}

	/// Fetches one extra item to learn whether another page follows.
	pub async fn simple_paginate(&mut self, per_page: usize, page: usize) -> Result<SimplePage> {
		if let Err(e) = self.for_page(page, per_page) {
			self.reset();
			return Err(e);
		}
		let lookahead_limit = match per_page.checked_add(1) {
			Some(limit) => limit,
			None => {
				self.reset();
				return Err(StatcounterError::InvalidArgument(format!(
					"{per_page} items per page is out of range"
				)));
			}
		};
		self.query.set_limit(lookahead_limit)?;
		let items = self.get().await?;
		let has_more = items.len() > per_page;
		Ok(SimplePage {
			items: items.slice(0, Some(per_page)),
			per_page,
			current_page: page,
			has_more,
		})
	}

	/// Feeds page-sized batches to `callback` until a batch comes back empty.
	/// Returns `false` if the callback stopped early.
	pub async fn chunk<F>(&mut self, count: usize, mut callback: F) -> Result<bool>
	where
		F: FnMut(QueryResult) -> ControlFlow<()>,
	{
		let outcome = self.chunk_pages(count, &mut callback).await;
		self.reset();
		outcome
	}

	/// [`chunk`](Self::chunk) flattened to rows, with each row's overall index.
	pub async fn each<F>(&mut self, count: usize, mut callback: F) -> Result<bool>
	where
		F: FnMut(Value, usize) -> ControlFlow<()>,
	{
		let mut index = 0;
		self
			.chunk(count, |batch| {
				for row in batch.into_rows() {
					if callback(row, index).is_break() {
						return ControlFlow::Break(());
					}
					index += 1;
				}
				ControlFlow::Continue(())
			})
			.await
	}

	async fn chunk_pages<F>(&self, count: usize, callback: &mut F) -> Result<bool>
	where
		F: FnMut(QueryResult) -> ControlFlow<()>,
	{
		let mut page: usize = 1;
		loop {
			let mut query = self.query.clone();
			query.set_limit(count)?;
			let offset = (page - 1).checked_mul(count).ok_or_else(|| {
				StatcounterError::InvalidArgument(format!("chunk {page} of {count} items is out of range"))
			})?;
			query.set_offset(offset);

			let batch = self.execute(&query).await?;
			if batch.is_empty() {
				return Ok(true);
			}
			debug!(page, items = batch.len(), "processing chunk");
			if callback(batch).is_break() {
				return Ok(false);
			}
			page += 1;
		}
	}

	async fn execute(&self, query: &Query) -> Result<QueryResult> {
		execute(
			self.client,
			query,
			self.cache_duration,
			self.cache_key.as_deref(),
		)
		.await
	}
}

/// Fetch (through the cache when a duration is set), trim and slice.
async fn execute(
	client: &StatcounterClient,
	query: &Query,
	cache_duration: Option<CacheDuration>,
	cache_key: Option<&str>,
) -> Result<QueryResult> {
	let mut result = match cache_duration {
		None => client.fetch(query).await?,
		Some(duration) => {
			let key = match cache_key {
				Some(key) => key.to_string(),
				None => client.cache_key(query)?,
			};
			client
				.cache()
				.remember(&key, duration, || client.fetch(query))
				.await?
		}
	};
	result.trim_columns(query.columns());
	Ok(result.slice(query.offset(), query.limit()))
}
