// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The shared client: credentials, project labels, transport and cache.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use statcounter_config::{StatcounterConfig, DEFAULT_TIMEOUT_SECS};
use statcounter_core::{
	decode, Credentials, ProjectRegistry, Query, QueryResult, SignatureAlgorithm, UrlCompiler,
};
use tracing::{debug, instrument};

use crate::cache::{Cache, CacheDuration, CacheStore};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StatcounterError};
use crate::query::StatQuery;
use crate::tracker::{public_stats_url, TrackerSnippet};
use crate::transport::{HttpTransport, Transport};

/// Client for the StatCounter API.
///
/// Cheap to clone and safe to share across tasks. Each [`StatQuery`] borrows
/// the client and belongs to one task.
#[derive(Clone)]
pub struct StatcounterClient {
	inner: Arc<ClientInner>,
}

struct ClientInner {
	credentials: Credentials,
	registry: ProjectRegistry,
	security_codes: BTreeMap<String, String>,
	compiler: UrlCompiler,
	transport: Arc<dyn Transport>,
	cache: Cache,
	clock: Arc<dyn Clock>,
	default_cache: Option<CacheDuration>,
}

impl std::fmt::Debug for StatcounterClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StatcounterClient")
			.field("credentials", &self.inner.credentials)
			.field("registry", &self.inner.registry)
			.field("base_url", &self.inner.compiler.base_url())
			.finish_non_exhaustive()
	}
}

impl StatcounterClient {
	pub fn builder(credentials: Credentials) -> StatcounterClientBuilder {
		StatcounterClientBuilder::new(credentials)
	}

	/// Builds a client from loaded configuration, with an HTTP transport
	/// and an in-memory cache.
	pub fn from_config(config: &StatcounterConfig) -> Result<Self> {
		let mut builder = Self::builder(config.credentials())
			.with_registry(config.registry())
			.with_base_url(config.base_url.clone())
			.with_signature(config.signature)
			.with_timeout(config.timeout());
		for (label, code) in &config.security_codes {
			builder = builder.with_security_code(label.clone(), code.clone());
		}
		if let Some(minutes) = config.cache_minutes {
			builder = builder.with_default_cache(CacheDuration::from_minutes(minutes));
		}
		builder.build()
	}

	/// Starts a fresh query.
	pub fn query(&self) -> StatQuery<'_> {
		StatQuery::new(self)
	}

	pub fn credentials(&self) -> &Credentials {
		&self.inner.credentials
	}

	pub fn registry(&self) -> &ProjectRegistry {
		&self.inner.registry
	}

	pub fn compiler(&self) -> &UrlCompiler {
		&self.inner.compiler
	}

	pub fn cache(&self) -> &Cache {
		&self.inner.cache
	}

	pub(crate) fn default_cache(&self) -> Option<CacheDuration> {
		self.inner.default_cache
	}

	pub(crate) fn now(&self) -> i64 {
		self.inner.clock.now_timestamp()
	}

	/// Tracker markup for a project; `None` uses the default project.
	pub fn tracker(&self, label: Option<&str>, https: bool, visible: bool) -> Result<TrackerSnippet> {
		let label = self.label_or_default(label)?;
		let project_id = self.inner.registry.resolve(Some(label.as_str()))?;
		let security_code = self
			.inner
			.security_codes
			.get(&label)
			.ok_or_else(|| {
				StatcounterError::Config(format!("could not find security-codes.{label} in config"))
			})?;
		Ok(TrackerSnippet {
			project_id: project_id.to_string(),
			security_code: security_code.clone(),
			https,
			visible,
		})
	}

	/// Guest URL for a project's public stats; `None` uses the default project.
	pub fn public_stats_url(&self, label: Option<&str>) -> Result<String> {
		let project_id = self.inner.registry.resolve(label)?;
		Ok(public_stats_url(project_id.as_str()))
	}

	fn label_or_default(&self, label: Option<&str>) -> Result<String> {
		label
			.or_else(|| self.inner.registry.default_label())
			.map(str::to_string)
			.ok_or_else(|| StatcounterError::Config("no default project configured".to_string()))
	}

	/// Signed URL for `query` at the current clock time.
	pub(crate) fn signed_url(&self, query: &Query) -> Result<String> {
		let inner = &self.inner;
		Ok(inner
			.compiler
			.compile(query, &inner.credentials, &inner.registry, self.now())?)
	}

	pub(crate) fn cache_key(&self, query: &Query) -> Result<String> {
		let inner = &self.inner;
		Ok(inner
			.compiler
			.cache_key(query, &inner.credentials, &inner.registry)?)
	}

	/// One round trip: compile, GET, decode. Columns are not trimmed.
	#[instrument(skip_all, fields(command = ?query.command()))]
	pub(crate) async fn fetch(&self, query: &Query) -> Result<QueryResult> {
		let url = self.signed_url(query)?;
		let body = self.inner.transport.get_raw(&url).await?;
		let result = decode(&body, query, &self.inner.registry)?;
		debug!(items = result.len(), "fetched result");
		Ok(result)
	}
}

/// Builder for [`StatcounterClient`].
pub struct StatcounterClientBuilder {
	credentials: Credentials,
	registry: ProjectRegistry,
	security_codes: BTreeMap<String, String>,
	base_url: Option<String>,
	signature: SignatureAlgorithm,
	timeout: Duration,
	transport: Option<Arc<dyn Transport>>,
	cache_store: Option<Arc<dyn CacheStore>>,
	clock: Arc<dyn Clock>,
	default_cache: Option<CacheDuration>,
}

impl StatcounterClientBuilder {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			credentials,
			registry: ProjectRegistry::new(),
			security_codes: BTreeMap::new(),
			base_url: None,
			signature: SignatureAlgorithm::default(),
			timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
			transport: None,
			cache_store: None,
			clock: Arc::new(SystemClock),
			default_cache: None,
		}
	}

	pub fn with_registry(mut self, registry: ProjectRegistry) -> Self {
		self.registry = registry;
		self
	}

	pub fn with_project(mut self, label: impl Into<String>, id: impl Into<String>) -> Self {
		self.registry.insert(label, id);
		self
	}

	pub fn with_default_project(mut self, label: impl Into<String>) -> Self {
		self.registry = self.registry.with_default(label);
		self
	}

	pub fn with_security_code(mut self, label: impl Into<String>, code: impl Into<String>) -> Self {
		self.security_codes.insert(label.into(), code.into());
		self
	}

	/// Sets a custom API origin (useful for testing).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = Some(base_url.into());
		self
	}

	pub fn with_signature(mut self, signature: SignatureAlgorithm) -> Self {
		self.signature = signature;
		self
	}

	/// Request timeout for the default HTTP transport.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
		self.cache_store = Some(store);
		self
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	/// Cache duration applied to every new query.
	pub fn with_default_cache(mut self, duration: CacheDuration) -> Self {
		self.default_cache = Some(duration);
		self
	}

	pub fn build(self) -> Result<StatcounterClient> {
		let compiler = match self.base_url {
			Some(base_url) => UrlCompiler::new(base_url),
			None => UrlCompiler::default(),
		}
		.with_algorithm(self.signature);

		let transport: Arc<dyn Transport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(HttpTransport::new(self.timeout)?),
		};
		let cache = match self.cache_store {
			Some(store) => Cache::new(store),
			None => Cache::default(),
		};

		debug!(base_url = %compiler.base_url(), "built StatCounter client");
		Ok(StatcounterClient {
			inner: Arc::new(ClientInner {
				credentials: self.credentials,
				registry: self.registry,
				security_codes: self.security_codes,
				compiler,
				transport,
				cache,
				clock: self.clock,
				default_cache: self.default_cache,
			}),
		})
	}
}
