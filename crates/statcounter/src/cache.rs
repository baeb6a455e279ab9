// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Response caching keyed by the unsigned request URL.
//!
//! The store is an external collaborator behind [`CacheStore`]. [`Cache`]
//! adds the remember-or-produce logic on top; it performs at most one fresh
//! fetch per call and leaves stampede protection to the store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use statcounter_core::QueryResult;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

use crate::error::Result;

/// How long a cached result stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDuration {
	Forever,
	Minutes(u64),
}

impl CacheDuration {
	/// Negative minutes mean forever.
	pub fn from_minutes(minutes: i64) -> Self {
		if minutes < 0 {
			CacheDuration::Forever
		} else {
			CacheDuration::Minutes(minutes.unsigned_abs())
		}
	}

	/// `None` for [`CacheDuration::Forever`].
	pub fn ttl(&self) -> Option<Duration> {
		match self {
			CacheDuration::Forever => None,
			CacheDuration::Minutes(m) => Some(Duration::from_secs(m.saturating_mul(60))),
		}
	}
}

/// Storage backend for cached results.
#[async_trait]
pub trait CacheStore: Send + Sync {
	async fn get(&self, key: &str) -> Option<QueryResult>;

	async fn put(&self, key: &str, value: QueryResult, duration: CacheDuration);
}

/// Remember-or-produce wrapper over a [`CacheStore`].
#[derive(Clone)]
pub struct Cache {
	store: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for Cache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Cache").finish_non_exhaustive()
	}
}

impl Default for Cache {
	fn default() -> Self {
		Self::new(Arc::new(MemoryCache::new()))
	}
}

impl Cache {
	pub fn new(store: Arc<dyn CacheStore>) -> Self {
		Self { store }
	}

	/// Returns the cached value for `key`, or runs `producer` and stores its
	/// result for `duration`. Errors are returned without being stored.
	#[instrument(skip(self, producer), fields(key = %key))]
	pub async fn remember<F, Fut>(
		&self,
		key: &str,
		duration: CacheDuration,
		producer: F,
	) -> Result<QueryResult>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<QueryResult>>,
	{
		if let Some(hit) = self.store.get(key).await {
			debug!("cache hit");
			return Ok(hit);
		}

		debug!(?duration, "cache miss");
		let value = producer().await?;
		self.store.put(key, value.clone(), duration).await;
		Ok(value)
	}

	pub async fn remember_forever<F, Fut>(&self, key: &str, producer: F) -> Result<QueryResult>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<QueryResult>>,
	{
		self.remember(key, CacheDuration::Forever, producer).await
	}
}

#[derive(Debug)]
struct Entry {
	value: QueryResult,
	expires_at: Option<Instant>,
}

impl Entry {
	fn is_live(&self, now: Instant) -> bool {
		self.expires_at.map_or(true, |at| now < at)
	}
}

/// In-process [`CacheStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
	inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn len(&self) -> usize {
		let now = Instant::now();
		self
			.inner
			.read()
			.await
			.values()
			.filter(|e| e.is_live(now))
			.count()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	pub async fn clear(&self) {
		self.inner.write().await.clear();
	}

	#[cfg(test)]
	async fn stored_entries(&self) -> usize {
		self.inner.read().await.len()
	}
}

#[async_trait]
impl CacheStore for MemoryCache {
	async fn get(&self, key: &str) -> Option<QueryResult> {
		let now = Instant::now();
		{
			let inner = self.inner.read().await;
			match inner.get(key) {
				Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
				Some(_) => {}
				None => return None,
			}
		}
		trace!(key = %key, "evicting expired entry");
		self.inner.write().await.remove(key);
		None
	}

	/// Also drops every expired entry, so keys that are never read again
	/// do not accumulate.
	async fn put(&self, key: &str, value: QueryResult, duration: CacheDuration) {
		let now = Instant::now();
		let expires_at = duration.ttl().and_then(|ttl| now.checked_add(ttl));
		let mut inner = self.inner.write().await;
		let before = inner.len();
		inner.retain(|_, entry| entry.is_live(now));
		let swept = before - inner.len();
		if swept > 0 {
			trace!(swept, "swept expired entries");
		}
		inner.insert(key.to_string(), Entry { value, expires_at });
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::StatcounterError;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn rows(n: i64) -> QueryResult {
		QueryResult::Rows(vec![json!(n)])
	}

	#[test]
	fn negative_minutes_mean_forever() {
		assert_eq!(CacheDuration::from_minutes(-1), CacheDuration::Forever);
		assert_eq!(CacheDuration::from_minutes(5), CacheDuration::Minutes(5));
		assert_eq!(
			CacheDuration::Minutes(2).ttl(),
			Some(Duration::from_secs(120))
		);
		assert_eq!(CacheDuration::Forever.ttl(), None);
	}

	#[tokio::test]
	async fn remember_produces_once_per_key() {
		let cache = Cache::default();
		let calls = AtomicUsize::new(0);
		for _ in 0..3 {
			let value = cache
				.remember("k", CacheDuration::Minutes(10), || async {
					calls.fetch_add(1, Ordering::SeqCst);
					Ok(rows(1))
				})
				.await
				.unwrap();
			assert_eq!(value, rows(1));
		}
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn errors_are_not_cached() {
		let store = Arc::new(MemoryCache::new());
		let cache = Cache::new(store.clone());
		let err = cache
			.remember_forever("k", || async {
				Err(StatcounterError::Api {
					message: "nope".to_string(),
				})
			})
			.await;
		assert!(err.is_err());
		assert!(store.is_empty().await);

		let value = cache.remember_forever("k", || async { Ok(rows(2)) }).await;
		assert_eq!(value.unwrap(), rows(2));
	}

	#[tokio::test]
	async fn zero_minutes_expire_immediately() {
		let store = MemoryCache::new();
		store.put("k", rows(1), CacheDuration::Minutes(0)).await;
		assert!(store.get("k").await.is_none());
		assert!(store.is_empty().await);
	}

	#[tokio::test]
	async fn put_sweeps_expired_entries_for_other_keys() {
		let store = MemoryCache::new();
		for i in 0..50 {
			store
				.put(&format!("stale-{i}"), rows(i), CacheDuration::Minutes(0))
				.await;
		}
		store.put("live", rows(99), CacheDuration::Minutes(10)).await;
		assert_eq!(store.stored_entries().await, 1);
		assert_eq!(store.get("live").await, Some(rows(99)));
	}

	#[tokio::test]
	async fn forever_entries_survive() {
		let store = MemoryCache::new();
		store.put("k", rows(3), CacheDuration::Forever).await;
		assert_eq!(store.get("k").await, Some(rows(3)));
		store.clear().await;
		assert!(store.get("k").await.is_none());
	}
}
