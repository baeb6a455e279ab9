// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fluent client for the StatCounter v3 API.
//!
//! ```ignore
//! let config = statcounter_config::load_config()?;
//! let client = StatcounterClient::from_config(&config)?;
//! let pages = client
//!     .query()
//!     .popular_pages(false, Some("visitor"))
//!     .project("blog")?
//!     .limit(10)?
//!     .get()
//!     .await?;
//! ```

pub mod cache;
pub mod client;
pub mod clock;
pub mod error;
pub mod paginate;
pub mod query;
pub mod tracker;
pub mod transport;

pub use cache::{Cache, CacheDuration, CacheStore, MemoryCache};
pub use client::{StatcounterClient, StatcounterClientBuilder};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, StatcounterError};
pub use paginate::{Page, SimplePage};
pub use query::StatQuery;
pub use tracker::{public_stats_url, TrackerSnippet};
pub use transport::{HttpTransport, Transport};

pub use statcounter_core::{
	Columns, Command, Credentials, DateInput, Device, Granularity, ProjectRegistry, ProjectRows,
	PublicStats, QueryResult, RawQuery, SearchEngine, SignatureAlgorithm, Statistic,
};
