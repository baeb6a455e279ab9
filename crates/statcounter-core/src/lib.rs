// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Query engine for the StatCounter v3 API.
//!
//! This crate holds everything that does not touch the network: the
//! parameter table, the [`Query`] accumulator, the [`UrlCompiler`] that signs
//! requests, and [`interpret`], which normalises response bodies.

pub mod compile;
pub mod error;
pub mod options;
pub mod params;
pub mod query;
pub mod range;
pub mod registry;
pub mod response;
pub mod secret;

pub use compile::{SignatureAlgorithm, UrlCompiler, DEFAULT_BASE_URL};
pub use error::{CoreError, Result};
pub use options::{Command, Device, Granularity, PublicStats, SearchEngine, Statistic};
pub use params::{ParamKey, ParameterSet, ProjectId, ProjectSelection, API_VERSION};
pub use query::{Columns, Query, RawQuery};
pub use range::{apply_range, DateInput};
pub use registry::{Credentials, ProjectRegistry};
pub use response::{decode, interpret, ProjectRows, QueryResult};
pub use secret::{Secret, SecretString, REDACTED};
