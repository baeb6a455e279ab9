// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source of the request time stamped into every live URL.

use chrono::Utc;

pub trait Clock: Send + Sync {
	/// Seconds since the Unix epoch.
	fn now_timestamp(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_timestamp(&self) -> i64 {
		Utc::now().timestamp()
	}
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
	fn now_timestamp(&self) -> i64 {
		self.0
	}
}
