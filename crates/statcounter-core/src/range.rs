// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Date range constraints.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{CoreError, Result};
use crate::options::Granularity;
use crate::params::{ParamKey, ParameterSet};

/// A range endpoint as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
	/// Seconds since the Unix epoch.
	Timestamp(i64),
	/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, or a numeric timestamp.
	Text(String),
	DateTime(DateTime<Utc>),
}

impl From<i64> for DateInput {
	fn from(value: i64) -> Self {
		DateInput::Timestamp(value)
	}
}

impl From<&str> for DateInput {
	fn from(value: &str) -> Self {
		DateInput::Text(value.to_string())
	}
}

impl From<String> for DateInput {
	fn from(value: String) -> Self {
		DateInput::Text(value)
	}
}

impl From<DateTime<Utc>> for DateInput {
	fn from(value: DateTime<Utc>) -> Self {
		DateInput::DateTime(value)
	}
}

impl From<NaiveDate> for DateInput {
	fn from(value: NaiveDate) -> Self {
		DateInput::DateTime(value.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
	}
}

impl DateInput {
	pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
		match self {
			DateInput::Timestamp(ts) => from_timestamp(*ts),
			DateInput::DateTime(dt) => Ok(*dt),
			DateInput::Text(text) => parse_text(text.trim()),
		}
	}
}

fn from_timestamp(ts: i64) -> Result<DateTime<Utc>> {
	Utc
		.timestamp_opt(ts, 0)
		.single()
		.ok_or_else(|| CoreError::invalid_argument(format!("timestamp {ts} is out of range")))
}

fn parse_text(text: &str) -> Result<DateTime<Utc>> {
	if let Ok(ts) = text.parse::<i64>() {
		return from_timestamp(ts);
	}
	if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
		return Ok(dt.with_timezone(&Utc));
	}
	if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
		return Ok(dt.and_utc());
	}
	if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
		if let Some(dt) = date.and_hms_opt(0, 0, 0) {
			return Ok(dt.and_utc());
		}
	}
	Err(CoreError::invalid_argument(format!(
		"could not parse date '{text}'"
	)))
}

fn quarter(dt: &DateTime<Utc>) -> u32 {
	(dt.month() - 1) / 3 + 1
}

/// Writes `g` and the date sub-fields that belong to `granularity`.
///
/// Sub-fields from an earlier range are cleared first, so only one tier is
/// ever present.
pub fn apply_range(
	params: &mut ParameterSet,
	granularity: Granularity,
	start: &DateInput,
	end: &DateInput,
) -> Result<()> {
	let start = start.to_datetime()?;
	let end = end.to_datetime()?;

	for key in ParamKey::DATE_FIELDS {
		params.remove(key);
	}
	params.set(ParamKey::Granularity, granularity.wire_value());

	match granularity {
		Granularity::Hourly => {
			params.set(ParamKey::StartHour, start.hour().to_string());
			params.set(ParamKey::StartDay, start.day().to_string());
			params.set(ParamKey::StartMonth, start.month().to_string());
			params.set(ParamKey::StartYear, start.year().to_string());
			params.set(ParamKey::EndHour, end.hour().to_string());
			params.set(ParamKey::EndDay, end.day().to_string());
			params.set(ParamKey::EndMonth, end.month().to_string());
			params.set(ParamKey::EndYear, end.year().to_string());
		}
		Granularity::Daily => {
			params.set(ParamKey::StartDay, start.day().to_string());
			params.set(ParamKey::StartMonth, start.month().to_string());
			params.set(ParamKey::StartYear, start.year().to_string());
			params.set(ParamKey::EndDay, end.day().to_string());
			params.set(ParamKey::EndMonth, end.month().to_string());
			params.set(ParamKey::EndYear, end.year().to_string());
		}
		Granularity::Weekly => {
			// Week and year both come from the ISO week-numbering year.
			let (start_week, end_week) = (start.iso_week(), end.iso_week());
			params.set(ParamKey::StartWeek, start_week.week().to_string());
			params.set(ParamKey::StartYear, start_week.year().to_string());
			params.set(ParamKey::EndWeek, end_week.week().to_string());
			params.set(ParamKey::EndYear, end_week.year().to_string());
		}
		Granularity::Monthly => {
			params.set(ParamKey::StartMonth, start.month().to_string());
			params.set(ParamKey::StartYear, start.year().to_string());
			params.set(ParamKey::EndMonth, end.month().to_string());
			params.set(ParamKey::EndYear, end.year().to_string());
		}
		Granularity::Quarterly => {
			params.set(ParamKey::StartQuarter, quarter(&start).to_string());
			params.set(ParamKey::StartYear, start.year().to_string());
			params.set(ParamKey::EndQuarter, quarter(&end).to_string());
			params.set(ParamKey::EndYear, end.year().to_string());
		}
		Granularity::Yearly => {
			params.set(ParamKey::StartYear, start.year().to_string());
			params.set(ParamKey::EndYear, end.year().to_string());
		}
	}

	Ok(())
}
