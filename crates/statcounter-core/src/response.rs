// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decoding of API response bodies into [`QueryResult`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::error::{CoreError, Result};
use crate::params::ProjectId;
use crate::query::{Columns, Query};
use crate::registry::ProjectRegistry;

/// Rows for one project of a multi-project response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRows {
	pub label: String,
	pub project_id: String,
	pub rows: Vec<Value>,
}

/// A normalised response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryResult {
	/// The `sc_data` block of a single-project response.
	Rows(Vec<Value>),
	/// One entry per project, in response order.
	Projects(Vec<ProjectRows>),
	/// The whole body, for commands without tabular data.
	Document(Value),
}

impl Default for QueryResult {
	fn default() -> Self {
		QueryResult::Rows(Vec::new())
	}
}

impl QueryResult {
	/// Number of items subject to slicing. A document counts as one.
	pub fn len(&self) -> usize {
		match self {
			QueryResult::Rows(rows) => rows.len(),
			QueryResult::Projects(projects) => projects.len(),
			QueryResult::Document(_) => 1,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Client-side `offset`/`limit` slice. `None` means to the end.
	pub fn slice(self, offset: usize, limit: Option<usize>) -> Self {
		fn window<T>(items: Vec<T>, offset: usize, limit: Option<usize>) -> Vec<T> {
			let iter = items.into_iter().skip(offset);
			match limit {
				Some(limit) => iter.take(limit).collect(),
				None => iter.collect(),
			}
		}

		match self {
			QueryResult::Rows(rows) => QueryResult::Rows(window(rows, offset, limit)),
			QueryResult::Projects(projects) => {
				QueryResult::Projects(window(projects, offset, limit))
			}
			QueryResult::Document(doc) => {
				if offset == 0 && limit != Some(0) {
					QueryResult::Document(doc)
				} else {
					QueryResult::Rows(Vec::new())
				}
			}
		}
	}

	/// Drops every row field not in `columns`. Never adds fields.
	pub fn trim_columns(&mut self, columns: &Columns) {
		let Columns::Only(names) = columns else {
			return;
		};
		let trim = |row: &mut Value| {
			if let Value::Object(map) = row {
				map.retain(|key, _| names.contains(key));
			}
		};
		match self {
			QueryResult::Rows(rows) => rows.iter_mut().for_each(trim),
			QueryResult::Projects(projects) => projects
				.iter_mut()
				.flat_map(|p| p.rows.iter_mut())
				.for_each(trim),
			QueryResult::Document(_) => {}
		}
	}

	/// Flattens into rows: project rows are concatenated, a document is one row.
	pub fn into_rows(self) -> Vec<Value> {
		match self {
			QueryResult::Rows(rows) => rows,
			QueryResult::Projects(projects) => {
				projects.into_iter().flat_map(|p| p.rows).collect()
			}
			QueryResult::Document(doc) => vec![doc],
		}
	}

	/// The first item: a row, a project's rows as an object, or the document.
	pub fn into_first(self) -> Option<Value> {
		match self {
			QueryResult::Rows(rows) => rows.into_iter().next(),
			QueryResult::Projects(projects) => projects.into_iter().next().map(|p| {
				let mut map = Map::new();
				map.insert(p.label, Value::Array(p.rows));
				Value::Object(map)
			}),
			QueryResult::Document(doc) => Some(doc),
		}
	}
}

/// Parses `body` and shapes it according to `query`, including column trimming.
pub fn interpret(body: &str, query: &Query, registry: &ProjectRegistry) -> Result<QueryResult> {
	let mut result = decode(body, query, registry)?;
	result.trim_columns(query.columns());
	Ok(result)
}

/// [`interpret`] without column trimming. Cached values are stored in this
/// form so that one entry can serve queries selecting different columns.
pub fn decode(body: &str, query: &Query, registry: &ProjectRegistry) -> Result<QueryResult> {
	let value: Value = serde_json::from_str(body).map_err(|e| CoreError::Decode {
		reason: e.to_string(),
		body: body.to_string(),
	})?;

	let status = value
		.pointer("/@attributes/status")
		.and_then(Value::as_str);
	if status != Some("ok") {
		let message = error_descriptions(&value)
			.unwrap_or_else(|| format!("request failed with status {}", status.unwrap_or("missing")));
		warn!(status = ?status, "API reported failure");
		return Err(CoreError::Api { message });
	}

	let result = if query.is_multi_project() && value.get("project").is_some() {
		QueryResult::Projects(demultiplex(&value["project"], registry))
	} else if let Some(data) = value.get("sc_data") {
		QueryResult::Rows(to_rows(data))
	} else {
		trace!("response has no data block; passing document through");
		QueryResult::Document(value)
	};

	debug!(items = result.len(), "decoded response");
	Ok(result)
}

/// Newline-joined `error[].description`, in list order.
fn error_descriptions(value: &Value) -> Option<String> {
	let errors: Vec<&Value> = match value.get("error")? {
		Value::Array(list) => list.iter().collect(),
		single @ Value::Object(_) => vec![single],
		_ => return None,
	};
	let descriptions: Vec<&str> = errors
		.into_iter()
		.filter_map(|e| e.get("description").and_then(Value::as_str))
		.collect();
	if descriptions.is_empty() {
		None
	} else {
		Some(descriptions.join("\n"))
	}
}

fn demultiplex(projects: &Value, registry: &ProjectRegistry) -> Vec<ProjectRows> {
	let entries: Vec<&Value> = match projects {
		Value::Array(list) => list.iter().collect(),
		single @ Value::Object(_) => vec![single],
		_ => Vec::new(),
	};

	entries
		.into_iter()
		.filter_map(|entry| {
			let id = match entry.get("id")? {
				Value::String(s) => s.clone(),
				Value::Number(n) => n.to_string(),
				_ => return None,
			};
			let data = entry.get("sc_data")?;
			let project_id = ProjectId::new(id.clone());
			let label = registry
				.label_for(&project_id)
				.map(str::to_string)
				.unwrap_or_else(|| id.clone());
			Some(ProjectRows {
				label,
				project_id: id,
				rows: to_rows(data),
			})
		})
		.collect()
}

fn to_rows(data: &Value) -> Vec<Value> {
	match data {
		Value::Array(rows) => rows.clone(),
		Value::Null => Vec::new(),
		other => vec![other.clone()],
	}
}
