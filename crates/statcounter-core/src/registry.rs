// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project labels, credentials and everything else the compiler reads from
//! configuration rather than from the query.

use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, Result};
use crate::params::ProjectId;
use crate::secret::SecretString;

/// Username and API password used to sign requests.
#[derive(Debug, Clone)]
pub struct Credentials {
	pub username: String,
	pub password: SecretString,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}
}

/// Bidirectional map between human project labels and API project ids.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
	default_label: Option<String>,
	by_label: BTreeMap<String, ProjectId>,
	by_id: HashMap<ProjectId, String>,
}

impl ProjectRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_project(mut self, label: impl Into<String>, id: impl Into<String>) -> Self {
		self.insert(label, id);
		self
	}

	pub fn with_default(mut self, label: impl Into<String>) -> Self {
		self.default_label = Some(label.into());
		self
	}

	pub fn insert(&mut self, label: impl Into<String>, id: impl Into<String>) {
		let label = label.into();
		let id = ProjectId::new(id);
		if let Some(previous) = self.by_label.insert(label.clone(), id.clone()) {
			self.by_id.remove(&previous);
		}
		self.by_id.insert(id, label);
	}

	pub fn default_label(&self) -> Option<&str> {
		self.default_label.as_deref()
	}

	/// Resolves a label, or the default label when `None`.
	pub fn resolve(&self, label: Option<&str>) -> Result<&ProjectId> {
		let label = match label {
			Some(label) => label,
			None => self
				.default_label
				.as_deref()
				.ok_or_else(|| CoreError::config("no default project configured"))?,
		};
		self
			.by_label
			.get(label)
			.ok_or_else(|| CoreError::config(format!("could not find projects.{label} in config")))
	}

	pub fn label_for(&self, id: &ProjectId) -> Option<&str> {
		self.by_id.get(id).map(String::as_str)
	}

	pub fn labels(&self) -> impl Iterator<Item = (&str, &ProjectId)> {
		self.by_label.iter().map(|(label, id)| (label.as_str(), id))
	}

	pub fn is_empty(&self) -> bool {
		self.by_label.is_empty()
	}
}
