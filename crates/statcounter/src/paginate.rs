// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pagination results and the snapshot guard used while counting.

use std::ops::Deref;

use serde::Serialize;
use statcounter_core::{Query, QueryResult};

/// A page plus the total item count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
	pub items: QueryResult,
	pub total: usize,
	pub per_page: usize,
	pub current_page: usize,
}

impl Page {
	pub fn last_page(&self) -> usize {
		self.total.div_ceil(self.per_page).max(1)
	}

	pub fn has_more_pages(&self) -> bool {
		self.current_page < self.last_page()
	}
}

/// A page that only knows whether another one follows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimplePage {
	pub items: QueryResult,
	pub per_page: usize,
	pub current_page: usize,
	pub has_more: bool,
}

/// Clears limit, offset and columns for the guard's lifetime, then puts the
/// whole query back exactly as it was, on every exit path.
pub(crate) struct UnboundedScope<'q> {
	query: &'q mut Query,
	saved: Query,
}

impl<'q> UnboundedScope<'q> {
	pub(crate) fn enter(query: &'q mut Query) -> Self {
		let saved = query.clone();
		query.clear_constraints();
		Self { query, saved }
	}
}

impl Deref for UnboundedScope<'_> {
	type Target = Query;

	fn deref(&self) -> &Query {
		self.query
	}
}

impl Drop for UnboundedScope<'_> {
	fn drop(&mut self) {
		*self.query = std::mem::take(&mut self.saved);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use statcounter_core::{Columns, Command};

	#[test]
	fn scope_clears_then_restores() {
		let mut query = Query::new();
		query.set_command(Command::Stats);
		query.set_limit(3).unwrap();
		query.set_offset(6);
		query.set_columns(Columns::from_names(["a"]));
		{
			let scope = UnboundedScope::enter(&mut query);
			assert_eq!(scope.limit(), None);
			assert_eq!(scope.offset(), 0);
			assert!(scope.columns().is_all());
		}
		assert_eq!(query.limit(), Some(3));
		assert_eq!(query.offset(), 6);
		assert_eq!(query.columns(), &Columns::from_names(["a"]));
	}

	#[test]
	fn last_page_rounds_up() {
		let page = Page {
			items: QueryResult::default(),
			total: 31,
			per_page: 15,
			current_page: 1,
		};
		assert_eq!(page.last_page(), 3);
		assert!(page.has_more_pages());

		let empty = Page { total: 0, ..page };
		assert_eq!(empty.last_page(), 1);
	}
}
