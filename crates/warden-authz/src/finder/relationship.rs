// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::attribute::{AttributeBag, AttributeDesignator, AttributeValue, Category, REPOSITORY_PID};
use crate::context::EvaluationCtx;
use crate::error::FinderError;
use crate::store::ObjectSource;

use super::AttributeFinder;

/// Resolves resource attributes by following one relationship of the
/// resource's object.
///
/// Each configured attribute id names a predicate; the attribute's values are
/// the objects of the matching relationships (literals as strings, object
/// references as anyURI).
pub struct RelationshipAttributeFinder {
	source: Arc<dyn ObjectSource>,
	predicates: BTreeMap<String, String>,
}

impl RelationshipAttributeFinder {
	pub fn new(source: Arc<dyn ObjectSource>, predicates: BTreeMap<String, String>) -> Self {
		Self { source, predicates }
	}

	pub fn predicate_for(&self, attribute_id: &str) -> Option<&str> {
		self.predicates.get(attribute_id).map(String::as_str)
	}
}

impl AttributeFinder for RelationshipAttributeFinder {
	fn name(&self) -> &str {
		"relationship"
	}

	fn supports_designator(&self, designator: &AttributeDesignator) -> bool {
		designator.category == Category::Resource
			&& self.predicates.contains_key(&designator.attribute_id)
	}

	fn find_attribute(
		&self,
		designator: &AttributeDesignator,
		ctx: &EvaluationCtx<'_>,
	) -> Result<Option<AttributeBag>, FinderError> {
		let Some(predicate) = self.predicate_for(&designator.attribute_id) else {
			return Ok(None);
		};
		let Some(pid) = ctx.object_pid() else {
			return Ok(None);
		};
		if pid == REPOSITORY_PID {
			return Ok(None);
		}

		let bag: AttributeBag = self
			.source
			.relationships(&pid, Some(predicate))?
			.into_iter()
			.map(|rel| {
				if rel.is_literal {
					AttributeValue::String(rel.object)
				} else {
					AttributeValue::AnyUri(rel.object)
				}
			})
			.collect();

		tracing::trace!(pid = %pid, predicate = %predicate, values = bag.len(), "relationships resolved");
		Ok(Some(bag))
	}
}
