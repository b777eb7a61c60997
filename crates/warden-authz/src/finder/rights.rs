// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::attribute::{
	ids, AttributeBag, AttributeDesignator, AttributeValue, Category, REPOSITORY_PID,
};
use crate::context::EvaluationCtx;
use crate::error::FinderError;
use crate::rights::{AccessType, RightsMetadataLoader};

use super::AttributeFinder;

/// Exposes an object's rights metadata as resource attributes.
///
/// `…:rights:<access>:person` and `…:rights:<access>:group` carry the
/// effective grants for that access type on the evaluation date;
/// `…:rights:embargo` carries the embargo release date.
#[derive(Debug)]
pub struct RightsMetadataAttributeFinder {
	loader: RightsMetadataLoader,
}

enum RightsAttribute {
	Persons(AccessType),
	Groups(AccessType),
	Embargo,
}

fn classify(attribute_id: &str) -> Option<RightsAttribute> {
	if attribute_id == ids::RIGHTS_EMBARGO {
		return Some(RightsAttribute::Embargo);
	}
	let rest = attribute_id.strip_prefix(ids::RIGHTS_PREFIX)?;
	let (access, kind) = rest.split_once(':')?;
	let access = AccessType::parse(access)?;
	match kind {
		"person" => Some(RightsAttribute::Persons(access)),
		"group" => Some(RightsAttribute::Groups(access)),
		_ => None,
	}
}

impl RightsMetadataAttributeFinder {
	pub fn new(loader: RightsMetadataLoader) -> Self {
		Self { loader }
	}
}

impl AttributeFinder for RightsMetadataAttributeFinder {
	fn name(&self) -> &str {
		"rights-metadata"
	}

	fn supports_designator(&self, designator: &AttributeDesignator) -> bool {
		designator.category == Category::Resource && classify(&designator.attribute_id).is_some()
	}

	fn find_attribute(
		&self,
		designator: &AttributeDesignator,
		ctx: &EvaluationCtx<'_>,
	) -> Result<Option<AttributeBag>, FinderError> {
		let Some(kind) = classify(&designator.attribute_id) else {
			return Ok(None);
		};
		let Some(pid) = ctx.object_pid().filter(|p| p != REPOSITORY_PID) else {
			return Ok(None);
		};
		let Some(rights) = self.loader.load(&pid)? else {
			return Ok(None);
		};

		let today = ctx.current_date_time().date_naive();
		let bag = match kind {
			RightsAttribute::Persons(access) => rights
				.persons(access, today)
				.into_iter()
				.map(AttributeValue::string)
				.collect(),
			RightsAttribute::Groups(access) => rights
				.groups(access, today)
				.into_iter()
				.map(AttributeValue::string)
				.collect(),
			RightsAttribute::Embargo => rights
				.embargo_release_date()
				.map(|d| AttributeBag::single(AttributeValue::Date(d)))
				.unwrap_or_default(),
		};
		Ok(Some(bag))
	}
}
