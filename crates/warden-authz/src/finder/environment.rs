// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::attribute::{ids, AttributeBag, AttributeDesignator, AttributeValue, Category};
use crate::context::EvaluationCtx;
use crate::error::FinderError;

use super::AttributeFinder;

/// Supplies the current time, date and dateTime of the evaluation.
///
/// Values come from the context's fixed evaluation instant, so every
/// time-based check within one decision agrees. The current time is rendered
/// as `HH:MM:SS` text (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrentEnvironmentFinder;

impl CurrentEnvironmentFinder {
	pub fn new() -> Self {
		Self
	}
}

impl AttributeFinder for CurrentEnvironmentFinder {
	fn name(&self) -> &str {
		"current-environment"
	}

	fn supports_designator(&self, designator: &AttributeDesignator) -> bool {
		designator.category == Category::Environment
			&& matches!(
				designator.attribute_id.as_str(),
				ids::CURRENT_TIME | ids::CURRENT_DATE | ids::CURRENT_DATE_TIME
			)
	}

	fn find_attribute(
		&self,
		designator: &AttributeDesignator,
		ctx: &EvaluationCtx<'_>,
	) -> Result<Option<AttributeBag>, FinderError> {
		let now = ctx.current_date_time();
		let value = match designator.attribute_id.as_str() {
			ids::CURRENT_DATE_TIME => AttributeValue::DateTime(now),
			ids::CURRENT_DATE => AttributeValue::Date(now.date_naive()),
			ids::CURRENT_TIME => AttributeValue::string(now.format("%H:%M:%S").to_string()),
			_ => return Ok(None),
		};
		Ok(Some(AttributeBag::single(value)))
	}
}
