// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decisions, status codes and match results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four-valued outcome of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
	Permit,
	Deny,
	Indeterminate,
	NotApplicable,
}

impl Decision {
	pub fn as_str(&self) -> &'static str {
		match self {
			Decision::Permit => "Permit",
			Decision::Deny => "Deny",
			Decision::Indeterminate => "Indeterminate",
			Decision::NotApplicable => "NotApplicable",
		}
	}

	pub fn is_permit(&self) -> bool {
		matches!(self, Decision::Permit)
	}
}

impl fmt::Display for Decision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCode {
	Ok,
	MissingAttribute,
	SyntaxError,
	ProcessingError,
}

impl StatusCode {
	pub fn urn(&self) -> &'static str {
		match self {
			StatusCode::Ok => "urn:oasis:names:tc:xacml:1.0:status:ok",
			StatusCode::MissingAttribute => "urn:oasis:names:tc:xacml:1.0:status:missing-attribute",
			StatusCode::SyntaxError => "urn:oasis:names:tc:xacml:1.0:status:syntax-error",
			StatusCode::ProcessingError => "urn:oasis:names:tc:xacml:1.0:status:processing-error",
		}
	}
}

/// Status accompanying a decision; carries the diagnostic for Indeterminate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
	pub code: StatusCode,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl Status {
	pub fn ok() -> Self {
		Self {
			code: StatusCode::Ok,
			message: None,
		}
	}

	pub fn missing_attribute(message: impl Into<String>) -> Self {
		Self {
			code: StatusCode::MissingAttribute,
			message: Some(message.into()),
		}
	}

	pub fn syntax_error(message: impl Into<String>) -> Self {
		Self {
			code: StatusCode::SyntaxError,
			message: Some(message.into()),
		}
	}

	pub fn processing_error(message: impl Into<String>) -> Self {
		Self {
			code: StatusCode::ProcessingError,
			message: Some(message.into()),
		}
	}

	pub fn is_ok(&self) -> bool {
		self.code == StatusCode::Ok
	}
}

impl Default for Status {
	fn default() -> Self {
		Self::ok()
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.message {
			Some(message) => write!(f, "{}: {}", self.code.urn(), message),
			None => f.write_str(self.code.urn()),
		}
	}
}

/// A decision with its status, tagged with the resource it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
	pub decision: Decision,
	pub status: Status,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub resource_id: Option<String>,
}

impl DecisionResult {
	fn with_decision(decision: Decision) -> Self {
		Self {
			decision,
			status: Status::ok(),
			resource_id: None,
		}
	}

	pub fn permit() -> Self {
		Self::with_decision(Decision::Permit)
	}

	pub fn deny() -> Self {
		Self::with_decision(Decision::Deny)
	}

	pub fn not_applicable() -> Self {
		Self::with_decision(Decision::NotApplicable)
	}

	pub fn indeterminate(status: Status) -> Self {
		Self {
			decision: Decision::Indeterminate,
			status,
			resource_id: None,
		}
	}

	pub fn with_resource_id(mut self, resource_id: Option<&str>) -> Self {
		self.resource_id = resource_id.map(str::to_string);
		self
	}

	pub fn is_permit(&self) -> bool {
		self.decision.is_permit()
	}
}

/// Outcome of matching a target against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
	Match,
	NoMatch,
	Indeterminate(Status),
}

impl MatchResult {
	pub fn is_match(&self) -> bool {
		matches!(self, MatchResult::Match)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decision_text_matches_wire_vocabulary() {
		assert_eq!(Decision::NotApplicable.to_string(), "NotApplicable");
		assert_eq!(
			serde_json::to_string(&Decision::Indeterminate).unwrap(),
			"\"Indeterminate\""
		);
	}

	#[test]
	fn status_display_includes_urn_and_message() {
		let status = Status::missing_attribute("subject-id");
		assert_eq!(
			status.to_string(),
			"urn:oasis:names:tc:xacml:1.0:status:missing-attribute: subject-id"
		);
		assert_eq!(Status::ok().to_string(), StatusCode::Ok.urn());
	}

	#[test]
	fn result_serializes_without_empty_fields() {
		let json = serde_json::to_value(DecisionResult::permit()).unwrap();
		assert_eq!(json["decision"], "Permit");
		assert_eq!(json["status"]["code"], "ok");
		assert!(json.get("resource_id").is_none());
		assert!(json["status"].get("message").is_none());
	}
}
