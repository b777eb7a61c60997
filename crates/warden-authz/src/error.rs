// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the decision core.
//!
//! Most failures inside a decision are not errors at all: they become an
//! Indeterminate [`crate::Decision`] with a [`crate::Status`]. The types here
//! cover the collaborators (stores, object sources, finders, the parser) and
//! configuration problems detected while wiring the core together.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling or driving the decision core.
#[derive(Debug, Error)]
pub enum AuthzError {
	/// A configured module key, algorithm URN or option is not known.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// The policy store failed.
	#[error("policy store error: {0}")]
	Store(#[from] StoreError),

	/// Internal failure that must not be read as a decision.
	#[error("internal error: {0}")]
	Internal(String),
}

/// Errors from a [`crate::PolicyStore`].
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("policy not found: {0}")]
	NotFound(String),

	#[error("policy already exists: {0}")]
	AlreadyExists(String),

	#[error("invalid policy id: {0}")]
	InvalidId(String),

	#[error("policy document rejected: {0}")]
	InvalidDocument(#[from] PolicyParseError),

	#[error("failed to access {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Errors from an [`crate::ObjectSource`].
#[derive(Debug, Error)]
pub enum ObjectSourceError {
	#[error("invalid object id: {0}")]
	InvalidPid(String),

	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed relationship data for {pid}: {source}")]
	Relationships {
		pid: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Errors from an [`crate::AttributeFinder`].
///
/// The finder chain never propagates these; they are logged and the finder is
/// treated as having no value.
#[derive(Debug, Error)]
pub enum FinderError {
	#[error("object source unavailable: {0}")]
	Source(#[from] ObjectSourceError),

	#[error("rights metadata unreadable: {0}")]
	Rights(#[from] PolicyParseError),

	#[error("{0}")]
	Other(String),
}

/// Errors raised while parsing a policy or rights document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyParseError {
	#[error("malformed XML: {0}")]
	Xml(String),

	#[error("unexpected root element <{0}>")]
	UnexpectedRoot(String),

	#[error("<{element}> is missing required attribute {attribute}")]
	MissingAttribute { element: String, attribute: String },

	#[error("unsupported element <{0}>")]
	UnsupportedElement(String),

	#[error("unknown combining algorithm: {0}")]
	UnknownCombiningAlgorithm(String),

	#[error("combining algorithm {0} cannot combine rules")]
	PolicyOnlyAlgorithm(String),

	#[error("unknown function: {0}")]
	UnknownFunction(String),

	#[error("unknown data type: {0}")]
	UnknownDataType(String),

	#[error("invalid {data_type} value {value:?}")]
	InvalidValue { data_type: String, value: String },

	#[error("invalid effect: {0}")]
	InvalidEffect(String),

	#[error("invalid regular expression {pattern:?}: {message}")]
	InvalidPattern { pattern: String, message: String },

	#[error("{0}")]
	Structure(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_error_converts_into_store_error() {
		let err: StoreError = PolicyParseError::UnexpectedRoot("html".into()).into();
		assert!(err.to_string().contains("<html>"));
	}

	#[test]
	fn missing_attribute_names_element_and_attribute() {
		let err = PolicyParseError::MissingAttribute {
			element: "Rule".into(),
			attribute: "Effect".into(),
		};
		assert_eq!(err.to_string(), "<Rule> is missing required attribute Effect");
	}
}
