// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed attribute values, bags and designators.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PolicyParseError;

/// Identifier naming the repository as a whole rather than a single object.
///
/// Object-scoped policies (rights metadata) never apply to it.
pub const REPOSITORY_PID: &str = "repository";

/// Well-known attribute identifiers.
pub mod ids {
	pub const SUBJECT_ID: &str = "urn:oasis:names:tc:xacml:1.0:subject:subject-id";
	pub const RESOURCE_ID: &str = "urn:oasis:names:tc:xacml:1.0:resource:resource-id";
	pub const ACTION_ID: &str = "urn:oasis:names:tc:xacml:1.0:action:action-id";

	pub const CURRENT_TIME: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-time";
	pub const CURRENT_DATE: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-date";
	pub const CURRENT_DATE_TIME: &str =
		"urn:oasis:names:tc:xacml:1.0:environment:current-dateTime";

	pub const SUBJECT_ROLE: &str = "urn:warden:names:subject:role";

	pub const OBJECT_PID: &str = "urn:warden:names:resource:object:pid";
	pub const DATASTREAM_ID: &str = "urn:warden:names:resource:datastream:id";
	pub const DATASTREAM_MIME_TYPE: &str = "urn:warden:names:resource:datastream:mimeType";
	pub const POLICY_ID: &str = "urn:warden:names:resource:policy:id";

	pub const ACTION_API: &str = "urn:warden:names:action:api";

	pub const TRANSACTION_ID: &str = "urn:warden:names:environment:transaction:id";
	pub const CLIENT_ADDRESS: &str = "urn:warden:names:environment:client:address";
	pub const AUTHENTICATED: &str = "urn:warden:names:environment:authenticated";

	/// Prefix shared by attributes derived from an object's rights metadata.
	pub const RIGHTS_PREFIX: &str = "urn:warden:names:resource:rights:";
	pub const RIGHTS_EMBARGO: &str = "urn:warden:names:resource:rights:embargo";

	/// `urn:warden:names:resource:rights:<access>:person`
	pub fn rights_person(access: &str) -> String {
		format!("{RIGHTS_PREFIX}{access}:person")
	}

	/// `urn:warden:names:resource:rights:<access>:group`
	pub fn rights_group(access: &str) -> String {
		format!("{RIGHTS_PREFIX}{access}:group")
	}
}

/// The four attribute categories of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Subject,
	Resource,
	Action,
	Environment,
}

impl Category {
	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Subject => "subject",
			Category::Resource => "resource",
			Category::Action => "action",
			Category::Environment => "environment",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s.to_ascii_lowercase().as_str() {
			"subject" => Some(Category::Subject),
			"resource" => Some(Category::Resource),
			"action" => Some(Category::Action),
			"environment" => Some(Category::Environment),
			_ => None,
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

const XML_SCHEMA: &str = "http://www.w3.org/2001/XMLSchema#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
	String,
	AnyUri,
	Boolean,
	Integer,
	Date,
	DateTime,
}

impl DataType {
	/// The XML Schema local name, also used as the function-name prefix.
	pub fn short_name(&self) -> &'static str {
		match self {
			DataType::String => "string",
			DataType::AnyUri => "anyURI",
			DataType::Boolean => "boolean",
			DataType::Integer => "integer",
			DataType::Date => "date",
			DataType::DateTime => "dateTime",
		}
	}

	pub fn uri(&self) -> String {
		format!("{XML_SCHEMA}{}", self.short_name())
	}

	pub fn from_short_name(name: &str) -> Option<Self> {
		match name {
			"string" => Some(DataType::String),
			"anyURI" => Some(DataType::AnyUri),
			"boolean" => Some(DataType::Boolean),
			"integer" => Some(DataType::Integer),
			"date" => Some(DataType::Date),
			"dateTime" => Some(DataType::DateTime),
			_ => None,
		}
	}

	pub fn from_uri(uri: &str) -> Option<Self> {
		uri.strip_prefix(XML_SCHEMA).and_then(Self::from_short_name)
	}

	/// String and anyURI values compare by their text.
	pub fn is_text(&self) -> bool {
		matches!(self, DataType::String | DataType::AnyUri)
	}

	/// Whether values of this type have a total order usable by comparison functions.
	pub fn is_ordered(&self) -> bool {
		matches!(self, DataType::Integer | DataType::Date | DataType::DateTime)
	}
}

impl fmt::Display for DataType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.short_name())
	}
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
	String(String),
	AnyUri(String),
	Boolean(bool),
	Integer(i64),
	Date(NaiveDate),
	DateTime(DateTime<Utc>),
}

impl AttributeValue {
	pub fn string(value: impl Into<String>) -> Self {
		AttributeValue::String(value.into())
	}

	pub fn any_uri(value: impl Into<String>) -> Self {
		AttributeValue::AnyUri(value.into())
	}

	pub fn data_type(&self) -> DataType {
		match self {
			AttributeValue::String(_) => DataType::String,
			AttributeValue::AnyUri(_) => DataType::AnyUri,
			AttributeValue::Boolean(_) => DataType::Boolean,
			AttributeValue::Integer(_) => DataType::Integer,
			AttributeValue::Date(_) => DataType::Date,
			AttributeValue::DateTime(_) => DataType::DateTime,
		}
	}

	/// Parses the lexical form of a value of the given type.
	pub fn parse(data_type: DataType, text: &str) -> Result<Self, PolicyParseError> {
		let text = text.trim();
		let invalid = || PolicyParseError::InvalidValue {
			data_type: data_type.short_name().to_string(),
			value: text.to_string(),
		};

		match data_type {
			DataType::String => Ok(AttributeValue::String(text.to_string())),
			DataType::AnyUri => Ok(AttributeValue::AnyUri(text.to_string())),
			DataType::Boolean => match text {
				"true" | "1" => Ok(AttributeValue::Boolean(true)),
				"false" | "0" => Ok(AttributeValue::Boolean(false)),
				_ => Err(invalid()),
			},
			DataType::Integer => text
				.parse::<i64>()
				.map(AttributeValue::Integer)
				.map_err(|_| invalid()),
			DataType::Date => parse_date(text)
				.map(AttributeValue::Date)
				.ok_or_else(invalid),
			DataType::DateTime => parse_date_time(text)
				.map(AttributeValue::DateTime)
				.ok_or_else(invalid),
		}
	}

	/// The text of a string or anyURI value.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			AttributeValue::String(s) | AttributeValue::AnyUri(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			AttributeValue::Boolean(b) => Some(*b),
			_ => None,
		}
	}

	/// Equality with text types treated as one family.
	pub fn equivalent(&self, other: &AttributeValue) -> bool {
		match (self.as_text(), other.as_text()) {
			(Some(a), Some(b)) => a == b,
			_ => self == other,
		}
	}

	/// Ordering between two values of the same ordered type.
	pub fn compare(&self, other: &AttributeValue) -> Option<std::cmp::Ordering> {
		match (self, other) {
			(AttributeValue::Integer(a), AttributeValue::Integer(b)) => Some(a.cmp(b)),
			(AttributeValue::Date(a), AttributeValue::Date(b)) => Some(a.cmp(b)),
			(AttributeValue::DateTime(a), AttributeValue::DateTime(b)) => Some(a.cmp(b)),
			_ => None,
		}
	}
}

impl fmt::Display for AttributeValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AttributeValue::String(s) | AttributeValue::AnyUri(s) => f.write_str(s),
			AttributeValue::Boolean(b) => write!(f, "{b}"),
			AttributeValue::Integer(i) => write!(f, "{i}"),
			AttributeValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
			AttributeValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
		}
	}
}

fn parse_date(text: &str) -> Option<NaiveDate> {
	let text = text.strip_suffix('Z').unwrap_or(text);
	NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
	if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
		return Some(dt.with_timezone(&Utc));
	}
	NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
		.ok()
		.map(|naive| naive.and_utc())
}

/// An ordered multiset of values. The empty bag is the "no value" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeBag(Vec<AttributeValue>);

impl AttributeBag {
	pub fn empty() -> Self {
		Self(Vec::new())
	}

	pub fn single(value: AttributeValue) -> Self {
		Self(vec![value])
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, AttributeValue> {
		self.0.iter()
	}

	pub fn values(&self) -> &[AttributeValue] {
		&self.0
	}

	pub fn push(&mut self, value: AttributeValue) {
		self.0.push(value);
	}

	pub fn extend(&mut self, other: AttributeBag) {
		self.0.extend(other.0);
	}

	/// First value with a textual form.
	pub fn first_text(&self) -> Option<&str> {
		self.0.iter().find_map(AttributeValue::as_text)
	}

	pub fn texts(&self) -> impl Iterator<Item = &str> {
		self.0.iter().filter_map(AttributeValue::as_text)
	}

	pub fn contains(&self, value: &AttributeValue) -> bool {
		self.0.iter().any(|v| v.equivalent(value))
	}
}

impl From<Vec<AttributeValue>> for AttributeBag {
	fn from(values: Vec<AttributeValue>) -> Self {
		Self(values)
	}
}

impl FromIterator<AttributeValue> for AttributeBag {
	fn from_iter<I: IntoIterator<Item = AttributeValue>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl IntoIterator for AttributeBag {
	type Item = AttributeValue;
	type IntoIter = std::vec::IntoIter<AttributeValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a AttributeBag {
	type Item = &'a AttributeValue;
	type IntoIter = std::slice::Iter<'a, AttributeValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// One named attribute inside a request. Its category is the request set holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub id: String,
	pub issuer: Option<String>,
	pub values: AttributeBag,
}

impl Attribute {
	pub fn new(id: impl Into<String>, values: AttributeBag) -> Self {
		Self {
			id: id.into(),
			issuer: None,
			values,
		}
	}

	pub fn string(id: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(id, AttributeBag::single(AttributeValue::string(value)))
	}

	pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer = Some(issuer.into());
		self
	}

	/// Whether this attribute answers a lookup for `id` from `issuer`.
	///
	/// A lookup without an issuer accepts any issuer.
	pub fn answers(&self, id: &str, issuer: Option<&str>) -> bool {
		self.id == id && issuer.map_or(true, |i| self.issuer.as_deref() == Some(i))
	}
}

/// Identity under which resolved attributes are cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeKey {
	pub category: Category,
	pub attribute_id: String,
	pub issuer: Option<String>,
}

/// A request for the values of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesignator {
	pub category: Category,
	pub attribute_id: String,
	pub data_type: DataType,
	pub issuer: Option<String>,
	pub must_be_present: bool,
}

impl AttributeDesignator {
	pub fn new(category: Category, attribute_id: impl Into<String>) -> Self {
		Self {
			category,
			attribute_id: attribute_id.into(),
			data_type: DataType::String,
			issuer: None,
			must_be_present: false,
		}
	}

	pub fn subject(attribute_id: impl Into<String>) -> Self {
		Self::new(Category::Subject, attribute_id)
	}

	pub fn resource(attribute_id: impl Into<String>) -> Self {
		Self::new(Category::Resource, attribute_id)
	}

	pub fn action(attribute_id: impl Into<String>) -> Self {
		Self::new(Category::Action, attribute_id)
	}

	pub fn environment(attribute_id: impl Into<String>) -> Self {
		Self::new(Category::Environment, attribute_id)
	}

	pub fn with_data_type(mut self, data_type: DataType) -> Self {
		self.data_type = data_type;
		self
	}

	pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer = Some(issuer.into());
		self
	}

	pub fn required(mut self) -> Self {
		self.must_be_present = true;
		self
	}

	pub fn key(&self) -> AttributeKey {
		AttributeKey {
			category: self.category,
			attribute_id: self.attribute_id.clone(),
			issuer: self.issuer.clone(),
		}
	}
}
