// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The immutable attribute bundle describing one authorization question.

use crate::attribute::{
	ids, Attribute, AttributeBag, AttributeDesignator, AttributeValue, Category,
};

/// Subject, resource, action and environment attributes of one operation.
///
/// Built once by the enforcement point with [`RequestCtx::builder`] and never
/// mutated afterwards. A request may carry several subjects (for example the
/// caller and a delegate); lookups merge values across all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCtx {
	subjects: Vec<Vec<Attribute>>,
	resource: Vec<Attribute>,
	action: Vec<Attribute>,
	environment: Vec<Attribute>,
}

impl RequestCtx {
	pub fn builder() -> RequestCtxBuilder {
		RequestCtxBuilder::default()
	}

	pub fn subjects(&self) -> &[Vec<Attribute>] {
		&self.subjects
	}

	pub fn resource(&self) -> &[Attribute] {
		&self.resource
	}

	pub fn action(&self) -> &[Attribute] {
		&self.action
	}

	pub fn environment(&self) -> &[Attribute] {
		&self.environment
	}

	/// Values of the attributes answering `designator`.
	///
	/// `None` when no attribute with that identity is present at all; a present
	/// attribute with no values yields an empty bag.
	pub fn lookup(&self, designator: &AttributeDesignator) -> Option<AttributeBag> {
		let issuer = designator.issuer.as_deref();
		let id = designator.attribute_id.as_str();

		let mut found = false;
		let mut bag = AttributeBag::empty();
		for attr in self
			.attributes_in(designator.category)
			.filter(|a| a.answers(id, issuer))
		{
			found = true;
			bag.extend(attr.values.clone());
		}

		found.then_some(bag)
	}

	fn attributes_in(&self, category: Category) -> Box<dyn Iterator<Item = &Attribute> + '_> {
		match category {
			Category::Subject => Box::new(self.subjects.iter().flatten()),
			Category::Resource => Box::new(self.resource.iter()),
			Category::Action => Box::new(self.action.iter()),
			Category::Environment => Box::new(self.environment.iter()),
		}
	}

	fn first_text(&self, category: Category, id: &str) -> Option<&str> {
		self.attributes_in(category)
			.filter(|a| a.id == id)
			.find_map(|a| a.values.first_text())
	}

	pub fn subject_id(&self) -> Option<&str> {
		self.first_text(Category::Subject, ids::SUBJECT_ID)
	}

	pub fn resource_id(&self) -> Option<&str> {
		self.first_text(Category::Resource, ids::RESOURCE_ID)
	}

	/// The object pid, falling back to the resource id.
	pub fn object_pid(&self) -> Option<&str> {
		self.first_text(Category::Resource, ids::OBJECT_PID)
			.or_else(|| self.resource_id())
	}

	pub fn action_id(&self) -> Option<&str> {
		self.first_text(Category::Action, ids::ACTION_ID)
	}
}

#[derive(Debug, Default)]
pub struct RequestCtxBuilder {
	subjects: Vec<Vec<Attribute>>,
	resource: Vec<Attribute>,
	action: Vec<Attribute>,
	environment: Vec<Attribute>,
}

impl RequestCtxBuilder {
	/// Adds an attribute to the current subject, opening one if none exists.
	pub fn subject(mut self, attribute: Attribute) -> Self {
		if self.subjects.is_empty() {
			self.subjects.push(Vec::new());
		}
		if let Some(current) = self.subjects.last_mut() {
			current.push(attribute);
		}
		self
	}

	/// Starts a further subject; later `subject*` calls add to it.
	pub fn next_subject(mut self) -> Self {
		self.subjects.push(Vec::new());
		self
	}

	pub fn subject_string(self, id: &str, value: impl Into<String>) -> Self {
		self.subject(Attribute::string(id, value))
	}

	/// Adds a multi-valued string attribute to the current subject.
	pub fn subject_strings<I, S>(self, id: &str, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let bag = values.into_iter().map(AttributeValue::string).collect();
		self.subject(Attribute::new(id, bag))
	}

	pub fn resource(mut self, attribute: Attribute) -> Self {
		self.resource.push(attribute);
		self
	}

	pub fn resource_string(self, id: &str, value: impl Into<String>) -> Self {
		self.resource(Attribute::string(id, value))
	}

	pub fn action(mut self, attribute: Attribute) -> Self {
		self.action.push(attribute);
		self
	}

	pub fn action_string(self, id: &str, value: impl Into<String>) -> Self {
		self.action(Attribute::string(id, value))
	}

	pub fn environment(mut self, attribute: Attribute) -> Self {
		self.environment.push(attribute);
		self
	}

	pub fn environment_string(self, id: &str, value: impl Into<String>) -> Self {
		self.environment(Attribute::string(id, value))
	}

	pub fn build(self) -> RequestCtx {
		RequestCtx {
			subjects: self.subjects,
			resource: self.resource,
			action: self.action,
			environment: self.environment,
		}
	}
}
