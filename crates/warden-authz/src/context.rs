// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request evaluation context with memoised attribute resolution.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::attribute::{ids, AttributeBag, AttributeDesignator, AttributeKey, AttributeValue, Category};
use crate::decision::Status;
use crate::finder::AttributeFinderChain;
use crate::request::RequestCtx;

/// Attribute source supplied by the transport that carried the request.
///
/// Consulted after the request itself and before the finder chain, for the
/// handful of values the transport knows directly.
pub trait TransportContext {
	fn direct_attribute(&self, designator: &AttributeDesignator) -> Option<AttributeBag>;
}

impl TransportContext for () {
	fn direct_attribute(&self, _designator: &AttributeDesignator) -> Option<AttributeBag> {
		None
	}
}

/// Environment facts known to the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportAttributes {
	pub transaction_id: Option<String>,
	pub client_address: Option<String>,
	pub authenticated: Option<bool>,
}

impl TransportAttributes {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
		self.transaction_id = Some(id.into());
		self
	}

	pub fn with_client_address(mut self, address: impl Into<String>) -> Self {
		self.client_address = Some(address.into());
		self
	}

	pub fn with_authenticated(mut self, authenticated: bool) -> Self {
		self.authenticated = Some(authenticated);
		self
	}
}

impl TransportContext for TransportAttributes {
	fn direct_attribute(&self, designator: &AttributeDesignator) -> Option<AttributeBag> {
		if designator.category != Category::Environment || designator.issuer.is_some() {
			return None;
		}
		let value = match designator.attribute_id.as_str() {
			ids::TRANSACTION_ID => AttributeValue::string(self.transaction_id.clone()?),
			ids::CLIENT_ADDRESS => AttributeValue::string(self.client_address.clone()?),
			ids::AUTHENTICATED => AttributeValue::Boolean(self.authenticated?),
			_ => return None,
		};
		Some(AttributeBag::single(value))
	}
}

/// Lazily resolved view of one request.
///
/// Lookups consult, in order: the memo cache, the [`RequestCtx`], the
/// transport's direct attributes, then the finder chain. Every outcome,
/// including absence, is memoised so repeated lookups of one identity observe
/// one value and the finder chain runs at most once per identity.
///
/// Holds its cache in a `RefCell`; create one per request and never share it.
pub struct EvaluationCtx<'a> {
	request: &'a RequestCtx,
	transport: &'a dyn TransportContext,
	finders: &'a AttributeFinderChain,
	now: DateTime<Utc>,
	cache: RefCell<HashMap<AttributeKey, Option<AttributeBag>>>,
	resolving: RefCell<HashSet<AttributeKey>>,
}

impl<'a> EvaluationCtx<'a> {
	pub fn new(
		request: &'a RequestCtx,
		transport: &'a dyn TransportContext,
		finders: &'a AttributeFinderChain,
	) -> Self {
		Self::at(request, transport, finders, Utc::now())
	}

	/// A context whose evaluation instant is fixed to `now`.
	pub fn at(
		request: &'a RequestCtx,
		transport: &'a dyn TransportContext,
		finders: &'a AttributeFinderChain,
		now: DateTime<Utc>,
	) -> Self {
		Self {
			request,
			transport,
			finders,
			now,
			cache: RefCell::new(HashMap::new()),
			resolving: RefCell::new(HashSet::new()),
		}
	}

	pub fn request(&self) -> &RequestCtx {
		self.request
	}

	/// The instant every time-based attribute of this decision observes.
	pub fn current_date_time(&self) -> DateTime<Utc> {
		self.now
	}

	/// Values for `designator`; an empty bag when nothing supplies one.
	pub fn get_attribute(&self, designator: &AttributeDesignator) -> AttributeBag {
		let key = designator.key();

		let cached = self.cache.borrow().get(&key).cloned();
		if let Some(hit) = cached {
			tracing::trace!(
				category = %key.category,
				attribute_id = %key.attribute_id,
				"attribute cache hit"
			);
			return hit.unwrap_or_default();
		}

		// A finder that asks for the attribute it is resolving sees no value.
		if !self.resolving.borrow_mut().insert(key.clone()) {
			return AttributeBag::empty();
		}
		let resolved = self.resolve_uncached(designator);
		self.resolving.borrow_mut().remove(&key);

		self.cache.borrow_mut().insert(key, resolved.clone());
		resolved.unwrap_or_default()
	}

	/// Like [`get_attribute`](Self::get_attribute) but reports a missing
	/// required attribute as an Indeterminate status.
	pub fn resolve(&self, designator: &AttributeDesignator) -> Result<AttributeBag, Status> {
		let bag = self.get_attribute(designator);
		if bag.is_empty() && designator.must_be_present {
			return Err(Status::missing_attribute(format!(
				"{} attribute {} is required",
				designator.category, designator.attribute_id
			)));
		}
		Ok(bag)
	}

	fn resolve_uncached(&self, designator: &AttributeDesignator) -> Option<AttributeBag> {
		if let Some(bag) = self.request.lookup(designator) {
			return Some(bag);
		}
		if let Some(bag) = self.transport.direct_attribute(designator) {
			return Some(bag);
		}
		self.finders.find(designator, self)
	}

	pub fn get_subject_attribute(&self, attribute_id: &str) -> AttributeBag {
		self.get_attribute(&AttributeDesignator::subject(attribute_id))
	}

	pub fn get_resource_attribute(&self, attribute_id: &str) -> AttributeBag {
		self.get_attribute(&AttributeDesignator::resource(attribute_id))
	}

	pub fn get_action_attribute(&self, attribute_id: &str) -> AttributeBag {
		self.get_attribute(&AttributeDesignator::action(attribute_id))
	}

	pub fn get_environment_attribute(&self, attribute_id: &str) -> AttributeBag {
		self.get_attribute(&AttributeDesignator::environment(attribute_id))
	}

	/// The object pid of the resource, falling back to its resource id.
	pub fn object_pid(&self) -> Option<String> {
		self.get_resource_attribute(ids::OBJECT_PID)
			.first_text()
			.map(str::to_string)
			.or_else(|| {
				self.get_resource_attribute(ids::RESOURCE_ID)
					.first_text()
					.map(str::to_string)
			})
	}
}
