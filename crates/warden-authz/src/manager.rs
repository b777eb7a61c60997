// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Top-level policy selection.
//!
//! The [`PolicyManager`] asks the store for candidate documents, parses them
//! through a digest-checked [`PolicyCache`], keeps the ones whose target
//! matches the request and reduces the survivors to a single policy tree.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::attribute::REPOSITORY_PID;
use crate::context::EvaluationCtx;
use crate::decision::{MatchResult, Status};
use crate::error::{AuthzError, PolicyParseError};
use crate::policy::{
	parse_policy, CombiningAlgorithm, CombiningAlgorithms, PolicySet, PolicyTree, Target,
};
use crate::rights::{
	rights_policy_id, ActionAliases, RightsMetadata, RightsMetadataLoader, RightsMetadataPolicy,
};
use crate::store::PolicyStore;

/// Id of the policy set synthesized when several top-level policies apply.
pub const TOP_LEVEL_POLICY_SET_ID: &str = "urn:warden:names:policy-set:top-level";

/// Outcome of selecting the policy for a request.
#[derive(Debug, Clone)]
pub enum PolicyLookup {
	Applicable(Arc<PolicyTree>),
	NotApplicable,
	Indeterminate(Status),
}

/// Capacity of the rights-policy cache when none is configured.
pub const DEFAULT_RIGHTS_CACHE_CAPACITY: usize = 1024;

struct CacheEntry {
	digest: String,
	policy: Arc<PolicyTree>,
}

#[derive(Default)]
struct CacheState {
	entries: HashMap<String, CacheEntry>,
	/// Insertion order, oldest first. Only tracked for bounded caches.
	order: VecDeque<String>,
}

/// Parsed policies keyed by id, each tagged with the SHA-256 of its source.
///
/// A document whose digest changed is reparsed and replaces the old entry
/// whole; readers holding the previous `Arc` keep a consistent tree. A
/// bounded cache evicts its oldest entry when a new id would exceed the
/// capacity.
#[derive(Default)]
pub struct PolicyCache {
	state: RwLock<CacheState>,
	capacity: Option<usize>,
}

pub fn document_digest(document: &[u8]) -> String {
	hex::encode(Sha256::digest(document))
}

impl PolicyCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// A cache holding at most `capacity` policies (at least one).
	pub fn bounded(capacity: usize) -> Self {
		Self {
			state: RwLock::new(CacheState::default()),
			capacity: Some(capacity.max(1)),
		}
	}

	pub fn capacity(&self) -> Option<usize> {
		self.capacity
	}

	/// Returns the cached tree for `id` when `document` is unchanged, else
	/// parses it with `parse` and stores the result.
	pub fn get_or_parse<F>(
		&self,
		id: &str,
		document: &[u8],
		parse: F,
	) -> Result<Arc<PolicyTree>, PolicyParseError>
	where
		F: FnOnce(&[u8]) -> Result<PolicyTree, PolicyParseError>,
	{
		let digest = document_digest(document);
		if let Some(entry) = self.state.read().entries.get(id) {
			if entry.digest == digest {
				tracing::trace!(policy_id = %id, "policy cache hit");
				return Ok(entry.policy.clone());
			}
		}

		let policy = Arc::new(parse(document)?);
		tracing::debug!(policy_id = %id, digest = %digest, "parsed policy into cache");
		self.insert(id, digest, policy.clone());
		Ok(policy)
	}

	fn insert(&self, id: &str, digest: String, policy: Arc<PolicyTree>) {
		let mut state = self.state.write();
		let entry = CacheEntry { digest, policy };
		if state.entries.insert(id.to_string(), entry).is_some() {
			return;
		}
		let Some(capacity) = self.capacity else {
			return;
		};
		state.order.push_back(id.to_string());
		while state.entries.len() > capacity {
			let Some(oldest) = state.order.pop_front() else {
				break;
			};
			state.entries.remove(&oldest);
			tracing::trace!(policy_id = %oldest, "evicted cached policy");
		}
	}

	pub fn get(&self, id: &str) -> Option<Arc<PolicyTree>> {
		self.state.read().entries.get(id).map(|e| e.policy.clone())
	}

	pub fn invalidate(&self, id: &str) -> bool {
		let mut state = self.state.write();
		let removed = state.entries.remove(id).is_some();
		if removed && self.capacity.is_some() {
			state.order.retain(|queued| queued != id);
		}
		removed
	}

	pub fn clear(&self) {
		let mut state = self.state.write();
		state.entries.clear();
		state.order.clear();
	}

	pub fn len(&self) -> usize {
		self.state.read().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.read().entries.is_empty()
	}
}

impl fmt::Debug for PolicyCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PolicyCache")
			.field("len", &self.len())
			.field("capacity", &self.capacity)
			.finish()
	}
}

struct RightsSource {
	loader: RightsMetadataLoader,
	aliases: Arc<ActionAliases>,
}

pub struct PolicyManager {
	store: Arc<dyn PolicyStore>,
	algorithms: Arc<CombiningAlgorithms>,
	top_level: Option<CombiningAlgorithm>,
	rights: Option<RightsSource>,
	cache: PolicyCache,
	/// Rights policies are keyed by object, so this one is bounded.
	rights_cache: PolicyCache,
}

impl PolicyManager {
	pub fn new(store: Arc<dyn PolicyStore>, algorithms: Arc<CombiningAlgorithms>) -> Self {
		Self {
			store,
			algorithms,
			top_level: None,
			rights: None,
			cache: PolicyCache::new(),
			rights_cache: PolicyCache::bounded(DEFAULT_RIGHTS_CACHE_CAPACITY),
		}
	}

	/// Combines several applicable top-level policies with the named algorithm
	/// instead of failing the request.
	pub fn with_top_level_algorithm(mut self, name_or_urn: &str) -> Result<Self, AuthzError> {
		let alg = self
			.algorithms
			.resolve_policy_algorithm(name_or_urn)
			.map_err(|e| AuthzError::Configuration(format!("top-level combining algorithm: {e}")))?;
		self.top_level = Some(alg);
		Ok(self)
	}

	pub fn with_combining_algorithm(mut self, alg: CombiningAlgorithm) -> Self {
		self.top_level = Some(alg);
		self
	}

	/// Adds the rights-metadata policy of the request's object to the
	/// candidates.
	pub fn with_rights_metadata(
		mut self,
		loader: RightsMetadataLoader,
		aliases: Arc<ActionAliases>,
	) -> Self {
		self.rights = Some(RightsSource { loader, aliases });
		self
	}

	/// Caps how many objects' parsed rights policies are kept.
	pub fn with_rights_cache_capacity(mut self, capacity: usize) -> Self {
		self.rights_cache = PolicyCache::bounded(capacity);
		self
	}

	pub fn top_level_algorithm(&self) -> Option<CombiningAlgorithm> {
		self.top_level
	}

	pub fn store(&self) -> &Arc<dyn PolicyStore> {
		&self.store
	}

	pub fn cache(&self) -> &PolicyCache {
		&self.cache
	}

	pub fn rights_cache(&self) -> &PolicyCache {
		&self.rights_cache
	}

	/// Drops the parsed copy of a policy after the store changed it.
	pub fn invalidate(&self, id: &str) {
		if self.cache.invalidate(id) {
			tracing::debug!(policy_id = %id, "invalidated cached policy");
		}
	}

	#[instrument(level = "debug", skip(self, ctx))]
	pub fn get_policy(&self, ctx: &EvaluationCtx<'_>) -> PolicyLookup {
		let candidates = match self.candidates(ctx) {
			Ok(candidates) => candidates,
			Err(status) => return PolicyLookup::Indeterminate(status),
		};
		tracing::debug!(candidates = candidates.len(), "fetched candidate policies");

		let mut applicable = Vec::new();
		for policy in candidates {
			match policy.match_target(ctx) {
				MatchResult::Match => applicable.push(policy),
				MatchResult::NoMatch => {}
				MatchResult::Indeterminate(status) => {
					tracing::debug!(policy_id = %policy.id(), status = %status, "policy target indeterminate");
					return PolicyLookup::Indeterminate(status);
				}
			}
		}

		match applicable.len() {
			0 => PolicyLookup::NotApplicable,
			1 => match applicable.pop() {
				Some(policy) => PolicyLookup::Applicable(policy),
				None => PolicyLookup::NotApplicable,
			},
			n => match self.top_level {
				None => {
					let ids: Vec<&str> = applicable.iter().map(|p| p.id()).collect();
					tracing::warn!(applicable = ?ids, "several top-level policies apply and no combining algorithm is configured");
					PolicyLookup::Indeterminate(Status::processing_error(format!(
						"too many applicable top-level policies ({n})"
					)))
				}
				Some(alg) => PolicyLookup::Applicable(Arc::new(PolicyTree::PolicySet(PolicySet {
					id: TOP_LEVEL_POLICY_SET_ID.to_string(),
					description: None,
					target: Target::any(),
					policy_combining: alg,
					children: applicable,
				}))),
			},
		}
	}

	/// Parsed candidates in store order, followed by the object's rights policy.
	fn candidates(&self, ctx: &EvaluationCtx<'_>) -> Result<Vec<Arc<PolicyTree>>, Status> {
		let documents = self.store.candidate_policies(ctx).map_err(|e| {
			tracing::warn!(error = %e, "policy store query failed");
			Status::processing_error(format!("policy store unavailable: {e}"))
		})?;

		let mut policies = Vec::with_capacity(documents.len() + 1);
		for (id, document) in &documents {
			match self
				.cache
				.get_or_parse(id, document, |bytes| parse_policy(bytes, &self.algorithms))
			{
				Ok(policy) => policies.push(policy),
				Err(e) => tracing::warn!(policy_id = %id, error = %e, "skipping unparseable policy"),
			}
		}

		if let Some(rights) = &self.rights {
			if let Some(policy) = self.rights_policy(rights, ctx)? {
				policies.push(policy);
			}
		}
		Ok(policies)
	}

	fn rights_policy(
		&self,
		rights: &RightsSource,
		ctx: &EvaluationCtx<'_>,
	) -> Result<Option<Arc<PolicyTree>>, Status> {
		let Some(pid) = ctx.object_pid() else {
			return Ok(None);
		};
		if pid == REPOSITORY_PID {
			return Ok(None);
		}

		let id = rights_policy_id(&pid);
		let document = match rights.loader.load_document(&pid) {
			Ok(Some(document)) => document,
			Ok(None) => {
				self.rights_cache.invalidate(&id);
				return Ok(None);
			}
			Err(e) => {
				tracing::warn!(pid = %pid, error = %e, "rights metadata unavailable");
				return Err(Status::processing_error(format!(
					"rights metadata for {pid} unavailable: {e}"
				)));
			}
		};

		let parsed = self.rights_cache.get_or_parse(&id, &document, |bytes| {
			let metadata = RightsMetadata::parse(bytes)?;
			Ok(PolicyTree::RightsMetadata(RightsMetadataPolicy::new(
				pid.as_str(),
				metadata,
				rights.aliases.clone(),
			)))
		});
		match parsed {
			Ok(policy) => Ok(Some(policy)),
			Err(e) => {
				tracing::warn!(pid = %pid, error = %e, "skipping unparseable rights metadata");
				self.rights_cache.invalidate(&id);
				Ok(None)
			}
		}
	}
}

impl fmt::Debug for PolicyManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PolicyManager")
			.field("top_level", &self.top_level)
			.field("rights_metadata", &self.rights.is_some())
			.field("cache", &self.cache)
			.field("rights_cache", &self.rights_cache)
			.finish_non_exhaustive()
	}
}
