// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy decision core for repository access control.
//!
//! This crate turns a [`RequestCtx`] (who is asking, for what resource, to do
//! what, under which environment) into a four-valued [`Decision`] by:
//!
//! - resolving attributes lazily through an [`EvaluationCtx`] that consults the
//!   request, the transport, and an ordered [`AttributeFinderChain`]
//! - fetching candidate policies from a [`PolicyStore`] and keeping only those
//!   whose target matches ([`PolicyManager`])
//! - combining several applicable top-level policies with a configured
//!   combining algorithm, or refusing to when none is configured
//! - walking the resulting policy tree to a [`DecisionResult`]
//!
//! # Decision Flow
//!
//! ```text
//! RequestCtx ──► PolicyDecisionPoint::evaluate
//!                    │
//!                    ├── EvaluationCtx::new (one per request, owns attribute cache)
//!                    │
//!                    ├── PolicyManager::get_policy
//!                    │       ├── PolicyStore::candidate_policies
//!                    │       ├── PolicyCache (parse once per document digest)
//!                    │       └── match targets ─► 0 / 1 / N (synthetic PolicySet)
//!                    │
//!                    └── PolicyTree::evaluate ─► Permit | Deny | Indeterminate | NotApplicable
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_authz::{
//! 	attribute::ids, AttributeFinderChain, CombiningAlgorithms, Decision, MemoryPolicyStore,
//! 	PolicyDecisionPoint, PolicyManager, PolicyStore, RequestCtx,
//! };
//!
//! let store = Arc::new(MemoryPolicyStore::new());
//! store
//! 	.add_policy(
//! 		Some("permit-read"),
//! 		br#"<Policy PolicyId="permit-read"
//! 		        RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
//! 		      <Target/>
//! 		      <Rule RuleId="read" Effect="Permit"/>
//! 		    </Policy>"#,
//! 	)
//! 	.unwrap();
//!
//! let manager = PolicyManager::new(store, Arc::new(CombiningAlgorithms::standard()));
//! let pdp = PolicyDecisionPoint::new(manager, Arc::new(AttributeFinderChain::empty()));
//!
//! let request = RequestCtx::builder()
//! 	.subject_string(ids::SUBJECT_ID, "alice")
//! 	.resource_string(ids::RESOURCE_ID, "demo:1")
//! 	.action_string(ids::ACTION_ID, "read")
//! 	.build();
//!
//! assert_eq!(pdp.decide(&request, &()).decision, Decision::Permit);
//! ```

pub mod attribute;
pub mod context;
pub mod decision;
pub mod error;
pub mod finder;
pub mod manager;
pub mod pdp;
pub mod policy;
pub mod request;
pub mod rights;
pub mod store;

pub use attribute::{
	Attribute, AttributeBag, AttributeDesignator, AttributeValue, Category, DataType,
	REPOSITORY_PID,
};
pub use context::{EvaluationCtx, TransportAttributes, TransportContext};
pub use decision::{Decision, DecisionResult, MatchResult, Status, StatusCode};
pub use error::{AuthzError, FinderError, ObjectSourceError, PolicyParseError, StoreError};
pub use finder::{
	AttributeFinder, AttributeFinderChain, CurrentEnvironmentFinder, FinderDeps, FinderRegistry,
	FinderSpec, RelationshipAttributeFinder, RightsMetadataAttributeFinder,
};
pub use manager::{PolicyCache, PolicyLookup, PolicyManager, TOP_LEVEL_POLICY_SET_ID};
pub use pdp::{ContextHandler, PolicyDecisionPoint};
pub use policy::{
	CombiningAlgorithm, CombiningAlgorithms, Effect, Policy, PolicySet, PolicyTree, Rule, Target,
};
pub use request::{RequestCtx, RequestCtxBuilder};
pub use rights::{
	AccessType, ActionAliases, RightsMetadata, RightsMetadataLoader, RightsMetadataPolicy,
};
pub use store::{
	FsObjectSource, FsPolicyStore, MemoryObjectSource, MemoryPolicyStore, ObjectSource,
	PolicyStore, Relationship,
};
