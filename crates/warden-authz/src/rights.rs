// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Object-embedded rights metadata and the policy it drives.
//!
//! A rights document grants access types to people and groups:
//!
//! ```xml
//! <rightsMetadata>
//!   <access type="discover"><machine><group>public</group></machine></access>
//!   <access type="read"><machine><person>researcher1</person></machine></access>
//!   <access type="edit"><machine><group>curators</group></machine></access>
//!   <embargo><machine><date>2030-01-01</date></machine></embargo>
//! </rightsMetadata>
//! ```
//!
//! Access types form a ladder: an edit grant also grants read and discover,
//! and a read grant also grants discover. While an embargo is in force only
//! edit grants count.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::attribute::{ids, REPOSITORY_PID};
use crate::context::EvaluationCtx;
use crate::decision::{DecisionResult, MatchResult, Status};
use crate::error::{FinderError, PolicyParseError};
use crate::policy::xml::{parse_document, Element};
use crate::store::ObjectSource;

/// Group name that grants access to every caller, anonymous ones included.
pub const PUBLIC_GROUP: &str = "public";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessType {
	Discover,
	Read,
	Edit,
}

impl AccessType {
	pub const ALL: [AccessType; 3] = [AccessType::Discover, AccessType::Read, AccessType::Edit];

	pub fn as_str(&self) -> &'static str {
		match self {
			AccessType::Discover => "discover",
			AccessType::Read => "read",
			AccessType::Edit => "edit",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"discover" => Some(AccessType::Discover),
			"read" => Some(AccessType::Read),
			"edit" => Some(AccessType::Edit),
			_ => None,
		}
	}
}

impl fmt::Display for AccessType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Grants {
	persons: BTreeSet<String>,
	groups: BTreeSet<String>,
}

/// Parsed rights document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RightsMetadata {
	grants: BTreeMap<AccessType, Grants>,
	embargo_release: Option<NaiveDate>,
}

impl RightsMetadata {
	pub fn parse(bytes: &[u8]) -> Result<Self, PolicyParseError> {
		let root = parse_document(bytes)?;
		if root.name != "rightsMetadata" {
			return Err(PolicyParseError::UnexpectedRoot(root.name));
		}

		let mut rights = RightsMetadata::default();
		for access in root.children_named("access") {
			let kind = access.required_attribute("type")?;
			let Some(access_type) = AccessType::parse(kind) else {
				tracing::debug!(access_type = %kind, "ignoring unknown rights access type");
				continue;
			};
			let grants = rights.grants.entry(access_type).or_default();
			for machine in access.children_named("machine") {
				grants.persons.extend(texts(machine, "person"));
				grants.groups.extend(texts(machine, "group"));
			}
		}

		if let Some(embargo) = root.child("embargo") {
			let date = embargo
				.children_named("machine")
				.flat_map(|m| m.children_named("date"))
				.map(|d| d.text.trim())
				.find(|t| !t.is_empty());
			if let Some(date) = date {
				let release = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
					PolicyParseError::InvalidValue {
						data_type: "date".into(),
						value: date.to_string(),
					}
				})?;
				rights.embargo_release = Some(release);
			}
		}

		Ok(rights)
	}

	pub fn embargo_release_date(&self) -> Option<NaiveDate> {
		self.embargo_release
	}

	pub fn is_embargoed(&self, today: NaiveDate) -> bool {
		self.embargo_release.is_some_and(|release| today < release)
	}

	fn granting(&self, access: AccessType, embargoed: bool) -> impl Iterator<Item = &Grants> {
		self.grants
			.iter()
			.filter(move |(kind, _)| {
				if embargoed {
					**kind == AccessType::Edit
				} else {
					**kind >= access
				}
			})
			.map(|(_, g)| g)
	}

	/// People holding `access`, directly or through a higher access type.
	pub fn persons(&self, access: AccessType, today: NaiveDate) -> BTreeSet<&str> {
		let embargoed = self.is_embargoed(today);
		self.granting(access, embargoed)
			.flat_map(|g| g.persons.iter().map(String::as_str))
			.collect()
	}

	/// Groups holding `access`, directly or through a higher access type.
	pub fn groups(&self, access: AccessType, today: NaiveDate) -> BTreeSet<&str> {
		let embargoed = self.is_embargoed(today);
		self.granting(access, embargoed)
			.flat_map(|g| g.groups.iter().map(String::as_str))
			.collect()
	}

	/// Whether `subject` (or one of `groups`) holds `access` on `today`.
	pub fn permits(
		&self,
		access: AccessType,
		subject: Option<&str>,
		groups: &[&str],
		today: NaiveDate,
	) -> bool {
		let granted_groups = self.groups(access, today);
		if granted_groups.contains(PUBLIC_GROUP) {
			return true;
		}
		if subject.is_some_and(|s| self.persons(access, today).contains(s)) {
			return true;
		}
		groups.iter().any(|g| granted_groups.contains(g))
	}
}

fn texts<'a>(element: &'a Element, name: &'a str) -> impl Iterator<Item = String> + 'a {
	element
		.children_named(name)
		.map(|e| e.text.trim().to_string())
		.filter(|t| !t.is_empty())
}

/// Maps request action ids onto rights access types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionAliases {
	aliases: HashMap<String, AccessType>,
}

impl ActionAliases {
	pub fn new() -> Self {
		Self::default()
	}

	/// Each access type's own name maps to itself.
	pub fn standard() -> Self {
		let mut aliases = Self::new();
		for access in AccessType::ALL {
			aliases.insert(access.as_str(), access);
		}
		aliases
	}

	pub fn insert(&mut self, action: impl Into<String>, access: AccessType) {
		self.aliases.insert(action.into(), access);
	}

	pub fn with(mut self, action: impl Into<String>, access: AccessType) -> Self {
		self.insert(action, access);
		self
	}

	pub fn resolve(&self, action: &str) -> Option<AccessType> {
		self.aliases.get(action).copied()
	}

	pub fn len(&self) -> usize {
		self.aliases.len()
	}

	pub fn is_empty(&self) -> bool {
		self.aliases.is_empty()
	}
}

/// Id under which an object's rights policy is cached and reported.
pub fn rights_policy_id(pid: &str) -> String {
	format!("urn:warden:names:policy:rights-metadata:{pid}")
}

/// A policy bound to one object and decided by that object's rights document.
#[derive(Debug, Clone)]
pub struct RightsMetadataPolicy {
	id: String,
	pid: String,
	rights: RightsMetadata,
	aliases: Arc<ActionAliases>,
}

impl RightsMetadataPolicy {
	pub fn new(pid: impl Into<String>, rights: RightsMetadata, aliases: Arc<ActionAliases>) -> Self {
		let pid = pid.into();
		Self {
			id: rights_policy_id(&pid),
			pid,
			rights,
			aliases,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn pid(&self) -> &str {
		&self.pid
	}

	pub fn rights(&self) -> &RightsMetadata {
		&self.rights
	}

	pub fn match_target(&self, ctx: &EvaluationCtx<'_>) -> MatchResult {
		match ctx.object_pid() {
			Some(pid) if pid == REPOSITORY_PID => MatchResult::NoMatch,
			Some(pid) if pid == self.pid => MatchResult::Match,
			_ => MatchResult::NoMatch,
		}
	}

	pub fn evaluate(&self, ctx: &EvaluationCtx<'_>) -> DecisionResult {
		match self.match_target(ctx) {
			MatchResult::Match => {}
			MatchResult::NoMatch => return DecisionResult::not_applicable(),
			MatchResult::Indeterminate(status) => return DecisionResult::indeterminate(status),
		}

		let actions = ctx.get_action_attribute(ids::ACTION_ID);
		let mut requested = Vec::new();
		for action in actions.texts() {
			match self.aliases.resolve(action) {
				Some(access) => requested.push(access),
				None => {
					return DecisionResult::indeterminate(Status::processing_error(format!(
						"action {action} has no rights metadata mapping"
					)));
				}
			}
		}
		if requested.is_empty() {
			return DecisionResult::indeterminate(Status::missing_attribute(
				"action-id is required by rights metadata",
			));
		}

		// Any subject-id may carry the grant; every requested action needs one.
		let subjects = ctx.get_subject_attribute(ids::SUBJECT_ID);
		let subject_ids: Vec<&str> = subjects.texts().collect();
		let roles = ctx.get_subject_attribute(ids::SUBJECT_ROLE);
		let groups: Vec<&str> = roles.texts().collect();
		let today = ctx.current_date_time().date_naive();

		let granted = |access: AccessType| {
			if subject_ids.is_empty() {
				self.rights.permits(access, None, &groups, today)
			} else {
				subject_ids
					.iter()
					.any(|subject| self.rights.permits(access, Some(*subject), &groups, today))
			}
		};

		match requested.into_iter().find(|access| !granted(*access)) {
			None => DecisionResult::permit(),
			Some(access) => {
				tracing::debug!(
					pid = %self.pid,
					access = %access,
					subjects = ?subject_ids,
					"rights metadata grants no access"
				);
				DecisionResult::deny()
			}
		}
	}
}

/// Reads an object's rights datastream through an [`ObjectSource`].
#[derive(Clone)]
pub struct RightsMetadataLoader {
	source: Arc<dyn ObjectSource>,
	datastream_id: String,
}

impl RightsMetadataLoader {
	pub fn new(source: Arc<dyn ObjectSource>, datastream_id: impl Into<String>) -> Self {
		Self {
			source,
			datastream_id: datastream_id.into(),
		}
	}

	pub fn datastream_id(&self) -> &str {
		&self.datastream_id
	}

	/// Raw rights document of `pid`, if the object has one.
	pub fn load_document(&self, pid: &str) -> Result<Option<Vec<u8>>, FinderError> {
		Ok(self.source.datastream_content(pid, &self.datastream_id)?)
	}

	pub fn load(&self, pid: &str) -> Result<Option<RightsMetadata>, FinderError> {
		match self.load_document(pid)? {
			Some(bytes) => Ok(Some(RightsMetadata::parse(&bytes)?)),
			None => Ok(None),
		}
	}
}

impl fmt::Debug for RightsMetadataLoader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RightsMetadataLoader")
			.field("datastream_id", &self.datastream_id)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attribute::{Attribute, AttributeValue};
	use crate::decision::{Decision, StatusCode};
	use crate::finder::AttributeFinderChain;
	use crate::request::RequestCtx;
	use crate::store::MemoryObjectSource;
	use chrono::{TimeZone, Utc};

	const RESEARCHER_READ: &[u8] = br#"<rightsMetadata xmlns="http://hydra-collab.stanford.edu/schemas/rightsMetadata/v1" version="0.1">
		<access type="read"><human/><machine><person>researcher1</person></machine></access>
	</rightsMetadata>"#;

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	fn policy(doc: &[u8]) -> RightsMetadataPolicy {
		RightsMetadataPolicy::new(
			"demo:1",
			RightsMetadata::parse(doc).unwrap(),
			Arc::new(ActionAliases::standard().with("get-datastream-content", AccessType::Read)),
		)
	}

	fn decide(policy: &RightsMetadataPolicy, request: RequestCtx) -> DecisionResult {
		let chain = AttributeFinderChain::empty();
		let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
		let ctx = EvaluationCtx::at(&request, &(), &chain, now);
		policy.evaluate(&ctx)
	}

	fn request(pid: &str, subject: &str, action: &str) -> RequestCtx {
		RequestCtx::builder()
			.subject_string(ids::SUBJECT_ID, subject)
			.resource_string(ids::RESOURCE_ID, pid)
			.action_string(ids::ACTION_ID, action)
			.build()
	}

	mod document {
		use super::*;

		#[test]
		fn parses_grants_and_embargo() {
			let rights = RightsMetadata::parse(
				br#"<rightsMetadata>
					<access type="discover"><machine><group>public</group></machine></access>
					<access type="edit"><machine><person>curator</person><group>staff</group></machine></access>
					<embargo><human>until 2030</human><machine><date>2030-01-01</date></machine></embargo>
				</rightsMetadata>"#,
			)
			.unwrap();

			assert_eq!(rights.embargo_release_date(), Some(date(2030, 1, 1)));
			let today = date(2031, 1, 1);
			assert!(rights.groups(AccessType::Discover, today).contains("public"));
			assert!(rights.persons(AccessType::Read, today).contains("curator"));
			assert!(!rights.groups(AccessType::Read, today).contains("public"));
		}

		#[test]
		fn rejects_other_documents() {
			assert!(matches!(
				RightsMetadata::parse(b"<Policy/>"),
				Err(PolicyParseError::UnexpectedRoot(_))
			));
			assert!(RightsMetadata::parse(
				b"<rightsMetadata><embargo><machine><date>soon</date></machine></embargo></rightsMetadata>"
			)
			.is_err());
		}

		#[test]
		fn embargo_suppresses_all_but_edit_grants() {
			let rights = RightsMetadata::parse(
				br#"<rightsMetadata>
					<access type="read"><machine><group>public</group><person>reader</person></machine></access>
					<access type="edit"><machine><person>editor</person></machine></access>
					<embargo><machine><date>2030-01-01</date></machine></embargo>
				</rightsMetadata>"#,
			)
			.unwrap();

			let during = date(2029, 12, 31);
			let after = date(2030, 1, 1);
			assert!(!rights.permits(AccessType::Read, Some("reader"), &[], during));
			assert!(!rights.permits(AccessType::Read, None, &[], during));
			assert!(rights.permits(AccessType::Read, Some("editor"), &[], during));
			assert!(rights.permits(AccessType::Read, None, &[], after));
		}

		#[test]
		fn groups_grant_through_roles() {
			let rights = RightsMetadata::parse(
				br#"<rightsMetadata><access type="edit"><machine><group>staff</group></machine></access></rightsMetadata>"#,
			)
			.unwrap();
			let today = date(2025, 1, 1);
			assert!(rights.permits(AccessType::Discover, Some("x"), &["staff"], today));
			assert!(!rights.permits(AccessType::Discover, Some("x"), &["guests"], today));
		}
	}

	mod policy {
		use super::*;

		#[test]
		fn grants_listed_subject() {
			let p = policy(RESEARCHER_READ);
			assert_eq!(
				decide(&p, request("demo:1", "researcher1", "read")).decision,
				Decision::Permit
			);
		}

		#[test]
		fn denies_unlisted_subject() {
			let p = policy(RESEARCHER_READ);
			assert_eq!(
				decide(&p, request("demo:1", "other", "read")).decision,
				Decision::Deny
			);
		}

		#[test]
		fn any_subject_id_may_carry_the_grant() {
			let p = policy(RESEARCHER_READ);
			let request = |subjects: [&str; 2]| {
				RequestCtx::builder()
					.subject_strings(ids::SUBJECT_ID, subjects)
					.resource_string(ids::RESOURCE_ID, "demo:1")
					.action_string(ids::ACTION_ID, "read")
					.build()
			};
			assert_eq!(
				decide(&p, request(["r1@example.org", "researcher1"])).decision,
				Decision::Permit
			);
			assert_eq!(
				decide(&p, request(["r1@example.org", "other"])).decision,
				Decision::Deny
			);
		}

		#[test]
		fn every_action_id_must_be_granted() {
			let p = policy(
				br#"<rightsMetadata>
					<access type="discover"><machine><group>public</group></machine></access>
					<access type="read"><machine><person>researcher1</person></machine></access>
				</rightsMetadata>"#,
			);
			let request = |actions: [&str; 2]| {
				let bag = actions.into_iter().map(AttributeValue::string).collect();
				RequestCtx::builder()
					.subject_string(ids::SUBJECT_ID, "other")
					.resource_string(ids::RESOURCE_ID, "demo:1")
					.action(Attribute::new(ids::ACTION_ID, bag))
					.build()
			};
			assert_eq!(
				decide(&p, request(["discover", "discover"])).decision,
				Decision::Permit
			);
			assert_eq!(decide(&p, request(["discover", "read"])).decision, Decision::Deny);
			assert_eq!(
				decide(&p, request(["discover", "unmapped-action"])).decision,
				Decision::Indeterminate
			);
		}

		#[test]
		fn unmapped_action_is_indeterminate() {
			let p = policy(RESEARCHER_READ);
			let result = decide(&p, request("demo:1", "researcher1", "unmapped-action"));
			assert_eq!(result.decision, Decision::Indeterminate);
			assert_eq!(result.status.code, StatusCode::ProcessingError);
		}

		#[test]
		fn aliases_map_actions_onto_access_types() {
			let p = policy(RESEARCHER_READ);
			assert_eq!(
				decide(&p, request("demo:1", "researcher1", "get-datastream-content")).decision,
				Decision::Permit
			);
		}

		#[test]
		fn repository_sentinel_never_matches() {
			let p = RightsMetadataPolicy::new(
				REPOSITORY_PID,
				RightsMetadata::parse(RESEARCHER_READ).unwrap(),
				Arc::new(ActionAliases::standard()),
			);
			let req = request(REPOSITORY_PID, "researcher1", "read");
			let chain = AttributeFinderChain::empty();
			let ctx = EvaluationCtx::new(&req, &(), &chain);
			assert_eq!(p.match_target(&ctx), MatchResult::NoMatch);
			assert_eq!(p.evaluate(&ctx).decision, Decision::NotApplicable);
		}

		#[test]
		fn other_objects_do_not_match() {
			let p = policy(RESEARCHER_READ);
			assert_eq!(
				decide(&p, request("demo:2", "researcher1", "read")).decision,
				Decision::NotApplicable
			);
		}
	}

	mod loader {
		use super::*;

		#[test]
		fn loads_configured_datastream() {
			let source = Arc::new(MemoryObjectSource::new());
			source.put_datastream("demo:1", "rightsMetadata", RESEARCHER_READ, None);
			let loader = RightsMetadataLoader::new(source, "rightsMetadata");

			assert!(loader.load("demo:1").unwrap().is_some());
			assert!(loader.load("demo:2").unwrap().is_none());
		}

		#[test]
		fn malformed_document_is_an_error() {
			let source = Arc::new(MemoryObjectSource::new());
			source.put_datastream("demo:1", "rightsMetadata", "<rightsMetadata>", None);
			let loader = RightsMetadataLoader::new(source, "rightsMetadata");
			assert!(matches!(loader.load("demo:1"), Err(FinderError::Rights(_))));
		}
	}
}
