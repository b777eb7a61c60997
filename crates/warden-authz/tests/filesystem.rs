// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-backed store and object source driving full decisions.

use std::sync::Arc;

use tempfile::TempDir;
use warden_authz::attribute::ids;
use warden_authz::{
	Category, CombiningAlgorithms, Decision, FinderDeps, FinderRegistry, FinderSpec,
	FsObjectSource, FsPolicyStore, ObjectSource, PolicyDecisionPoint, PolicyManager, PolicyStore,
	RequestCtx,
};

const COLLECTION_POLICY: &str = r#"<?xml version="1.0"?>
<Policy PolicyId="members-of-restricted"
	RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
	<Target><Resources><Resource>
		<ResourceMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:anyURI-equal">
			<AttributeValue DataType="http://www.w3.org/2001/XMLSchema#anyURI">info:warden/restricted</AttributeValue>
			<ResourceAttributeDesignator AttributeId="urn:test:collection"
				DataType="http://www.w3.org/2001/XMLSchema#anyURI"/>
		</ResourceMatch>
	</Resource></Resources></Target>
	<Rule RuleId="curators" Effect="Permit">
		<Condition>
			<Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-is-in">
				<AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">curator</AttributeValue>
				<SubjectAttributeDesignator AttributeId="urn:warden:names:subject:role"
					DataType="http://www.w3.org/2001/XMLSchema#string"/>
			</Apply>
		</Condition>
	</Rule>
	<Rule RuleId="everyone-else" Effect="Deny"/>
</Policy>"#;

const RELATIONSHIPS: &str = r#"[
	{"subject": "demo:1", "predicate": "info:warden/isMemberOf", "object": "info:warden/restricted"},
	{"subject": "demo:1", "predicate": "info:warden/title", "object": "A title", "is_literal": true}
]"#;

struct Fixture {
	_policies: TempDir,
	_objects: TempDir,
	pdp: PolicyDecisionPoint,
	store: Arc<FsPolicyStore>,
}

fn fixture() -> Fixture {
	let policies = TempDir::new().unwrap();
	std::fs::write(policies.path().join("members-of-restricted.xml"), COLLECTION_POLICY).unwrap();

	let objects = TempDir::new().unwrap();
	let object_dir = objects.path().join("demo:1");
	std::fs::create_dir_all(object_dir.join("datastreams")).unwrap();
	std::fs::write(object_dir.join("relationships.json"), RELATIONSHIPS).unwrap();

	let store = Arc::new(FsPolicyStore::open(policies.path()).unwrap());
	let source: Arc<dyn ObjectSource> = Arc::new(FsObjectSource::new(objects.path()));

	let specs = vec![FinderSpec::new("relationship")
		.with_option("urn:test:collection", "info:warden/isMemberOf")
		.with_designator(Category::Resource, "urn:test:collection")];
	let chain = FinderRegistry::with_defaults()
		.build_chain(&specs, &FinderDeps::new(source, "rightsMetadata"))
		.unwrap();

	let manager = PolicyManager::new(store.clone(), Arc::new(CombiningAlgorithms::standard()));
	Fixture {
		_policies: policies,
		_objects: objects,
		pdp: PolicyDecisionPoint::new(manager, Arc::new(chain)),
		store,
	}
}

fn request(subject: &str, roles: &[&str], pid: &str) -> RequestCtx {
	RequestCtx::builder()
		.subject_string(ids::SUBJECT_ID, subject)
		.subject_strings(ids::SUBJECT_ROLE, roles.iter().copied())
		.resource_string(ids::RESOURCE_ID, pid)
		.action_string(ids::ACTION_ID, "read")
		.build()
}

#[test]
fn relationship_attributes_drive_target_matching() {
	let f = fixture();
	assert_eq!(
		f.pdp.decide(&request("alice", &["curator"], "demo:1"), &()).decision,
		Decision::Permit
	);
	assert_eq!(
		f.pdp.decide(&request("bob", &["visitor"], "demo:1"), &()).decision,
		Decision::Deny
	);
	assert_eq!(
		f.pdp.decide(&request("alice", &["curator"], "demo:2"), &()).decision,
		Decision::NotApplicable
	);
}

#[test]
fn policy_updates_take_effect_on_next_decision() {
	let f = fixture();
	let open = COLLECTION_POLICY.replace(r#"Effect="Deny""#, r#"Effect="Permit""#);
	f.store
		.update_policy("members-of-restricted", open.as_bytes())
		.unwrap();

	assert_eq!(
		f.pdp.decide(&request("bob", &["visitor"], "demo:1"), &()).decision,
		Decision::Permit
	);
}

#[test]
fn deleting_the_only_policy_leaves_nothing_applicable() {
	let f = fixture();
	f.store.delete_policy("members-of-restricted").unwrap();
	assert_eq!(
		f.pdp.decide(&request("alice", &["curator"], "demo:1"), &()).decision,
		Decision::NotApplicable
	);
}
