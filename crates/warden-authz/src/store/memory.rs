// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use super::{admit_document, filter_relationships, ObjectSource, PolicyStore, Relationship};
use crate::context::EvaluationCtx;
use crate::error::{ObjectSourceError, StoreError};

/// Policy store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
	policies: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryPolicyStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.policies.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.policies.read().is_empty()
	}

	/// Inserts without validation. Lets tests seed malformed documents.
	pub fn insert_raw(&self, id: impl Into<String>, document: impl Into<Vec<u8>>) {
		self.policies.write().insert(id.into(), document.into());
	}
}

impl PolicyStore for MemoryPolicyStore {
	fn candidate_policies(
		&self,
		_ctx: &EvaluationCtx<'_>,
	) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
		Ok(self.policies.read().clone())
	}

	fn add_policy(&self, id: Option<&str>, document: &[u8]) -> Result<String, StoreError> {
		let id = admit_document(id, document)?;
		let mut policies = self.policies.write();
		if policies.contains_key(&id) {
			return Err(StoreError::AlreadyExists(id));
		}
		policies.insert(id.clone(), document.to_vec());
		Ok(id)
	}

	fn update_policy(&self, id: &str, document: &[u8]) -> Result<(), StoreError> {
		admit_document(Some(id), document)?;
		let mut policies = self.policies.write();
		match policies.get_mut(id) {
			Some(existing) => {
				*existing = document.to_vec();
				Ok(())
			}
			None => Err(StoreError::NotFound(id.to_string())),
		}
	}

	fn delete_policy(&self, id: &str) -> Result<(), StoreError> {
		self.policies
			.write()
			.remove(id)
			.map(|_| ())
			.ok_or_else(|| StoreError::NotFound(id.to_string()))
	}

	fn list_policies(&self) -> Result<Vec<String>, StoreError> {
		Ok(self.policies.read().keys().cloned().collect())
	}

	fn get_policy(&self, id: &str) -> Result<Vec<u8>, StoreError> {
		self.policies
			.read()
			.get(id)
			.cloned()
			.ok_or_else(|| StoreError::NotFound(id.to_string()))
	}
}

#[derive(Debug, Default, Clone)]
struct StoredObject {
	datastreams: HashMap<String, (Vec<u8>, Option<String>)>,
	relationships: Vec<Relationship>,
}

/// Object source held in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectSource {
	objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn put_datastream(
		&self,
		pid: &str,
		datastream_id: &str,
		content: impl Into<Vec<u8>>,
		mime_type: Option<&str>,
	) {
		self.objects
			.write()
			.entry(pid.to_string())
			.or_default()
			.datastreams
			.insert(
				datastream_id.to_string(),
				(content.into(), mime_type.map(str::to_string)),
			);
	}

	pub fn remove_datastream(&self, pid: &str, datastream_id: &str) -> bool {
		self.objects
			.write()
			.get_mut(pid)
			.is_some_and(|object| object.datastreams.remove(datastream_id).is_some())
	}

	pub fn add_relationship(&self, pid: &str, predicate: &str, object: &str, is_literal: bool) {
		self.objects
			.write()
			.entry(pid.to_string())
			.or_default()
			.relationships
			.push(Relationship {
				subject: pid.to_string(),
				predicate: predicate.to_string(),
				object: object.to_string(),
				is_literal,
			});
	}
}

impl ObjectSource for MemoryObjectSource {
	fn datastream_content(
		&self,
		pid: &str,
		datastream_id: &str,
	) -> Result<Option<Vec<u8>>, ObjectSourceError> {
		Ok(self
			.objects
			.read()
			.get(pid)
			.and_then(|o| o.datastreams.get(datastream_id))
			.map(|(content, _)| content.clone()))
	}

	fn datastream_mime_type(
		&self,
		pid: &str,
		datastream_id: &str,
	) -> Result<Option<String>, ObjectSourceError> {
		Ok(self
			.objects
			.read()
			.get(pid)
			.and_then(|o| o.datastreams.get(datastream_id))
			.and_then(|(_, mime)| mime.clone()))
	}

	fn relationships(
		&self,
		pid: &str,
		predicate: Option<&str>,
	) -> Result<Vec<Relationship>, ObjectSourceError> {
		Ok(self
			.objects
			.read()
			.get(pid)
			.map(|o| filter_relationships(&o.relationships, predicate))
			.unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const POLICY: &[u8] = br#"<Policy PolicyId="p1" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable"><Rule RuleId="r" Effect="Permit"/></Policy>"#;

	mod policies {
		use super::*;

		#[test]
		fn add_uses_declared_id_when_none_given() {
			let store = MemoryPolicyStore::new();
			assert_eq!(store.add_policy(None, POLICY).unwrap(), "p1");
			assert_eq!(store.list_policies().unwrap(), vec!["p1".to_string()]);
		}

		#[test]
		fn add_rejects_duplicates_and_malformed_documents() {
			let store = MemoryPolicyStore::new();
			store.add_policy(Some("p1"), POLICY).unwrap();
			assert!(matches!(
				store.add_policy(Some("p1"), POLICY),
				Err(StoreError::AlreadyExists(_))
			));
			assert!(matches!(
				store.add_policy(Some("bad"), b"<Policy"),
				Err(StoreError::InvalidDocument(_))
			));
		}

		#[test]
		fn update_and_delete_require_existing_policy() {
			let store = MemoryPolicyStore::new();
			assert!(matches!(
				store.update_policy("p1", POLICY),
				Err(StoreError::NotFound(_))
			));
			store.add_policy(Some("p1"), POLICY).unwrap();
			store.update_policy("p1", POLICY).unwrap();
			store.delete_policy("p1").unwrap();
			assert!(store.get_policy("p1").is_err());
			assert!(store.delete_policy("p1").is_err());
		}
	}

	mod objects {
		use super::*;

		#[test]
		fn serves_datastreams_and_mime_types() {
			let source = MemoryObjectSource::new();
			source.put_datastream("demo:1", "DC", "<dc/>", Some("text/xml"));

			assert_eq!(
				source.datastream_content("demo:1", "DC").unwrap(),
				Some(b"<dc/>".to_vec())
			);
			assert_eq!(
				source.datastream_mime_type("demo:1", "DC").unwrap().as_deref(),
				Some("text/xml")
			);
			assert_eq!(source.datastream_content("demo:1", "RELS").unwrap(), None);
			assert_eq!(source.datastream_content("demo:2", "DC").unwrap(), None);
		}

		#[test]
		fn filters_relationships_by_predicate() {
			let source = MemoryObjectSource::new();
			source.add_relationship("demo:1", "info:rel/isMemberOf", "demo:c1", false);
			source.add_relationship("demo:1", "info:rel/isMemberOf", "demo:c2", false);
			source.add_relationship("demo:1", "info:rel/owner", "alice", true);

			let members = source
				.relationships("demo:1", Some("info:rel/isMemberOf"))
				.unwrap();
			assert_eq!(members.len(), 2);
			assert!(source.relationships("demo:9", None).unwrap().is_empty());
		}
	}
}
