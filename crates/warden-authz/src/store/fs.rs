// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filesystem-backed policy store and object source.
//!
//! Policies live one per file as `<policy_dir>/<id>.xml`. Objects live under
//! `<root>/<pid>/`, with datastream bytes at `datastreams/<dsid>`, an optional
//! `datastreams/<dsid>.mime` holding the content type, and the object's
//! relationships as a JSON array in `relationships.json`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::{
	admit_document, filter_relationships, validate_pid, validate_policy_id, ObjectSource,
	PolicyStore, Relationship,
};
use crate::context::EvaluationCtx;
use crate::error::{ObjectSourceError, StoreError};

const POLICY_EXTENSION: &str = "xml";

/// Policy directory mirrored in memory; writes go to disk first.
#[derive(Debug)]
pub struct FsPolicyStore {
	dir: PathBuf,
	documents: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl FsPolicyStore {
	/// Opens `dir`, creating it when missing, and loads every policy file.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();
		std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
			path: dir.clone(),
			source,
		})?;
		let store = Self {
			dir,
			documents: RwLock::new(BTreeMap::new()),
		};
		store.reload()?;
		Ok(store)
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Re-reads the directory, replacing the in-memory view wholesale.
	pub fn reload(&self) -> Result<usize, StoreError> {
		let io_err = |source| StoreError::Io {
			path: self.dir.clone(),
			source,
		};

		let mut documents = BTreeMap::new();
		for entry in std::fs::read_dir(&self.dir).map_err(io_err)? {
			let path = entry.map_err(io_err)?.path();
			if path.extension().and_then(|e| e.to_str()) != Some(POLICY_EXTENSION) {
				continue;
			}
			let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
				continue;
			};
			if validate_policy_id(id).is_err() {
				continue;
			}
			let bytes = std::fs::read(&path).map_err(|source| StoreError::Io {
				path: path.clone(),
				source,
			})?;
			documents.insert(id.to_string(), bytes);
		}

		let count = documents.len();
		*self.documents.write() = documents;
		tracing::debug!(dir = %self.dir.display(), policies = count, "policy directory loaded");
		Ok(count)
	}

	fn path_for(&self, id: &str) -> PathBuf {
		self.dir.join(format!("{id}.{POLICY_EXTENSION}"))
	}

	fn write_file(&self, id: &str, document: &[u8]) -> Result<(), StoreError> {
		let path = self.path_for(id);
		let tmp = self.dir.join(format!(".{id}.{POLICY_EXTENSION}.tmp"));
		std::fs::write(&tmp, document).map_err(|source| StoreError::Io {
			path: tmp.clone(),
			source,
		})?;
		std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
	}
}

impl PolicyStore for FsPolicyStore {
	fn candidate_policies(
		&self,
		_ctx: &EvaluationCtx<'_>,
	) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
		Ok(self.documents.read().clone())
	}

	fn add_policy(&self, id: Option<&str>, document: &[u8]) -> Result<String, StoreError> {
		let id = admit_document(id, document)?;
		let mut documents = self.documents.write();
		if documents.contains_key(&id) {
			return Err(StoreError::AlreadyExists(id));
		}
		self.write_file(&id, document)?;
		documents.insert(id.clone(), document.to_vec());
		tracing::info!(policy_id = %id, "policy added");
		Ok(id)
	}

	fn update_policy(&self, id: &str, document: &[u8]) -> Result<(), StoreError> {
		admit_document(Some(id), document)?;
		let mut documents = self.documents.write();
		if !documents.contains_key(id) {
			return Err(StoreError::NotFound(id.to_string()));
		}
		self.write_file(id, document)?;
		documents.insert(id.to_string(), document.to_vec());
		tracing::info!(policy_id = %id, "policy updated");
		Ok(())
	}

	fn delete_policy(&self, id: &str) -> Result<(), StoreError> {
		validate_policy_id(id)?;
		let mut documents = self.documents.write();
		if documents.remove(id).is_none() {
			return Err(StoreError::NotFound(id.to_string()));
		}
		let path = self.path_for(id);
		match std::fs::remove_file(&path) {
			Ok(()) => {}
			Err(e) if e.kind() == ErrorKind::NotFound => {}
			Err(source) => return Err(StoreError::Io { path, source }),
		}
		tracing::info!(policy_id = %id, "policy deleted");
		Ok(())
	}

	fn list_policies(&self) -> Result<Vec<String>, StoreError> {
		Ok(self.documents.read().keys().cloned().collect())
	}

	fn get_policy(&self, id: &str) -> Result<Vec<u8>, StoreError> {
		self.documents
			.read()
			.get(id)
			.cloned()
			.ok_or_else(|| StoreError::NotFound(id.to_string()))
	}
}

/// Objects laid out on disk, one directory per pid.
#[derive(Debug, Clone)]
pub struct FsObjectSource {
	root: PathBuf,
}

impl FsObjectSource {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn datastream_path(&self, pid: &str, datastream_id: &str) -> Result<PathBuf, ObjectSourceError> {
		validate_pid(pid)?;
		validate_pid(datastream_id)?;
		Ok(self.root.join(pid).join("datastreams").join(datastream_id))
	}
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ObjectSourceError> {
	match std::fs::read(path) {
		Ok(bytes) => Ok(Some(bytes)),
		Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
		Err(source) => Err(ObjectSourceError::Io {
			path: path.to_path_buf(),
			source,
		}),
	}
}

impl ObjectSource for FsObjectSource {
	fn datastream_content(
		&self,
		pid: &str,
		datastream_id: &str,
	) -> Result<Option<Vec<u8>>, ObjectSourceError> {
		read_optional(&self.datastream_path(pid, datastream_id)?)
	}

	fn datastream_mime_type(
		&self,
		pid: &str,
		datastream_id: &str,
	) -> Result<Option<String>, ObjectSourceError> {
		let path = self
			.datastream_path(pid, datastream_id)?
			.with_extension("mime");
		Ok(read_optional(&path)?
			.map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
			.filter(|mime| !mime.is_empty()))
	}

	fn relationships(
		&self,
		pid: &str,
		predicate: Option<&str>,
	) -> Result<Vec<Relationship>, ObjectSourceError> {
		validate_pid(pid)?;
		let path = self.root.join(pid).join("relationships.json");
		let Some(bytes) = read_optional(&path)? else {
			return Ok(Vec::new());
		};
		let all: Vec<Relationship> =
			serde_json::from_slice(&bytes).map_err(|source| ObjectSourceError::Relationships {
				pid: pid.to_string(),
				source,
			})?;
		Ok(filter_relationships(&all, predicate))
	}
}
