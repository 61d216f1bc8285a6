use std::{collections::HashMap, sync::RwLock};

use serde_json::Value;

use qrw_rewriter::RewriterDefinition;

use crate::{BoxFuture, DefinitionStore, Result, document};

/// Process-local store holding raw documents, so reads go through the same mapping as Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
	documents: RwLock<HashMap<String, Value>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores a raw document as-is, bypassing the write mapping.
	pub fn insert_document(&self, id: impl Into<String>, document: Value) {
		let mut documents = self.documents.write().unwrap_or_else(|err| err.into_inner());

		documents.insert(id.into(), document);
	}

	pub fn len(&self) -> usize {
		self.documents.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn read(&self, id: &str) -> Result<Option<RewriterDefinition>> {
		let documents = self.documents.read().unwrap_or_else(|err| err.into_inner());

		documents.get(id).map(|doc| document::from_document(id, doc)).transpose()
	}

	fn write(&self, definition: &RewriterDefinition) -> Result<()> {
		let doc = document::to_document(definition)?;

		self.insert_document(definition.id.clone(), doc);

		Ok(())
	}

	fn remove(&self, id: &str) -> bool {
		let mut documents = self.documents.write().unwrap_or_else(|err| err.into_inner());

		documents.remove(id).is_some()
	}
}
impl DefinitionStore for MemoryStore {
	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<RewriterDefinition>>> {
		Box::pin(async move { self.read(id) })
	}

	fn put<'a>(&'a self, definition: &'a RewriterDefinition) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.write(definition) })
	}

	fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(self.remove(id)) })
	}
}
