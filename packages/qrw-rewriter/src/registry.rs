use std::{collections::HashMap, fmt, sync::Arc};

use crate::{Error, Result, RewriterFactory, builtin};

/// Builds an unconfigured factory bound to a rewriter id.
pub type Constructor = Arc<dyn Fn(&str) -> Box<dyn RewriterFactory> + Send + Sync>;

/// Maps kind names, as written in definitions, to factory constructors.
#[derive(Clone, Default)]
pub struct KindRegistry {
	kinds: HashMap<String, Constructor>,
}
impl KindRegistry {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn with_builtins() -> Self {
		let mut registry = Self::empty();

		builtin::register(&mut registry);

		registry
	}

	pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
	where
		F: Fn(&str) -> Box<dyn RewriterFactory> + Send + Sync + 'static,
	{
		self.kinds.insert(kind.into(), Arc::new(constructor));

		self
	}

	pub fn resolve(&self, kind: &str) -> Result<Constructor> {
		self.kinds.get(kind).cloned().ok_or_else(|| Error::UnknownKind { kind: kind.to_string() })
	}

	pub fn kinds(&self) -> Vec<&str> {
		let mut kinds = self.kinds.keys().map(String::as_str).collect::<Vec<_>>();

		kinds.sort_unstable();

		kinds
	}
}
impl fmt::Debug for KindRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("KindRegistry").field("kinds", &self.kinds()).finish()
	}
}
