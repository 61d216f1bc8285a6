use std::sync::Arc;

use crate::{Error, KindRegistry, Result, RewriterDefinition, RewriterFactory};

/// Turns stored definitions into configured factories.
#[derive(Clone, Debug)]
pub struct FactoryLoader {
	registry: Arc<KindRegistry>,
}
impl FactoryLoader {
	pub fn new(registry: KindRegistry) -> Self {
		Self { registry: Arc::new(registry) }
	}

	pub fn registry(&self) -> &KindRegistry {
		&self.registry
	}

	pub fn load(
		&self,
		id: &str,
		definition: &RewriterDefinition,
	) -> Result<Arc<dyn RewriterFactory>> {
		let constructor = self.registry.resolve(&definition.kind)?;
		let mut factory = constructor(id);

		factory.configure(&definition.config)?;

		Ok(Arc::from(factory))
	}

	/// Collects every problem with `definition` without loading it.
	///
	/// An unregistered kind is an error; anything else is reported in the returned list, which is
	/// empty for a loadable definition.
	pub fn validate(&self, definition: &RewriterDefinition) -> Result<Vec<String>> {
		let constructor = self.registry.resolve(&definition.kind)?;
		let mut errors = constructor(&definition.id).validate(&definition.config);

		if let Some(logging) = definition.logging.as_ref() {
			errors.extend(logging.validate());
		}

		Ok(errors)
	}

	pub fn validate_or_error(&self, definition: &RewriterDefinition) -> Result<()> {
		let messages = self.validate(definition)?;

		if messages.is_empty() {
			Ok(())
		} else {
			Err(Error::InvalidConfig { id: definition.id.clone(), messages })
		}
	}
}
impl Default for FactoryLoader {
	fn default() -> Self {
		Self::new(KindRegistry::with_builtins())
	}
}
