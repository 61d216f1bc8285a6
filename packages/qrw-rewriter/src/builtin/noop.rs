use serde_json::{Map, Value};

use crate::{ExpandedQuery, QueryRewriter, Result, RewriteContext, RewriterFactory};

pub const KIND: &str = "noop";

pub fn construct(id: &str) -> Box<dyn RewriterFactory> {
	Box::new(NoopFactory { id: id.to_string() })
}

struct NoopFactory {
	id: String,
}
impl RewriterFactory for NoopFactory {
	fn rewriter_id(&self) -> &str {
		&self.id
	}

	fn configure(&mut self, config: &Map<String, Value>) -> Result<()> {
		let errors = self.validate(config);

		if errors.is_empty() { Ok(()) } else { Err(super::into_config_error(&self.id, errors)) }
	}

	fn validate(&self, config: &Map<String, Value>) -> Vec<String> {
		config.keys().map(|key| format!("noop does not accept config key {key:?}.")).collect()
	}

	fn create_rewriter(&self) -> Box<dyn QueryRewriter> {
		Box::new(NoopRewriter)
	}

	fn approx_size_bytes(&self) -> usize {
		64 + self.id.len()
	}
}

struct NoopRewriter;
impl QueryRewriter for NoopRewriter {
	fn rewrite(&mut self, _query: &mut ExpandedQuery, _ctx: &mut RewriteContext<'_>) -> Result<()> {
		Ok(())
	}
}
