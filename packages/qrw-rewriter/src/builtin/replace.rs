//! Replaces whole term values in the user query according to a fixed table.

use std::{collections::HashMap, sync::Arc};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{ExpandedQuery, QueryRewriter, Result, RewriteContext, RewriterFactory};

pub const KIND: &str = "replace";

pub fn construct(id: &str) -> Box<dyn RewriterFactory> {
	Box::new(ReplaceFactory { id: id.to_string(), table: Arc::new(Table::default()) })
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
	rules: Map<String, Value>,
	#[serde(default)]
	ignore_case: bool,
}

#[derive(Debug, Default)]
struct Table {
	rules: HashMap<String, String>,
	ignore_case: bool,
}
impl Table {
	fn parse(config: &Map<String, Value>) -> Result<Self, Vec<String>> {
		let raw: RawSettings = super::decode(config)?;
		let mut errors = Vec::new();
		let mut rules = HashMap::with_capacity(raw.rules.len());

		if raw.rules.is_empty() {
			errors.push("rules must be non-empty.".to_string());
		}

		for (from, to) in raw.rules {
			let key = if raw.ignore_case { from.to_lowercase() } else { from.clone() };
			let Some(to) = to.as_str() else {
				errors.push(format!("rules.{from} must be a string."));

				continue;
			};

			if key.trim().is_empty() {
				errors.push("rules must not contain an empty source term.".to_string());

				continue;
			}
			if to.trim().is_empty() {
				errors.push(format!("rules.{from} must not be empty."));

				continue;
			}
			if rules.insert(key, to.to_string()).is_some() {
				errors.push(format!("rules contains duplicate source term {from:?}."));
			}
		}

		if !errors.is_empty() {
			return Err(errors);
		}

		Ok(Self { rules, ignore_case: raw.ignore_case })
	}

	fn lookup(&self, value: &str) -> Option<&str> {
		if self.ignore_case {
			self.rules.get(&value.to_lowercase()).map(String::as_str)
		} else {
			self.rules.get(value).map(String::as_str)
		}
	}
}

struct ReplaceFactory {
	id: String,
	table: Arc<Table>,
}
impl RewriterFactory for ReplaceFactory {
	fn rewriter_id(&self) -> &str {
		&self.id
	}

	fn configure(&mut self, config: &Map<String, Value>) -> Result<()> {
		let table =
			Table::parse(config).map_err(|errors| super::into_config_error(&self.id, errors))?;

		self.table = Arc::new(table);

		Ok(())
	}

	fn validate(&self, config: &Map<String, Value>) -> Vec<String> {
		Table::parse(config).err().unwrap_or_default()
	}

	fn create_rewriter(&self) -> Box<dyn QueryRewriter> {
		Box::new(ReplaceRewriter { table: self.table.clone() })
	}

	fn approx_size_bytes(&self) -> usize {
		let rules: usize =
			self.table.rules.iter().map(|(from, to)| from.len() + to.len() + 48).sum();

		128 + self.id.len() + rules
	}
}

struct ReplaceRewriter {
	table: Arc<Table>,
}
impl QueryRewriter for ReplaceRewriter {
	fn rewrite(&mut self, query: &mut ExpandedQuery, ctx: &mut RewriteContext<'_>) -> Result<()> {
		if ctx.param_bool("enabled") == Some(false) {
			return Ok(());
		}

		let table = &self.table;
		let mut actions = Vec::new();

		query.user_query.for_each_term_mut(&mut |field, value| {
			if let Some(to) = table.lookup(value) {
				actions.push(format!("{field}:{value} => {to}"));

				*value = to.to_string();
			}
		});

		for action in actions {
			ctx.record_action(action);
		}

		Ok(())
	}
}
