//! Emits fixed boost and filter clauses when a trigger term occurs in the user query.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use qrw_query::{BoostQuery, FilterQuery, Polarity, Query};

use crate::{ExpandedQuery, QueryRewriter, Result, RewriteContext, RewriterFactory};

pub const KIND: &str = "clauses";

pub fn construct(id: &str) -> Box<dyn RewriterFactory> {
	Box::new(ClausesFactory { id: id.to_string(), settings: Arc::new(Settings::default()) })
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
	#[serde(default)]
	triggers: Vec<String>,
	#[serde(default)]
	boosts: Vec<RawBoost>,
	#[serde(default)]
	filters: Vec<RawFilter>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBoost {
	field: String,
	value: String,
	#[serde(default = "default_weight")]
	weight: f32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilter {
	field: String,
	value: String,
	#[serde(default)]
	exclude: bool,
}

#[derive(Debug, Default)]
struct Settings {
	/// Lowercased; empty means the clauses are always emitted.
	triggers: Vec<String>,
	boosts: Vec<(String, String, f32)>,
	filters: Vec<(String, String, Polarity)>,
}
impl Settings {
	fn parse(config: &Map<String, Value>) -> Result<Self, Vec<String>> {
		let raw: RawSettings = super::decode(config)?;
		let mut errors = Vec::new();

		if raw.boosts.is_empty() && raw.filters.is_empty() {
			errors.push("At least one of boosts or filters must be non-empty.".to_string());
		}
		if raw.triggers.iter().any(|trigger| trigger.trim().is_empty()) {
			errors.push("triggers must not contain empty terms.".to_string());
		}

		for (idx, boost) in raw.boosts.iter().enumerate() {
			if boost.field.trim().is_empty() || boost.value.trim().is_empty() {
				errors.push(format!("boosts[{idx}] requires a non-empty field and value."));
			}
			if !boost.weight.is_finite() || boost.weight <= 0.0 {
				errors.push(format!(
					"boosts[{idx}].weight must be a finite number greater than zero."
				));
			}
		}
		for (idx, filter) in raw.filters.iter().enumerate() {
			if filter.field.trim().is_empty() || filter.value.trim().is_empty() {
				errors.push(format!("filters[{idx}] requires a non-empty field and value."));
			}
		}

		if !errors.is_empty() {
			return Err(errors);
		}

		Ok(Self {
			triggers: raw.triggers.iter().map(|trigger| trigger.to_lowercase()).collect(),
			boosts: raw.boosts.into_iter().map(|b| (b.field, b.value, b.weight)).collect(),
			filters: raw
				.filters
				.into_iter()
				.map(|f| {
					let polarity = if f.exclude { Polarity::Exclude } else { Polarity::Include };

					(f.field, f.value, polarity)
				})
				.collect(),
		})
	}

	fn triggered_by(&self, query: &Query) -> Option<String> {
		if self.triggers.is_empty() {
			return Some(String::new());
		}

		query
			.term_values()
			.into_iter()
			.map(|value| value.to_lowercase())
			.find(|value| self.triggers.contains(value))
	}
}

struct ClausesFactory {
	id: String,
	settings: Arc<Settings>,
}
impl RewriterFactory for ClausesFactory {
	fn rewriter_id(&self) -> &str {
		&self.id
	}

	fn configure(&mut self, config: &Map<String, Value>) -> Result<()> {
		let settings =
			Settings::parse(config).map_err(|errors| super::into_config_error(&self.id, errors))?;

		self.settings = Arc::new(settings);

		Ok(())
	}

	fn validate(&self, config: &Map<String, Value>) -> Vec<String> {
		Settings::parse(config).err().unwrap_or_default()
	}

	fn create_rewriter(&self) -> Box<dyn QueryRewriter> {
		Box::new(ClausesRewriter { settings: self.settings.clone() })
	}

	fn approx_size_bytes(&self) -> usize {
		let triggers: usize = self.settings.triggers.iter().map(|t| t.len() + 24).sum();
		let boosts: usize =
			self.settings.boosts.iter().map(|(f, v, _)| f.len() + v.len() + 56).sum();
		let filters: usize =
			self.settings.filters.iter().map(|(f, v, _)| f.len() + v.len() + 56).sum();

		128 + self.id.len() + triggers + boosts + filters
	}
}

struct ClausesRewriter {
	settings: Arc<Settings>,
}
impl QueryRewriter for ClausesRewriter {
	fn rewrite(&mut self, query: &mut ExpandedQuery, ctx: &mut RewriteContext<'_>) -> Result<()> {
		let Some(trigger) = self.settings.triggered_by(&query.user_query) else {
			return Ok(());
		};
		let factor = ctx
			.param_f32("weight_factor")
			.filter(|factor| factor.is_finite() && *factor > 0.0)
			.unwrap_or(1.0);

		for (field, value, weight) in &self.settings.boosts {
			query.boosts.push(BoostQuery {
				query: Query::term(field.as_str(), value.as_str()),
				// Both operands are finite and positive; only the product can overflow.
				weight: (weight * factor).min(f32::MAX),
			});
		}
		for (field, value, polarity) in &self.settings.filters {
			query.filters.push(FilterQuery {
				query: Query::term(field.as_str(), value.as_str()),
				polarity: *polarity,
			});
		}

		if trigger.is_empty() {
			ctx.record_action(format!(
				"Added {} boost(s) and {} filter(s).",
				self.settings.boosts.len(),
				self.settings.filters.len()
			));
		} else {
			ctx.record_action(format!(
				"Trigger {trigger:?} added {} boost(s) and {} filter(s).",
				self.settings.boosts.len(),
				self.settings.filters.len()
			));
		}

		Ok(())
	}
}

fn default_weight() -> f32 {
	1.0
}
