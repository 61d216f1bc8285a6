use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version assigned to documents written before versioning existed.
pub const LEGACY_SCHEMA_VERSION: i32 = 1;
pub const CURRENT_SCHEMA_VERSION: i32 = 3;
pub const TRACING_SINK: &str = "tracing";

const MAX_REWRITER_ID_CHARS: usize = 128;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriterDefinition {
	pub id: String,
	pub kind: String,
	#[serde(default)]
	pub config: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logging: Option<LoggingConfig>,
	pub schema_version: i32,
}
impl RewriterDefinition {
	pub fn new(id: impl Into<String>, kind: impl Into<String>, config: Map<String, Value>) -> Self {
		Self {
			id: id.into(),
			kind: kind.into(),
			config,
			logging: None,
			schema_version: CURRENT_SCHEMA_VERSION,
		}
	}

	pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
		self.logging = Some(logging);

		self
	}

	pub fn payload(&self) -> LogPayload {
		self.logging.as_ref().map(LoggingConfig::effective_payload).unwrap_or_default()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogPayload {
	#[default]
	None,
	RewriterId,
	Detail,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
	#[serde(default)]
	pub sinks: Vec<String>,
	#[serde(default)]
	pub payload: LogPayload,
}
impl LoggingConfig {
	/// Payload that is actually emitted; nothing is emitted without a sink.
	pub fn effective_payload(&self) -> LogPayload {
		if self.sinks.is_empty() { LogPayload::None } else { self.payload }
	}

	pub fn validate(&self) -> Vec<String> {
		let mut errors = Vec::new();

		for sink in &self.sinks {
			if sink != TRACING_SINK {
				errors.push(format!("info_logging.sinks contains unknown sink {sink:?}."));
			}
		}

		if self.payload != LogPayload::None && self.sinks.is_empty() {
			errors.push(
				"info_logging.sinks must be non-empty when payload is not NONE.".to_string(),
			);
		}

		errors
	}
}

/// Rewriter ids double as request parameter path segments, so they are restricted to
/// ASCII letters, digits, `_` and `-`.
pub fn validate_rewriter_id(id: &str) -> Result<(), String> {
	if id.is_empty() {
		return Err("Rewriter id must be non-empty.".to_string());
	}
	if id.len() > MAX_REWRITER_ID_CHARS {
		return Err(format!("Rewriter id must be at most {MAX_REWRITER_ID_CHARS} characters."));
	}
	if !id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
		return Err(format!(
			"Rewriter id {id:?} may only contain ASCII letters, digits, '_' or '-'."
		));
	}

	Ok(())
}
