//! Mapping between stored definition documents and [`RewriterDefinition`].
//!
//! Two layouts are readable. The legacy layout has no `version` field and keeps the config under
//! `config`, either inline or as JSON text. The current layout carries `version = 3`, stores the
//! config as JSON text under `config_v_003`, and may carry `info_logging`. Writes always produce
//! the current layout.

use serde_json::{Map, Value};

use qrw_rewriter::{
	CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION, LoggingConfig, RewriterDefinition,
};

use crate::{Error, Result};

pub const DOCUMENT_TYPE: &str = "rewriter";

const CURRENT_CONFIG_FIELD: &str = "config_v_003";
const LEGACY_CONFIG_FIELD: &str = "config";

pub fn from_document(id: &str, document: &Value) -> Result<RewriterDefinition> {
	let invalid = |message: String| Error::InvalidDocument { id: id.to_string(), message };
	let Some(fields) = document.as_object() else {
		return Err(invalid("Document must be a JSON object.".to_string()));
	};

	match fields.get("type").and_then(Value::as_str) {
		Some(DOCUMENT_TYPE) => {},
		Some(other) => return Err(invalid(format!("Unexpected document type {other:?}."))),
		None => return Err(invalid("Document type is missing.".to_string())),
	}

	let kind = fields
		.get("class")
		.and_then(Value::as_str)
		.filter(|kind| !kind.trim().is_empty())
		.ok_or_else(|| invalid("Document class is missing.".to_string()))?;
	let version = match fields.get("version") {
		None | Some(Value::Null) => LEGACY_SCHEMA_VERSION,
		Some(value) => value
			.as_i64()
			.and_then(|version| i32::try_from(version).ok())
			.ok_or_else(|| invalid(format!("Document version {value} is not an integer.")))?,
	};
	let (config, logging) = match version {
		LEGACY_SCHEMA_VERSION => {
			let config = read_config(fields.get(LEGACY_CONFIG_FIELD)).map_err(invalid)?;

			(config, None)
		},
		CURRENT_SCHEMA_VERSION => {
			let config = read_config(fields.get(CURRENT_CONFIG_FIELD)).map_err(invalid)?;
			let logging = match fields.get("info_logging") {
				None | Some(Value::Null) => None,
				Some(value) => Some(
					serde_json::from_value::<LoggingConfig>(value.clone())
						.map_err(|err| invalid(format!("info_logging is malformed: {err}.")))?,
				),
			};

			(config, logging)
		},
		other => return Err(invalid(format!("Unsupported document version {other}."))),
	};

	Ok(RewriterDefinition {
		id: id.to_string(),
		kind: kind.to_string(),
		config,
		logging,
		schema_version: version,
	})
}

pub fn to_document(definition: &RewriterDefinition) -> Result<Value> {
	let config = serde_json::to_string(&definition.config).map_err(|err| Error::InvalidDocument {
		id: definition.id.clone(),
		message: format!("Config cannot be serialized: {err}."),
	})?;
	let mut document = Map::new();

	document.insert("type".to_string(), Value::from(DOCUMENT_TYPE));
	document.insert("version".to_string(), Value::from(CURRENT_SCHEMA_VERSION));
	document.insert("class".to_string(), Value::from(definition.kind.as_str()));
	document.insert(CURRENT_CONFIG_FIELD.to_string(), Value::from(config));

	if let Some(logging) = definition.logging.as_ref() {
		document.insert(
			"info_logging".to_string(),
			serde_json::to_value(logging).map_err(|err| Error::InvalidDocument {
				id: definition.id.clone(),
				message: format!("info_logging cannot be serialized: {err}."),
			})?,
		);
	}

	Ok(Value::Object(document))
}

fn read_config(value: Option<&Value>) -> Result<Map<String, Value>, String> {
	match value {
		None | Some(Value::Null) => Ok(Map::new()),
		Some(Value::Object(map)) => Ok(map.clone()),
		Some(Value::String(text)) if text.trim().is_empty() => Ok(Map::new()),
		Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
			Ok(Value::Object(map)) => Ok(map),
			Ok(_) => Err("Config text must encode a JSON object.".to_string()),
			Err(err) => Err(format!("Config text is not valid JSON: {err}.")),
		},
		Some(_) => Err("Config must be a JSON object or JSON text.".to_string()),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use qrw_rewriter::{LogPayload, LoggingConfig, RewriterDefinition};

	use crate::{Error, document};

	#[test]
	fn reads_legacy_layout_with_inline_or_text_config() {
		let inline = json!({
			"type": "rewriter",
			"class": "replace",
			"config": { "rules": { "a": "b" } }
		});
		let text = json!({
			"type": "rewriter",
			"class": "replace",
			"config": "{\"rules\":{\"a\":\"b\"}}"
		});
		let from_inline =
			document::from_document("r1", &inline).expect("Legacy inline should parse.");
		let from_text = document::from_document("r1", &text).expect("Legacy text should parse.");

		assert_eq!(from_inline, from_text);
		assert_eq!(from_inline.schema_version, 1);
		assert_eq!(from_inline.logging, None);
		assert_eq!(from_inline.config["rules"]["a"], "b");
	}

	#[test]
	fn reads_current_layout_with_logging() {
		let doc = json!({
			"type": "rewriter",
			"version": 3,
			"class": "noop",
			"config_v_003": "{}",
			"info_logging": { "sinks": ["tracing"], "payload": "DETAIL" }
		});
		let definition = document::from_document("r1", &doc).expect("Current layout should parse.");

		assert_eq!(definition.schema_version, 3);
		assert_eq!(definition.kind, "noop");
		assert_eq!(definition.payload(), LogPayload::Detail);
	}

	#[test]
	fn rejects_unknown_versions_and_types() {
		let version = json!({ "type": "rewriter", "version": 2, "class": "noop" });
		let kind = json!({ "type": "synonyms", "class": "noop" });
		let config =
			json!({ "type": "rewriter", "version": 3, "class": "noop", "config_v_003": "[1]" });

		for doc in [version, kind, config] {
			assert!(matches!(
				document::from_document("r1", &doc),
				Err(Error::InvalidDocument { .. })
			));
		}
	}

	#[test]
	fn writes_current_layout() {
		let mut config = serde_json::Map::new();

		config.insert("rules".to_string(), json!({ "a": "b" }));

		let logging =
			LoggingConfig { sinks: vec!["tracing".to_string()], payload: LogPayload::RewriterId };
		let definition = RewriterDefinition::new("r1", "replace", config).with_logging(logging);
		let doc = document::to_document(&definition).expect("Document should serialize.");

		assert_eq!(doc["version"], 3);
		assert_eq!(doc["class"], "replace");
		assert!(doc["config_v_003"].is_string());
		assert_eq!(doc["info_logging"]["payload"], "REWRITER_ID");
		assert_eq!(
			document::from_document("r1", &doc).expect("Round trip should parse."),
			definition
		);
	}
}
