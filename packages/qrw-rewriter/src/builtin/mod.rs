//! Generic rewriter kinds available in every registry built with
//! [`KindRegistry::with_builtins`](crate::KindRegistry::with_builtins).

pub mod clauses;
pub mod noop;
pub mod replace;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{Error, KindRegistry};

pub fn register(registry: &mut KindRegistry) {
	registry
		.register(clauses::KIND, clauses::construct)
		.register(noop::KIND, noop::construct)
		.register(replace::KIND, replace::construct);
}

fn decode<T>(config: &Map<String, Value>) -> Result<T, Vec<String>>
where
	T: DeserializeOwned,
{
	serde_json::from_value(Value::Object(config.clone())).map_err(|err| vec![format!("{err}.")])
}

fn into_config_error(id: &str, messages: Vec<String>) -> Error {
	Error::InvalidConfig { id: id.to_string(), messages }
}
