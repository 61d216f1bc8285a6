use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request parameters addressed by dotted path, e.g. `qrw.synonyms.enabled`.
///
/// Lookups never fail: a missing path or a value of the wrong type reads as absent, and list
/// lookups read as an empty list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams {
	root: Map<String, Value>,
}
impl RequestParams {
	pub fn new(root: Map<String, Value>) -> Self {
		Self { root }
	}

	/// Places `params` at `<namespace>.<rewriter_id>`, merging into existing objects.
	pub fn mount(&mut self, namespace: &str, rewriter_id: &str, params: Map<String, Value>) {
		let ns = self
			.root
			.entry(namespace.to_string())
			.or_insert_with(|| Value::Object(Map::new()));

		if !ns.is_object() {
			*ns = Value::Object(Map::new());
		}

		let Some(ns) = ns.as_object_mut() else {
			return;
		};
		let slot =
			ns.entry(rewriter_id.to_string()).or_insert_with(|| Value::Object(Map::new()));

		match slot.as_object_mut() {
			Some(existing) => existing.extend(params),
			None => *slot = Value::Object(params),
		}
	}

	pub fn get(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.');
		let mut current = self.root.get(segments.next()?)?;

		for segment in segments {
			current = current.as_object()?.get(segment)?;
		}

		Some(current)
	}

	pub fn get_str(&self, path: &str) -> Option<&str> {
		self.get(path)?.as_str()
	}

	pub fn get_string_list(&self, path: &str) -> Vec<String> {
		let Some(items) = self.get(path).and_then(Value::as_array) else {
			return Vec::new();
		};

		items
			.iter()
			.map(|item| item.as_str().map(ToString::to_string))
			.collect::<Option<Vec<_>>>()
			.unwrap_or_default()
	}

	pub fn get_bool(&self, path: &str) -> Option<bool> {
		self.get(path)?.as_bool()
	}

	pub fn get_i32(&self, path: &str) -> Option<i32> {
		i32::try_from(self.get(path)?.as_i64()?).ok()
	}

	pub fn get_f32(&self, path: &str) -> Option<f32> {
		self.get_f64(path).map(|value| value as f32)
	}

	pub fn get_f64(&self, path: &str) -> Option<f64> {
		self.get(path)?.as_f64()
	}

	pub fn is_empty(&self) -> bool {
		self.root.is_empty()
	}
}
