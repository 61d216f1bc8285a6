use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use qrw_query::{BoostQuery, ComposedQuery, FilterQuery, Query};

use crate::{RequestParams, Result};

/// The engine's unit of local execution. Every partition compiles its own factories.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId {
	pub index: String,
	pub shard: u32,
}
impl PartitionId {
	pub fn new(index: impl Into<String>, shard: u32) -> Self {
		Self { index: index.into(), shard }
	}
}
impl fmt::Display for PartitionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}[{}]", self.index, self.shard)
	}
}

/// A configured rewriter definition, ready to hand out per-request rewriters.
///
/// Instances are created unconfigured by a [`crate::Constructor`], configured exactly once by
/// the loader, and only shared immutably afterwards.
pub trait RewriterFactory
where
	Self: Send + Sync,
{
	fn rewriter_id(&self) -> &str;

	fn configure(&mut self, config: &Map<String, Value>) -> Result<()>;

	/// Reports configuration problems without touching `self`.
	fn validate(&self, config: &Map<String, Value>) -> Vec<String>;

	fn create_rewriter(&self) -> Box<dyn QueryRewriter>;

	/// Rough heap footprint, used for the partition cache memory budget.
	fn approx_size_bytes(&self) -> usize {
		256
	}
}

pub trait QueryRewriter
where
	Self: Send,
{
	fn rewrite(&mut self, query: &mut ExpandedQuery, ctx: &mut RewriteContext<'_>) -> Result<()>;
}

/// The evolving query representation passed along a rewrite chain.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedQuery {
	pub user_query: Query,
	pub boosts: Vec<BoostQuery>,
	pub filters: Vec<FilterQuery>,
}
impl ExpandedQuery {
	pub fn new(user_query: Query) -> Self {
		Self { user_query, boosts: Vec::new(), filters: Vec::new() }
	}

	pub fn into_composed(self) -> ComposedQuery {
		ComposedQuery { main: self.user_query, boosts: self.boosts, filters: self.filters }
	}
}

/// Per-rewriter view of one request.
pub struct RewriteContext<'a> {
	partition: &'a PartitionId,
	rewriter_id: &'a str,
	namespace: &'a str,
	params: &'a RequestParams,
	actions: Vec<String>,
}
impl<'a> RewriteContext<'a> {
	pub fn new(
		partition: &'a PartitionId,
		rewriter_id: &'a str,
		namespace: &'a str,
		params: &'a RequestParams,
	) -> Self {
		Self { partition, rewriter_id, namespace, params, actions: Vec::new() }
	}

	pub fn partition(&self) -> &PartitionId {
		self.partition
	}

	pub fn rewriter_id(&self) -> &str {
		self.rewriter_id
	}

	pub fn params(&self) -> &RequestParams {
		self.params
	}

	/// Full parameter path for `key` under this rewriter, `<namespace>.<rewriter_id>.<key>`.
	pub fn param_path(&self, key: &str) -> String {
		format!("{}.{}.{key}", self.namespace, self.rewriter_id)
	}

	pub fn param_bool(&self, key: &str) -> Option<bool> {
		self.params.get_bool(&self.param_path(key))
	}

	pub fn param_f32(&self, key: &str) -> Option<f32> {
		self.params.get_f32(&self.param_path(key))
	}

	pub fn param_string_list(&self, key: &str) -> Vec<String> {
		self.params.get_string_list(&self.param_path(key))
	}

	/// Records a human-readable note about what the rewriter did, for info logging.
	pub fn record_action(&mut self, message: impl Into<String>) {
		self.actions.push(message.into());
	}

	pub fn into_actions(self) -> Vec<String> {
		self.actions
	}
}
