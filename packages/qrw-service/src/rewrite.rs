use std::{collections::HashSet, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use qrw_cache::CompiledFactory;
use qrw_query::{MinimumShouldMatch, Query};
use qrw_rewriter::{ExpandedQuery, PartitionId, RequestParams, RewriteContext};

use crate::{Error, Result, RewriteService, info_log};

/// A rewriter named by a search request, optionally with per-request parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewriterRef {
	Id(String),
	WithParams {
		id: String,
		#[serde(default)]
		params: Map<String, Value>,
	},
}
impl RewriterRef {
	pub fn id(&self) -> &str {
		match self {
			Self::Id(id) | Self::WithParams { id, .. } => id,
		}
	}

	pub fn params(&self) -> Option<&Map<String, Value>> {
		match self {
			Self::Id(_) => None,
			Self::WithParams { params, .. } => Some(params),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewriteRequest {
	pub partition: PartitionId,
	pub rewriters: Vec<RewriterRef>,
	pub query: Query,
	#[serde(default)]
	pub minimum_should_match: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
	pub rewriter_id: String,
	pub action: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriteResponse {
	pub query: Query,
	/// Rewriter ids in the order they ran.
	pub applied: Vec<String>,
	pub actions: Vec<ActionRecord>,
}

impl RewriteService {
	/// Runs the named rewriters over the query, in order, on the request's partition.
	///
	/// Every rewriter is resolved before any of them runs, so a single unknown id fails the
	/// whole request.
	pub async fn rewrite(&self, req: RewriteRequest) -> Result<RewriteResponse> {
		validate_refs(&req.rewriters)?;

		let minimum_should_match = match req.minimum_should_match.as_deref() {
			Some(raw) if !raw.trim().is_empty() => Some(MinimumShouldMatch::from_str(raw)?),
			_ => self.default_minimum_should_match.clone(),
		};
		let cache = self.registry.open(&req.partition)?;
		let mut chain: Vec<Arc<CompiledFactory>> = Vec::with_capacity(req.rewriters.len());

		for rewriter in &req.rewriters {
			chain.push(cache.get_or_load(rewriter.id()).await?);
		}

		let mut params = RequestParams::default();

		for rewriter in &req.rewriters {
			if let Some(rewriter_params) = rewriter.params() {
				params.mount(&self.param_namespace, rewriter.id(), rewriter_params.clone());
			}
		}

		let mut expanded = ExpandedQuery::new(req.query);
		let mut applied = Vec::with_capacity(chain.len());
		let mut actions = Vec::new();

		for compiled in &chain {
			let mut ctx = RewriteContext::new(
				&req.partition,
				&compiled.rewriter_id,
				&self.param_namespace,
				&params,
			);

			compiled.factory.create_rewriter().rewrite(&mut expanded, &mut ctx)?;

			let rewriter_actions = ctx.into_actions();

			info_log::applied(compiled, &req.partition, &rewriter_actions);
			applied.push(compiled.rewriter_id.clone());
			actions.extend(rewriter_actions.into_iter().map(|action| ActionRecord {
				rewriter_id: compiled.rewriter_id.clone(),
				action,
			}));
		}

		let query = expanded.into_composed().compose(minimum_should_match.as_ref())?;

		tracing::debug!(
			partition = %req.partition,
			rewriters = applied.len(),
			actions = actions.len(),
			"Query rewritten."
		);

		Ok(RewriteResponse { query, applied, actions })
	}
}

fn validate_refs(rewriters: &[RewriterRef]) -> Result<()> {
	let mut seen = HashSet::with_capacity(rewriters.len());

	for rewriter in rewriters {
		let id = rewriter.id();

		if let Err(message) = qrw_rewriter::validate_rewriter_id(id) {
			return Err(Error::InvalidRequest { message });
		}
		if !seen.insert(id) {
			return Err(Error::InvalidRequest {
				message: format!("Rewriter {id:?} is listed more than once."),
			});
		}
	}

	Ok(())
}
