use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use qrw_cluster::{AggregatedResult, NodeCommand};
use qrw_rewriter::{LoggingConfig, RewriterDefinition};

use crate::{Error, Result, RewriteService};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PutRewriterRequest {
	pub kind: String,
	#[serde(default)]
	pub config: Map<String, Value>,
	#[serde(default)]
	pub info_logging: Option<LoggingConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PutRewriterResponse {
	pub rewriter_id: String,
	pub schema_version: i32,
	/// Outcome of the cluster reload that followed the write.
	pub invalidation: AggregatedResult,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRewriterResponse {
	pub rewriter_id: String,
	pub deleted: bool,
	pub invalidation: AggregatedResult,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
	pub rewriter_id: String,
	pub valid: bool,
	pub errors: Vec<String>,
}

impl RewriteService {
	/// Validates, stores, then reloads the rewriter cluster-wide.
	///
	/// Nothing is broadcast when validation or the store write fails. Broadcast failures are
	/// reported in the response and do not fail the call.
	pub async fn put_rewriter(
		&self,
		id: &str,
		req: PutRewriterRequest,
	) -> Result<PutRewriterResponse> {
		let definition = build_definition(id, req)?;

		self.loader().validate_or_error(&definition)?;
		self.store().put(&definition).await?;

		tracing::info!(rewriter_id = %id, kind = %definition.kind, "Rewriter definition saved.");

		let invalidation = self.best_effort(NodeCommand::reload(id)).await;

		Ok(PutRewriterResponse {
			rewriter_id: definition.id,
			schema_version: definition.schema_version,
			invalidation,
		})
	}

	/// Deletes the definition, then clears it cluster-wide.
	///
	/// The clear is broadcast even when nothing was stored, so stray cache entries cannot
	/// outlive a definition removed by other means.
	pub async fn delete_rewriter(&self, id: &str) -> Result<DeleteRewriterResponse> {
		check_id(id)?;

		let deleted = self.store().delete(id).await?;

		tracing::info!(rewriter_id = %id, deleted, "Rewriter definition deleted.");

		let invalidation = self.best_effort(NodeCommand::clear(Some(id))).await;

		Ok(DeleteRewriterResponse { rewriter_id: id.to_string(), deleted, invalidation })
	}

	pub async fn get_rewriter(&self, id: &str) -> Result<RewriterDefinition> {
		check_id(id)?;

		self.store().get(id).await?.ok_or_else(|| Error::NotFound { id: id.to_string() })
	}

	/// Reports every problem with a candidate definition without storing it.
	pub fn validate_rewriter(&self, id: &str, req: PutRewriterRequest) -> Result<ValidateResponse> {
		let definition = build_definition(id, req)?;
		let errors = match self.loader().validate(&definition) {
			Ok(errors) => errors,
			Err(err @ qrw_rewriter::Error::UnknownKind { .. }) => vec![err.to_string()],
			Err(err) => return Err(err.into()),
		};

		Ok(ValidateResponse { rewriter_id: definition.id, valid: errors.is_empty(), errors })
	}

	/// Reloads `id` on every node without touching the store.
	pub async fn reload(&self, id: &str) -> Result<AggregatedResult> {
		check_id(id)?;

		Ok(self.coordinator.reload_everywhere(id).await?)
	}

	/// Clears `id`, or every rewriter, on every node without touching the store.
	pub async fn clear(&self, id: Option<&str>) -> Result<AggregatedResult> {
		if let Some(id) = id {
			check_id(id)?;
		}

		Ok(self.coordinator.clear_everywhere(id).await?)
	}

	async fn best_effort(&self, command: NodeCommand) -> AggregatedResult {
		match self.coordinator.broadcast(command.clone()).await {
			Ok(result) => result,
			Err(qrw_cluster::Error::NoNodesReachable { failures }) => {
				tracing::warn!(
					command = command.name(),
					rewriter_id = command.rewriter_id().unwrap_or("*"),
					"Store updated but no node acknowledged the invalidation."
				);

				AggregatedResult { command, succeeded: Vec::new(), failed: failures }
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					command = command.name(),
					"Invalidation broadcast failed."
				);

				AggregatedResult { command, succeeded: Vec::new(), failed: Vec::new() }
			},
		}
	}
}

fn check_id(id: &str) -> Result<()> {
	qrw_rewriter::validate_rewriter_id(id).map_err(|message| Error::InvalidRequest { message })
}

fn build_definition(id: &str, req: PutRewriterRequest) -> Result<RewriterDefinition> {
	check_id(id)?;

	let kind = req.kind.trim();

	if kind.is_empty() {
		return Err(Error::InvalidRequest { message: "kind is required.".to_string() });
	}

	let definition = RewriterDefinition::new(id, kind, req.config);

	Ok(match req.info_logging {
		Some(logging) => definition.with_logging(logging),
		None => definition,
	})
}
