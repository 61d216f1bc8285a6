use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use qrw_cluster::{AggregatedResult, NodeCommand, NodeReply};
use qrw_rewriter::{PartitionId, RewriterDefinition};
use qrw_service::{
	DeleteRewriterResponse, Error as ServiceError, PutRewriterRequest, PutRewriterResponse,
	RewriteRequest, RewriteResponse, ValidateResponse,
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClearRequest {
	#[serde(default)]
	pub id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClosePartitionResponse {
	pub partition: PartitionId,
	pub closed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
	pub node_id: String,
	pub partitions: usize,
}

#[derive(Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidRequest { .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::NotFound { .. } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message, None),
			ServiceError::UnknownKind { .. } =>
				json_error(StatusCode::BAD_REQUEST, "unknown_kind", message, None),
			ServiceError::InvalidConfig { messages, .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_config", message, Some(messages)),
			ServiceError::Rewrite { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "rewrite_failed", message, None),
			ServiceError::StoreUnavailable { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message, None),
			ServiceError::InvalidDocument { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "invalid_document", message, None),
			ServiceError::ClusterUnreachable { failures } => {
				let fields = failures
					.iter()
					.map(|failure| format!("{}: {}", failure.node_id, failure.message))
					.collect();

				json_error(StatusCode::BAD_GATEWAY, "cluster_unreachable", message, Some(fields))
			},
			ServiceError::Cluster { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "cluster_error", message, None),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
		};

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/rewrite", post(rewrite))
		.route(qrw_cluster::transport::COMMAND_PATH, post(node_command))
		.route("/v1/partitions/{index}/{shard}/close", post(close_partition))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route(
			"/v1/admin/rewriters/{id}",
			put(put_rewriter).get(get_rewriter).delete(delete_rewriter),
		)
		.route("/v1/admin/rewriters/{id}/validate", post(validate_rewriter))
		.route("/v1/admin/reload/{id}", post(reload))
		.route("/v1/admin/clear", post(clear))
		.with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		node_id: state.service.node_id().to_string(),
		partitions: state.service.partitions().len(),
	})
}

async fn rewrite(
	State(state): State<AppState>,
	Json(payload): Json<RewriteRequest>,
) -> Result<Json<RewriteResponse>, ApiError> {
	let response = state.service.rewrite(payload).await?;

	Ok(Json(response))
}

async fn node_command(
	State(state): State<AppState>,
	Json(command): Json<NodeCommand>,
) -> Result<Json<NodeReply>, ApiError> {
	let reply = state.service.execute_node_command(&command).await?;

	Ok(Json(reply))
}

async fn close_partition(
	State(state): State<AppState>,
	Path((index, shard)): Path<(String, u32)>,
) -> Json<ClosePartitionResponse> {
	let partition = PartitionId::new(index, shard);
	let closed = state.service.close_partition(&partition);

	Json(ClosePartitionResponse { partition, closed })
}

async fn put_rewriter(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(payload): Json<PutRewriterRequest>,
) -> Result<Json<PutRewriterResponse>, ApiError> {
	let response = state.service.put_rewriter(&id, payload).await?;

	Ok(Json(response))
}

async fn get_rewriter(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<RewriterDefinition>, ApiError> {
	let definition = state.service.get_rewriter(&id).await?;

	Ok(Json(definition))
}

async fn delete_rewriter(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<DeleteRewriterResponse>, ApiError> {
	let response = state.service.delete_rewriter(&id).await?;

	Ok(Json(response))
}

async fn validate_rewriter(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(payload): Json<PutRewriterRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
	let response = state.service.validate_rewriter(&id, payload)?;

	Ok(Json(response))
}

async fn reload(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<AggregatedResult>, ApiError> {
	let result = state.service.reload(&id).await?;

	Ok(Json(result))
}

async fn clear(
	State(state): State<AppState>,
	payload: Option<Json<ClearRequest>>,
) -> Result<Json<AggregatedResult>, ApiError> {
	let request = payload.map(|Json(request)| request).unwrap_or_default();
	let result = state.service.clear(request.id.as_deref()).await?;

	Ok(Json(result))
}

fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
