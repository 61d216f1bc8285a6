use qrw_cluster::NodeFailure;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Rewriter {id:?} is not defined.")]
	NotFound { id: String },
	#[error("Unknown rewriter kind {kind:?}.")]
	UnknownKind { kind: String },
	#[error("Invalid config for rewriter {id:?}: {}", messages.join(" "))]
	InvalidConfig { id: String, messages: Vec<String> },
	#[error("Rewriter {id:?} failed: {message}")]
	Rewrite { id: String, message: String },
	#[error("Definition store is unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error("Stored document for rewriter {id:?} is invalid: {message}")]
	InvalidDocument { id: String, message: String },
	#[error("No cluster node could be reached.")]
	ClusterUnreachable { failures: Vec<NodeFailure> },
	#[error("Cluster error: {message}")]
	Cluster { message: String },
}
impl From<qrw_cache::Error> for Error {
	fn from(err: qrw_cache::Error) -> Self {
		match err {
			qrw_cache::Error::NotFound { id } => Self::NotFound { id },
			qrw_cache::Error::UnknownKind { kind } => Self::UnknownKind { kind },
			qrw_cache::Error::InvalidConfig { id, messages } =>
				Self::InvalidConfig { id, messages },
			qrw_cache::Error::Rewrite { id, message } => Self::Rewrite { id, message },
			qrw_cache::Error::StoreUnavailable { message } => Self::StoreUnavailable { message },
			qrw_cache::Error::InvalidDocument { id, message } =>
				Self::InvalidDocument { id, message },
			err @ qrw_cache::Error::PartitionLimit { .. } =>
				Self::InvalidRequest { message: err.to_string() },
		}
	}
}
impl From<qrw_rewriter::Error> for Error {
	fn from(err: qrw_rewriter::Error) -> Self {
		qrw_cache::Error::from(err).into()
	}
}
impl From<qrw_storage::Error> for Error {
	fn from(err: qrw_storage::Error) -> Self {
		qrw_cache::Error::from(err).into()
	}
}
impl From<qrw_query::Error> for Error {
	fn from(err: qrw_query::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
impl From<qrw_cluster::Error> for Error {
	fn from(err: qrw_cluster::Error) -> Self {
		match err {
			qrw_cluster::Error::NoNodesReachable { failures } =>
				Self::ClusterUnreachable { failures },
			other => Self::Cluster { message: other.to_string() },
		}
	}
}
