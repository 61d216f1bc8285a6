pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Load failure for one rewriter.
///
/// Cloneable because a failed load is handed to every caller that waited on it.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
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
	#[error("Partition {partition} is not open and the node already serves {limit} partitions.")]
	PartitionLimit { partition: String, limit: usize },
}
impl From<qrw_rewriter::Error> for Error {
	fn from(err: qrw_rewriter::Error) -> Self {
		match err {
			qrw_rewriter::Error::UnknownKind { kind } => Self::UnknownKind { kind },
			qrw_rewriter::Error::InvalidConfig { id, messages } =>
				Self::InvalidConfig { id, messages },
			qrw_rewriter::Error::Rewrite { id, message } => Self::Rewrite { id, message },
		}
	}
}
impl From<qrw_storage::Error> for Error {
	fn from(err: qrw_storage::Error) -> Self {
		match err {
			qrw_storage::Error::Unavailable { message }
			| qrw_storage::Error::Configuration { message } => Self::StoreUnavailable { message },
			qrw_storage::Error::InvalidDocument { id, message } =>
				Self::InvalidDocument { id, message },
		}
	}
}
