pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Definition store is unavailable: {message}")]
	Unavailable { message: String },
	#[error("Stored document for rewriter {id:?} is invalid: {message}")]
	InvalidDocument { id: String, message: String },
	#[error("Invalid storage configuration: {message}")]
	Configuration { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Unavailable { message: err.to_string() }
	}
}
impl From<tokio::time::error::Elapsed> for Error {
	fn from(_: tokio::time::error::Elapsed) -> Self {
		Self::Unavailable { message: "Timed out waiting for the definition store.".to_string() }
	}
}
