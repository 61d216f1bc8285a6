pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown rewriter kind {kind:?}.")]
	UnknownKind { kind: String },
	#[error("Invalid config for rewriter {id:?}: {}", messages.join(" "))]
	InvalidConfig { id: String, messages: Vec<String> },
	#[error("Rewriter {id:?} failed: {message}")]
	Rewrite { id: String, message: String },
}
