use crate::NodeFailure;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
	#[error("Node {node_id:?} is unreachable: {message}")]
	NodeUnreachable { node_id: String, message: String },
	#[error("Node {node_id:?} reported an error: {message}")]
	NodeError { node_id: String, message: String },
	#[error("No cluster node could be reached ({} failed).", failures.len())]
	NoNodesReachable { failures: Vec<NodeFailure> },
	#[error("Failed to build cluster transport: {message}")]
	Transport { message: String },
}
