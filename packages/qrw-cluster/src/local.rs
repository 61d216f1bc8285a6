use std::sync::Arc;

use qrw_cache::PartitionCacheRegistry;

use crate::{NodeCommand, NodeReply};

/// Executes node commands against this node's partition caches.
#[derive(Clone)]
pub struct LocalNode {
	node_id: String,
	registry: Arc<PartitionCacheRegistry>,
}
impl LocalNode {
	pub fn new(node_id: impl Into<String>, registry: Arc<PartitionCacheRegistry>) -> Self {
		Self { node_id: node_id.into(), registry }
	}

	pub fn node_id(&self) -> &str {
		&self.node_id
	}

	pub fn registry(&self) -> &Arc<PartitionCacheRegistry> {
		&self.registry
	}

	pub async fn execute(&self, command: &NodeCommand) -> qrw_cache::Result<NodeReply> {
		let partitions = match command {
			NodeCommand::Reload { rewriter_id } => self.registry.reload(rewriter_id).await?,
			NodeCommand::Clear { rewriter_id: Some(rewriter_id) } =>
				self.registry.invalidate(rewriter_id).await,
			NodeCommand::Clear { rewriter_id: None } => self.registry.invalidate_all(),
		};

		tracing::debug!(
			node_id = %self.node_id,
			command = command.name(),
			rewriter_id = command.rewriter_id().unwrap_or("*"),
			partitions,
			"Node command executed."
		);

		Ok(NodeReply { node_id: self.node_id.clone(), partitions })
	}
}
