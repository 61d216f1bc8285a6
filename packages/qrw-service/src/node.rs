use qrw_cluster::{NodeCommand, NodeReply};
use qrw_rewriter::PartitionId;

use crate::{Result, RewriteService};

impl RewriteService {
	/// Executes a command received from a coordinating node against local caches.
	pub async fn execute_node_command(&self, command: &NodeCommand) -> Result<NodeReply> {
		Ok(self.coordinator.local().execute(command).await?)
	}

	/// Drops the partition's cache when the host closes or relocates it.
	pub fn close_partition(&self, partition: &PartitionId) -> bool {
		self.registry.remove(partition)
	}

	pub fn partitions(&self) -> Vec<PartitionId> {
		self.registry.partitions()
	}
}
