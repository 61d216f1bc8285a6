use std::{
	collections::{HashMap, HashSet},
	sync::{Mutex, RwLock},
};

use qrw_cluster::{BoxFuture, Error, LocalNode, NodeCommand, NodeReply, NodeTransport, Result};
use qrw_config::Peer;

/// Transport that dispatches to other in-process nodes, with per-node outage switches.
#[derive(Default)]
pub struct InProcessTransport {
	nodes: RwLock<HashMap<String, LocalNode>>,
	down: Mutex<HashSet<String>>,
}
impl InProcessTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_node(&self, node: LocalNode) {
		let mut nodes = self.nodes.write().unwrap_or_else(|err| err.into_inner());

		nodes.insert(node.node_id().to_string(), node);
	}

	pub fn set_down(&self, node_id: &str, down: bool) {
		let mut set = self.down.lock().unwrap_or_else(|err| err.into_inner());

		if down {
			set.insert(node_id.to_string());
		} else {
			set.remove(node_id);
		}
	}

	fn is_down(&self, node_id: &str) -> bool {
		self.down.lock().unwrap_or_else(|err| err.into_inner()).contains(node_id)
	}

	fn node(&self, node_id: &str) -> Option<LocalNode> {
		self.nodes.read().unwrap_or_else(|err| err.into_inner()).get(node_id).cloned()
	}
}
impl NodeTransport for InProcessTransport {
	fn send<'a>(
		&'a self,
		peer: &'a Peer,
		command: &'a NodeCommand,
	) -> BoxFuture<'a, Result<NodeReply>> {
		Box::pin(async move {
			let node = match self.node(&peer.node_id) {
				Some(node) if !self.is_down(&peer.node_id) => node,
				_ =>
					return Err(Error::NodeUnreachable {
						node_id: peer.node_id.clone(),
						message: "Connection refused.".to_string(),
					}),
			};

			node.execute(command).await.map_err(|err| Error::NodeError {
				node_id: peer.node_id.clone(),
				message: err.to_string(),
			})
		})
	}
}
