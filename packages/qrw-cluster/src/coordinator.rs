use std::{sync::Arc, time::Duration};

use futures_util::future;
use serde::{Deserialize, Serialize};
use tokio::time;

use qrw_config::Peer;

use crate::{BoxFuture, Error, LocalNode, NodeCommand, NodeReply, NodeTransport, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	/// The node could not be reached in time.
	Unreachable,
	/// The node was reached and reported an error.
	NodeError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
	pub node_id: String,
	pub kind: FailureKind,
	pub message: String,
}

/// Per-node outcome of one broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResult {
	pub command: NodeCommand,
	pub succeeded: Vec<NodeReply>,
	pub failed: Vec<NodeFailure>,
}
impl AggregatedResult {
	pub fn is_complete(&self) -> bool {
		self.failed.is_empty()
	}

	pub fn partitions(&self) -> usize {
		self.succeeded.iter().map(|reply| reply.partitions).sum()
	}
}

/// Scatter-gather broadcaster for cache commands.
///
/// The local node is always a member and is dispatched in-process; peers go through the
/// transport. Every node is attempted and bounded by the request timeout; one node failing never
/// prevents delivery to the others.
pub struct Coordinator {
	local: LocalNode,
	peers: Vec<Peer>,
	transport: Arc<dyn NodeTransport>,
	request_timeout: Duration,
}
impl Coordinator {
	pub fn new(
		local: LocalNode,
		peers: Vec<Peer>,
		transport: Arc<dyn NodeTransport>,
		request_timeout: Duration,
	) -> Self {
		Self { local, peers, transport, request_timeout }
	}

	pub fn local(&self) -> &LocalNode {
		&self.local
	}

	pub fn node_ids(&self) -> Vec<&str> {
		std::iter::once(self.local.node_id())
			.chain(self.peers.iter().map(|peer| peer.node_id.as_str()))
			.collect()
	}

	pub async fn reload_everywhere(&self, rewriter_id: &str) -> Result<AggregatedResult> {
		self.broadcast(NodeCommand::reload(rewriter_id)).await
	}

	pub async fn clear_everywhere(&self, rewriter_id: Option<&str>) -> Result<AggregatedResult> {
		self.broadcast(NodeCommand::clear(rewriter_id)).await
	}

	/// Sends `command` to every node and collects the outcomes.
	///
	/// Fails only when no node was reached at all.
	pub async fn broadcast(&self, command: NodeCommand) -> Result<AggregatedResult> {
		let mut calls: Vec<BoxFuture<'_, (String, Result<NodeReply>)>> =
			Vec::with_capacity(self.peers.len() + 1);

		calls.push(Box::pin(async {
			let node_id = self.local.node_id().to_string();
			let outcome = self.bounded(&node_id, async {
				self.local.execute(&command).await.map_err(|err| Error::NodeError {
					node_id: node_id.clone(),
					message: err.to_string(),
				})
			});

			(node_id.clone(), outcome.await)
		}));

		for peer in &self.peers {
			let command = &command;

			calls.push(Box::pin(async move {
				let outcome = self.bounded(&peer.node_id, self.transport.send(peer, command)).await;

				(peer.node_id.clone(), outcome)
			}));
		}

		let mut succeeded = Vec::new();
		let mut failed = Vec::new();

		for (node_id, outcome) in future::join_all(calls).await {
			match outcome {
				Ok(reply) => succeeded.push(reply),
				Err(err) => {
					let failure = into_failure(node_id, err);

					tracing::warn!(
						node_id = %failure.node_id,
						kind = ?failure.kind,
						command = command.name(),
						rewriter_id = command.rewriter_id().unwrap_or("*"),
						error = %failure.message,
						"Cluster command failed on node."
					);

					failed.push(failure);
				},
			}
		}

		let reached_any = !succeeded.is_empty()
			|| failed.iter().any(|failure| failure.kind == FailureKind::NodeError);

		if !reached_any {
			return Err(Error::NoNodesReachable { failures: failed });
		}

		tracing::info!(
			command = command.name(),
			rewriter_id = command.rewriter_id().unwrap_or("*"),
			succeeded = succeeded.len(),
			failed = failed.len(),
			"Cluster command broadcast."
		);

		Ok(AggregatedResult { command, succeeded, failed })
	}

	async fn bounded<F>(&self, node_id: &str, call: F) -> Result<NodeReply>
	where
		F: Future<Output = Result<NodeReply>>,
	{
		match time::timeout(self.request_timeout, call).await {
			Ok(outcome) => outcome,
			Err(_) => Err(Error::NodeUnreachable {
				node_id: node_id.to_string(),
				message: format!("No reply within {} ms.", self.request_timeout.as_millis()),
			}),
		}
	}
}

fn into_failure(node_id: String, err: Error) -> NodeFailure {
	let kind = match err {
		Error::NodeError { .. } => FailureKind::NodeError,
		_ => FailureKind::Unreachable,
	};
	let message = match err {
		Error::NodeUnreachable { message, .. } | Error::NodeError { message, .. } => message,
		other => other.to_string(),
	};

	NodeFailure { node_id, kind, message }
}
