use std::time::Duration;

use reqwest::Client;

use qrw_config::Peer;

use crate::{BoxFuture, Error, NodeCommand, NodeReply, Result};

pub const COMMAND_PATH: &str = "/v1/cluster/command";

/// Delivers a command to a remote node.
///
/// Implementations report connection-level failures as [`Error::NodeUnreachable`] and failures
/// the node itself reported as [`Error::NodeError`].
pub trait NodeTransport
where
	Self: Send + Sync,
{
	fn send<'a>(
		&'a self,
		peer: &'a Peer,
		command: &'a NodeCommand,
	) -> BoxFuture<'a, Result<NodeReply>>;
}

/// JSON over HTTP to the peer's cluster endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransport {
	client: Client,
}
impl HttpTransport {
	pub fn new(timeout: Duration) -> Result<Self> {
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|err| Error::Transport { message: err.to_string() })?;

		Ok(Self { client })
	}

	async fn post(&self, peer: &Peer, command: &NodeCommand) -> Result<NodeReply> {
		let url = format!("{}{COMMAND_PATH}", peer.base_url);
		let res = self.client.post(url).json(command).send().await.map_err(|err| {
			Error::NodeUnreachable { node_id: peer.node_id.clone(), message: err.to_string() }
		})?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::NodeError {
				node_id: peer.node_id.clone(),
				message: format!("HTTP {status}: {body}"),
			});
		}

		res.json::<NodeReply>().await.map_err(|err| Error::NodeError {
			node_id: peer.node_id.clone(),
			message: format!("Malformed reply: {err}."),
		})
	}
}
impl NodeTransport for HttpTransport {
	fn send<'a>(
		&'a self,
		peer: &'a Peer,
		command: &'a NodeCommand,
	) -> BoxFuture<'a, Result<NodeReply>> {
		Box::pin(self.post(peer, command))
	}
}
