use serde::{Deserialize, Serialize};

/// Instruction sent to every node during a broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum NodeCommand {
	/// Force-reload the rewriter on partitions that currently hold it.
	Reload { rewriter_id: String },
	/// Invalidate one rewriter, or every rewriter when `rewriter_id` is absent.
	Clear {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		rewriter_id: Option<String>,
	},
}
impl NodeCommand {
	pub fn reload(rewriter_id: impl Into<String>) -> Self {
		Self::Reload { rewriter_id: rewriter_id.into() }
	}

	pub fn clear(rewriter_id: Option<&str>) -> Self {
		Self::Clear { rewriter_id: rewriter_id.map(str::to_string) }
	}

	pub fn rewriter_id(&self) -> Option<&str> {
		match self {
			Self::Reload { rewriter_id } => Some(rewriter_id),
			Self::Clear { rewriter_id } => rewriter_id.as_deref(),
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::Reload { .. } => "reload",
			Self::Clear { .. } => "clear",
		}
	}
}

/// A node's acknowledgement of a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReply {
	pub node_id: String,
	/// Partitions on the node that the command touched.
	pub partitions: usize,
}
