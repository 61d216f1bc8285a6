use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub node: Node,
	pub storage: Storage,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub cluster: Cluster,
	#[serde(default)]
	pub search: Search,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Node {
	pub node_id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	/// Either "memory" or "postgres".
	pub backend: String,
	#[serde(default = "default_storage_timeout_ms")]
	pub timeout_ms: u64,
	pub postgres: Option<Postgres>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Per-partition rewriter cache tuning. Every expiry is optional; unset or zero disables it.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Cache {
	/// Approximate memory budget of one partition cache, in bytes.
	pub max_bytes: Option<u64>,
	pub expire_after_write_secs: Option<u64>,
	pub expire_after_access_secs: Option<u64>,
	/// Partitions a node opens for rewrite requests; unset means 1024.
	pub max_partitions: Option<usize>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Cluster {
	pub request_timeout_ms: u64,
	pub peers: Vec<Peer>,
}
impl Default for Cluster {
	fn default() -> Self {
		Self { request_timeout_ms: 5_000, peers: Vec::new() }
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Peer {
	pub node_id: String,
	/// Base URL of the peer's HTTP listener, e.g. "http://10.0.0.7:8080".
	pub base_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// First segment of request parameter paths: `<param_namespace>.<rewriter_id>.<path>`.
	pub param_namespace: String,
	pub default_minimum_should_match: Option<String>,
}
impl Default for Search {
	fn default() -> Self {
		Self { param_namespace: default_param_namespace(), default_minimum_should_match: None }
	}
}

fn default_storage_timeout_ms() -> u64 {
	2_000
}

fn default_param_namespace() -> String {
	"qrw".to_string()
}
