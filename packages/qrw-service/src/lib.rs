pub mod admin;
pub mod node;
pub mod rewrite;

mod error;
mod info_log;

pub use admin::{DeleteRewriterResponse, PutRewriterRequest, PutRewriterResponse, ValidateResponse};
pub use error::{Error, Result};
pub use rewrite::{ActionRecord, RewriteRequest, RewriteResponse, RewriterRef};

use std::{str::FromStr, sync::Arc, time::Duration};

use qrw_cache::{CacheSettings, PartitionCacheRegistry};
use qrw_cluster::{Coordinator, HttpTransport, LocalNode, NodeTransport};
use qrw_config::Config;
use qrw_query::MinimumShouldMatch;
use qrw_rewriter::FactoryLoader;
use qrw_storage::DefinitionStore;

/// One node's rewriting, administration, and cluster-command surface.
pub struct RewriteService {
	registry: Arc<PartitionCacheRegistry>,
	coordinator: Coordinator,
	param_namespace: String,
	default_minimum_should_match: Option<MinimumShouldMatch>,
}
impl RewriteService {
	pub fn new(
		cfg: &Config,
		store: Arc<dyn DefinitionStore>,
		loader: FactoryLoader,
		transport: Arc<dyn NodeTransport>,
	) -> Result<Self> {
		let default_minimum_should_match = cfg
			.search
			.default_minimum_should_match
			.as_deref()
			.map(MinimumShouldMatch::from_str)
			.transpose()?;
		let registry = Arc::new(PartitionCacheRegistry::new(
			store,
			loader,
			CacheSettings::from_config(&cfg.cache),
		));
		let local = LocalNode::new(cfg.node.node_id.clone(), registry.clone());
		let coordinator = Coordinator::new(
			local,
			cfg.cluster.peers.clone(),
			transport,
			Duration::from_millis(cfg.cluster.request_timeout_ms),
		);

		Ok(Self {
			registry,
			coordinator,
			param_namespace: cfg.search.param_namespace.clone(),
			default_minimum_should_match,
		})
	}

	/// Opens the configured store and talks to peers over HTTP.
	pub async fn from_config(cfg: &Config) -> Result<Self> {
		let store = qrw_storage::open(&cfg.storage).await?;
		let transport =
			HttpTransport::new(Duration::from_millis(cfg.cluster.request_timeout_ms))?;

		Self::new(cfg, store, FactoryLoader::default(), Arc::new(transport))
	}

	pub fn node_id(&self) -> &str {
		self.coordinator.local().node_id()
	}

	pub fn registry(&self) -> &Arc<PartitionCacheRegistry> {
		&self.registry
	}

	pub fn coordinator(&self) -> &Coordinator {
		&self.coordinator
	}

	/// Handle for dispatching commands to this node in-process.
	pub fn local_node(&self) -> LocalNode {
		self.coordinator.local().clone()
	}

	pub fn store(&self) -> &Arc<dyn DefinitionStore> {
		self.registry.store()
	}

	pub fn loader(&self) -> &FactoryLoader {
		self.registry.loader()
	}
}
