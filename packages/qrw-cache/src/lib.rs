pub mod partition;
pub mod registry;

mod error;

pub use error::{Error, Result};
pub use partition::{CompiledFactory, PartitionCache};
pub use registry::PartitionCacheRegistry;

use std::time::Duration;

const DEFAULT_MAX_PARTITIONS: usize = 1_024;

/// Bounds applied to every partition cache on a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheSettings {
	/// Approximate byte budget per partition; unbounded when `None`.
	pub max_bytes: Option<u64>,
	pub expire_after_write: Option<Duration>,
	pub expire_after_access: Option<Duration>,
	/// Partitions [`PartitionCacheRegistry::open`] creates before refusing; unbounded when `None`.
	pub max_partitions: Option<usize>,
}
impl CacheSettings {
	pub fn from_config(cfg: &qrw_config::Cache) -> Self {
		Self {
			max_bytes: cfg.max_bytes,
			expire_after_write: cfg.expire_after_write_secs.map(Duration::from_secs),
			expire_after_access: cfg.expire_after_access_secs.map(Duration::from_secs),
			max_partitions: Some(cfg.max_partitions.unwrap_or(DEFAULT_MAX_PARTITIONS)),
		}
	}
}
