use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
};

use qrw_rewriter::{FactoryLoader, PartitionId};
use qrw_storage::DefinitionStore;

use crate::{CacheSettings, Error, PartitionCache, Result};

/// Node-local map from partition to its rewriter cache.
///
/// Partitions are created lazily on first lookup and dropped when the host closes or relocates
/// them. Identical rewriter ids on different partitions are compiled independently.
pub struct PartitionCacheRegistry {
	caches: RwLock<HashMap<PartitionId, Arc<PartitionCache>>>,
	store: Arc<dyn DefinitionStore>,
	loader: FactoryLoader,
	settings: CacheSettings,
}
impl PartitionCacheRegistry {
	pub fn new(
		store: Arc<dyn DefinitionStore>,
		loader: FactoryLoader,
		settings: CacheSettings,
	) -> Self {
		Self { caches: RwLock::new(HashMap::new()), store, loader, settings }
	}

	pub fn store(&self) -> &Arc<dyn DefinitionStore> {
		&self.store
	}

	pub fn loader(&self) -> &FactoryLoader {
		&self.loader
	}

	pub fn settings(&self) -> &CacheSettings {
		&self.settings
	}

	pub fn get_or_create(&self, partition: &PartitionId) -> Arc<PartitionCache> {
		if let Some(cache) = self.get(partition) {
			return cache;
		}

		let mut caches = self.caches.write().unwrap_or_else(|err| err.into_inner());

		caches
			.entry(partition.clone())
			.or_insert_with(|| {
				tracing::debug!(partition = %partition, "Partition cache created.");

				Arc::new(PartitionCache::new(
					partition.clone(),
					self.store.clone(),
					self.loader.clone(),
					&self.settings,
				))
			})
			.clone()
	}

	/// Like [`Self::get_or_create`], but refuses to create a partition past
	/// [`CacheSettings::max_partitions`]. Request paths go through here so arbitrary partition
	/// names cannot grow the registry without bound.
	pub fn open(&self, partition: &PartitionId) -> Result<Arc<PartitionCache>> {
		if let Some(cache) = self.get(partition) {
			return Ok(cache);
		}

		let Some(limit) = self.settings.max_partitions else {
			return Ok(self.get_or_create(partition));
		};
		let mut caches = self.caches.write().unwrap_or_else(|err| err.into_inner());

		if let Some(cache) = caches.get(partition) {
			return Ok(cache.clone());
		}
		if caches.len() >= limit {
			tracing::warn!(partition = %partition, limit, "Partition limit reached; open refused.");

			return Err(Error::PartitionLimit { partition: partition.to_string(), limit });
		}

		tracing::debug!(partition = %partition, "Partition cache created.");

		let cache = Arc::new(PartitionCache::new(
			partition.clone(),
			self.store.clone(),
			self.loader.clone(),
			&self.settings,
		));

		caches.insert(partition.clone(), cache.clone());

		Ok(cache)
	}

	pub fn get(&self, partition: &PartitionId) -> Option<Arc<PartitionCache>> {
		self.caches.read().unwrap_or_else(|err| err.into_inner()).get(partition).cloned()
	}

	/// Drops the partition's cache. Returns whether the partition was known.
	pub fn remove(&self, partition: &PartitionId) -> bool {
		let removed = {
			let mut caches = self.caches.write().unwrap_or_else(|err| err.into_inner());

			caches.remove(partition)
		};
		let Some(cache) = removed else {
			return false;
		};

		// Callers may still hold the Arc; release the compiled instances regardless.
		cache.invalidate_all();

		tracing::info!(partition = %partition, "Partition cache removed.");

		true
	}

	pub fn partitions(&self) -> Vec<PartitionId> {
		let mut partitions = self
			.caches
			.read()
			.unwrap_or_else(|err| err.into_inner())
			.keys()
			.cloned()
			.collect::<Vec<_>>();

		partitions.sort();

		partitions
	}

	/// Force-reloads `id` on every partition that holds it and returns how many did.
	///
	/// Every partition is attempted; the first failure is returned after the sweep.
	pub async fn reload(&self, id: &str) -> Result<usize> {
		let mut reloaded = 0;
		let mut first_err = None;

		for cache in self.snapshot() {
			match cache.force_reload(id).await {
				Ok(true) => reloaded += 1,
				Ok(false) => {},
				Err(err) =>
					if first_err.is_none() {
						first_err = Some(err);
					},
			}
		}

		match first_err {
			Some(err) => Err(err),
			None => Ok(reloaded),
		}
	}

	/// Invalidates `id` on every partition and returns how many held it.
	pub async fn invalidate(&self, id: &str) -> usize {
		let mut invalidated = 0;

		for cache in self.snapshot() {
			if cache.invalidate(id).await {
				invalidated += 1;
			}
		}

		invalidated
	}

	/// Clears every partition cache and returns the number of partitions touched.
	pub fn invalidate_all(&self) -> usize {
		let caches = self.snapshot();

		for cache in &caches {
			cache.invalidate_all();
		}

		caches.len()
	}

	fn snapshot(&self) -> Vec<Arc<PartitionCache>> {
		self.caches.read().unwrap_or_else(|err| err.into_inner()).values().cloned().collect()
	}
}
