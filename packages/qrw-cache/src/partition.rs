use std::{
	collections::HashMap,
	fmt,
	future,
	sync::{Arc, Mutex, MutexGuard},
};

use moka::{
	future::Cache,
	notification::RemovalCause,
	ops::compute::{CompResult, Op},
};
use time::OffsetDateTime;

use qrw_rewriter::{FactoryLoader, LogPayload, LoggingConfig, PartitionId, RewriterFactory};
use qrw_storage::DefinitionStore;

use crate::{CacheSettings, Error, Result};

const ENTRY_OVERHEAD_BYTES: usize = 192;
const MAX_LOAD_ATTEMPTS: usize = 4;
const MAX_TRACKED_MARKS: usize = 4_096;

/// A configured factory as cached for one partition.
pub struct CompiledFactory {
	pub rewriter_id: String,
	pub factory: Arc<dyn RewriterFactory>,
	pub logging: Option<LoggingConfig>,
	pub loaded_at: OffsetDateTime,
	weight: u32,
	// Invalidation clock observed before the definition was read.
	stamp: u64,
}
impl CompiledFactory {
	pub fn new(
		rewriter_id: impl Into<String>,
		factory: Arc<dyn RewriterFactory>,
		logging: Option<LoggingConfig>,
	) -> Self {
		let rewriter_id = rewriter_id.into();
		let bytes = ENTRY_OVERHEAD_BYTES
			.saturating_add(rewriter_id.len())
			.saturating_add(factory.approx_size_bytes());
		let weight = u32::try_from(bytes).unwrap_or(u32::MAX);

		Self {
			rewriter_id,
			factory,
			logging,
			loaded_at: OffsetDateTime::now_utc(),
			weight,
			stamp: 0,
		}
	}

	pub fn payload(&self) -> LogPayload {
		self.logging.as_ref().map(LoggingConfig::effective_payload).unwrap_or_default()
	}

	/// Approximate bytes charged against the partition budget.
	pub fn weight(&self) -> u32 {
		self.weight
	}
}
impl fmt::Debug for CompiledFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompiledFactory")
			.field("rewriter_id", &self.rewriter_id)
			.field("loaded_at", &self.loaded_at)
			.field("weight", &self.weight)
			.finish_non_exhaustive()
	}
}

/// Invalidations seen by one partition, ordered by a partition-local clock.
#[derive(Debug, Default)]
struct Marks {
	clock: u64,
	all: u64,
	by_id: HashMap<String, u64>,
}
impl Marks {
	fn mark(&mut self, id: &str) {
		self.clock += 1;

		if self.by_id.len() >= MAX_TRACKED_MARKS && !self.by_id.contains_key(id) {
			// Collapse into a partition-wide mark.
			self.all = self.clock;
			self.by_id.clear();
		} else {
			self.by_id.insert(id.to_string(), self.clock);
		}
	}

	fn mark_all(&mut self) {
		self.clock += 1;
		self.all = self.clock;
		self.by_id.clear();
	}

	fn invalidated_since(&self, id: &str, stamp: u64) -> bool {
		self.all > stamp || self.by_id.get(id).is_some_and(|at| *at > stamp)
	}
}

/// Compiled rewriters of one partition.
///
/// Loads go through [`Cache::try_get_with`], so concurrent callers asking for the same id share a
/// single store read and compilation while loads of different ids proceed independently. A failed
/// load inserts nothing.
///
/// moka keeps a pending load alive across [`Cache::invalidate`], so every compiled instance carries
/// the invalidation clock read before its definition was fetched. An instance read before the
/// latest invalidation of its id is never handed out: it is removed and loaded again.
pub struct PartitionCache {
	partition: PartitionId,
	entries: Cache<String, Arc<CompiledFactory>>,
	marks: Mutex<Marks>,
	store: Arc<dyn DefinitionStore>,
	loader: FactoryLoader,
}
impl PartitionCache {
	pub fn new(
		partition: PartitionId,
		store: Arc<dyn DefinitionStore>,
		loader: FactoryLoader,
		settings: &CacheSettings,
	) -> Self {
		let listener_partition = partition.clone();
		let mut builder = Cache::<String, Arc<CompiledFactory>>::builder()
			.weigher(|_id: &String, compiled: &Arc<CompiledFactory>| compiled.weight())
			.eviction_listener(move |id: Arc<String>, _compiled, cause: RemovalCause| {
				if cause.was_evicted() {
					tracing::debug!(
						partition = %listener_partition,
						rewriter_id = %id,
						cause = ?cause,
						"Compiled rewriter evicted."
					);
				}
			});

		if let Some(max_bytes) = settings.max_bytes {
			builder = builder.max_capacity(max_bytes);
		}
		if let Some(ttl) = settings.expire_after_write {
			builder = builder.time_to_live(ttl);
		}
		if let Some(tti) = settings.expire_after_access {
			builder = builder.time_to_idle(tti);
		}

		Self { partition, entries: builder.build(), marks: Mutex::default(), store, loader }
	}

	pub fn partition(&self) -> &PartitionId {
		&self.partition
	}

	/// Returns the cached factory for `id`, loading it from the store on a miss.
	pub async fn get_or_load(&self, id: &str) -> Result<Arc<CompiledFactory>> {
		for _ in 0..MAX_LOAD_ATTEMPTS {
			let compiled = self
				.entries
				.try_get_with_by_ref(id, self.load(id))
				.await
				.map_err(|err: Arc<Error>| (*err).clone())?;

			if !self.is_stale(id, &compiled) {
				return Ok(compiled);
			}

			tracing::debug!(
				partition = %self.partition,
				rewriter_id = %id,
				"Discarding rewriter compiled before its invalidation."
			);

			self.discard(id, &compiled).await;
		}

		Err(Error::StoreUnavailable {
			message: format!("Rewriter {id:?} kept changing while it was loading."),
		})
	}

	/// Recompiles `id` from the store if this partition currently holds it.
	///
	/// Returns whether an entry was present. A definition that disappeared from the store drops the
	/// entry; any other failure leaves the existing entry in place. Loads of `id` still in flight
	/// when no entry is present are discarded, as they may predate the change being announced.
	pub async fn force_reload(&self, id: &str) -> Result<bool> {
		if !self.entries.contains_key(id) {
			self.marks().mark(id);

			return Ok(false);
		}

		match self.load(id).await {
			Ok(compiled) => {
				if !self.replace(id, compiled).await {
					tracing::debug!(
						partition = %self.partition,
						rewriter_id = %id,
						"Rewriter invalidated during reload; reloaded instance dropped."
					);

					return Ok(true);
				}

				tracing::debug!(
					partition = %self.partition,
					rewriter_id = %id,
					"Rewriter reloaded."
				);
			},
			Err(Error::NotFound { .. }) => {
				self.invalidate(id).await;

				tracing::info!(
					partition = %self.partition,
					rewriter_id = %id,
					"Rewriter definition is gone; cache entry dropped."
				);
			},
			Err(err) => {
				tracing::warn!(
					partition = %self.partition,
					rewriter_id = %id,
					error = %err,
					"Rewriter reload failed; keeping cached instance."
				);

				return Err(err);
			},
		}

		Ok(true)
	}

	/// Returns whether an entry was present.
	pub async fn invalidate(&self, id: &str) -> bool {
		self.marks().mark(id);

		self.entries.remove(id).await.is_some()
	}

	pub fn invalidate_all(&self) {
		self.marks().mark_all();
		self.entries.invalidate_all();
	}

	pub fn contains(&self, id: &str) -> bool {
		self.entries.contains_key(id)
	}

	pub async fn entry_count(&self) -> u64 {
		self.entries.run_pending_tasks().await;

		self.entries.entry_count()
	}

	pub async fn weighted_size(&self) -> u64 {
		self.entries.run_pending_tasks().await;

		self.entries.weighted_size()
	}

	async fn load(&self, id: &str) -> Result<Arc<CompiledFactory>> {
		let stamp = self.marks().clock;
		let Some(definition) = self.store.get(id).await? else {
			return Err(Error::NotFound { id: id.to_string() });
		};
		let factory = self.loader.load(id, &definition)?;

		tracing::debug!(
			partition = %self.partition,
			rewriter_id = %id,
			kind = %definition.kind,
			"Rewriter compiled."
		);

		let mut compiled = CompiledFactory::new(id, factory, definition.logging);

		compiled.stamp = stamp;

		Ok(Arc::new(compiled))
	}

	/// Installs a reloaded instance unless `id` was invalidated after it was read.
	///
	/// The check runs again after the insert: an invalidation that slipped in between has already
	/// bumped the clock, so the instance is taken back out.
	async fn replace(&self, id: &str, compiled: Arc<CompiledFactory>) -> bool {
		if self.is_stale(id, &compiled) {
			return false;
		}

		self.entries.insert(id.to_string(), compiled.clone()).await;

		if self.is_stale(id, &compiled) {
			self.discard(id, &compiled).await;

			return false;
		}

		true
	}

	/// Removes `compiled` if it is still the cached instance for `id`.
	async fn discard(&self, id: &str, compiled: &Arc<CompiledFactory>) {
		let result = self
			.entries
			.entry_by_ref(id)
			.and_compute_with(|entry| {
				let op = match entry {
					Some(entry) if Arc::ptr_eq(entry.value(), compiled) => Op::Remove,
					_ => Op::Nop,
				};

				future::ready(op)
			})
			.await;

		if let CompResult::Removed(_) = result {
			tracing::debug!(
				partition = %self.partition,
				rewriter_id = %id,
				"Stale rewriter removed."
			);
		}
	}

	fn is_stale(&self, id: &str, compiled: &CompiledFactory) -> bool {
		self.marks().invalidated_since(id, compiled.stamp)
	}

	fn marks(&self) -> MutexGuard<'_, Marks> {
		self.marks.lock().unwrap_or_else(|err| err.into_inner())
	}
}
impl fmt::Debug for PartitionCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PartitionCache")
			.field("partition", &self.partition)
			.field("entries", &self.entries.entry_count())
			.finish_non_exhaustive()
	}
}
