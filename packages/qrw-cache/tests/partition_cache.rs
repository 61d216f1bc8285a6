use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::{Duration, Instant},
};

use serde_json::json;

use qrw_cache::{CacheSettings, Error, PartitionCache, PartitionCacheRegistry};
use qrw_rewriter::{FactoryLoader, KindRegistry, PartitionId, builtin};
use qrw_storage::DefinitionStore;
use qrw_testkit::ObservedStore;

fn partition(shard: u32) -> PartitionId {
	PartitionId::new("products", shard)
}

fn cache_over(store: Arc<ObservedStore>, settings: CacheSettings) -> PartitionCache {
	PartitionCache::new(partition(0), store, FactoryLoader::default(), &settings)
}

async fn seed(store: &ObservedStore, id: &str, from: &str, to: &str) {
	store
		.put(&qrw_testkit::replace_definition(id, from, to))
		.await
		.expect("Failed to seed definition.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cold_lookups_load_once() {
	let store = Arc::new(ObservedStore::new().with_get_delay(Duration::from_millis(50)));
	let constructed = Arc::new(AtomicUsize::new(0));
	let counter = constructed.clone();
	let mut kinds = KindRegistry::empty();

	kinds.register("counted", move |id| {
		counter.fetch_add(1, Ordering::SeqCst);

		builtin::noop::construct(id)
	});
	store
		.put(&qrw_testkit::definition("r1", "counted", json!({})))
		.await
		.expect("Failed to seed definition.");

	let cache = Arc::new(PartitionCache::new(
		partition(0),
		store.clone(),
		FactoryLoader::new(kinds),
		&CacheSettings::default(),
	));
	let handles = (0..16)
		.map(|_| {
			let cache = cache.clone();

			tokio::spawn(async move { cache.get_or_load("r1").await })
		})
		.collect::<Vec<_>>();
	let mut loaded = Vec::new();

	for handle in handles {
		loaded.push(handle.await.expect("Task panicked.").expect("Load failed."));
	}

	assert_eq!(store.get_count(), 1);
	assert_eq!(constructed.load(Ordering::SeqCst), 1);
	assert!(loaded.iter().all(|compiled| Arc::ptr_eq(compiled, &loaded[0])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_load_does_not_block_other_ids() {
	let store = Arc::new(ObservedStore::new().with_get_delay(Duration::from_millis(200)));

	seed(&store, "a", "a", "b").await;
	seed(&store, "b", "a", "b").await;

	let cache = Arc::new(cache_over(store.clone(), CacheSettings::default()));
	let started = Instant::now();
	let handles = ["a", "b"]
		.into_iter()
		.map(|id| {
			let cache = cache.clone();

			tokio::spawn(async move { cache.get_or_load(id).await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.await.expect("Task panicked.").expect("Load failed.");
	}

	assert!(started.elapsed() < Duration::from_millis(350), "took {:?}", started.elapsed());
	assert_eq!(store.get_count(), 2);
}

#[tokio::test]
async fn cached_instance_is_reused_until_invalidated() {
	let store = Arc::new(ObservedStore::new());

	store
		.put(&qrw_testkit::definition("r1", builtin::noop::KIND, json!({})))
		.await
		.expect("Failed to seed definition.");

	let cache = cache_over(store.clone(), CacheSettings::default());
	let first = cache.get_or_load("r1").await.expect("Load failed.");
	let second = cache.get_or_load("r1").await.expect("Load failed.");

	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(store.get_count(), 1);
	assert!(cache.invalidate("r1").await);

	let third = cache.get_or_load("r1").await.expect("Load failed.");

	assert!(!Arc::ptr_eq(&first, &third));
	assert_eq!(store.get_count(), 2);
}

#[tokio::test]
async fn invalidate_then_update_serves_new_definition() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "spelling", "labtop", "laptop").await;

	let cache = cache_over(store.clone(), CacheSettings::default());
	let old = cache.get_or_load("spelling").await.expect("Load failed.");

	seed(&store, "spelling", "labtop", "notebook").await;

	// Without invalidation the old compiled instance is still served.
	assert!(Arc::ptr_eq(&old, &cache.get_or_load("spelling").await.expect("Load failed.")));

	cache.invalidate("spelling").await;

	let fresh = cache.get_or_load("spelling").await.expect("Load failed.");
	let actions = qrw_testkit::run_rewriter(&fresh, qrw_query::Query::term("title", "labtop"));

	assert_eq!(actions, vec!["title:labtop => notebook"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn load_in_flight_during_update_is_not_kept() {
	let store = Arc::new(ObservedStore::new().with_reply_delay(Duration::from_millis(200)));

	seed(&store, "spelling", "labtop", "laptop").await;

	let cache = Arc::new(cache_over(store.clone(), CacheSettings::default()));
	let pending = {
		let cache = cache.clone();

		tokio::spawn(async move { cache.get_or_load("spelling").await })
	};

	// The spawned load has read the old definition and is still stalling.
	tokio::time::sleep(Duration::from_millis(50)).await;
	seed(&store, "spelling", "labtop", "notebook").await;

	assert!(!cache.force_reload("spelling").await.expect("Reload failed."));
	assert!(!cache.invalidate("spelling").await);

	let raced = pending.await.expect("Task panicked.").expect("Load failed.");
	let query = || qrw_query::Query::term("title", "labtop");

	assert_eq!(qrw_testkit::run_rewriter(&raced, query()), vec!["title:labtop => notebook"]);

	let fresh = cache.get_or_load("spelling").await.expect("Load failed.");

	assert_eq!(qrw_testkit::run_rewriter(&fresh, query()), vec!["title:labtop => notebook"]);
	assert_eq!(store.get_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn clear_all_discards_loads_in_flight() {
	let store = Arc::new(ObservedStore::new().with_reply_delay(Duration::from_millis(200)));

	seed(&store, "spelling", "labtop", "laptop").await;

	let cache = Arc::new(cache_over(store.clone(), CacheSettings::default()));
	let pending = {
		let cache = cache.clone();

		tokio::spawn(async move { cache.get_or_load("spelling").await })
	};

	tokio::time::sleep(Duration::from_millis(50)).await;
	seed(&store, "spelling", "labtop", "notebook").await;
	cache.invalidate_all();

	pending.await.expect("Task panicked.").expect("Load failed.");

	let fresh = cache.get_or_load("spelling").await.expect("Load failed.");
	let actions = qrw_testkit::run_rewriter(&fresh, qrw_query::Query::term("title", "labtop"));

	assert_eq!(actions, vec!["title:labtop => notebook"]);
}

#[tokio::test]
async fn missing_definition_is_not_found_and_not_cached() {
	let store = Arc::new(ObservedStore::new());
	let cache = cache_over(store.clone(), CacheSettings::default());

	assert!(matches!(
		cache.get_or_load("missing").await,
		Err(Error::NotFound { id }) if id == "missing"
	));
	assert!(!cache.contains("missing"));

	seed(&store, "missing", "a", "b").await;

	assert!(cache.get_or_load("missing").await.is_ok());
}

#[tokio::test]
async fn load_errors_surface_and_leave_nothing_behind() {
	let store = Arc::new(ObservedStore::new());

	store
		.put(&qrw_testkit::definition("bad", "com.example.Missing", json!({})))
		.await
		.expect("Failed to seed definition.");
	store
		.put(&qrw_testkit::definition("invalid", builtin::replace::KIND, json!({ "rules": {} })))
		.await
		.expect("Failed to seed definition.");

	let cache = cache_over(store, CacheSettings::default());

	assert!(matches!(cache.get_or_load("bad").await, Err(Error::UnknownKind { .. })));
	assert!(matches!(cache.get_or_load("invalid").await, Err(Error::InvalidConfig { .. })));
	assert_eq!(cache.entry_count().await, 0);
}

#[tokio::test]
async fn force_reload_skips_absent_entries() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let cache = cache_over(store.clone(), CacheSettings::default());

	assert!(!cache.force_reload("r1").await.expect("Reload failed."));
	assert_eq!(store.get_count(), 0);
	assert!(!cache.contains("r1"));
}

#[tokio::test]
async fn force_reload_replaces_entry() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let cache = cache_over(store.clone(), CacheSettings::default());
	let old = cache.get_or_load("r1").await.expect("Load failed.");

	assert!(cache.force_reload("r1").await.expect("Reload failed."));

	let new = cache.get_or_load("r1").await.expect("Load failed.");

	assert!(!Arc::ptr_eq(&old, &new));
	assert_eq!(store.get_count(), 2);
}

#[tokio::test]
async fn failed_reload_keeps_existing_entry() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let cache = cache_over(store.clone(), CacheSettings::default());
	let old = cache.get_or_load("r1").await.expect("Load failed.");

	store.set_unavailable(true);

	assert!(matches!(cache.force_reload("r1").await, Err(Error::StoreUnavailable { .. })));

	store.set_unavailable(false);

	assert!(Arc::ptr_eq(&old, &cache.get_or_load("r1").await.expect("Load failed.")));
}

#[tokio::test]
async fn reload_of_deleted_definition_drops_entry() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let cache = cache_over(store.clone(), CacheSettings::default());

	cache.get_or_load("r1").await.expect("Load failed.");
	store.delete("r1").await.expect("Failed to delete definition.");

	assert!(cache.force_reload("r1").await.expect("Reload failed."));
	assert!(!cache.contains("r1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reload_in_flight_during_delete_does_not_restore_entry() {
	let store = Arc::new(ObservedStore::new().with_reply_delay(Duration::from_millis(200)));

	seed(&store, "r1", "a", "b").await;

	let cache = Arc::new(cache_over(store.clone(), CacheSettings::default()));

	cache.get_or_load("r1").await.expect("Load failed.");

	let reloading = {
		let cache = cache.clone();

		tokio::spawn(async move { cache.force_reload("r1").await })
	};

	// The reload has read the definition that is about to be deleted.
	tokio::time::sleep(Duration::from_millis(50)).await;

	assert!(store.delete("r1").await.expect("Failed to delete definition."));
	assert!(cache.invalidate("r1").await);
	assert!(reloading.await.expect("Task panicked.").expect("Reload failed."));
	assert!(!cache.contains("r1"));
	assert!(matches!(cache.get_or_load("r1").await, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn entries_expire_after_write() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let settings = CacheSettings {
		expire_after_write: Some(Duration::from_millis(100)),
		..CacheSettings::default()
	};
	let cache = cache_over(store.clone(), settings);
	let first = cache.get_or_load("r1").await.expect("Load failed.");

	tokio::time::sleep(Duration::from_millis(250)).await;

	let second = cache.get_or_load("r1").await.expect("Load failed.");

	assert!(!Arc::ptr_eq(&first, &second));
	assert_eq!(store.get_count(), 2);
}

#[tokio::test]
async fn idle_entries_expire_after_access() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "busy", "a", "b").await;
	seed(&store, "idle", "a", "b").await;

	let settings = CacheSettings {
		expire_after_access: Some(Duration::from_millis(150)),
		..CacheSettings::default()
	};
	let cache = cache_over(store.clone(), settings);
	let busy = cache.get_or_load("busy").await.expect("Load failed.");
	let idle = cache.get_or_load("idle").await.expect("Load failed.");

	for _ in 0..6 {
		tokio::time::sleep(Duration::from_millis(50)).await;

		assert!(Arc::ptr_eq(&busy, &cache.get_or_load("busy").await.expect("Load failed.")));
	}

	assert!(!Arc::ptr_eq(&idle, &cache.get_or_load("idle").await.expect("Load failed.")));
	assert_eq!(store.get_count(), 3);
}

#[tokio::test]
async fn byte_budget_bounds_weighted_size() {
	let store = Arc::new(ObservedStore::new());

	for idx in 0..32 {
		seed(&store, &format!("r{idx}"), "a", "b").await;
	}

	let settings = CacheSettings { max_bytes: Some(2_048), ..CacheSettings::default() };
	let cache = cache_over(store.clone(), settings);

	for idx in 0..32 {
		cache.get_or_load(&format!("r{idx}")).await.expect("Load failed.");
	}

	assert!(cache.weighted_size().await <= 2_048);
	assert!(cache.entry_count().await < 32);
}

#[tokio::test]
async fn registry_isolates_partitions() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let registry = PartitionCacheRegistry::new(
		store.clone(),
		FactoryLoader::default(),
		CacheSettings::default(),
	);
	let shard0 = registry.get_or_create(&partition(0));
	let shard1 = registry.get_or_create(&partition(1));

	assert!(Arc::ptr_eq(&shard0, &registry.get_or_create(&partition(0))));

	let a = shard0.get_or_load("r1").await.expect("Load failed.");
	let b = shard1.get_or_load("r1").await.expect("Load failed.");

	assert!(!Arc::ptr_eq(&a, &b));
	assert_eq!(store.get_count(), 2);
	assert_eq!(registry.partitions(), vec![partition(0), partition(1)]);
}

#[tokio::test]
async fn registry_broadcast_helpers_count_partitions() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let registry = PartitionCacheRegistry::new(
		store.clone(),
		FactoryLoader::default(),
		CacheSettings::default(),
	);

	registry.get_or_create(&partition(0)).get_or_load("r1").await.expect("Load failed.");
	registry.get_or_create(&partition(1));

	assert_eq!(registry.reload("r1").await.expect("Reload failed."), 1);
	assert_eq!(registry.reload("unused").await.expect("Reload failed."), 0);
	assert_eq!(registry.invalidate("r1").await, 1);
	assert_eq!(registry.invalidate_all(), 2);
}

#[tokio::test]
async fn removed_partition_starts_cold() {
	let store = Arc::new(ObservedStore::new());

	seed(&store, "r1", "a", "b").await;

	let registry = PartitionCacheRegistry::new(
		store.clone(),
		FactoryLoader::default(),
		CacheSettings::default(),
	);
	let old = registry.get_or_create(&partition(0));

	old.get_or_load("r1").await.expect("Load failed.");

	assert!(registry.remove(&partition(0)));
	assert!(!registry.remove(&partition(0)));
	assert!(!old.contains("r1"));
	assert!(registry.get(&partition(0)).is_none());
	assert!(!registry.get_or_create(&partition(0)).contains("r1"));
}

#[tokio::test]
async fn open_refuses_partitions_past_the_limit() {
	let registry = PartitionCacheRegistry::new(
		Arc::new(ObservedStore::new()),
		FactoryLoader::default(),
		CacheSettings { max_partitions: Some(2), ..CacheSettings::default() },
	);
	let shard0 = registry.open(&partition(0)).expect("Open failed.");

	registry.open(&partition(1)).expect("Open failed.");

	assert!(Arc::ptr_eq(&shard0, &registry.open(&partition(0)).expect("Open failed.")));
	assert!(matches!(
		registry.open(&partition(2)),
		Err(Error::PartitionLimit { limit: 2, .. })
	));
	assert!(registry.get(&partition(2)).is_none());
	assert!(registry.remove(&partition(1)));
	assert!(registry.open(&partition(2)).is_ok());
}
