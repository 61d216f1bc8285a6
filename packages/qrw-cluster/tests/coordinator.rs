use std::{sync::Arc, time::Duration};

use qrw_cache::{CacheSettings, PartitionCacheRegistry};
use qrw_cluster::{
	Coordinator, Error, FailureKind, HttpTransport, LocalNode, NodeCommand, NodeTransport,
};
use qrw_config::Peer;
use qrw_query::Query;
use qrw_rewriter::{FactoryLoader, PartitionId};
use qrw_storage::DefinitionStore;
use qrw_testkit::{InProcessTransport, ObservedStore};

struct Cluster {
	store: Arc<ObservedStore>,
	transport: Arc<InProcessTransport>,
	nodes: Vec<LocalNode>,
}
impl Cluster {
	fn new(store: Arc<ObservedStore>, node_ids: &[&str]) -> Self {
		let transport = Arc::new(InProcessTransport::new());
		let nodes = node_ids
			.iter()
			.map(|node_id| {
				let registry = Arc::new(PartitionCacheRegistry::new(
					store.clone(),
					FactoryLoader::default(),
					CacheSettings::default(),
				));
				let node = LocalNode::new(*node_id, registry);

				transport.add_node(node.clone());

				node
			})
			.collect();

		Self { store, transport, nodes }
	}

	fn coordinator(&self, local: usize, timeout: Duration) -> Coordinator {
		let peers = self
			.nodes
			.iter()
			.enumerate()
			.filter(|(idx, _)| *idx != local)
			.map(|(_, node)| Peer {
				node_id: node.node_id().to_string(),
				base_url: format!("http://{}.invalid", node.node_id()),
			})
			.collect();

		Coordinator::new(self.nodes[local].clone(), peers, self.transport.clone(), timeout)
	}

	async fn warm(&self, id: &str) {
		for node in &self.nodes {
			node.registry()
				.get_or_create(&PartitionId::new("products", 0))
				.get_or_load(id)
				.await
				.expect("Warm-up load failed.");
		}
	}

	async fn actions_on(&self, node: usize, id: &str) -> Vec<String> {
		let compiled = self.nodes[node]
			.registry()
			.get_or_create(&PartitionId::new("products", 0))
			.get_or_load(id)
			.await
			.expect("Load failed.");

		qrw_testkit::run_rewriter(&compiled, Query::term("title", "labtop"))
	}
}

#[tokio::test]
async fn reload_everywhere_propagates_new_definition() {
	let store = Arc::new(ObservedStore::new());

	store
		.put(&qrw_testkit::replace_definition("spelling", "labtop", "laptop"))
		.await
		.expect("Seed failed.");

	let cluster = Cluster::new(store.clone(), &["node-a", "node-b", "node-c"]);

	cluster.warm("spelling").await;
	store
		.put(&qrw_testkit::replace_definition("spelling", "labtop", "notebook"))
		.await
		.expect("Update failed.");

	let result = cluster
		.coordinator(0, Duration::from_secs(1))
		.reload_everywhere("spelling")
		.await
		.expect("Broadcast failed.");

	assert!(result.is_complete());
	assert_eq!(result.succeeded.len(), 3);
	assert_eq!(result.partitions(), 3);

	for node in 0..3 {
		assert_eq!(cluster.actions_on(node, "spelling").await, vec!["title:labtop => notebook"]);
	}
}

#[tokio::test]
async fn unreachable_peer_is_reported_without_aborting() {
	let store = Arc::new(ObservedStore::new());

	store
		.put(&qrw_testkit::replace_definition("spelling", "labtop", "laptop"))
		.await
		.expect("Seed failed.");

	let cluster = Cluster::new(store.clone(), &["node-a", "node-b", "node-c"]);

	cluster.warm("spelling").await;
	cluster.transport.set_down("node-b", true);

	let result = cluster
		.coordinator(0, Duration::from_secs(1))
		.clear_everywhere(Some("spelling"))
		.await
		.expect("Broadcast failed.");

	assert_eq!(result.succeeded.len(), 2);
	assert_eq!(result.failed.len(), 1);
	assert_eq!(result.failed[0].node_id, "node-b");
	assert_eq!(result.failed[0].kind, FailureKind::Unreachable);

	let partition = PartitionId::new("products", 0);

	assert!(!cluster.nodes[0].registry().get_or_create(&partition).contains("spelling"));
	assert!(cluster.nodes[1].registry().get_or_create(&partition).contains("spelling"));
	assert!(!cluster.nodes[2].registry().get_or_create(&partition).contains("spelling"));
}

#[tokio::test]
async fn node_errors_are_distinguished_from_unreachable_nodes() {
	let store = Arc::new(ObservedStore::new());

	store
		.put(&qrw_testkit::replace_definition("spelling", "labtop", "laptop"))
		.await
		.expect("Seed failed.");

	let cluster = Cluster::new(store.clone(), &["node-a", "node-b"]);

	cluster.warm("spelling").await;
	store.set_unavailable(true);

	let result = cluster
		.coordinator(0, Duration::from_secs(1))
		.reload_everywhere("spelling")
		.await
		.expect("Reached nodes should not fail the broadcast.");

	assert!(result.succeeded.is_empty());
	assert!(result.failed.iter().all(|failure| failure.kind == FailureKind::NodeError));
}

#[tokio::test]
async fn clear_all_reports_partitions_per_node() {
	let store = Arc::new(ObservedStore::new());
	let cluster = Cluster::new(store, &["node-a", "node-b"]);

	cluster.nodes[1].registry().get_or_create(&PartitionId::new("products", 0));
	cluster.nodes[1].registry().get_or_create(&PartitionId::new("products", 1));

	let result = cluster
		.coordinator(0, Duration::from_secs(1))
		.clear_everywhere(None)
		.await
		.expect("Broadcast failed.");

	assert_eq!(result.command, NodeCommand::clear(None));
	assert_eq!(result.partitions(), 2);
}

#[tokio::test]
async fn zero_reachable_nodes_fails_the_broadcast() {
	let store = Arc::new(ObservedStore::new().with_get_delay(Duration::from_millis(300)));

	store
		.put(&qrw_testkit::replace_definition("spelling", "labtop", "laptop"))
		.await
		.expect("Seed failed.");

	let cluster = Cluster::new(store, &["node-a", "node-b"]);

	cluster.warm("spelling").await;
	cluster.transport.set_down("node-b", true);

	let err = cluster
		.coordinator(0, Duration::from_millis(20))
		.reload_everywhere("spelling")
		.await
		.expect_err("Broadcast should fail.");

	match err {
		Error::NoNodesReachable { failures } => assert_eq!(failures.len(), 2),
		other => panic!("Expected NoNodesReachable, got {other:?}."),
	}
}

#[tokio::test]
async fn http_transport_reports_connection_failures_as_unreachable() {
	let transport = HttpTransport::new(Duration::from_millis(500)).expect("Client build failed.");
	let peer = Peer { node_id: "node-x".to_string(), base_url: "http://127.0.0.1:9".to_string() };
	let err = transport
		.send(&peer, &NodeCommand::reload("r1"))
		.await
		.expect_err("Send should fail.");

	assert!(matches!(err, Error::NodeUnreachable { node_id, .. } if node_id == "node-x"));
}
