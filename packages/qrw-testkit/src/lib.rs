mod error;
mod store;
mod transport;

pub use error::{Error, Result};
pub use store::ObservedStore;
pub use transport::InProcessTransport;

use std::{env, future::Future, str::FromStr, thread};

use serde_json::{Map, Value};
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use qrw_cache::CompiledFactory;
use qrw_query::Query;
use qrw_rewriter::{ExpandedQuery, PartitionId, RequestParams, RewriteContext, RewriterDefinition};

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

/// Throwaway Postgres database dropped on cleanup or drop.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options: PgConnectOptions = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse QRW_PG_DSN: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("qrw_test_{}", Uuid::new_v4().simple());
		let create_sql = format!(r#"CREATE DATABASE "{}""#, name);

		admin_conn
			.execute(create_sql.as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.clone().database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		cleanup_database(&self.name, &self.admin_options).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test database cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup_database(&name, &admin_options)) {
				eprintln!("Test database cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var("QRW_PG_DSN").ok()
}

pub async fn with_test_db<F, Fut, T>(base_dsn: &str, f: F) -> Result<T>
where
	F: FnOnce(&TestDatabase) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let db = TestDatabase::new(base_dsn).await?;
	let result = f(&db).await;
	let mut db = db;

	if let Err(err) = db.cleanup_inner().await {
		eprintln!("Test database cleanup warning: {err}.");

		if result.is_ok() {
			return Err(err);
		}
	}

	result
}

/// Memory-backed node config with the given peers, for in-process clusters.
pub fn node_config(node_id: &str, peers: &[&str]) -> qrw_config::Config {
	let mut raw = format!(
		"\
[service]
http_bind = \"127.0.0.1:0\"
admin_bind = \"127.0.0.1:0\"
log_level = \"info\"

[node]
node_id = \"{node_id}\"

[storage]
backend = \"memory\"

[cluster]
request_timeout_ms = 1000
"
	);

	for peer in peers {
		raw.push_str(&format!(
			"\n[[cluster.peers]]\nnode_id = \"{peer}\"\nbase_url = \"http://{peer}.invalid\"\n"
		));
	}

	qrw_config::parse(&raw).unwrap_or_else(|err| panic!("Invalid test config: {err}."))
}

/// Definition with a JSON object config; panics on a non-object config.
pub fn definition(id: &str, kind: &str, config: Value) -> RewriterDefinition {
	let Value::Object(config) = config else {
		panic!("Definition config must be a JSON object.");
	};

	RewriterDefinition::new(id, kind, config)
}

/// `replace` definition with a single rule.
pub fn replace_definition(id: &str, from: &str, to: &str) -> RewriterDefinition {
	let mut rules = Map::new();

	rules.insert(from.to_string(), Value::from(to));

	definition(id, qrw_rewriter::builtin::replace::KIND, serde_json::json!({ "rules": rules }))
}

/// Runs one compiled rewriter over `query` with no request params and returns its actions.
pub fn run_rewriter(compiled: &CompiledFactory, query: Query) -> Vec<String> {
	let partition = PartitionId::new("test", 0);
	let params = RequestParams::default();
	let mut expanded = ExpandedQuery::new(query);
	let mut ctx = RewriteContext::new(&partition, &compiled.rewriter_id, "qrw", &params);

	compiled
		.factory
		.create_rewriter()
		.rewrite(&mut expanded, &mut ctx)
		.unwrap_or_else(|err| panic!("Rewrite failed: {err}."));

	ctx.into_actions()
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => {
				last_err = Some(err);
			},
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn cleanup_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await.map_err(|err| {
		Error::Message(format!("Failed to connect to admin database for cleanup: {err}."))
	})?;
	let drop_sql = format!(r#"DROP DATABASE IF EXISTS "{}""#, name);
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(drop_sql.as_str())
		.execute(&mut conn)
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}
