pub mod db;
pub mod document;
pub mod memory;
pub mod postgres;
pub mod schema;

mod error;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use qrw_rewriter::RewriterDefinition;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable, authoritative mapping from rewriter id to definition.
pub trait DefinitionStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<RewriterDefinition>>>;

	/// Inserts or replaces the definition stored under `definition.id`.
	fn put<'a>(&'a self, definition: &'a RewriterDefinition) -> BoxFuture<'a, Result<()>>;

	/// Returns whether a definition was removed.
	fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>>;
}

/// Opens the store selected by `storage.backend`.
pub async fn open(cfg: &qrw_config::Storage) -> Result<Arc<dyn DefinitionStore>> {
	match cfg.backend.as_str() {
		"memory" => Ok(Arc::new(MemoryStore::new())),
		"postgres" => {
			let Some(postgres) = cfg.postgres.as_ref() else {
				return Err(Error::Configuration {
					message: "storage.postgres is required for the postgres backend.".to_string(),
				});
			};
			let db = db::Db::connect(postgres).await?;

			db.ensure_schema().await?;

			tracing::info!(pool_max_conns = postgres.pool_max_conns, "Definition store connected.");

			Ok(Arc::new(PgStore::new(db.pool, Duration::from_millis(cfg.timeout_ms))))
		},
		other =>
			Err(Error::Configuration { message: format!("Unknown storage backend {other:?}.") }),
	}
}
