use std::time::Duration;

use serde_json::Value;
use sqlx::{PgPool, types::Json};
use time::OffsetDateTime;
use tokio::time::timeout;

use qrw_rewriter::RewriterDefinition;

use crate::{BoxFuture, DefinitionStore, Result, document};

/// Definition store backed by the `rewriter_definitions` table.
#[derive(Clone, Debug)]
pub struct PgStore {
	pool: PgPool,
	timeout: Duration,
}
impl PgStore {
	pub fn new(pool: PgPool, timeout: Duration) -> Self {
		Self { pool, timeout }
	}

	async fn fetch(&self, id: &str) -> Result<Option<RewriterDefinition>> {
		let row: Option<(Json<Value>,)> = timeout(
			self.timeout,
			sqlx::query_as("SELECT document FROM rewriter_definitions WHERE rewriter_id = $1")
				.bind(id)
				.fetch_optional(&self.pool),
		)
		.await??;

		row.map(|(Json(doc),)| document::from_document(id, &doc)).transpose()
	}

	async fn upsert(&self, definition: &RewriterDefinition) -> Result<()> {
		let doc = document::to_document(definition)?;
		let now = OffsetDateTime::now_utc();

		timeout(
			self.timeout,
			sqlx::query(
				"\
INSERT INTO rewriter_definitions (rewriter_id, document, updated_at)
VALUES ($1, $2, $3)
ON CONFLICT (rewriter_id) DO UPDATE
SET document = EXCLUDED.document,
	updated_at = EXCLUDED.updated_at",
			)
			.bind(definition.id.as_str())
			.bind(Json(doc))
			.bind(now)
			.execute(&self.pool),
		)
		.await??;

		tracing::debug!(rewriter_id = %definition.id, "Definition written.");

		Ok(())
	}

	async fn remove(&self, id: &str) -> Result<bool> {
		let result = timeout(
			self.timeout,
			sqlx::query("DELETE FROM rewriter_definitions WHERE rewriter_id = $1")
				.bind(id)
				.execute(&self.pool),
		)
		.await??;

		Ok(result.rows_affected() > 0)
	}
}
impl DefinitionStore for PgStore {
	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<RewriterDefinition>>> {
		Box::pin(self.fetch(id))
	}

	fn put<'a>(&'a self, definition: &'a RewriterDefinition) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.upsert(definition))
	}

	fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(self.remove(id))
	}
}
