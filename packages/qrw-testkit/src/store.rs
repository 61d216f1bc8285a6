use std::{
	sync::atomic::{AtomicBool, AtomicUsize, Ordering},
	time::Duration,
};

use qrw_rewriter::RewriterDefinition;
use qrw_storage::{BoxFuture, DefinitionStore, Error, MemoryStore, Result};

/// In-memory store that counts reads and can be switched into an outage.
#[derive(Debug, Default)]
pub struct ObservedStore {
	inner: MemoryStore,
	gets: AtomicUsize,
	unavailable: AtomicBool,
	get_delay: Duration,
	reply_delay: Duration,
}
impl ObservedStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Delays every read, widening the window in which concurrent loads overlap.
	pub fn with_get_delay(mut self, delay: Duration) -> Self {
		self.get_delay = delay;

		self
	}

	/// Delays every reply after the read, so the caller holds a snapshot that later writes
	/// overtake.
	pub fn with_reply_delay(mut self, delay: Duration) -> Self {
		self.reply_delay = delay;

		self
	}

	pub fn inner(&self) -> &MemoryStore {
		&self.inner
	}

	pub fn get_count(&self) -> usize {
		self.gets.load(Ordering::SeqCst)
	}

	/// While set, every operation fails with [`Error::Unavailable`].
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	fn check_available(&self) -> Result<()> {
		if self.unavailable.load(Ordering::SeqCst) {
			return Err(Error::Unavailable { message: "Simulated outage.".to_string() });
		}

		Ok(())
	}
}
impl DefinitionStore for ObservedStore {
	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<RewriterDefinition>>> {
		Box::pin(async move {
			self.check_available()?;
			self.gets.fetch_add(1, Ordering::SeqCst);

			if !self.get_delay.is_zero() {
				tokio::time::sleep(self.get_delay).await;
			}

			let definition = self.inner.get(id).await?;

			if !self.reply_delay.is_zero() {
				tokio::time::sleep(self.reply_delay).await;
			}

			Ok(definition)
		})
	}

	fn put<'a>(&'a self, definition: &'a RewriterDefinition) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.check_available()?;

			self.inner.put(definition).await
		})
	}

	fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			self.check_available()?;

			self.inner.delete(id).await
		})
	}
}
