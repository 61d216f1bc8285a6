use qrw_cache::CompiledFactory;
use qrw_rewriter::{LogPayload, PartitionId, TRACING_SINK};

/// Emits the rewriter's configured info log for one application.
pub(crate) fn applied(compiled: &CompiledFactory, partition: &PartitionId, actions: &[String]) {
	let Some(logging) = compiled.logging.as_ref() else {
		return;
	};

	for sink in &logging.sinks {
		if sink != TRACING_SINK {
			continue;
		}

		match logging.effective_payload() {
			LogPayload::None => {},
			LogPayload::RewriterId => tracing::info!(
				target: "qrw::rewriter",
				rewriter_id = %compiled.rewriter_id,
				partition = %partition,
				"Rewriter applied."
			),
			LogPayload::Detail => tracing::info!(
				target: "qrw::rewriter",
				rewriter_id = %compiled.rewriter_id,
				partition = %partition,
				actions = ?actions,
				"Rewriter applied."
			),
		}
	}
}
