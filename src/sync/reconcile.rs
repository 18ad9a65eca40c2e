//! Reconciliation writer: per-page upserts and the post-cycle reaper.

// self
use crate::{
	_prelude::*,
	model::AuthorizerRecord,
	obs::{self, FlowOutcome, SyncKind, SyncSpan},
	sync::Mirror,
};

impl Mirror {
	/// Upserts one enriched page, stamping every record as seen at `observed_at`.
	pub async fn reconcile_page(
		&self,
		records: Vec<AuthorizerRecord>,
		observed_at: OffsetDateTime,
	) -> Result<()> {
		if records.is_empty() {
			return Ok(());
		}

		self.store.upsert_batch(records, observed_at).await?;

		Ok(())
	}

	/// Deletes records not seen since `started_at`, but only when the cycle succeeded.
	///
	/// Returns `None` without touching the store for a failed cycle.
	pub async fn reap_if_cycle_succeeded(
		&self,
		started_at: OffsetDateTime,
		succeeded: bool,
	) -> Result<Option<usize>> {
		if !succeeded {
			return Ok(None);
		}

		let span = SyncSpan::new(SyncKind::Reap, "delete_older_than");
		let reaped = span.instrument(self.store.delete_older_than(started_at)).await?;

		obs::record_flow_outcome(SyncKind::Reap, FlowOutcome::Success);
		obs::step_completed(SyncKind::Reap, "reap", reaped);
		self.metrics.record_reaped(reaped);

		Ok(Some(reaped))
	}
}
