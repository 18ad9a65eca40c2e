//! Bounded concurrent profile enrichment for one page of entries.

// crates.io
use futures::future;
// self
use crate::{
	model::{AuthorizerEntry, AuthorizerRecord},
	obs::{self, SyncKind, SyncSpan},
	sync::Mirror,
};

impl Mirror {
	/// Fetches the profile of every entry concurrently and returns records in input order.
	///
	/// Never fails: an entry whose lookup errors or times out comes back bare
	/// (`profile: None`) so it is still persisted and counted as observed.
	pub async fn enrich(&self, entries: Vec<AuthorizerEntry>) -> Vec<AuthorizerRecord> {
		let span = SyncSpan::new(SyncKind::Enrich, "enrich");

		span.instrument(future::join_all(entries.into_iter().map(|entry| self.enrich_entry(entry))))
			.await
	}

	async fn enrich_entry(&self, entry: AuthorizerEntry) -> AuthorizerRecord {
		match self.fetch_profile(&entry.app_id).await {
			Ok(info) => AuthorizerRecord::bare(entry).with_profile(info.profile),
			Err(e) => {
				obs::absorbed_failure(SyncKind::Enrich, &entry.app_id, &e);
				obs::record_enrich_failure();
				self.metrics.record_enrich_failure();

				AuthorizerRecord::bare(entry)
			},
		}
	}
}
