//! Thread-safe in-memory [`RecordStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	model::{AppId, AuthorizerRecord, Handle},
	store::{ProfilePatch, RecordFilter, RecordPage, RecordStore, RecordTable, StoreFuture},
};

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<RecordTable>>);
impl MemoryStore {
	/// Number of mirrored records.
	pub fn len(&self) -> usize {
		self.0.read().rows().len()
	}

	/// Returns `true` when nothing is mirrored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl RecordStore for MemoryStore {
	fn upsert_batch(
		&self,
		records: Vec<AuthorizerRecord>,
		observed_at: OffsetDateTime,
	) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().upsert(records, observed_at);

			Ok(())
		})
	}

	fn patch_profiles(&self, patches: Vec<ProfilePatch>) -> StoreFuture<'_, usize> {
		Box::pin(async move { Ok(self.0.write().patch(patches)) })
	}

	fn delete_older_than(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, usize> {
		Box::pin(async move { Ok(self.0.write().delete_older_than(cutoff)) })
	}

	fn query<'a>(
		&'a self,
		filter: &'a RecordFilter,
		offset: usize,
		limit: usize,
	) -> StoreFuture<'a, RecordPage> {
		Box::pin(async move { Ok(self.0.read().query(filter, offset, limit)) })
	}

	fn fetch<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<AuthorizerRecord>> {
		Box::pin(async move { Ok(self.0.read().get(app_id)) })
	}

	fn find_by_handle<'a>(
		&'a self,
		handle: &'a Handle,
	) -> StoreFuture<'a, Option<AuthorizerRecord>> {
		Box::pin(async move { Ok(self.0.read().find_by_handle(handle)) })
	}

	fn last_seen<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<OffsetDateTime>> {
		Box::pin(async move { Ok(self.0.read().last_seen(app_id)) })
	}
}
