//! Storage contracts and built-in store implementations for mirrored authorizer records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	model::{AppId, AuthorizerProfile, AuthorizerRecord, Handle, ProfileField},
};

/// Boxed future returned by [`RecordStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by authorizer record stores.
///
/// Every record is keyed by its [`AppId`]; the store keeps a `last_seen_at` instant beside each
/// record that only the reaper reads.
pub trait RecordStore
where
	Self: Send + Sync,
{
	/// Inserts or replaces every record, stamping `last_seen_at` with `observed_at`.
	///
	/// `last_seen_at` never moves backwards, and a bare incoming record keeps the profile
	/// already stored for the same app id.
	fn upsert_batch(
		&self,
		records: Vec<AuthorizerRecord>,
		observed_at: OffsetDateTime,
	) -> StoreFuture<'_, ()>;

	/// Replaces the profile of records that still exist and returns how many were patched.
	///
	/// A patch applies only while the stored profile equals [`ProfilePatch::expected`]; any other
	/// patch is skipped. Patches never create records and never touch tokens or `last_seen_at`.
	fn patch_profiles(&self, patches: Vec<ProfilePatch>) -> StoreFuture<'_, usize>;

	/// Deletes every record whose `last_seen_at` is strictly older than `cutoff`.
	fn delete_older_than(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, usize>;

	/// Returns one page of records ordered by app id, plus the total matching count.
	fn query<'a>(
		&'a self,
		filter: &'a RecordFilter,
		offset: usize,
		limit: usize,
	) -> StoreFuture<'a, RecordPage>;

	/// Fetches the record for an app id, if present.
	fn fetch<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<AuthorizerRecord>>;

	/// Fetches the record whose profile carries the given handle, if present.
	fn find_by_handle<'a>(&'a self, handle: &'a Handle)
	-> StoreFuture<'a, Option<AuthorizerRecord>>;

	/// Returns the instant the record was last observed by a pull cycle.
	fn last_seen<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<OffsetDateTime>>;
}

/// Error type produced by [`RecordStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Record narrowing applied by [`RecordStore::query`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
	/// Restricts the page to a single app id.
	pub app_id: Option<AppId>,
}
impl RecordFilter {
	fn matches(&self, record: &AuthorizerRecord) -> bool {
		self.app_id.as_ref().is_none_or(|app_id| app_id == &record.app_id)
	}
}

/// One page of mirrored records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPage {
	/// Records in app id order.
	pub records: Vec<AuthorizerRecord>,
	/// Number of records matching the filter, ignoring pagination.
	pub total: usize,
}

/// Profile correction produced by the read path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfilePatch {
	/// Record to correct.
	pub app_id: AppId,
	/// Stored profile the diff was computed against.
	pub expected: Option<AuthorizerProfile>,
	/// Freshly fetched profile.
	pub profile: AuthorizerProfile,
	/// Fields that differed from the stored profile.
	pub changed: Vec<ProfileField>,
}

/// Result of applying one [`ProfilePatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PatchOutcome {
	/// The stored profile matched the expected one and was replaced.
	Updated,
	/// The record exists but its profile changed since the diff was taken.
	ProfileMismatch,
	/// No record exists for the app id.
	Missing,
}

/// Stored record plus the bookkeeping the reaper relies on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
	/// Mirrored record.
	pub record: AuthorizerRecord,
	/// Start instant of the most recent cycle that observed the record.
	pub last_seen_at: OffsetDateTime,
}

/// Record table shared by the built-in backends.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordTable(BTreeMap<AppId, StoredRecord>);
impl RecordTable {
	pub(crate) fn from_rows(rows: Vec<StoredRecord>) -> Self {
		Self(rows.into_iter().map(|row| (row.record.app_id.clone(), row)).collect())
	}

	pub(crate) fn rows(&self) -> Vec<&StoredRecord> {
		self.0.values().collect()
	}

	pub(crate) fn upsert(&mut self, records: Vec<AuthorizerRecord>, observed_at: OffsetDateTime) {
		for mut record in records {
			match self.0.get_mut(&record.app_id) {
				Some(stored) => {
					if record.profile.is_none() {
						record.profile = stored.record.profile.take();
					}

					stored.record = record;
					stored.last_seen_at = stored.last_seen_at.max(observed_at);
				},
				None => {
					self.0.insert(
						record.app_id.clone(),
						StoredRecord { record, last_seen_at: observed_at },
					);
				},
			}
		}
	}

	pub(crate) fn patch(&mut self, patches: Vec<ProfilePatch>) -> usize {
		let mut patched = 0;

		for patch in patches {
			if self.compare_and_swap_profile(patch) == PatchOutcome::Updated {
				patched += 1;
			}
		}

		patched
	}

	pub(crate) fn compare_and_swap_profile(&mut self, patch: ProfilePatch) -> PatchOutcome {
		let Some(stored) = self.0.get_mut(&patch.app_id) else {
			return PatchOutcome::Missing;
		};

		if stored.record.profile != patch.expected {
			return PatchOutcome::ProfileMismatch;
		}

		stored.record.profile = Some(patch.profile);

		PatchOutcome::Updated
	}

	pub(crate) fn delete_older_than(&mut self, cutoff: OffsetDateTime) -> usize {
		let before = self.0.len();

		self.0.retain(|_, stored| stored.last_seen_at >= cutoff);

		before - self.0.len()
	}

	pub(crate) fn query(&self, filter: &RecordFilter, offset: usize, limit: usize) -> RecordPage {
		let matching = self.0.values().filter(|stored| filter.matches(&stored.record));
		let total = matching.clone().count();
		let records =
			matching.skip(offset).take(limit).map(|stored| stored.record.clone()).collect();

		RecordPage { records, total }
	}

	pub(crate) fn get(&self, app_id: &AppId) -> Option<AuthorizerRecord> {
		self.0.get(app_id).map(|stored| stored.record.clone())
	}

	pub(crate) fn find_by_handle(&self, handle: &Handle) -> Option<AuthorizerRecord> {
		self.0
			.values()
			.find(|stored| stored.record.handle() == Some(handle.as_ref()))
			.map(|stored| stored.record.clone())
	}

	pub(crate) fn last_seen(&self, app_id: &AppId) -> Option<OffsetDateTime> {
		self.0.get(app_id).map(|stored| stored.last_seen_at)
	}
}
