//! Simple file-backed [`RecordStore`] for lightweight deployments.
//!
//! Mutations are staged on a copy of the table; memory only changes once the snapshot is on disk.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	model::{AppId, AuthorizerRecord, Handle},
	store::{
		ProfilePatch, RecordFilter, RecordPage, RecordStore, RecordTable, StoreError, StoreFuture,
		StoredRecord,
	},
};

/// Persists the mirror to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<RecordTable>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<RecordTable, StoreError> {
		if !path.exists() {
			return Ok(RecordTable::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(RecordTable::default());
		}

		let rows: Vec<StoredRecord> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(RecordTable::from_rows(rows))
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	/// Runs `mutate` on a staged copy and publishes it only after the snapshot reached disk.
	///
	/// `mutate` reports whether it changed anything; unchanged tables are neither written nor
	/// swapped.
	fn commit<T>(
		&self,
		mutate: impl FnOnce(&mut RecordTable) -> (T, bool),
	) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let mut staged = guard.clone();
		let (output, changed) = mutate(&mut staged);

		if changed {
			self.persist(&staged)?;

			*guard = staged;
		}

		Ok(output)
	}

	fn persist(&self, table: &RecordTable) -> Result<(), StoreError> {
		let serialized =
			serde_json::to_vec_pretty(&table.rows()).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl RecordStore for FileStore {
	fn upsert_batch(
		&self,
		records: Vec<AuthorizerRecord>,
		observed_at: OffsetDateTime,
	) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.commit(|table| {
				table.upsert(records, observed_at);

				((), true)
			})
		})
	}

	fn patch_profiles(&self, patches: Vec<ProfilePatch>) -> StoreFuture<'_, usize> {
		Box::pin(async move {
			self.commit(|table| {
				let patched = table.patch(patches);

				(patched, patched > 0)
			})
		})
	}

	fn delete_older_than(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, usize> {
		Box::pin(async move {
			self.commit(|table| {
				let deleted = table.delete_older_than(cutoff);

				(deleted, deleted > 0)
			})
		})
	}

	fn query<'a>(
		&'a self,
		filter: &'a RecordFilter,
		offset: usize,
		limit: usize,
	) -> StoreFuture<'a, RecordPage> {
		Box::pin(async move { Ok(self.inner.read().query(filter, offset, limit)) })
	}

	fn fetch<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<AuthorizerRecord>> {
		Box::pin(async move { Ok(self.inner.read().get(app_id)) })
	}

	fn find_by_handle<'a>(
		&'a self,
		handle: &'a Handle,
	) -> StoreFuture<'a, Option<AuthorizerRecord>> {
		Box::pin(async move { Ok(self.inner.read().find_by_handle(handle)) })
	}

	fn last_seen<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<OffsetDateTime>> {
		Box::pin(async move { Ok(self.inner.read().last_seen(app_id)) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use time::macros;
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::model::AuthorizerProfile;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"authorizer_sync_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record() -> AuthorizerRecord {
		AuthorizerRecord::builder(AppId::new("wx-file").expect("Failed to build app id fixture."))
			.refresh_token("refresh-token")
			.authorized_at(macros::datetime!(2025-03-01 08:00 UTC))
			.profile(AuthorizerProfile { handle: "gh_file".into(), ..Default::default() })
			.build()
			.expect("Failed to build file-store test record.")
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let record = build_record();
		let seen = macros::datetime!(2025-03-02 00:00 UTC);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.upsert_batch(vec![record.clone()], seen))
			.expect("Failed to save fixture record to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let handle = Handle::new("gh_file").expect("Failed to build handle fixture.");
		let fetched = rt
			.block_on(reopened.find_by_handle(&handle))
			.expect("Failed to look up fixture record in file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched, record);
		assert_eq!(
			rt.block_on(reopened.last_seen(&record.app_id))
				.expect("Failed to read last-seen instant."),
			Some(seen)
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_write_leaves_memory_matching_disk() {
		let dir = temp_path().with_extension("d");
		let store = FileStore::open(dir.join("mirror.json")).expect("Failed to open file store.");
		let record = build_record();
		let seen = macros::datetime!(2025-03-02 00:00 UTC);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.upsert_batch(vec![record.clone()], seen))
			.expect("Failed to save fixture record to file store.");
		fs::remove_dir_all(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove temporary store directory {}: {e}", dir.display())
		});

		let err = rt
			.block_on(store.delete_older_than(macros::datetime!(2026-01-01 00:00 UTC)))
			.expect_err("Reap must fail once the snapshot cannot be written.");

		assert!(matches!(err, StoreError::Backend { .. }));
		assert_eq!(
			rt.block_on(store.fetch(&record.app_id)).expect("Failed to fetch fixture record."),
			Some(record),
			"A reap that never reached disk must not drop rows from memory."
		);
	}
}
