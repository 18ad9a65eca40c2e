#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, HashSet},
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::{Mutex, RwLock};
use time::{OffsetDateTime, macros};
// self
use authorizer_sync::{
	directory::{AccessToken, AuthorizerPage, Directory, DirectoryFuture},
	error::{Error, TransientError},
	model::{
		AppId, AppType, AuthorizerDetails, AuthorizerEntry, AuthorizerInfo, AuthorizerProfile,
		AuthorizerRecord, CredentialSecret, Handle,
	},
	store::{
		MemoryStore, ProfilePatch, RecordFilter, RecordPage, RecordStore, StoreError, StoreFuture,
	},
};

pub const AUTHORIZED_AT: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

pub fn app_id(value: &str) -> AppId {
	AppId::new(value).expect("App id fixture should be valid.")
}

pub fn app_id_at(index: usize) -> AppId {
	app_id(&format!("wx{index:04}"))
}

pub fn entry(index: usize) -> AuthorizerEntry {
	AuthorizerEntry {
		app_id: app_id_at(index),
		refresh_token: CredentialSecret::new(format!("refresh-{index}")),
		authorized_at: AUTHORIZED_AT,
	}
}

pub fn default_profile(app_id: &AppId) -> AuthorizerProfile {
	AuthorizerProfile {
		app_type: AppType::OfficialAccount,
		service_type: 2,
		display_name: format!("Account {app_id}"),
		handle: format!("gh_{app_id}"),
		avatar_url: format!("https://img.example.com/{app_id}.png"),
		qrcode_url: format!("https://img.example.com/{app_id}-qr.png"),
		principal_name: "Example Ltd".into(),
		capabilities: "1|15".into(),
		verification: 0,
	}
}

pub fn bare_record(id: &str, token: &str) -> AuthorizerRecord {
	AuthorizerRecord::builder(app_id(id))
		.refresh_token(token)
		.authorized_at(AUTHORIZED_AT)
		.build()
		.expect("Record fixture should build.")
}

/// In-process directory whose listing, profiles, and failures are scripted by the test.
#[derive(Debug, Default)]
pub struct ScriptedDirectory {
	entries: RwLock<Vec<AuthorizerEntry>>,
	profiles: RwLock<HashMap<AppId, AuthorizerProfile>>,
	failing_profiles: RwLock<HashSet<AppId>>,
	list_failure_at: RwLock<Option<usize>>,
	list_delay: RwLock<Option<StdDuration>>,
	profile_delay: RwLock<Option<StdDuration>>,
	list_calls: Mutex<Vec<(usize, usize)>>,
	profile_calls: AtomicUsize,
	token_calls: AtomicUsize,
}
impl ScriptedDirectory {
	pub fn with_authorizers(count: usize) -> Self {
		let directory = Self::default();

		directory.set_entries((0..count).map(entry).collect());

		directory
	}

	pub fn set_entries(&self, entries: Vec<AuthorizerEntry>) {
		*self.entries.write() = entries;
	}

	pub fn set_profile(&self, app_id: AppId, profile: AuthorizerProfile) {
		self.profiles.write().insert(app_id, profile);
	}

	pub fn fail_profile(&self, app_id: AppId) {
		self.failing_profiles.write().insert(app_id);
	}

	pub fn heal_profile(&self, app_id: &AppId) {
		self.failing_profiles.write().remove(app_id);
	}

	pub fn fail_list_at(&self, offset: usize) {
		*self.list_failure_at.write() = Some(offset);
	}

	pub fn delay_lists(&self, delay: StdDuration) {
		*self.list_delay.write() = Some(delay);
	}

	pub fn delay_profiles(&self, delay: StdDuration) {
		*self.profile_delay.write() = Some(delay);
	}

	pub fn clear_profile_delay(&self) {
		*self.profile_delay.write() = None;
	}

	pub fn list_offsets(&self) -> Vec<usize> {
		self.list_calls.lock().iter().map(|(offset, _)| *offset).collect()
	}

	pub fn profile_calls(&self) -> usize {
		self.profile_calls.load(Ordering::SeqCst)
	}

	pub fn token_calls(&self) -> usize {
		self.token_calls.load(Ordering::SeqCst)
	}

	pub fn profile_of(&self, app_id: &AppId) -> AuthorizerProfile {
		self.profiles.read().get(app_id).cloned().unwrap_or_else(|| default_profile(app_id))
	}
}
impl Directory for ScriptedDirectory {
	fn list_authorizers(&self, offset: usize, count: usize) -> DirectoryFuture<'_, AuthorizerPage> {
		Box::pin(async move {
			self.list_calls.lock().push((offset, count));

			let delay = *self.list_delay.read();

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}
			if *self.list_failure_at.read() == Some(offset) {
				return Err(TransientError::Directory {
					errcode: -1,
					message: "system busy".into(),
				}
				.into());
			}

			let entries = self.entries.read();
			let page = entries.iter().skip(offset).take(count).cloned().collect();

			Ok(AuthorizerPage { total_count: entries.len(), entries: page })
		})
	}

	fn profile<'a>(&'a self, app_id: &'a AppId) -> DirectoryFuture<'a, AuthorizerInfo> {
		Box::pin(async move {
			self.profile_calls.fetch_add(1, Ordering::SeqCst);

			// The answer is fixed when the request arrives; a delay only holds back the reply.
			let profile = self.profile_of(app_id);
			let failing = self.failing_profiles.read().contains(app_id);
			let delay = *self.profile_delay.read();

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}
			if failing {
				return Err(TransientError::Directory {
					errcode: 45009,
					message: "rate limited".into(),
				}
				.into());
			}

			Ok(AuthorizerInfo {
				profile,
				details: AuthorizerDetails { account_status: 1, ..Default::default() },
			})
		})
	}

	fn access_token<'a>(
		&'a self,
		app_id: &'a AppId,
		refresh_token: &'a CredentialSecret,
	) -> DirectoryFuture<'a, AccessToken> {
		Box::pin(async move {
			self.token_calls.fetch_add(1, Ordering::SeqCst);

			let known = self
				.entries
				.read()
				.iter()
				.any(|entry| &entry.app_id == app_id && &entry.refresh_token == refresh_token);

			if !known {
				return Err(Error::InvalidCredential { reason: "61023 refresh token mismatch".into() });
			}

			Ok(AccessToken {
				app_id: app_id.clone(),
				token: CredentialSecret::new(format!("access-{app_id}")),
				expires_at: OffsetDateTime::now_utc() + time::Duration::hours(2),
			})
		})
	}
}

/// Store wrapper over a [`MemoryStore`] that counts writes and can fail a chosen upsert.
#[derive(Debug, Default)]
pub struct CountingStore {
	pub inner: MemoryStore,
	patch_calls: AtomicUsize,
	upsert_calls: AtomicUsize,
	failing_upsert: RwLock<Option<usize>>,
}
impl CountingStore {
	pub fn patch_calls(&self) -> usize {
		self.patch_calls.load(Ordering::SeqCst)
	}

	pub fn upsert_calls(&self) -> usize {
		self.upsert_calls.load(Ordering::SeqCst)
	}

	/// Fails the `call`-th upsert (1-based) with a backend error; other calls pass through.
	pub fn fail_upsert_call(&self, call: usize) {
		*self.failing_upsert.write() = Some(call);
	}
}
impl RecordStore for CountingStore {
	fn upsert_batch(
		&self,
		records: Vec<AuthorizerRecord>,
		observed_at: OffsetDateTime,
	) -> StoreFuture<'_, ()> {
		let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst) + 1;

		if *self.failing_upsert.read() == Some(call) {
			return Box::pin(async {
				Err(StoreError::Backend { message: "disk full".into() })
			});
		}

		self.inner.upsert_batch(records, observed_at)
	}

	fn patch_profiles(&self, patches: Vec<ProfilePatch>) -> StoreFuture<'_, usize> {
		self.patch_calls.fetch_add(1, Ordering::SeqCst);

		self.inner.patch_profiles(patches)
	}

	fn delete_older_than(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, usize> {
		self.inner.delete_older_than(cutoff)
	}

	fn query<'a>(
		&'a self,
		filter: &'a RecordFilter,
		offset: usize,
		limit: usize,
	) -> StoreFuture<'a, RecordPage> {
		self.inner.query(filter, offset, limit)
	}

	fn fetch<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<AuthorizerRecord>> {
		self.inner.fetch(app_id)
	}

	fn find_by_handle<'a>(
		&'a self,
		handle: &'a Handle,
	) -> StoreFuture<'a, Option<AuthorizerRecord>> {
		self.inner.find_by_handle(handle)
	}

	fn last_seen<'a>(&'a self, app_id: &'a AppId) -> StoreFuture<'a, Option<OffsetDateTime>> {
		self.inner.last_seen(app_id)
	}
}

/// Polls `check` until it holds or five seconds pass.
pub async fn wait_until<F, Fut>(mut check: F)
where
	F: FnMut() -> Fut,
	Fut: Future<Output = bool>,
{
	for _ in 0..500 {
		if check().await {
			return;
		}

		tokio::time::sleep(StdDuration::from_millis(10)).await;
	}

	panic!("Condition was not met within five seconds.");
}
