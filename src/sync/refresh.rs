//! Read path: mirror-backed listing and lookups with diff-gated background correction.
//!
//! Reads are answered from the store. Every record a read returns is then re-fetched from the
//! directory in a detached task, compared field by field, and patched only when something
//! differs. Patches replace profiles of records that still exist and still hold the profile the
//! diff was taken against; they never create records and never touch refresh tokens.

// crates.io
use futures::future;
// self
use crate::{
	_prelude::*,
	directory::AccessToken,
	error::ValidationError,
	model::{AppId, AuthorizerDetail, AuthorizerRecord, Handle, profile_changes},
	obs::{self, FlowOutcome, SyncKind, SyncSpan},
	store::{ProfilePatch, RecordFilter, RecordPage},
	sync::Mirror,
};

/// Validated listing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
	/// Records to skip.
	pub offset: usize,
	/// Page size, `1..=20`.
	pub limit: usize,
	/// Restricts the listing to one app id.
	pub app_id: Option<AppId>,
}
impl ListQuery {
	/// Page size used when the caller supplies none.
	pub const DEFAULT_LIMIT: usize = 10;
	/// Largest accepted page size.
	pub const MAX_LIMIT: usize = 20;

	/// Creates a query after checking the limit.
	pub fn new(offset: usize, limit: usize) -> Result<Self, ValidationError> {
		if !(1..=Self::MAX_LIMIT).contains(&limit) {
			return Err(ValidationError::LimitOutOfRange { limit, max: Self::MAX_LIMIT });
		}

		Ok(Self { offset, limit, app_id: None })
	}

	/// Builds a query from raw request parameters; blank values fall back to defaults.
	pub fn from_params(
		offset: Option<&str>,
		limit: Option<&str>,
		app_id: Option<&str>,
	) -> Result<Self, ValidationError> {
		let offset = parse_param("offset", offset)?.unwrap_or_default();
		let limit = parse_param("limit", limit)?.unwrap_or(Self::DEFAULT_LIMIT);
		let query = Self::new(offset, limit)?;

		match non_blank(app_id) {
			Some(app_id) => Ok(query.with_app_id(AppId::new(app_id)?)),
			None => Ok(query),
		}
	}

	/// Restricts the listing to one app id.
	pub fn with_app_id(mut self, app_id: AppId) -> Self {
		self.app_id = Some(app_id);

		self
	}

	fn filter(&self) -> RecordFilter {
		RecordFilter { app_id: self.app_id.clone() }
	}
}
impl Default for ListQuery {
	fn default() -> Self {
		Self { offset: 0, limit: Self::DEFAULT_LIMIT, app_id: None }
	}
}

/// Key used to resolve a single mirrored authorizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizerLookup {
	/// Resolve by app id.
	AppId(AppId),
	/// Resolve by public handle.
	Handle(Handle),
}
impl AuthorizerLookup {
	/// Picks the app id when present, otherwise the handle; blank values count as absent.
	pub fn from_params(
		app_id: Option<&str>,
		handle: Option<&str>,
	) -> Result<Self, ValidationError> {
		if let Some(app_id) = non_blank(app_id) {
			return Ok(Self::AppId(AppId::new(app_id)?));
		}
		if let Some(handle) = non_blank(handle) {
			return Ok(Self::Handle(Handle::new(handle)?));
		}

		Err(ValidationError::EmptyLookup)
	}
}
impl Display for AuthorizerLookup {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			AuthorizerLookup::AppId(app_id) => write!(f, "app id {app_id}"),
			AuthorizerLookup::Handle(handle) => write!(f, "handle {handle}"),
		}
	}
}

impl Mirror {
	/// Returns one page of mirrored records and schedules a background correction for them.
	pub async fn list_records(&self, query: &ListQuery) -> Result<RecordPage> {
		let page = self.store.query(&query.filter(), query.offset, query.limit).await?;

		self.spawn_correction(page.records.clone());

		Ok(page)
	}

	/// Resolves a lookup against the mirror; a miss never reaches the directory.
	pub async fn resolve(&self, lookup: &AuthorizerLookup) -> Result<AuthorizerRecord> {
		let found = match lookup {
			AuthorizerLookup::AppId(app_id) => self.store.fetch(app_id).await?,
			AuthorizerLookup::Handle(handle) => self.store.find_by_handle(handle).await?,
		};

		found.ok_or_else(|| Error::NotFound { lookup: lookup.to_string() })
	}

	/// Returns the stored record merged with a freshly fetched profile and its derived details.
	///
	/// The stored profile is corrected in the background when it differs.
	pub async fn authorizer_detail(&self, lookup: &AuthorizerLookup) -> Result<AuthorizerDetail> {
		let span = SyncSpan::new(SyncKind::Lookup, "authorizer_detail");

		span.instrument(async move {
			let record = self.resolve(lookup).await?;
			let info = self.fetch_profile(&record.app_id).await?;
			let changed = profile_changes(record.profile.as_ref(), &info.profile);

			if !changed.is_empty() {
				self.spawn_patch(vec![ProfilePatch {
					app_id: record.app_id.clone(),
					expected: record.profile.clone(),
					profile: info.profile.clone(),
					changed,
				}]);
			}

			Ok::<_, Error>(AuthorizerDetail {
				record: record.with_profile(info.profile),
				details: info.details,
			})
		})
		.await
	}

	/// Exchanges the stored refresh token of the resolved authorizer for an access token.
	pub async fn authorizer_access_token(&self, lookup: &AuthorizerLookup) -> Result<AccessToken> {
		let record = self.resolve(lookup).await?;

		self.bounded(
			"access_token",
			self.directory.access_token(&record.app_id, &record.refresh_token),
		)
		.await
	}

	/// Re-fetches every profile, patches the stale ones, and returns how many were written.
	///
	/// Lookup failures skip their record. Nothing is written when every profile matches. A patch
	/// lands only if the stored profile is still the one in `records`, so a pull that wrote a
	/// newer profile while the fetch was in flight wins.
	pub async fn correct_stale_profiles(&self, records: Vec<AuthorizerRecord>) -> Result<usize> {
		let span = SyncSpan::new(SyncKind::Refresh, "correct_stale_profiles");

		obs::record_flow_outcome(SyncKind::Refresh, FlowOutcome::Attempt);

		let patches = span
			.instrument(future::join_all(records.iter().map(|record| self.stale_patch(record))))
			.await
			.into_iter()
			.flatten()
			.collect::<Vec<_>>();

		self.write_patches(patches).await
	}

	async fn stale_patch(&self, record: &AuthorizerRecord) -> Option<ProfilePatch> {
		match self.fetch_profile(&record.app_id).await {
			Ok(info) => {
				let changed = profile_changes(record.profile.as_ref(), &info.profile);

				(!changed.is_empty()).then(|| ProfilePatch {
					app_id: record.app_id.clone(),
					expected: record.profile.clone(),
					profile: info.profile,
					changed,
				})
			},
			Err(e) => {
				obs::absorbed_failure(SyncKind::Refresh, &record.app_id, &e);

				None
			},
		}
	}

	async fn write_patches(&self, patches: Vec<ProfilePatch>) -> Result<usize> {
		if patches.is_empty() {
			obs::record_flow_outcome(SyncKind::Refresh, FlowOutcome::Success);

			return Ok(0);
		}

		match self.store.patch_profiles(patches).await {
			Ok(patched) => {
				obs::record_flow_outcome(SyncKind::Refresh, FlowOutcome::Success);
				obs::step_completed(SyncKind::Refresh, "patch_profiles", patched);
				self.metrics.record_corrections(patched);

				Ok(patched)
			},
			Err(e) => {
				obs::record_flow_outcome(SyncKind::Refresh, FlowOutcome::Failure);

				Err(e.into())
			},
		}
	}

	fn spawn_correction(&self, records: Vec<AuthorizerRecord>) {
		if records.is_empty() {
			return;
		}

		let mirror = self.clone();

		tokio::spawn(async move {
			if let Err(e) = mirror.correct_stale_profiles(records).await {
				obs::absorbed_failure(SyncKind::Refresh, &"background correction", &e);
			}
		});
	}

	fn spawn_patch(&self, patches: Vec<ProfilePatch>) {
		let mirror = self.clone();

		tokio::spawn(async move {
			if let Err(e) = mirror.write_patches(patches).await {
				obs::absorbed_failure(SyncKind::Refresh, &"background patch", &e);
			}
		});
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_param(name: &'static str, value: Option<&str>) -> Result<Option<usize>, ValidationError> {
	non_blank(value)
		.map(|raw| {
			raw.parse::<usize>()
				.map_err(|_| ValidationError::NotANumber { name, value: raw.to_owned() })
		})
		.transpose()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn list_query_defaults_and_bounds() {
		let query = ListQuery::from_params(None, Some(" "), None)
			.expect("Blank parameters should fall back to defaults.");

		assert_eq!(query, ListQuery::default());
		assert_eq!(
			ListQuery::new(0, 21),
			Err(ValidationError::LimitOutOfRange { limit: 21, max: 20 })
		);
		assert_eq!(
			ListQuery::new(0, 0),
			Err(ValidationError::LimitOutOfRange { limit: 0, max: 20 })
		);
		assert!(ListQuery::new(40, 20).is_ok());
	}

	#[test]
	fn list_query_rejects_garbage_numbers_and_ids() {
		assert_eq!(
			ListQuery::from_params(Some("-1"), None, None),
			Err(ValidationError::NotANumber { name: "offset", value: "-1".into() })
		);
		assert!(matches!(
			ListQuery::from_params(None, None, Some("wx bad")),
			Err(ValidationError::Identifier(_))
		));

		let query = ListQuery::from_params(Some("5"), Some("20"), Some("wx-a"))
			.expect("Valid parameters should parse.");

		assert_eq!(query.offset, 5);
		assert_eq!(query.filter().app_id.map(String::from), Some("wx-a".into()));
	}

	#[test]
	fn lookup_prefers_app_id_and_requires_one_key() {
		assert_eq!(AuthorizerLookup::from_params(None, Some("")), Err(ValidationError::EmptyLookup));
		assert!(matches!(
			AuthorizerLookup::from_params(Some("wx-a"), Some("gh_a")),
			Ok(AuthorizerLookup::AppId(_))
		));

		let lookup = AuthorizerLookup::from_params(Some("  "), Some("gh_a"))
			.expect("Handle lookup should parse.");

		assert_eq!(lookup.to_string(), "handle gh_a");
	}
}
