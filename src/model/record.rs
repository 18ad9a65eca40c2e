//! Bare directory entries, mirrored records, and the record builder.

// self
use crate::{
	_prelude::*,
	model::{AppId, AuthorizerDetails, AuthorizerProfile, CredentialSecret},
};

/// Bare entry as listed by the directory, before enrichment.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizerEntry {
	/// Authorizer identifier.
	pub app_id: AppId,
	/// Delegated-access credential currently reported by the directory.
	pub refresh_token: CredentialSecret,
	/// When the authorization was granted.
	pub authorized_at: OffsetDateTime,
}
impl Debug for AuthorizerEntry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizerEntry")
			.field("app_id", &self.app_id)
			.field("refresh_token", &"<redacted>")
			.field("authorized_at", &self.authorized_at)
			.finish()
	}
}

/// Errors produced by [`AuthorizerRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AuthorizerRecordBuilderError {
	/// Issued when no refresh token was provided.
	#[error("Refresh token is required.")]
	MissingRefreshToken,
	/// Issued when no authorization instant was provided.
	#[error("Authorization instant is required.")]
	MissingAuthorizedAt,
}

/// Mirrored authorizer record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerRecord {
	/// Unique key.
	pub app_id: AppId,
	/// Latest delegated-access credential; callers must avoid logging it.
	pub refresh_token: CredentialSecret,
	/// When the authorization was granted.
	pub authorized_at: OffsetDateTime,
	/// Profile attributes; `None` while the record has never been enriched.
	pub profile: Option<AuthorizerProfile>,
}
impl AuthorizerRecord {
	/// Returns a builder for assembling records by hand.
	pub fn builder(app_id: AppId) -> AuthorizerRecordBuilder {
		AuthorizerRecordBuilder::new(app_id)
	}

	/// Wraps a bare directory entry without profile attributes.
	pub fn bare(entry: AuthorizerEntry) -> Self {
		Self {
			app_id: entry.app_id,
			refresh_token: entry.refresh_token,
			authorized_at: entry.authorized_at,
			profile: None,
		}
	}

	/// Attaches fetched profile attributes.
	pub fn with_profile(mut self, profile: AuthorizerProfile) -> Self {
		self.profile = Some(profile);

		self
	}

	/// Returns `true` once profile attributes are present.
	pub fn is_enriched(&self) -> bool {
		self.profile.is_some()
	}

	/// Public handle, when the profile carries a non-empty one.
	pub fn handle(&self) -> Option<&str> {
		self.profile.as_ref().map(|profile| profile.handle.as_str()).filter(|h| !h.is_empty())
	}
}
impl Debug for AuthorizerRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizerRecord")
			.field("app_id", &self.app_id)
			.field("refresh_token", &"<redacted>")
			.field("authorized_at", &self.authorized_at)
			.field("profile", &self.profile)
			.finish()
	}
}

/// Builder for [`AuthorizerRecord`].
#[derive(Clone, Debug)]
pub struct AuthorizerRecordBuilder {
	app_id: AppId,
	refresh_token: Option<CredentialSecret>,
	authorized_at: Option<OffsetDateTime>,
	profile: Option<AuthorizerProfile>,
}
impl AuthorizerRecordBuilder {
	fn new(app_id: AppId) -> Self {
		Self { app_id, refresh_token: None, authorized_at: None, profile: None }
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(CredentialSecret::new(token));

		self
	}

	/// Sets the authorization instant.
	pub fn authorized_at(mut self, instant: OffsetDateTime) -> Self {
		self.authorized_at = Some(instant);

		self
	}

	/// Sets the authorization instant from directory epoch seconds.
	pub fn authorized_at_unix(self, seconds: i64) -> Self {
		match OffsetDateTime::from_unix_timestamp(seconds) {
			Ok(instant) => self.authorized_at(instant),
			Err(_) => self,
		}
	}

	/// Attaches profile attributes.
	pub fn profile(mut self, profile: AuthorizerProfile) -> Self {
		self.profile = Some(profile);

		self
	}

	/// Consumes the builder and produces an [`AuthorizerRecord`].
	pub fn build(self) -> Result<AuthorizerRecord, AuthorizerRecordBuilderError> {
		let refresh_token =
			self.refresh_token.ok_or(AuthorizerRecordBuilderError::MissingRefreshToken)?;
		let authorized_at =
			self.authorized_at.ok_or(AuthorizerRecordBuilderError::MissingAuthorizedAt)?;

		Ok(AuthorizerRecord { app_id: self.app_id, refresh_token, authorized_at, profile: self.profile })
	}
}

/// Stored record merged with a fresh profile and its read-path-only attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizerDetail {
	/// Record carrying the freshly fetched profile.
	pub record: AuthorizerRecord,
	/// Derived attributes from the same lookup.
	pub details: AuthorizerDetails,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn builder_requires_token_and_instant() {
		let app_id = AppId::new("wx-builder").expect("App id fixture should be valid.");

		assert_eq!(
			AuthorizerRecord::builder(app_id.clone()).build(),
			Err(AuthorizerRecordBuilderError::MissingRefreshToken)
		);
		assert_eq!(
			AuthorizerRecord::builder(app_id.clone()).refresh_token("r").build(),
			Err(AuthorizerRecordBuilderError::MissingAuthorizedAt)
		);

		let record = AuthorizerRecord::builder(app_id)
			.refresh_token("refresh")
			.authorized_at_unix(1_700_000_000)
			.build()
			.expect("Builder should succeed once token and instant are set.");

		assert_eq!(record.authorized_at, macros::datetime!(2023-11-14 22:13:20 UTC));
		assert!(!record.is_enriched());
	}

	#[test]
	fn handle_ignores_blank_profiles() {
		let entry = AuthorizerEntry {
			app_id: AppId::new("wx-handle").expect("App id fixture should be valid."),
			refresh_token: CredentialSecret::new("refresh"),
			authorized_at: macros::datetime!(2025-01-01 00:00 UTC),
		};
		let bare = AuthorizerRecord::bare(entry);

		assert_eq!(bare.handle(), None);
		assert_eq!(bare.clone().with_profile(AuthorizerProfile::default()).handle(), None);

		let profile = AuthorizerProfile { handle: "gh_handle".into(), ..Default::default() };

		assert_eq!(bare.with_profile(profile).handle(), Some("gh_handle"));
	}

	#[test]
	fn debug_redacts_refresh_token() {
		let record = AuthorizerRecord::builder(AppId::new("wx-debug").expect("Valid app id."))
			.refresh_token("very-secret")
			.authorized_at(macros::datetime!(2025-01-01 00:00 UTC))
			.build()
			.expect("Record fixture should build.");

		assert!(!format!("{record:?}").contains("very-secret"));
	}
}
