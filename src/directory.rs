//! Remote directory contract and its HTTP implementation.
//!
//! [`Directory`] is the mirror's only dependency on the remote source of truth. It exposes the
//! three operations the sync engine consumes: paginated listing, per-authorizer profile lookup,
//! and access-token exchange. [`HttpDirectory`] speaks the integrator platform's JSON protocol
//! over reqwest; tests and alternative transports implement the trait directly.

pub mod descriptor;
#[cfg(feature = "reqwest")] pub mod http;

mod wire;

pub use descriptor::*;
#[cfg(feature = "reqwest")] pub use http::HttpDirectory;

// self
use crate::{
	_prelude::*,
	model::{AppId, AuthorizerEntry, AuthorizerInfo, CredentialSecret},
};

/// Boxed future returned by [`Directory`] and [`ComponentTokenSource`] operations.
pub type DirectoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Remote authoritative source of authorizer entries and profile detail.
pub trait Directory
where
	Self: Send + Sync,
{
	/// Lists up to `count` bare entries starting at `offset`.
	fn list_authorizers(&self, offset: usize, count: usize) -> DirectoryFuture<'_, AuthorizerPage>;

	/// Fetches full profile detail for one authorizer.
	fn profile<'a>(&'a self, app_id: &'a AppId) -> DirectoryFuture<'a, AuthorizerInfo>;

	/// Exchanges an authorizer's refresh token for a short-lived access token.
	fn access_token<'a>(
		&'a self,
		app_id: &'a AppId,
		refresh_token: &'a CredentialSecret,
	) -> DirectoryFuture<'a, AccessToken>;
}

/// One page of the directory listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizerPage {
	/// Total number of authorizers the directory reports.
	pub total_count: usize,
	/// Entries in this page, in directory order.
	pub entries: Vec<AuthorizerEntry>,
}

/// Short-lived access token issued for one authorizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Authorizer the token acts for.
	pub app_id: AppId,
	/// Access token secret.
	pub token: CredentialSecret,
	/// Expiry instant derived from the directory's `expires_in`.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

/// Supplies the integrator-level credential that authorizes directory calls.
pub trait ComponentTokenSource
where
	Self: Send + Sync,
{
	/// Returns the current component access token.
	fn component_token(&self) -> DirectoryFuture<'_, CredentialSecret>;
}

/// Token source that always returns the same credential.
#[derive(Clone, Debug)]
pub struct StaticComponentToken(CredentialSecret);
impl StaticComponentToken {
	/// Wraps a fixed component access token.
	pub fn new(token: impl Into<String>) -> Self {
		Self(CredentialSecret::new(token))
	}
}
impl ComponentTokenSource for StaticComponentToken {
	fn component_token(&self) -> DirectoryFuture<'_, CredentialSecret> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn static_token_source_repeats_its_token() {
		let source = StaticComponentToken::new("component-token");
		let first = source.component_token().await.expect("Static source should not fail.");
		let second = source.component_token().await.expect("Static source should not fail.");

		assert_eq!(first.expose(), "component-token");
		assert_eq!(first, second);
	}

	#[test]
	fn access_token_expiry_is_inclusive() {
		let now = OffsetDateTime::now_utc();
		let token = AccessToken {
			app_id: AppId::new("wx-token").expect("App id fixture should be valid."),
			token: CredentialSecret::new("access"),
			expires_at: now,
		};

		assert!(token.is_expired_at(now));
		assert!(!token.is_expired_at(now - Duration::seconds(1)));
	}
}
