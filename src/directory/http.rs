//! [`Directory`] implementation that speaks the integrator platform's JSON protocol.

// self
use crate::{
	_prelude::*,
	directory::{
		AccessToken, AuthorizerPage, ComponentTokenSource, Directory, DirectoryDescriptor,
		DirectoryFuture, wire,
	},
	error::ConfigError,
	http::ReqwestHttpClient,
	model::{AppId, AuthorizerInfo, CredentialSecret},
};

/// Directory client backed by reqwest.
///
/// Every call carries the integrator credential from the configured
/// [`ComponentTokenSource`] as the `component_access_token` query parameter, and every
/// body is checked for a non-zero `errcode` before its shape is decoded.
#[derive(Clone)]
pub struct HttpDirectory {
	http_client: ReqwestHttpClient,
	descriptor: DirectoryDescriptor,
	token_source: Arc<dyn ComponentTokenSource>,
}
impl HttpDirectory {
	/// Creates a directory client from its parts.
	pub fn new(
		http_client: ReqwestHttpClient,
		descriptor: DirectoryDescriptor,
		token_source: Arc<dyn ComponentTokenSource>,
	) -> Self {
		Self { http_client, descriptor, token_source }
	}

	/// Creates a directory client whose reqwest client gives up on calls after `timeout`.
	pub fn with_timeout(
		descriptor: DirectoryDescriptor,
		token_source: Arc<dyn ComponentTokenSource>,
		timeout: std::time::Duration,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(ReqwestHttpClient::with_timeout(timeout)?, descriptor, token_source))
	}

	/// Returns the descriptor this client calls.
	pub fn descriptor(&self) -> &DirectoryDescriptor {
		&self.descriptor
	}

	async fn signed_endpoint(&self, path: &'static str) -> Result<Url> {
		let mut url = self.descriptor.endpoint(path)?;
		let token = self.token_source.component_token().await?;

		url.query_pairs_mut().append_pair("component_access_token", token.expose());

		Ok(url)
	}

	async fn call<B, T>(&self, path: &'static str, body: &B) -> Result<T>
	where
		B: Serialize,
		T: serde::de::DeserializeOwned,
	{
		let url = self.signed_endpoint(path).await?;
		let (meta, bytes) = self.http_client.post_json(path, url, body).await?;

		wire::decode(&bytes, meta.status)
	}
}
impl Debug for HttpDirectory {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("HttpDirectory")
			.field("api_base", &self.descriptor.api_base.as_str())
			.field("component_app_id", &self.descriptor.component_app_id)
			.finish_non_exhaustive()
	}
}
impl Directory for HttpDirectory {
	fn list_authorizers(&self, offset: usize, count: usize) -> DirectoryFuture<'_, AuthorizerPage> {
		Box::pin(async move {
			let request = wire::ListRequest {
				component_appid: self.descriptor.component_app_id.as_ref(),
				offset,
				count,
			};
			let response = self
				.call::<_, wire::ListResponse>(DirectoryDescriptor::LIST_PATH, &request)
				.await?;

			response.into_page()
		})
	}

	fn profile<'a>(&'a self, app_id: &'a AppId) -> DirectoryFuture<'a, AuthorizerInfo> {
		Box::pin(async move {
			let request = wire::ProfileRequest {
				component_appid: self.descriptor.component_app_id.as_ref(),
				authorizer_appid: app_id.as_ref(),
			};
			let response = self
				.call::<_, wire::ProfileResponse>(DirectoryDescriptor::PROFILE_PATH, &request)
				.await?;

			Ok(response.into_info())
		})
	}

	fn access_token<'a>(
		&'a self,
		app_id: &'a AppId,
		refresh_token: &'a CredentialSecret,
	) -> DirectoryFuture<'a, AccessToken> {
		Box::pin(async move {
			let request = wire::TokenRequest {
				component_appid: self.descriptor.component_app_id.as_ref(),
				authorizer_appid: app_id.as_ref(),
				authorizer_refresh_token: refresh_token.expose(),
			};
			let issued_at = OffsetDateTime::now_utc();
			let response = self
				.call::<_, wire::TokenResponse>(DirectoryDescriptor::TOKEN_PATH, &request)
				.await?;

			response.into_access_token(app_id.clone(), issued_at)
		})
	}
}

