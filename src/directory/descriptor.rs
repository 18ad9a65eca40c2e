//! Directory descriptor: where the directory lives and which integrator account calls it.

// self
use crate::{_prelude::*, error::ConfigError, model::ComponentAppId};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DescriptorError {
	/// API base URL is mandatory.
	#[error("Missing directory API base URL.")]
	MissingApiBase,
	/// Integrator account is mandatory.
	#[error("Missing component app id.")]
	MissingComponentAppId,
	/// Endpoints must use HTTPS.
	#[error("The directory API base must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a query or fragment.
	#[error("The directory API base must not carry a query or fragment: {url}.")]
	UnexpectedQuery {
		/// URL that failed validation.
		url: String,
	},
}

/// Immutable directory descriptor consumed by [`HttpDirectory`](crate::directory::HttpDirectory).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDescriptor {
	/// Base URL every endpoint path is resolved against; always ends with `/`.
	pub api_base: Url,
	/// Integrator account that owns the directory.
	pub component_app_id: ComponentAppId,
}
impl DirectoryDescriptor {
	/// Authorizer listing endpoint.
	pub const LIST_PATH: &'static str = "cgi-bin/component/api_get_authorizer_list";
	/// Profile lookup endpoint.
	pub const PROFILE_PATH: &'static str = "cgi-bin/component/api_get_authorizer_info";
	/// Access-token exchange endpoint.
	pub const TOKEN_PATH: &'static str = "cgi-bin/component/api_authorizer_token";

	/// Creates a new builder.
	pub fn builder() -> DirectoryDescriptorBuilder {
		DirectoryDescriptorBuilder::default()
	}

	/// Resolves an endpoint path against the API base.
	pub fn endpoint(&self, path: &'static str) -> Result<Url, ConfigError> {
		self.api_base.join(path).map_err(|source| ConfigError::InvalidEndpoint { path, source })
	}
}

/// Builder for [`DirectoryDescriptor`] values.
#[derive(Debug, Default)]
pub struct DirectoryDescriptorBuilder {
	/// API base URL.
	pub api_base: Option<Url>,
	/// Integrator account.
	pub component_app_id: Option<ComponentAppId>,
	/// Accept plain-HTTP bases (local mocks only).
	pub allow_insecure_http: bool,
}
impl DirectoryDescriptorBuilder {
	/// Sets the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Sets the integrator account.
	pub fn component_app_id(mut self, id: ComponentAppId) -> Self {
		self.component_app_id = Some(id);

		self
	}

	/// Accepts plain-HTTP bases; intended for local mock servers.
	pub fn allow_insecure_http(mut self, allow: bool) -> Self {
		self.allow_insecure_http = allow;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<DirectoryDescriptor, DescriptorError> {
		let mut api_base = self.api_base.ok_or(DescriptorError::MissingApiBase)?;
		let component_app_id =
			self.component_app_id.ok_or(DescriptorError::MissingComponentAppId)?;

		if api_base.scheme() != "https" && !(self.allow_insecure_http && api_base.scheme() == "http")
		{
			return Err(DescriptorError::InsecureEndpoint { url: api_base.to_string() });
		}
		if api_base.query().is_some() || api_base.fragment().is_some() {
			return Err(DescriptorError::UnexpectedQuery { url: api_base.to_string() });
		}
		if !api_base.path().ends_with('/') {
			let path = format!("{}/", api_base.path());

			api_base.set_path(&path);
		}

		Ok(DirectoryDescriptor { api_base, component_app_id })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn component() -> ComponentAppId {
		ComponentAppId::new("wxcomponent").expect("Component fixture should be valid.")
	}

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor URL fixture.")
	}

	#[test]
	fn builder_rejects_insecure_and_incomplete_descriptors() {
		assert_eq!(
			DirectoryDescriptor::builder().component_app_id(component()).build(),
			Err(DescriptorError::MissingApiBase)
		);
		assert_eq!(
			DirectoryDescriptor::builder().api_base(url("https://api.example.com")).build(),
			Err(DescriptorError::MissingComponentAppId)
		);
		assert!(matches!(
			DirectoryDescriptor::builder()
				.api_base(url("http://api.example.com"))
				.component_app_id(component())
				.build(),
			Err(DescriptorError::InsecureEndpoint { .. })
		));
		assert!(matches!(
			DirectoryDescriptor::builder()
				.api_base(url("https://api.example.com/?debug=1"))
				.component_app_id(component())
				.build(),
			Err(DescriptorError::UnexpectedQuery { .. })
		));
	}

	#[test]
	fn endpoints_resolve_below_a_nested_base() {
		let descriptor = DirectoryDescriptor::builder()
			.api_base(url("https://gateway.example.com/wx"))
			.component_app_id(component())
			.build()
			.expect("Descriptor should build for a secure base.");

		assert_eq!(
			descriptor
				.endpoint(DirectoryDescriptor::LIST_PATH)
				.expect("List endpoint should resolve.")
				.as_str(),
			"https://gateway.example.com/wx/cgi-bin/component/api_get_authorizer_list"
		);
	}

	#[test]
	fn insecure_http_is_opt_in() {
		let descriptor = DirectoryDescriptor::builder()
			.api_base(url("http://127.0.0.1:8080"))
			.component_app_id(component())
			.allow_insecure_http(true)
			.build()
			.expect("Plain HTTP should be accepted once allowed.");

		assert_eq!(descriptor.api_base.as_str(), "http://127.0.0.1:8080/");
	}
}
