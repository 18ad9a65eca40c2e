//! Profile attributes fetched per authorizer and the comparator that decides whether a stored
//! profile is stale.

// self
use crate::_prelude::*;

/// Kind of account behind an authorizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
	/// Official (subscription or service) account.
	#[default]
	OfficialAccount,
	/// Mini program.
	MiniProgram,
}

/// Persisted profile attributes of an authorizer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerProfile {
	/// Account kind.
	pub app_type: AppType,
	/// Directory service type id.
	pub service_type: i64,
	/// Display name (nickname).
	pub display_name: String,
	/// Public handle (original username); empty when the directory omits it.
	pub handle: String,
	/// Avatar URL.
	pub avatar_url: String,
	/// QR code URL.
	pub qrcode_url: String,
	/// Legal principal that owns the account.
	pub principal_name: String,
	/// Opaque descriptor of the delegated capability set.
	pub capabilities: String,
	/// Directory verification type id.
	pub verification: i64,
}
impl AuthorizerProfile {
	/// Lists the fields whose values differ between `self` and `fresh`.
	pub fn diff(&self, fresh: &AuthorizerProfile) -> Vec<ProfileField> {
		let mut changed = Vec::new();
		let mut check = |field: ProfileField, same: bool| {
			if !same {
				changed.push(field);
			}
		};

		check(ProfileField::AppType, self.app_type == fresh.app_type);
		check(ProfileField::ServiceType, self.service_type == fresh.service_type);
		check(ProfileField::DisplayName, self.display_name == fresh.display_name);
		check(ProfileField::Handle, self.handle == fresh.handle);
		check(ProfileField::AvatarUrl, self.avatar_url == fresh.avatar_url);
		check(ProfileField::QrcodeUrl, self.qrcode_url == fresh.qrcode_url);
		check(ProfileField::PrincipalName, self.principal_name == fresh.principal_name);
		check(ProfileField::Capabilities, self.capabilities == fresh.capabilities);
		check(ProfileField::Verification, self.verification == fresh.verification);

		changed
	}
}

/// Comparable profile attribute names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
	/// [`AuthorizerProfile::app_type`].
	AppType,
	/// [`AuthorizerProfile::service_type`].
	ServiceType,
	/// [`AuthorizerProfile::display_name`].
	DisplayName,
	/// [`AuthorizerProfile::handle`].
	Handle,
	/// [`AuthorizerProfile::avatar_url`].
	AvatarUrl,
	/// [`AuthorizerProfile::qrcode_url`].
	QrcodeUrl,
	/// [`AuthorizerProfile::principal_name`].
	PrincipalName,
	/// [`AuthorizerProfile::capabilities`].
	Capabilities,
	/// [`AuthorizerProfile::verification`].
	Verification,
}
impl ProfileField {
	/// Every comparable field, in declaration order.
	pub const ALL: [ProfileField; 9] = [
		ProfileField::AppType,
		ProfileField::ServiceType,
		ProfileField::DisplayName,
		ProfileField::Handle,
		ProfileField::AvatarUrl,
		ProfileField::QrcodeUrl,
		ProfileField::PrincipalName,
		ProfileField::Capabilities,
		ProfileField::Verification,
	];
}

/// Read-path-only attributes; returned with detail lookups and never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizerDetails {
	/// Registration type id.
	pub registration_type: i64,
	/// Account status id.
	pub account_status: i64,
	/// Extended configuration blob, when the directory reports one.
	pub extended_config: Option<serde_json::Value>,
}

/// Everything one profile lookup returns.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizerInfo {
	/// Persisted attributes.
	pub profile: AuthorizerProfile,
	/// Derived attributes.
	pub details: AuthorizerDetails,
}

/// Lists the fields a stored profile must change to match `fresh`.
///
/// A missing stored profile differs in every field.
pub fn profile_changes(
	stored: Option<&AuthorizerProfile>,
	fresh: &AuthorizerProfile,
) -> Vec<ProfileField> {
	match stored {
		Some(stored) => stored.diff(fresh),
		None => ProfileField::ALL.to_vec(),
	}
}
