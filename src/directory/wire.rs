//! JSON shapes of the directory protocol and their conversion into mirror types.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	directory::{AccessToken, AuthorizerPage},
	error::TransientError,
	model::{
		AppId, AppType, AuthorizerDetails, AuthorizerEntry, AuthorizerInfo, AuthorizerProfile,
		CredentialSecret,
	},
};

/// Error codes that mean the component credential itself was rejected.
const CREDENTIAL_ERRCODES: [i64; 3] = [40001, 40014, 42001];

#[derive(Debug, Serialize)]
pub(crate) struct ListRequest<'a> {
	pub component_appid: &'a str,
	pub offset: usize,
	pub count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileRequest<'a> {
	pub component_appid: &'a str,
	pub authorizer_appid: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
	pub component_appid: &'a str,
	pub authorizer_appid: &'a str,
	pub authorizer_refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
	#[serde(default)]
	total_count: usize,
	#[serde(default)]
	list: Vec<ListItem>,
}
impl ListResponse {
	pub(crate) fn into_page(self) -> Result<AuthorizerPage> {
		let entries = self.list.into_iter().map(ListItem::into_entry).collect::<Result<Vec<_>>>()?;

		Ok(AuthorizerPage { total_count: self.total_count, entries })
	}
}

#[derive(Debug, Deserialize)]
struct ListItem {
	authorizer_appid: String,
	refresh_token: String,
	auth_time: i64,
}
impl ListItem {
	fn into_entry(self) -> Result<AuthorizerEntry> {
		let app_id = AppId::new(&self.authorizer_appid).map_err(|e| {
			TransientError::MalformedEntry { reason: format!("authorizer_appid: {e}") }
		})?;
		let authorized_at = OffsetDateTime::from_unix_timestamp(self.auth_time).map_err(|e| {
			TransientError::MalformedEntry { reason: format!("auth_time of {app_id}: {e}") }
		})?;

		Ok(AuthorizerEntry {
			app_id,
			refresh_token: CredentialSecret::new(self.refresh_token),
			authorized_at,
		})
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
	authorizer_info: ProfileAuthorizer,
	#[serde(default)]
	authorization_info: ProfileAuthorization,
}
impl ProfileResponse {
	pub(crate) fn into_info(self) -> AuthorizerInfo {
		let ProfileResponse { authorizer_info: info, authorization_info } = self;
		let capabilities = authorization_info
			.func_info
			.iter()
			.map(|func| func.funcscope_category.id.to_string())
			.collect::<Vec<_>>()
			.join("|");
		let app_type = if info.mini_program_info.is_some() {
			AppType::MiniProgram
		} else {
			AppType::OfficialAccount
		};

		AuthorizerInfo {
			profile: AuthorizerProfile {
				app_type,
				service_type: info.service_type_info.id,
				display_name: info.nick_name,
				handle: info.user_name,
				avatar_url: info.head_img,
				qrcode_url: info.qrcode_url,
				principal_name: info.principal_name,
				capabilities,
				verification: info.verify_type_info.id,
			},
			details: AuthorizerDetails {
				registration_type: info.register_type,
				account_status: info.account_status,
				extended_config: info.basic_config,
			},
		}
	}
}

#[derive(Debug, Deserialize)]
struct ProfileAuthorizer {
	#[serde(default)]
	nick_name: String,
	#[serde(default)]
	head_img: String,
	#[serde(default)]
	service_type_info: IdField,
	#[serde(default)]
	verify_type_info: IdField,
	#[serde(default)]
	user_name: String,
	#[serde(default)]
	principal_name: String,
	#[serde(default)]
	qrcode_url: String,
	#[serde(default)]
	account_status: i64,
	#[serde(default)]
	register_type: i64,
	#[serde(default)]
	basic_config: Option<serde_json::Value>,
	#[serde(default, rename = "MiniProgramInfo")]
	mini_program_info: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileAuthorization {
	#[serde(default)]
	func_info: Vec<FuncInfo>,
}

#[derive(Debug, Deserialize)]
struct FuncInfo {
	funcscope_category: IdField,
}

#[derive(Debug, Default, Deserialize)]
struct IdField {
	#[serde(default)]
	id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
	authorizer_access_token: String,
	expires_in: i64,
}
impl TokenResponse {
	pub(crate) fn into_access_token(
		self,
		app_id: AppId,
		issued_at: OffsetDateTime,
	) -> Result<AccessToken> {
		if self.expires_in <= 0 {
			return Err(TransientError::MalformedEntry {
				reason: format!("non-positive expires_in for {app_id}"),
			}
			.into());
		}

		Ok(AccessToken {
			app_id,
			token: CredentialSecret::new(self.authorizer_access_token),
			expires_at: issued_at + Duration::seconds(self.expires_in),
		})
	}
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
	#[serde(default)]
	errcode: i64,
	#[serde(default)]
	errmsg: String,
}

/// Decodes a directory body, surfacing `errcode` failures before shape errors.
pub(crate) fn decode<T>(bytes: &[u8], status: Option<u16>) -> Result<T>
where
	T: DeserializeOwned,
{
	let envelope = serde_json::from_slice::<ErrorEnvelope>(bytes).unwrap_or_default();

	if envelope.errcode != 0 {
		return Err(classify_errcode(envelope.errcode, envelope.errmsg));
	}

	let mut de = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TransientError::ResponseParse { source, status }.into())
}

/// Maps a directory error code into the mirror taxonomy.
pub(crate) fn classify_errcode(errcode: i64, message: String) -> Error {
	if CREDENTIAL_ERRCODES.contains(&errcode) {
		Error::InvalidCredential { reason: format!("{errcode} {message}") }
	} else {
		TransientError::Directory { errcode, message }.into()
	}
}
