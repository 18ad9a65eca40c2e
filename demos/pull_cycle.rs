//! Demonstrates one full pull against a mocked directory, followed by a mirror-backed listing
//! and an access-token exchange for one of the mirrored authorizers.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use authorizer_sync::{
	config::SyncConfig,
	directory::{DirectoryDescriptor, StaticComponentToken},
	model::ComponentAppId,
	store::MemoryStore,
	sync::{AuthorizerLookup, ListQuery, Mirror},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let list_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/component/api_get_authorizer_list");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"total_count": 2,
				"list": [
					{"authorizer_appid": "wx-harbor", "refresh_token": "refresh-harbor", "auth_time": 1700000000},
					{"authorizer_appid": "wx-market", "refresh_token": "refresh-market", "auth_time": 1700003600}
				]
			}));
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/component/api_get_authorizer_info");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"authorizer_info": {
					"nick_name": "Harbor Cafe",
					"user_name": "gh_harbor",
					"service_type_info": {"id": 2},
					"verify_type_info": {"id": 0}
				},
				"authorization_info": {"func_info": [{"funcscope_category": {"id": 1}}]}
			}));
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/component/api_authorizer_token");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"authorizer_access_token": "demo-access",
				"expires_in": 7200
			}));
		})
		.await;
	let descriptor = DirectoryDescriptor::builder()
		.api_base(Url::parse(&server.base_url())?)
		.component_app_id(ComponentAppId::new("wx-demo-component")?)
		.allow_insecure_http(true)
		.build()?;
	let mirror = Mirror::over_http(
		descriptor,
		Arc::new(StaticComponentToken::new("demo-component-token")),
		Arc::new(MemoryStore::default()),
		SyncConfig::builder().page_size(50).build()?,
	)?;
	let report = mirror.run_full_pull().await?;

	list_mock.assert_async().await;
	profile_mock.assert_calls_async(2).await;

	println!(
		"Cycle {} mirrored {} authorizers over {} page(s) and reaped {}.",
		report.id, report.observed, report.pages, report.reaped
	);

	let page = mirror.list_records(&ListQuery::default()).await?;

	for record in &page.records {
		println!("{} -> {:?}", record.app_id, record.handle());
	}

	let token = mirror
		.authorizer_access_token(&AuthorizerLookup::from_params(Some("wx-market"), None)?)
		.await?;

	println!("Access token for wx-market expires at {}.", token.expires_at);

	token_mock.assert_async().await;

	Ok(())
}
