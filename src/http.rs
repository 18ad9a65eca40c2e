//! Transport primitives for directory calls.
//!
//! The module exposes [`ResponseMetadata`] and, behind the `reqwest` feature,
//! [`ReqwestHttpClient`]: a thin wrapper that posts JSON bodies, captures the status and
//! Retry-After hint of every response, and maps reqwest failures into the mirror's error
//! taxonomy so directory implementations never branch on transport details.

// std
use std::time::Duration as StdDuration;
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")]
use crate::error::{ConfigError, TransientError, TransportError};

/// Metadata captured from the most recent HTTP response.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the directory, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Directory endpoints answer directly, so clients built by
/// [`with_timeout`](Self::with_timeout) never follow redirects. Configure any custom
/// [`ReqwestClient`] passed to [`with_client`](Self::with_client) the same way and give it a
/// request timeout.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that gives up on any call after `timeout` and ignores redirects.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Posts `body` as JSON and returns the raw response body with its metadata.
	///
	/// Non-success statuses become [`TransientError::UnexpectedStatus`] carrying the
	/// Retry-After hint.
	pub async fn post_json<B>(
		&self,
		operation: &'static str,
		url: Url,
		body: &B,
	) -> Result<(ResponseMetadata, Vec<u8>)>
	where
		B: ?Sized + Serialize,
	{
		let payload = serde_json::to_vec(body)
			.map_err(|source| ConfigError::RequestEncode { path: operation, source })?;
		let response = self
			.0
			.post(url)
			.header(CONTENT_TYPE, "application/json")
			.body(payload)
			.send()
			.await
			.map_err(|e| map_reqwest_error(operation, e))?;
		let status = response.status();
		let meta = ResponseMetadata {
			status: Some(status.as_u16()),
			retry_after: parse_retry_after(response.headers()),
		};

		if !status.is_success() {
			return Err(TransientError::UnexpectedStatus {
				status: status.as_u16(),
				retry_after: meta.retry_after,
			}
			.into());
		}

		let bytes = response.bytes().await.map_err(|e| map_reqwest_error(operation, e))?;

		Ok((meta, bytes.to_vec()))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(operation: &'static str, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Timeout { operation }.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Converts a mirror duration into a timer duration, clamping negatives to zero.
pub(crate) fn to_std_duration(duration: Duration) -> StdDuration {
	StdDuration::try_from(duration).unwrap_or(StdDuration::ZERO)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_seconds_and_ignores_garbage() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn retry_after_in_the_past_is_dropped() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn negative_durations_clamp_to_zero() {
		assert_eq!(to_std_duration(Duration::seconds(-5)), StdDuration::ZERO);
		assert_eq!(to_std_duration(Duration::seconds(5)), StdDuration::from_secs(5));
	}
}
