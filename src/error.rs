//! Mirror-level error types shared across the directory client, stores, and sync flows.

// self
use crate::{_prelude::*, sync::CycleId};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical mirror error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary directory failure; the next cycle or read retries it.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Caller input was malformed.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// The lookup did not match any mirrored authorizer.
	#[error("No mirrored authorizer matches {lookup}.")]
	NotFound {
		/// Rendered lookup key (app id or handle).
		lookup: String,
	},
	/// Directory rejected the integrator credential.
	#[error("Directory rejected the component credential: {reason}.")]
	InvalidCredential {
		/// Directory-supplied reason string.
		reason: String,
	},
	/// Another pull cycle currently owns the single-flight slot.
	#[error("Pull cycle {running} is already running.")]
	CycleInProgress {
		/// Identifier of the running cycle.
		running: CycleId,
	},
}

/// Configuration failures raised while wiring the mirror.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Directory endpoint URL could not be derived from the descriptor.
	#[error("Directory endpoint `{path}` is invalid.")]
	InvalidEndpoint {
		/// Relative endpoint path.
		path: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Directory descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::directory::DescriptorError),
	/// Sync settings failed validation.
	#[error(transparent)]
	Sync(#[from] crate::config::SyncConfigError),
	/// Sync settings document could not be parsed.
	#[error("Sync settings are malformed.")]
	SyncParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request body could not be encoded.
	#[error("Request body for `{path}` could not be encoded.")]
	RequestEncode {
		/// Relative endpoint path.
		path: &'static str,
		/// Encoding failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry on the next cycle or read).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Directory answered with a non-zero error code.
	#[error("Directory returned error {errcode}: {message}.")]
	Directory {
		/// Directory error code.
		errcode: i64,
		/// Directory error message.
		message: String,
	},
	/// Directory answered with an unexpected HTTP status.
	#[error("Directory returned HTTP status {status}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Directory responded with malformed JSON.
	#[error("Directory returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Directory returned an entry that cannot be mirrored.
	#[error("Directory returned a malformed entry: {reason}.")]
	MalformedEntry {
		/// What was wrong with the entry.
		reason: String,
	},
	/// Directory call exceeded its time budget.
	#[error("Directory call `{operation}` timed out.")]
	Timeout {
		/// Directory operation label.
		operation: &'static str,
	},
}

/// Transport-level failures reported by the HTTP client.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the directory.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Caller-input failures reported synchronously and never retried.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Page limit is outside the accepted window.
	#[error("Limit {limit} must be between 1 and {max}.")]
	LimitOutOfRange {
		/// Requested limit.
		limit: usize,
		/// Largest accepted limit.
		max: usize,
	},
	/// Numeric query parameter failed to parse.
	#[error("Parameter `{name}` must be a non-negative integer, got `{value}`.")]
	NotANumber {
		/// Parameter name.
		name: &'static str,
		/// Raw value supplied by the caller.
		value: String,
	},
	/// Neither an app id nor a handle was supplied.
	#[error("Either an app id or a handle is required.")]
	EmptyLookup,
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::model::IdentifierError),
}
