//! Sync settings: page size, enrichment fan-out, call timeout, and status history.
//!
//! [`SyncConfig`] is assembled through [`SyncConfigBuilder`] or parsed from JSON; both paths run
//! the same validation so an invalid value never reaches a running cycle.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Errors raised while validating sync settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SyncConfigError {
	/// Page size must stay inside the directory's accepted window.
	#[error("Page size {value} must be between 1 and {max}.")]
	PageSizeOutOfRange {
		/// Rejected value.
		value: usize,
		/// Largest page the directory serves.
		max: usize,
	},
	/// At least one enrichment call must be allowed in flight.
	#[error("Enrichment concurrency must be at least 1.")]
	ZeroConcurrency,
	/// Directory calls need a positive time budget.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// Cycle status history must keep at least one entry.
	#[error("Cycle status history must keep at least one entry.")]
	ZeroStatusHistory,
}

/// Validated sync settings shared by every flow of a [`Mirror`](crate::sync::Mirror).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SyncConfigRepr", into = "SyncConfigRepr")]
pub struct SyncConfig {
	/// Entries requested per directory page.
	pub page_size: usize,
	/// Profile lookups allowed in flight at once, across pages and reads.
	pub enrich_concurrency: usize,
	/// Upper bound for every directory call.
	pub request_timeout: Duration,
	/// Number of finished cycles whose status stays queryable.
	pub status_history: usize,
}
impl SyncConfig {
	/// Largest page the directory serves.
	pub const MAX_PAGE_SIZE: usize = 500;

	const DEFAULT_ENRICH_CONCURRENCY: usize = 16;
	const DEFAULT_PAGE_SIZE: usize = 100;
	const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(30);
	const DEFAULT_STATUS_HISTORY: usize = 32;

	/// Returns a builder seeded with the defaults.
	pub fn builder() -> SyncConfigBuilder {
		SyncConfigBuilder::default()
	}

	/// Parses and validates settings from a JSON document; absent keys keep their defaults.
	pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de).map_err(|source| ConfigError::SyncParse { source })
	}

	/// Request timeout as a standard-library duration for timers.
	pub fn request_timeout_std(&self) -> StdDuration {
		crate::http::to_std_duration(self.request_timeout)
	}

	fn validate(&self) -> Result<(), SyncConfigError> {
		if !(1..=Self::MAX_PAGE_SIZE).contains(&self.page_size) {
			return Err(SyncConfigError::PageSizeOutOfRange {
				value: self.page_size,
				max: Self::MAX_PAGE_SIZE,
			});
		}
		if self.enrich_concurrency == 0 {
			return Err(SyncConfigError::ZeroConcurrency);
		}
		if !self.request_timeout.is_positive() {
			return Err(SyncConfigError::NonPositiveTimeout);
		}
		if self.status_history == 0 {
			return Err(SyncConfigError::ZeroStatusHistory);
		}

		Ok(())
	}
}
impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			page_size: Self::DEFAULT_PAGE_SIZE,
			enrich_concurrency: Self::DEFAULT_ENRICH_CONCURRENCY,
			request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
			status_history: Self::DEFAULT_STATUS_HISTORY,
		}
	}
}

#[derive(Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SyncConfigRepr {
	page_size: usize,
	enrich_concurrency: usize,
	request_timeout_secs: i64,
	status_history: usize,
}
impl Default for SyncConfigRepr {
	fn default() -> Self {
		SyncConfig::default().into()
	}
}
impl From<SyncConfig> for SyncConfigRepr {
	fn from(config: SyncConfig) -> Self {
		Self {
			page_size: config.page_size,
			enrich_concurrency: config.enrich_concurrency,
			request_timeout_secs: config.request_timeout.whole_seconds(),
			status_history: config.status_history,
		}
	}
}
impl TryFrom<SyncConfigRepr> for SyncConfig {
	type Error = SyncConfigError;

	fn try_from(repr: SyncConfigRepr) -> Result<Self, Self::Error> {
		SyncConfig::builder()
			.page_size(repr.page_size)
			.enrich_concurrency(repr.enrich_concurrency)
			.request_timeout(Duration::seconds(repr.request_timeout_secs))
			.status_history(repr.status_history)
			.build()
	}
}

/// Builder for [`SyncConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct SyncConfigBuilder {
	config: SyncConfig,
}
impl SyncConfigBuilder {
	/// Sets the directory page size.
	pub fn page_size(mut self, page_size: usize) -> Self {
		self.config.page_size = page_size;

		self
	}

	/// Sets how many profile lookups may run at once.
	pub fn enrich_concurrency(mut self, permits: usize) -> Self {
		self.config.enrich_concurrency = permits;

		self
	}

	/// Sets the upper bound for every directory call.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;

		self
	}

	/// Sets how many finished cycles stay queryable.
	pub fn status_history(mut self, entries: usize) -> Self {
		self.config.status_history = entries;

		self
	}

	/// Consumes the builder and validates the resulting settings.
	pub fn build(self) -> Result<SyncConfig, SyncConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}
