//! Mirror facade and the sync flows it drives.

pub mod cycle;
pub mod metrics;
pub mod refresh;

mod enrich;
mod pull;
mod reconcile;

pub use cycle::{CycleId, CycleReport, CycleStatus, CycleTicket};
pub use metrics::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	config::SyncConfig,
	directory::Directory,
	error::TransientError,
	model::{AppId, AuthorizerInfo},
	store::RecordStore,
	sync::cycle::CycleRegistry,
};
#[cfg(feature = "reqwest")]
use crate::{
	directory::{ComponentTokenSource, DirectoryDescriptor, HttpDirectory},
	error::ConfigError,
};

/// Keeps a [`RecordStore`] in step with a remote [`Directory`].
///
/// The mirror owns the directory client, the record store, the validated settings, and the
/// shared enrichment permits so that pull cycles and read-path corrections draw from the same
/// fan-out budget. Cloning is cheap; clones share every resource, including the single-flight
/// slot that keeps at most one pull cycle running.
#[derive(Clone)]
pub struct Mirror {
	/// Remote source of truth.
	pub directory: Arc<dyn Directory>,
	/// Local mirror.
	pub store: Arc<dyn RecordStore>,
	/// Shared counters for sync outcomes.
	pub metrics: Arc<SyncMetrics>,
	config: SyncConfig,
	cycles: Arc<CycleRegistry>,
	enrich_permits: Arc<Semaphore>,
}
impl Mirror {
	/// Creates a mirror with default settings.
	pub fn new(directory: Arc<dyn Directory>, store: Arc<dyn RecordStore>) -> Self {
		Self::with_config(directory, store, SyncConfig::default())
	}

	/// Creates a mirror with caller-provided settings.
	pub fn with_config(
		directory: Arc<dyn Directory>,
		store: Arc<dyn RecordStore>,
		config: SyncConfig,
	) -> Self {
		Self {
			directory,
			store,
			metrics: Default::default(),
			cycles: Arc::new(CycleRegistry::new(config.status_history)),
			enrich_permits: Arc::new(Semaphore::new(config.enrich_concurrency)),
			config,
		}
	}

	/// Returns the settings every flow of this mirror uses.
	pub fn config(&self) -> &SyncConfig {
		&self.config
	}

	/// Runs `fut` under the configured request timeout.
	pub(crate) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		match tokio::time::timeout(self.config.request_timeout_std(), fut).await {
			Ok(result) => result,
			Err(_) => Err(TransientError::Timeout { operation }.into()),
		}
	}

	/// Fetches one profile while holding an enrichment permit.
	pub(crate) async fn fetch_profile(&self, app_id: &AppId) -> Result<AuthorizerInfo> {
		let _permit = self.enrich_permits.acquire().await;

		self.bounded("profile", self.directory.profile(app_id)).await
	}
}
#[cfg(feature = "reqwest")]
impl Mirror {
	/// Creates a mirror that talks to the directory over reqwest.
	///
	/// The reqwest client carries the same timeout as [`SyncConfig::request_timeout`].
	pub fn over_http(
		descriptor: DirectoryDescriptor,
		token_source: Arc<dyn ComponentTokenSource>,
		store: Arc<dyn RecordStore>,
		config: SyncConfig,
	) -> Result<Self, ConfigError> {
		let directory =
			HttpDirectory::with_timeout(descriptor, token_source, config.request_timeout_std())?;

		Ok(Self::with_config(Arc::new(directory), store, config))
	}
}
impl Debug for Mirror {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Mirror")
			.field("config", &self.config)
			.field("running_cycle", &self.cycles.running())
			.finish()
	}
}
