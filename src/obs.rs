//! Optional observability helpers for sync flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `authorizer_sync.flow` with the `flow` and
//!   `stage` (call site) fields, plus events for isolated failures, reaping, and cycle
//!   completion.
//! - Enable `metrics` to increment the `authorizer_sync_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `authorizer_sync_enrich_failures_total` counter for every profile lookup that left a record
//!   bare.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Sync flow kinds observed by the mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncKind {
	/// Paginated full pull.
	FullPull,
	/// Per-page profile enrichment.
	Enrich,
	/// Stale-record reaping after a clean cycle.
	Reap,
	/// Background profile correction on the read path.
	Refresh,
	/// Synchronous read-path lookups.
	Lookup,
}
impl SyncKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SyncKind::FullPull => "full_pull",
			SyncKind::Enrich => "enrich",
			SyncKind::Reap => "reap",
			SyncKind::Refresh => "refresh",
			SyncKind::Lookup => "lookup",
		}
	}
}
impl Display for SyncKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a sync flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
