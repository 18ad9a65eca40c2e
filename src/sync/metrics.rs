//! In-process counters for pull cycles, reaping, enrichment, and read-path corrections.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for sync flows.
#[derive(Debug, Default)]
pub struct SyncMetrics {
	cycles_started: AtomicU64,
	cycles_succeeded: AtomicU64,
	cycles_failed: AtomicU64,
	records_reaped: AtomicU64,
	enrich_failures: AtomicU64,
	corrections_written: AtomicU64,
}
impl SyncMetrics {
	/// Returns the number of pull cycles that claimed the single-flight slot.
	pub fn cycles_started(&self) -> u64 {
		self.cycles_started.load(Ordering::Relaxed)
	}

	/// Returns the number of pull cycles that finished and reaped.
	pub fn cycles_succeeded(&self) -> u64 {
		self.cycles_succeeded.load(Ordering::Relaxed)
	}

	/// Returns the number of pull cycles that aborted.
	pub fn cycles_failed(&self) -> u64 {
		self.cycles_failed.load(Ordering::Relaxed)
	}

	/// Returns the number of records deleted by the reaper.
	pub fn records_reaped(&self) -> u64 {
		self.records_reaped.load(Ordering::Relaxed)
	}

	/// Returns the number of profile lookups that left a record bare during a pull.
	pub fn enrich_failures(&self) -> u64 {
		self.enrich_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of profiles patched by the read path.
	pub fn corrections_written(&self) -> u64 {
		self.corrections_written.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cycle_started(&self) {
		self.cycles_started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cycle_succeeded(&self) {
		self.cycles_succeeded.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cycle_failed(&self) {
		self.cycles_failed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reaped(&self, count: usize) {
		self.records_reaped.fetch_add(count as u64, Ordering::Relaxed);
	}

	pub(crate) fn record_enrich_failure(&self) {
		self.enrich_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_corrections(&self, count: usize) {
		self.corrections_written.fetch_add(count as u64, Ordering::Relaxed);
	}
}
