//! Paginated full pull: page, enrich, persist, then reap once every page landed.

// self
use crate::{
	_prelude::*,
	obs::{self, FlowOutcome, SyncKind, SyncSpan},
	sync::{
		Mirror,
		cycle::{CycleId, CycleReport, CycleSlot, CycleStatus, CycleTicket},
	},
};

#[derive(Debug, Default)]
struct CycleProgress {
	pages: usize,
	observed: usize,
	bare: usize,
}

impl Mirror {
	/// Runs one pull cycle to completion and returns its report.
	///
	/// Fails with [`Error::CycleInProgress`] when another cycle already holds the slot. A page
	/// failure aborts the cycle: pages persisted before it stay and the reaper does not run.
	pub async fn run_full_pull(&self) -> Result<CycleReport> {
		let slot = self
			.cycles
			.try_begin(OffsetDateTime::now_utc())
			.map_err(|running| Error::CycleInProgress { running })?;

		self.drive_cycle(slot).await
	}

	/// Starts a pull cycle in the background and returns immediately.
	///
	/// While a cycle is running, further triggers join it instead of starting another. Must be
	/// called from within a Tokio runtime.
	pub fn trigger_full_pull(&self) -> CycleTicket {
		match self.cycles.try_begin(OffsetDateTime::now_utc()) {
			Ok(slot) => {
				let id = slot.id();
				let mirror = self.clone();

				tokio::spawn(async move {
					// Outcome lands in the registry.
					let _ = mirror.drive_cycle(slot).await;
				});

				CycleTicket::Started(id)
			},
			Err(running) => CycleTicket::Joined(running),
		}
	}

	/// Returns the status of a recent cycle, if it is still in the history window.
	pub fn cycle_status(&self, id: CycleId) -> Option<CycleStatus> {
		self.cycles.status(id)
	}

	/// Returns the cycle currently holding the single-flight slot.
	pub fn running_cycle(&self) -> Option<CycleId> {
		self.cycles.running()
	}

	async fn drive_cycle(&self, slot: CycleSlot) -> Result<CycleReport> {
		let span = SyncSpan::new(SyncKind::FullPull, "drive_cycle");
		let started_at = slot.started_at();
		let mut progress = CycleProgress::default();

		obs::record_flow_outcome(SyncKind::FullPull, FlowOutcome::Attempt);
		self.metrics.record_cycle_started();

		match span.instrument(self.pull_cycle(started_at, &mut progress)).await {
			Ok(reaped) => {
				let report = CycleReport {
					id: slot.id(),
					started_at,
					finished_at: OffsetDateTime::now_utc(),
					pages: progress.pages,
					observed: progress.observed,
					bare: progress.bare,
					reaped,
				};

				slot.succeed(report.clone());
				obs::record_flow_outcome(SyncKind::FullPull, FlowOutcome::Success);
				obs::step_completed(SyncKind::FullPull, "cycle", report.observed);
				self.metrics.record_cycle_succeeded();

				Ok(report)
			},
			Err(e) => {
				obs::flow_failed(SyncKind::FullPull, &slot.id(), &e);
				obs::record_flow_outcome(SyncKind::FullPull, FlowOutcome::Failure);
				self.metrics.record_cycle_failed();
				slot.fail(e.to_string(), progress.pages);

				Err(e)
			},
		}
	}

	async fn pull_cycle(
		&self,
		started_at: OffsetDateTime,
		progress: &mut CycleProgress,
	) -> Result<usize> {
		let fetched = self.pull_pages(started_at, progress).await;
		let reaped = self.reap_if_cycle_succeeded(started_at, fetched.is_ok()).await?;

		fetched?;

		Ok(reaped.unwrap_or_default())
	}

	async fn pull_pages(
		&self,
		started_at: OffsetDateTime,
		progress: &mut CycleProgress,
	) -> Result<()> {
		let count = self.config.page_size;
		let mut offset = 0;

		loop {
			let page = self
				.bounded("list_authorizers", self.directory.list_authorizers(offset, count))
				.await?;
			let fetched = page.entries.len();
			let records = self.enrich(page.entries).await;

			progress.bare += records.iter().filter(|record| !record.is_enriched()).count();

			self.reconcile_page(records, started_at).await?;

			progress.pages += 1;
			progress.observed += fetched;

			if is_last_page(offset, count, fetched, page.total_count) {
				return Ok(());
			}

			offset += count;
		}
	}
}

/// A short page ends the walk; so does a full page that lands exactly on the reported total.
///
/// The reported total is trusted only while the listing agrees with it: a full page that runs
/// past a non-zero total means the directory under-reported, and the walk continues until a
/// short page. Zero means unreported. An under-report that happens to fall on a page boundary is
/// indistinguishable from the truth and ends the walk there.
fn is_last_page(offset: usize, count: usize, fetched: usize, total: usize) -> bool {
	fetched < count || (total > 0 && offset + fetched == total)
}
