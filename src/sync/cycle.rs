//! Single-flight registry for pull cycles and the statuses callers poll.

// std
use std::collections::VecDeque;
// self
use crate::_prelude::*;

/// Identifier handed out for every started pull cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CycleId(u64);
impl CycleId {
	/// Returns the raw sequence number.
	pub const fn get(self) -> u64 {
		self.0
	}
}
impl Display for CycleId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "cycle-{}", self.0)
	}
}

/// Summary of a pull cycle that completed and reaped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
	/// Cycle identifier.
	pub id: CycleId,
	/// Instant taken before the first page request; every record observed is stamped with it.
	pub started_at: OffsetDateTime,
	/// Instant the reaper finished.
	pub finished_at: OffsetDateTime,
	/// Pages fetched and persisted.
	pub pages: usize,
	/// Entries observed across all pages.
	pub observed: usize,
	/// Observed entries persisted without a profile.
	pub bare: usize,
	/// Records deleted by the reaper.
	pub reaped: usize,
}

/// Lifecycle state of one pull cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStatus {
	/// The cycle is still paging.
	Running {
		/// Cycle start instant.
		started_at: OffsetDateTime,
	},
	/// The cycle finished every page and reaped.
	Succeeded(CycleReport),
	/// The cycle aborted; pages persisted before the failure stay, nothing was reaped.
	Failed {
		/// Cycle start instant.
		started_at: OffsetDateTime,
		/// Instant the failure was recorded.
		finished_at: OffsetDateTime,
		/// Rendered failure.
		reason: String,
		/// Pages persisted before the failure.
		pages_persisted: usize,
	},
}
impl CycleStatus {
	/// Returns `true` once the cycle stopped, successfully or not.
	pub fn is_finished(&self) -> bool {
		!matches!(self, CycleStatus::Running { .. })
	}
}

/// Answer to a pull trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleTicket {
	/// A new cycle was started in the background.
	Started(CycleId),
	/// A cycle was already running; the trigger was coalesced into it.
	Joined(CycleId),
}
impl CycleTicket {
	/// Identifier of the cycle that will serve this trigger.
	pub fn id(self) -> CycleId {
		match self {
			CycleTicket::Started(id) | CycleTicket::Joined(id) => id,
		}
	}
}

#[derive(Debug, Default)]
struct RegistryState {
	next_id: u64,
	running: Option<CycleId>,
	statuses: HashMap<CycleId, CycleStatus>,
	finished: VecDeque<CycleId>,
}

/// Tracks the running cycle and a bounded history of finished ones.
#[derive(Debug)]
pub(crate) struct CycleRegistry {
	history: usize,
	state: Mutex<RegistryState>,
}
impl CycleRegistry {
	pub(crate) fn new(history: usize) -> Self {
		Self { history: history.max(1), state: Default::default() }
	}

	/// Claims the single-flight slot or reports the cycle that holds it.
	pub(crate) fn try_begin(
		self: &Arc<Self>,
		started_at: OffsetDateTime,
	) -> Result<CycleSlot, CycleId> {
		let mut state = self.state.lock();

		if let Some(running) = state.running {
			return Err(running);
		}

		state.next_id += 1;

		let id = CycleId(state.next_id);

		state.running = Some(id);
		state.statuses.insert(id, CycleStatus::Running { started_at });

		Ok(CycleSlot { registry: self.clone(), id, started_at, finished: false })
	}

	pub(crate) fn status(&self, id: CycleId) -> Option<CycleStatus> {
		self.state.lock().statuses.get(&id).cloned()
	}

	pub(crate) fn running(&self) -> Option<CycleId> {
		self.state.lock().running
	}

	fn finish(&self, id: CycleId, status: CycleStatus) {
		let mut state = self.state.lock();

		if state.running == Some(id) {
			state.running = None;
		}

		state.statuses.insert(id, status);
		state.finished.push_back(id);

		while state.finished.len() > self.history {
			if let Some(evicted) = state.finished.pop_front() {
				state.statuses.remove(&evicted);
			}
		}
	}
}

/// Exclusive claim on the pull slot; releasing it without a verdict records an abort.
#[derive(Debug)]
pub(crate) struct CycleSlot {
	registry: Arc<CycleRegistry>,
	id: CycleId,
	started_at: OffsetDateTime,
	finished: bool,
}
impl CycleSlot {
	pub(crate) fn id(&self) -> CycleId {
		self.id
	}

	pub(crate) fn started_at(&self) -> OffsetDateTime {
		self.started_at
	}

	pub(crate) fn succeed(mut self, report: CycleReport) {
		self.finished = true;
		self.registry.finish(self.id, CycleStatus::Succeeded(report));
	}

	pub(crate) fn fail(mut self, reason: String, pages_persisted: usize) {
		self.finished = true;
		self.registry.finish(
			self.id,
			CycleStatus::Failed {
				started_at: self.started_at,
				finished_at: OffsetDateTime::now_utc(),
				reason,
				pages_persisted,
			},
		);
	}
}
impl Drop for CycleSlot {
	fn drop(&mut self) {
		if !self.finished {
			self.registry.finish(
				self.id,
				CycleStatus::Failed {
					started_at: self.started_at,
					finished_at: OffsetDateTime::now_utc(),
					reason: "cycle aborted".into(),
					pages_persisted: 0,
				},
			);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn report(id: CycleId, started_at: OffsetDateTime) -> CycleReport {
		CycleReport {
			id,
			started_at,
			finished_at: started_at,
			pages: 1,
			observed: 0,
			bare: 0,
			reaped: 0,
		}
	}

	#[test]
	fn second_claim_reports_the_running_cycle() {
		let registry = Arc::new(CycleRegistry::new(4));
		let now = OffsetDateTime::now_utc();
		let slot = registry.try_begin(now).expect("First claim should succeed.");
		let id = slot.id();

		assert_eq!(registry.try_begin(now).map(|slot| slot.id()), Err(id));
		assert_eq!(registry.running(), Some(id));

		slot.succeed(report(id, now));

		assert_eq!(registry.running(), None);
		assert!(matches!(registry.status(id), Some(CycleStatus::Succeeded(_))));

		let next = registry.try_begin(now).expect("Slot should be free after success.");

		assert_eq!(next.id().get(), id.get() + 1);
	}

	#[test]
	fn dropped_slot_records_an_abort() {
		let registry = Arc::new(CycleRegistry::new(4));
		let slot =
			registry.try_begin(OffsetDateTime::now_utc()).expect("First claim should succeed.");
		let id = slot.id();

		drop(slot);

		match registry.status(id) {
			Some(CycleStatus::Failed { reason, .. }) => assert_eq!(reason, "cycle aborted"),
			other => panic!("Unexpected status: {other:?}"),
		}
		assert_eq!(registry.running(), None);
	}

	#[test]
	fn history_evicts_the_oldest_finished_cycle() {
		let registry = Arc::new(CycleRegistry::new(2));
		let now = OffsetDateTime::now_utc();
		let mut ids = Vec::new();

		for _ in 0..3 {
			let slot = registry.try_begin(now).expect("Slot should be free.");

			ids.push(slot.id());
			slot.fail("boom".into(), 0);
		}

		assert_eq!(registry.status(ids[0]), None);
		assert!(registry.status(ids[1]).is_some_and(|status| status.is_finished()));
		assert!(registry.status(ids[2]).is_some());
		assert_eq!(ids[2].to_string(), "cycle-3");
	}
}
