// self
use crate::obs::{FlowOutcome, SyncKind};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: SyncKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"authorizer_sync_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records one profile lookup that left its record bare.
pub fn record_enrich_failure() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("authorizer_sync_enrich_failures_total").increment(1);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_a_global_recorder() {
		record_flow_outcome(SyncKind::FullPull, FlowOutcome::Failure);
		record_enrich_failure();
	}
}
