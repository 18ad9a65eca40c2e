// self
use crate::{_prelude::*, obs::SyncKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by sync flows.
#[derive(Clone, Debug)]
pub struct SyncSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl SyncSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: SyncKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("authorizer_sync.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs an isolated failure that the flow absorbed (bare record, skipped correction).
pub(crate) fn absorbed_failure(kind: SyncKind, subject: &dyn Display, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(flow = kind.as_str(), subject = %subject, error = %error, "absorbed failure");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, subject, error);
	}
}

/// Logs a completed step with the number of records it touched.
pub(crate) fn step_completed(kind: SyncKind, step: &'static str, records: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(flow = kind.as_str(), step, records, "step completed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, step, records);
	}
}

/// Logs a flow failure that is about to propagate.
pub(crate) fn flow_failed(kind: SyncKind, subject: &dyn Display, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(flow = kind.as_str(), subject = %subject, error = %error, "flow failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, subject, error);
	}
}
