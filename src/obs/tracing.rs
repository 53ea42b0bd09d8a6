// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("renewal_client.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
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

/// Emits a debug event describing a renewal state transition.
pub(crate) fn renewal_transition(episode: u64, transition: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(episode, transition, "renewal state changed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (episode, transition);
	}
}

/// Emits a warning when a renewal episode fails.
pub(crate) fn renewal_failed(episode: u64, reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(episode, %reason, "credential renewal failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (episode, reason);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn op_span_passes_output_through() {
		let span = OpSpan::new(OpKind::Dispatch, "op_span_passes_output_through");

		assert_eq!(span.instrument(async { "done" }).await, "done");
	}

	#[test]
	fn renewal_events_accept_any_display() {
		renewal_transition(1, "idle->refreshing");
		renewal_failed(1, &"issuer unavailable");
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::Renewal, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
