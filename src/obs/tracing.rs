//! `api_gatekeeper.gate` spans.
//!
//! Each span is opened with `gate` and `stage` set and an empty `outcome`, which the gate fills
//! in through [`GateSpan::record`] once it has decided.

// self
use crate::{
	_prelude::*,
	obs::{GateKind, GateOutcome},
};

/// `Fut` wrapped in the gate span, or `Fut` itself without the `tracing` feature.
#[cfg(feature = "tracing")]
pub type InstrumentedGate<Fut> = tracing::instrument::Instrumented<Fut>;
/// `Fut` wrapped in the gate span, or `Fut` itself without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedGate<Fut> = Fut;

/// Span around one gate evaluation.
#[derive(Clone, Debug)]
pub struct GateSpan {
	kind: GateKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl GateSpan {
	/// Opens a debug-level span for `kind`; `stage` names the call site.
	pub fn new(kind: GateKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!(
				"api_gatekeeper.gate",
				gate = kind.as_str(),
				stage,
				outcome = tracing::field::Empty,
			);

			Self { kind, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self { kind }
		}
	}

	/// Gate this span belongs to.
	pub fn kind(&self) -> GateKind {
		self.kind
	}

	/// Stores the gate's verdict on the span. Later calls overwrite earlier ones.
	pub fn record(&self, outcome: GateOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}

	/// Runs a synchronous gate inside the span.
	pub fn in_scope<F, R>(&self, f: F) -> R
	where
		F: FnOnce() -> R,
	{
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Runs an async gate inside the span; the span is entered only while `fut` is polled.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedGate<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
