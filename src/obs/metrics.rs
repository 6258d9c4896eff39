//! Gate counters for the global `metrics` recorder. Without the `metrics` feature these are
//! no-ops.

// self
use crate::obs::{GateKind, GateOutcome};

/// Counter of gate evaluations, labelled by `gate` and `outcome`.
pub const GATE_TOTAL: &str = "api_gatekeeper_gate_total";
/// Counter of rejections, labelled by `gate` and `reason`.
pub const REJECTION_TOTAL: &str = "api_gatekeeper_rejection_total";

/// Counts one evaluation of `kind` ending in `outcome`.
pub fn record_gate_outcome(kind: GateKind, outcome: GateOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(GATE_TOTAL, "gate" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts one rejection by `kind`; `reason` is the rejection's stable label.
pub fn record_rejection(kind: GateKind, reason: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(REJECTION_TOTAL, "gate" => kind.as_str(), "reason" => reason)
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, reason);
	}
}
