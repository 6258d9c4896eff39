//! Optional observability helpers for gate evaluations.
//!
//! # Feature Flags
//!
//! - `tracing`: each evaluation runs in an `api_gatekeeper.gate` span with `gate`, `stage` (call
//!   site) and `outcome` fields.
//! - `metrics`: every decision bumps `api_gatekeeper_gate_total` (`gate`, `outcome`), and every
//!   rejection bumps `api_gatekeeper_rejection_total` (`gate`, `reason`).

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Gates observed by the gatekeeper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
	/// Per-client token-bucket throttle.
	RateLimit,
	/// Bearer credential resolution.
	Authenticate,
	/// Rejects anonymous requests.
	RequireAuthenticated,
	/// Rejects users that have not completed activation.
	RequireActivated,
	/// Rejects users lacking a permission code.
	RequirePermission,
	/// Registration, activation, and login flows.
	Accounts,
}
impl GateKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GateKind::RateLimit => "rate_limit",
			GateKind::Authenticate => "authenticate",
			GateKind::RequireAuthenticated => "require_authenticated",
			GateKind::RequireActivated => "require_activated",
			GateKind::RequirePermission => "require_permission",
			GateKind::Accounts => "accounts",
		}
	}
}
impl Display for GateKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateOutcome {
	/// The request may proceed.
	Continue,
	/// The request was refused with a client-facing rejection.
	Reject,
	/// The gate could not evaluate the request.
	Error,
}
impl GateOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GateOutcome::Continue => "continue",
			GateOutcome::Reject => "reject",
			GateOutcome::Error => "error",
		}
	}
}
impl Display for GateOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
