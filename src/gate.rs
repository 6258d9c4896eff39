//! Request gates and their shared decision type.
//!
//! Every gate answers with a [`Decision`]: either continue (optionally carrying a value for the
//! next gate) or reject with a [`Rejection`]. An `Err` means the gate itself could not decide and
//! maps to a server error. Turning a rejection into a wire response is the web layer's job;
//! [`Rejection::status_code`] and [`Rejection::to_envelope`] are offered as hints.

pub mod authenticate;
pub mod context;
pub mod pipeline;
pub mod stage;

pub use authenticate::*;
pub use context::*;
pub use pipeline::*;
pub use stage::*;

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	obs::{self, GateKind, GateOutcome},
};

/// Verdict produced by a gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision<T = ()> {
	/// The request may proceed; carries whatever the gate established.
	Continue(T),
	/// The request ends here.
	Reject(Rejection),
}
impl<T> Decision<T> {
	/// Returns `true` for [`Decision::Continue`].
	pub fn is_continue(&self) -> bool {
		matches!(self, Self::Continue(_))
	}

	/// Returns `true` for [`Decision::Reject`].
	pub fn is_reject(&self) -> bool {
		matches!(self, Self::Reject(_))
	}

	/// The rejection, if any.
	pub fn rejection(&self) -> Option<Rejection> {
		match self {
			Self::Continue(_) => None,
			Self::Reject(rejection) => Some(*rejection),
		}
	}

	/// The continued value, if any.
	pub fn into_continue(self) -> Option<T> {
		match self {
			Self::Continue(value) => Some(value),
			Self::Reject(_) => None,
		}
	}

	/// Maps the continued value.
	pub fn map<U, F>(self, f: F) -> Decision<U>
	where
		F: FnOnce(T) -> U,
	{
		match self {
			Self::Continue(value) => Decision::Continue(f(value)),
			Self::Reject(rejection) => Decision::Reject(rejection),
		}
	}
}

/// Reason a gate ended a request.
///
/// Messages deliberately say nothing about why a credential failed (absent, expired, or
/// issued for another scope all read the same).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
	/// The client exhausted its token bucket.
	RateLimited,
	/// A credential was presented but is malformed, unknown, or expired.
	InvalidAuthenticationToken,
	/// The route needs an authenticated user and the request is anonymous.
	AuthenticationRequired,
	/// The user has not completed activation.
	InactiveAccount,
	/// The user lacks the permission code the route needs.
	NotPermitted,
}
impl Rejection {
	/// Stable snake-case label, matching the serialized form.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::RateLimited => "rate_limited",
			Self::InvalidAuthenticationToken => "invalid_authentication_token",
			Self::AuthenticationRequired => "authentication_required",
			Self::InactiveAccount => "inactive_account",
			Self::NotPermitted => "not_permitted",
		}
	}

	/// Suggested HTTP status code.
	pub const fn status_code(self) -> u16 {
		match self {
			Self::RateLimited => 429,
			Self::InvalidAuthenticationToken | Self::AuthenticationRequired => 401,
			Self::InactiveAccount | Self::NotPermitted => 403,
		}
	}

	/// Client-facing message.
	pub const fn message(self) -> &'static str {
		match self {
			Self::RateLimited => "rate limit exceeded",
			Self::InvalidAuthenticationToken => "invalid or missing authentication token",
			Self::AuthenticationRequired => "you must be authenticated to access this resource",
			Self::InactiveAccount => "your user account must be activated to access this resource",
			Self::NotPermitted =>
				"your user account doesn't have the necessary permissions to access this resource",
		}
	}

	/// Whether the response should carry `WWW-Authenticate: Bearer`.
	pub const fn challenges_bearer(self) -> bool {
		matches!(self, Self::InvalidAuthenticationToken)
	}

	/// JSON body in the `{"error": "..."}` envelope.
	pub fn to_envelope(self) -> Value {
		json!({ "error": self.message() })
	}
}
impl Display for Rejection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.message())
	}
}

/// Reports a gate result to the metrics/tracing backends.
pub(crate) fn observe<T>(kind: GateKind, result: &Result<Decision<T>>) -> GateOutcome {
	let outcome = match result {
		Ok(Decision::Continue(_)) => GateOutcome::Continue,
		Ok(Decision::Reject(rejection)) => {
			#[cfg(feature = "tracing")]
			tracing::debug!(gate = kind.as_str(), rejection = rejection.as_str(), "request rejected");

			obs::record_rejection(kind, rejection.as_str());

			GateOutcome::Reject
		},
		Err(_e) => {
			#[cfg(feature = "tracing")]
			tracing::warn!(gate = kind.as_str(), error = %_e, "gate could not evaluate request");

			GateOutcome::Error
		},
	};

	obs::record_gate_outcome(kind, outcome);

	outcome
}
