//! Crate-level error types shared across gates, token handling, and account flows.

// self
use crate::{
	_prelude::*,
	store::{StoreError, UniqueField},
	validate::ValidationErrors,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Gate rejections are not errors; they travel as [`crate::gate::Decision::Reject`]. An `Error`
/// always means the request could not be evaluated (server-side) or that an account flow was
/// refused for a reason the caller has to act on.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure; the collaborator owns any retry policy.
	#[error("{0}")]
	Storage(#[source] StoreError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Client-supplied input failed validation.
	#[error("Validation failed: {0}.")]
	Validation(#[from] ValidationErrors),
	/// Uniqueness or optimistic-concurrency conflict.
	#[error(transparent)]
	Conflict(#[from] ConflictError),

	/// Token or user is absent, expired, or nothing matched a delete.
	#[error("Record not found.")]
	NotFound,
	/// Login email or password did not match.
	#[error("Invalid authentication credentials.")]
	InvalidCredentials,
	/// A bounded collaborator call did not finish in time.
	#[error("Timed out waiting for {operation}.")]
	Timeout {
		/// Label of the call that timed out.
		operation: &'static str,
	},
	/// The transport address of a request could not be parsed into a client identity.
	#[error("Client address `{addr}` cannot be parsed.")]
	ClientAddress {
		/// Raw address as received from the transport.
		addr: String,
	},
	/// The password hashing backend failed.
	#[error("Password hashing failed.")]
	PasswordHash(#[from] argon2::password_hash::Error),
	/// A blocking task was cancelled before it produced a result.
	#[error("Blocking task did not complete.")]
	Task(#[from] tokio::task::JoinError),
}
impl Error {
	/// Returns `true` for [`Error::NotFound`].
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound)
	}

	/// Returns `true` when the failure originates on the server side (maps to a 5xx).
	pub fn is_server_error(&self) -> bool {
		matches!(
			self,
			Self::Storage(_)
				| Self::Config(_)
				| Self::Timeout { .. }
				| Self::ClientAddress { .. }
				| Self::PasswordHash(_)
				| Self::Task(_)
		)
	}
}
impl From<StoreError> for Error {
	fn from(e: StoreError) -> Self {
		match e {
			StoreError::Duplicate { field: UniqueField::Email } => ConflictError::DuplicateEmail.into(),
			StoreError::Duplicate { field: UniqueField::Name } => ConflictError::DuplicateName.into(),
			e => Self::Storage(e),
		}
	}
}

/// Conflicts the caller resolves by changing input or refetching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum ConflictError {
	/// Another user already registered this email address.
	#[error("A user with this email address already exists.")]
	DuplicateEmail,
	/// Another user already registered this name.
	#[error("A user with this name already exists.")]
	DuplicateName,
	/// The record changed since it was read.
	#[error("Unable to update the record due to an edit conflict, please try again.")]
	EditConflict,
}

/// Configuration and validation failures raised while wiring the gatekeeper.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Rate limiter settings are unusable.
	#[error("Invalid rate limiter configuration: {reason}.")]
	InvalidLimiter {
		/// Which constraint was violated.
		reason: &'static str,
	},
	/// Password work factor is below the enforced minimum.
	#[error("Password work factor is too weak: {reason}.")]
	WeakPasswordParams {
		/// Which constraint was violated.
		reason: &'static str,
	},
	/// Argon2 refused the parameter set.
	#[error("Password parameters are invalid.")]
	PasswordParams(#[source] argon2::Error),
	/// Configuration document could not be parsed.
	#[error("Configuration document is malformed.")]
	Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn duplicate_store_errors_become_conflicts() {
		let email: Error = StoreError::Duplicate { field: UniqueField::Email }.into();
		let name: Error = StoreError::Duplicate { field: UniqueField::Name }.into();

		assert!(matches!(email, Error::Conflict(ConflictError::DuplicateEmail)));
		assert!(matches!(name, Error::Conflict(ConflictError::DuplicateName)));
		assert!(!email.is_server_error());
	}

	#[test]
	fn backend_errors_keep_their_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.is_server_error());
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Storage errors should expose the original store error as their source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn not_found_is_client_visible() {
		assert!(Error::NotFound.is_not_found());
		assert!(!Error::NotFound.is_server_error());
		assert!(Error::Timeout { operation: "token lookup" }.is_server_error());
	}
}
