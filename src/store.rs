//! Persistence contracts consumed by the gatekeeper and the built-in in-memory backend.
//!
//! The storage engine itself is a collaborator: anything that can look records up by key, report
//! a distinguishable "not found", and reject duplicate unique keys can implement these traits.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{NewUser, PermissionSet, TokenHash, TokenRecord, TokenScope, User, UserId},
};

/// Boxed future returned by every repository call.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Token persistence keyed by `(hash, scope)`.
pub trait TokenRepository
where
	Self: Send + Sync,
{
	/// Persists a token record.
	fn insert(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record matching both `hash` and `scope`, expired or not.
	fn find<'a>(
		&'a self,
		hash: &'a TokenHash,
		scope: TokenScope,
	) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Deletes every record of `scope` owned by `user` and returns how many were removed.
	fn delete_for_user<'a>(&'a self, scope: TokenScope, user: &'a UserId) -> StoreFuture<'a, u64>;
}

/// User persistence with unique name/email and versioned updates.
pub trait UserRepository
where
	Self: Send + Sync,
{
	/// Inserts a validated draft and returns the stored record (version 1).
	///
	/// Fails with [`StoreError::Duplicate`] when the name or email is taken.
	fn insert(&self, user: NewUser) -> StoreFuture<'_, User>;

	/// Fetches a user by identifier.
	fn get_by_id<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<User>>;

	/// Fetches a user by email, compared case-insensitively.
	fn get_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>>;

	/// Replaces the stored user if its version still equals `user.version`, bumping the version.
	fn update(&self, user: User) -> StoreFuture<'_, UpdateOutcome>;
}

/// Permission lookup used by authorization checks.
pub trait PermissionRepository
where
	Self: Send + Sync,
{
	/// Returns every permission code granted to `user` (empty when none).
	fn permissions_for<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, PermissionSet>;
}

/// Result of a version-checked update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
	/// The version matched; carries the stored record with its bumped version.
	Updated(User),
	/// The row exists but was modified since it was read.
	VersionMismatch,
	/// No row matched the identifier.
	Missing,
}

/// Field whose uniqueness constraint rejected a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniqueField {
	/// User display name.
	Name,
	/// User email address.
	Email,
}

/// Error type produced by repository implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// A unique key is already taken.
	#[error("Duplicate value for unique field {field:?}.")]
	Duplicate {
		/// The constrained field.
		field: UniqueField,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Runs a repository call under `timeout`, mapping elapsed time and store failures into [`Error`].
///
/// Dropping the returned future drops the repository call with it, so a cancelled request does
/// not leave lookups running.
pub(crate) async fn bounded<T, F>(
	operation: &'static str,
	timeout: StdDuration,
	call: F,
) -> Result<T>
where
	F: Future<Output = Result<T, StoreError>>,
{
	match tokio::time::timeout(timeout, call).await {
		Ok(result) => result.map_err(Error::from),
		Err(_) => Err(Error::Timeout { operation }),
	}
}
