//! Per-request values threaded through the gate chain.

// self
use crate::{
	_prelude::*,
	auth::{Identity, User},
};

/// What every stage knows once authentication has run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
	/// Resolved identity; anonymous when no credential was sent.
	pub identity: Identity,
	/// Transport address the request arrived from.
	pub remote_addr: String,
}
impl RequestContext {
	/// Builds a context for `identity`.
	pub fn new(identity: Identity, remote_addr: impl Into<String>) -> Self {
		Self { identity, remote_addr: remote_addr.into() }
	}

	/// Narrows to a [`UserContext`] unless the request is anonymous.
	pub fn into_user(self) -> Option<UserContext> {
		match self.identity {
			Identity::Anonymous => None,
			Identity::User(user) => Some(UserContext { user, remote_addr: self.remote_addr }),
		}
	}
}

/// Context handed to stages behind the authentication check.
///
/// Holding one proves the request carries a real user, so downstream stages never have to ask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserContext {
	/// The authenticated user.
	pub user: Arc<User>,
	/// Transport address the request arrived from.
	pub remote_addr: String,
}
impl UserContext {
	/// The authenticated user.
	pub fn user(&self) -> &User {
		&self.user
	}
}
