//! Request gatekeeping for JSON APIs: per-client token-bucket throttling, scoped bearer tokens,
//! and composable authorization stages in one crate.
//!
//! A request flows through [`limit::RateLimitGate`], then [`gate::Authenticator`], then whatever
//! [`gate::Stage`] chain guards the handler. Every gate reports a [`gate::Decision`]; the first
//! rejection ends the request and translating it into a wire response is left to the caller.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod limit;
pub mod obs;
pub mod store;
pub mod tokens;
pub mod validate;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		accounts::Accounts,
		auth::{PasswordHasher, PermissionCode, UserId},
		config::GatekeeperConfig,
		store::{MemoryStore, TokenRepository, UserRepository},
		tokens::TokenStore,
	};

	/// Password every test fixture user registers with.
	pub const TEST_PASSWORD: &str = "correct-horse";

	/// Constructs an [`Accounts`] service plus the [`MemoryStore`] backing it.
	pub fn build_test_accounts() -> (Accounts, Arc<MemoryStore>) {
		let config = GatekeeperConfig::default();
		let store = Arc::new(MemoryStore::default());
		let users: Arc<dyn UserRepository> = store.clone();
		let tokens: Arc<dyn TokenRepository> = store.clone();
		let hasher = PasswordHasher::from_config(&config.password)
			.expect("Minimum password configuration should always be accepted.");
		let accounts =
			Accounts::new(users, TokenStore::new(tokens, config.store_timeout()), hasher, &config);

		(accounts, store)
	}

	/// Grants the provided permission codes to a user stored in the [`MemoryStore`].
	pub fn grant(store: &MemoryStore, user: &UserId, codes: &[&str]) {
		store.grant_permissions(
			user,
			codes
				.iter()
				.map(|code| PermissionCode::new(code).expect("Permission fixture should be valid.")),
		);
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use color_eyre as _;
