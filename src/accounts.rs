//! Registration, activation, and login flows.
//!
//! These are the flows that mint tokens: registration hands out a one-hour activation token,
//! activation consumes it, and login issues a day-long authentication token.

// self
use crate::{
	_prelude::*,
	auth::{NewUser, Password, PasswordHasher, Token, TokenCodec, TokenScope, User},
	config::{GatekeeperConfig, TokenConfig},
	error::ConflictError,
	obs::{GateKind, GateSpan},
	store::{self, UpdateOutcome, UserRepository},
	tokens::TokenStore,
	validate::{self, ValidationErrors},
};

/// A freshly registered user plus the activation token to deliver to them.
#[derive(Clone, Debug)]
pub struct Registration {
	/// Stored user, not yet activated.
	pub user: User,
	/// Activation token; its plaintext exists nowhere else.
	pub activation_token: Token,
}

/// Account flows over a user repository and a [`TokenStore`].
#[derive(Clone)]
pub struct Accounts {
	users: Arc<dyn UserRepository>,
	tokens: TokenStore,
	hasher: PasswordHasher,
	ttl: TokenConfig,
	timeout: StdDuration,
}
impl Accounts {
	/// Wires the flows; token lifetimes and the call timeout come from `config`.
	pub fn new(
		users: Arc<dyn UserRepository>,
		tokens: TokenStore,
		hasher: PasswordHasher,
		config: &GatekeeperConfig,
	) -> Self {
		Self {
			users,
			tokens,
			hasher,
			ttl: config.tokens.clone(),
			timeout: config.store_timeout(),
		}
	}

	/// Token service used by these flows.
	pub fn tokens(&self) -> &TokenStore {
		&self.tokens
	}

	/// Hashes the password, validates and stores the user, and issues an activation token.
	///
	/// A taken name or email is a [`ConflictError`].
	pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Registration> {
		let span = GateSpan::new(GateKind::Accounts, "register");

		span.instrument(async move {
			let password = self.hash_password(password).await?;
			let draft = NewUser::new(name, email).with_password(password);

			draft.validate()?;

			let user =
				store::bounded("user insert", self.timeout, self.users.insert(draft)).await?;
			let activation_token =
				self.tokens.issue(&user.id, self.ttl.activation_ttl(), TokenScope::Activation).await?;

			#[cfg(feature = "tracing")]
			tracing::info!(user = %user.id, "registered user");

			Ok(Registration { user, activation_token })
		})
		.await
	}

	/// Activates the user owning `plaintext` and revokes all of their activation tokens.
	///
	/// Unknown, expired, and malformed tokens are validation failures on the `token` field.
	/// A concurrent modification of the user is [`ConflictError::EditConflict`].
	pub async fn activate(&self, plaintext: &str) -> Result<User> {
		let span = GateSpan::new(GateKind::Accounts, "activate");

		span.instrument(async move {
			TokenCodec::validate_format(plaintext)?;

			let user_id = match self.tokens.get(TokenScope::Activation, plaintext).await {
				Ok(user_id) => user_id,
				Err(Error::NotFound) =>
					return Err(Error::Validation(ValidationErrors::single(
						"token",
						"invalid or expired activation token",
					))),
				Err(e) => return Err(e),
			};
			let mut user =
				store::bounded("user lookup", self.timeout, self.users.get_by_id(&user_id))
					.await?
					.ok_or_else(|| ValidationErrors::single("token", "user for token not found"))?;

			user.activated = true;

			let user =
				match store::bounded("user update", self.timeout, self.users.update(user)).await? {
					UpdateOutcome::Updated(user) => user,
					UpdateOutcome::VersionMismatch =>
						return Err(Error::Conflict(ConflictError::EditConflict)),
					UpdateOutcome::Missing => return Err(Error::NotFound),
				};

			match self.tokens.delete_all_for_user(TokenScope::Activation, &user.id).await {
				// A concurrent activation may already have revoked them.
				Ok(_) | Err(Error::NotFound) => {},
				Err(e) => return Err(e),
			}

			#[cfg(feature = "tracing")]
			tracing::info!(user = %user.id, version = user.version, "activated user");

			Ok(user)
		})
		.await
	}

	/// Verifies `email`/`password` and issues an authentication token.
	///
	/// An unknown email and a wrong password both yield [`Error::InvalidCredentials`].
	pub async fn create_authentication_token(&self, email: &str, password: &str) -> Result<Token> {
		let span = GateSpan::new(GateKind::Accounts, "create_authentication_token");

		span.instrument(async move {
			let mut v = ValidationErrors::new();

			validate::validate_email(&mut v, email);
			validate::validate_password_plaintext(&mut v, password);
			v.into_result()?;

			let user = store::bounded("user lookup", self.timeout, self.users.get_by_email(email))
				.await?
				.ok_or(Error::InvalidCredentials)?;

			if !self.password_matches(&user, password).await? {
				return Err(Error::InvalidCredentials);
			}

			self.tokens
				.issue(&user.id, self.ttl.authentication_ttl(), TokenScope::Authentication)
				.await
		})
		.await
	}

	async fn hash_password(&self, plaintext: &str) -> Result<Password> {
		let hasher = self.hasher.clone();
		let owned = plaintext.to_owned();
		let hash = self.blocking("password hash", move || hasher.set(&owned)).await?;

		Ok(Password::hashed(plaintext, hash))
	}

	async fn password_matches(&self, user: &User, candidate: &str) -> Result<bool> {
		let hasher = self.hasher.clone();
		let hash = user.password_hash.clone();
		let candidate = candidate.to_owned();

		self.blocking("password verify", move || hasher.matches(&hash, &candidate)).await
	}

	async fn blocking<T, F>(&self, operation: &'static str, f: F) -> Result<T>
	where
		T: 'static + Send,
		F: 'static + Send + FnOnce() -> Result<T>,
	{
		match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(f)).await {
			Ok(joined) => joined?,
			Err(_) => Err(Error::Timeout { operation }),
		}
	}
}
impl Debug for Accounts {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Accounts")
			.field("tokens", &self.tokens)
			.field("hasher", &self.hasher)
			.field("ttl", &self.ttl)
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}
