//! Token lifecycle service: issue, resolve, and revoke scoped bearer tokens.

// self
use crate::{
	_prelude::*,
	auth::{Token, TokenCodec, TokenHash, TokenScope, UserId},
	store::{self, TokenRepository},
};

/// Issues and resolves tokens against a [`TokenRepository`], bounding every call by a timeout.
#[derive(Clone)]
pub struct TokenStore {
	repository: Arc<dyn TokenRepository>,
	timeout: StdDuration,
}
impl TokenStore {
	/// Wraps a repository; `timeout` bounds each repository call.
	pub fn new(repository: Arc<dyn TokenRepository>, timeout: StdDuration) -> Self {
		Self { repository, timeout }
	}

	/// Generates a token for `user_id` and persists its record.
	///
	/// The returned [`Token`] is the only place the plaintext ever exists.
	pub async fn issue(&self, user_id: &UserId, ttl: Duration, scope: TokenScope) -> Result<Token> {
		let token = TokenCodec::generate(user_id, ttl, scope);

		self.insert(&token).await?;

		Ok(token)
	}

	/// Persists the record half of `token`.
	pub async fn insert(&self, token: &Token) -> Result<()> {
		store::bounded("token insert", self.timeout, self.repository.insert(token.record.clone()))
			.await
	}

	/// Resolves `plaintext` under `scope` to the owning user.
	///
	/// Missing, wrong-scope, and expired tokens all come back as [`Error::NotFound`].
	pub async fn get(&self, scope: TokenScope, plaintext: &str) -> Result<UserId> {
		self.get_at(scope, plaintext, OffsetDateTime::now_utc()).await
	}

	/// Same as [`TokenStore::get`], judging expiry at `now`.
	pub async fn get_at(
		&self,
		scope: TokenScope,
		plaintext: &str,
		now: OffsetDateTime,
	) -> Result<UserId> {
		let hash = TokenHash::of(plaintext);
		let record =
			store::bounded("token lookup", self.timeout, self.repository.find(&hash, scope))
				.await?
				.ok_or(Error::NotFound)?;

		// The repository may still hold expired rows; expiry is judged here.
		if record.is_expired_at(now) {
			return Err(Error::NotFound);
		}

		Ok(record.user_id)
	}

	/// Deletes every `scope` token held by `user_id`.
	///
	/// Returns how many were removed, or [`Error::NotFound`] when there was nothing to delete.
	pub async fn delete_all_for_user(&self, scope: TokenScope, user_id: &UserId) -> Result<u64> {
		let removed = store::bounded(
			"token delete",
			self.timeout,
			self.repository.delete_for_user(scope, user_id),
		)
		.await?;

		if removed == 0 {
			return Err(Error::NotFound);
		}

		Ok(removed)
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("timeout", &self.timeout).finish_non_exhaustive()
	}
}
