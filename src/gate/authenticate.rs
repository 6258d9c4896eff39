//! Bearer credential resolution.

// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenCodec, TokenScope},
	gate::{self, Decision, Rejection},
	obs::{GateKind, GateSpan},
	store::{self, UserRepository},
	tokens::TokenStore,
};

/// Resolves the `Authorization` header to an [`Identity`].
#[derive(Clone)]
pub struct Authenticator {
	tokens: TokenStore,
	users: Arc<dyn UserRepository>,
	timeout: StdDuration,
}
impl Authenticator {
	/// Response header every authenticated route must carry, since its body depends on the
	/// credential.
	pub const VARY: (&'static str, &'static str) = ("Vary", "Authorization");

	/// Wires token and user lookups; `timeout` bounds the user lookup.
	pub fn new(tokens: TokenStore, users: Arc<dyn UserRepository>, timeout: StdDuration) -> Self {
		Self { tokens, users, timeout }
	}

	/// Evaluates the raw `Authorization` header value.
	///
	/// - absent or empty: continue as [`Identity::Anonymous`]
	/// - anything but exactly `Bearer <token>`, a badly sized token, or a token that does not
	///   resolve to a live user: [`Rejection::InvalidAuthenticationToken`], without saying which
	/// - otherwise: continue as the token's user
	pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Decision<Identity>> {
		let span = GateSpan::new(GateKind::Authenticate, "authenticate");
		let result = span.instrument(self.resolve(authorization)).await;

		span.record(gate::observe(GateKind::Authenticate, &result));

		result
	}

	async fn resolve(&self, authorization: Option<&str>) -> Result<Decision<Identity>> {
		let header = match authorization {
			None | Some("") => return Ok(Decision::Continue(Identity::Anonymous)),
			Some(header) => header,
		};
		let mut parts = header.split(' ');
		let plaintext = match (parts.next(), parts.next(), parts.next()) {
			(Some("Bearer"), Some(plaintext), None) => plaintext,
			_ => return Ok(reject()),
		};

		if TokenCodec::validate_format(plaintext).is_err() {
			return Ok(reject());
		}

		let user_id = match self.tokens.get(TokenScope::Authentication, plaintext).await {
			Ok(user_id) => user_id,
			Err(Error::NotFound) => return Ok(reject()),
			Err(e) => return Err(e),
		};
		let user =
			store::bounded("user lookup", self.timeout, self.users.get_by_id(&user_id)).await?;

		Ok(match user {
			Some(user) => Decision::Continue(Identity::from(user)),
			None => reject(),
		})
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("tokens", &self.tokens)
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

fn reject<T>() -> Decision<T> {
	Decision::Reject(Rejection::InvalidAuthenticationToken)
}
