//! Opaque token generation and cheap plaintext format checks.

// crates.io
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
// self
use crate::{
	_prelude::*,
	auth::{Secret, Token, TokenHash, TokenRecord, TokenScope, UserId},
	validate::{self, ValidationErrors},
};

/// Random bytes behind every token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;
/// Length of an unpadded base32 rendering of [`TOKEN_ENTROPY_BYTES`].
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

/// Mints tokens and checks plaintext shape before anything touches the store.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenCodec;
impl TokenCodec {
	/// Generates a token for `user_id` that expires `ttl` from now.
	pub fn generate(user_id: &UserId, ttl: Duration, scope: TokenScope) -> Token {
		Self::generate_at(user_id, ttl, scope, OffsetDateTime::now_utc())
	}

	/// Generates a token whose expiry is computed from the provided instant.
	pub fn generate_at(
		user_id: &UserId,
		ttl: Duration,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> Token {
		let mut bytes = [0_u8; TOKEN_ENTROPY_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		// Uppercase A-Z and 2-7 only, so the token survives case-folding transports.
		let plaintext = BASE32_NOPAD.encode(&bytes);
		let hash = TokenHash::of(&plaintext);

		Token {
			plaintext: Secret::new(plaintext),
			record: TokenRecord { hash, user_id: user_id.clone(), scope, expires_at: now + ttl },
		}
	}

	/// Rejects empty or wrongly sized plaintexts.
	pub fn validate_format(plaintext: &str) -> Result<(), ValidationErrors> {
		let mut v = ValidationErrors::new();

		validate::validate_token_plaintext(&mut v, plaintext);

		v.into_result()
	}
}
