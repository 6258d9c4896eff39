//! Persisted token records, freshly issued tokens, and lifecycle helpers.

// self
use crate::{
	_prelude::*,
	auth::{Secret, TokenHash, TokenScope, UserId},
};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is currently valid.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Stored form of a token. Carries the hash, never the plaintext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// SHA-256 of the plaintext handed to the client.
	pub hash: TokenHash,
	/// User the token resolves to.
	pub user_id: UserId,
	/// Purpose the token was issued for.
	pub scope: TokenScope,
	/// Instant after which the token no longer resolves.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at { TokenStatus::Expired } else { TokenStatus::Active }
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}

/// A token as it exists at issuance: the plaintext plus the record that gets persisted.
///
/// The plaintext is handed to the caller exactly once (API response or activation email) and
/// is dropped with this value.
#[derive(Clone, Debug)]
pub struct Token {
	/// Plaintext credential; callers must avoid logging it.
	pub plaintext: Secret,
	/// Record persisted by the token store.
	pub record: TokenRecord,
}
impl Token {
	/// User the token was issued to.
	pub fn user_id(&self) -> &UserId {
		&self.record.user_id
	}

	/// Scope the token was issued for.
	pub fn scope(&self) -> TokenScope {
		self.record.scope
	}

	/// Expiry instant of the token.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.record.expires_at
	}

	/// Consumes the token into the payload returned to the client.
	pub fn into_issued(self) -> IssuedToken {
		IssuedToken { token: self.plaintext.expose().to_owned(), expiry: self.record.expires_at }
	}
}

/// Client-facing body for a freshly issued token.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
	/// Plaintext credential.
	pub token: String,
	/// Expiry instant.
	#[serde(with = "time::serde::rfc3339")]
	pub expiry: OffsetDateTime,
}
impl Debug for IssuedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedToken")
			.field("token", &"<redacted>")
			.field("expiry", &self.expiry)
			.finish()
	}
}
