//! Lookup hash derived from a token plaintext.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// SHA-256 digest of a token plaintext; the only form of a token that is ever persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenHash([u8; 32]);
impl TokenHash {
	/// Hashes a plaintext. Every code path that needs a token hash goes through here.
	pub fn of(plaintext: &str) -> Self {
		let mut hasher = Sha256::new();

		hasher.update(plaintext.as_bytes());

		Self(hasher.finalize().into())
	}

	/// Raw digest bytes.
	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	/// Base64 (no padding) rendering of the digest, safe to log.
	pub fn fingerprint(&self) -> String {
		STANDARD_NO_PAD.encode(self.0)
	}
}
impl Debug for TokenHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenHash").field(&self.fingerprint()).finish()
	}
}
