//! One-way salted password hashing backed by Argon2id.

// crates.io
use argon2::{
	Algorithm, Argon2, Params, Version,
	password_hash::{
		self, PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
	},
};
use rand::RngCore;
// self
use crate::{_prelude::*, config::PasswordConfig, error::ConfigError};

const SALT_BYTES: usize = 16;

/// PHC-formatted Argon2id hash of a user password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasswordHash(String);
impl PasswordHash {
	/// Wraps a stored PHC string after checking that it parses.
	pub fn from_phc(value: impl Into<String>) -> Result<Self> {
		let value = value.into();

		PhcString::new(&value)?;

		Ok(Self(value))
	}

	/// Returns the PHC string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for PasswordHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PasswordHash").field(&"<phc>").finish()
	}
}
impl From<PasswordHash> for String {
	fn from(value: PasswordHash) -> Self {
		value.0
	}
}
impl TryFrom<String> for PasswordHash {
	type Error = Error;

	fn try_from(value: String) -> Result<Self> {
		Self::from_phc(value)
	}
}

/// Hashes and verifies passwords with a work factor that never drops below the configured floor.
///
/// Both operations are CPU-bound; async callers should move them onto a blocking thread.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
	params: Params,
}
impl PasswordHasher {
	/// Builds a hasher from configuration, rejecting work factors below the enforced minimum.
	pub fn from_config(config: &PasswordConfig) -> Result<Self, ConfigError> {
		Ok(Self { params: config.params()? })
	}

	/// Hashes `plaintext` with a fresh random salt.
	pub fn set(&self, plaintext: &str) -> Result<PasswordHash> {
		let mut salt = [0_u8; SALT_BYTES];

		rand::rng().fill_bytes(&mut salt);

		let salt = SaltString::encode_b64(&salt)?;
		let phc = self.argon2().hash_password(plaintext.as_bytes(), &salt)?;

		Ok(PasswordHash(phc.to_string()))
	}

	/// Returns `true` if `candidate` hashes to `hash`.
	///
	/// The digest comparison is constant-time; a mismatch is `Ok(false)`, while a corrupt hash
	/// is an error.
	pub fn matches(&self, hash: &PasswordHash, candidate: &str) -> Result<bool> {
		let parsed = PhcString::new(hash.as_str())?;

		match self.argon2().verify_password(candidate.as_bytes(), &parsed) {
			Ok(()) => Ok(true),
			Err(password_hash::Error::Password) => Ok(false),
			Err(e) => Err(e.into()),
		}
	}

	fn argon2(&self) -> Argon2<'static> {
		Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
	}
}
