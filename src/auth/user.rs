//! User records, registration drafts, and the per-request identity.

// self
use crate::{
	_prelude::*,
	auth::{PasswordHash, PasswordHasher, Secret, UserId},
	validate::{self, ValidationErrors},
};

/// Registered user as persisted by the user repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
	/// Stable identifier.
	pub id: UserId,
	/// Registration instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Unique display name.
	pub name: String,
	/// Unique email address, compared case-insensitively.
	pub email: String,
	/// Argon2id hash of the password.
	#[serde(skip_serializing)]
	pub password_hash: PasswordHash,
	/// Whether the account completed activation.
	pub activated: bool,
	/// Optimistic-concurrency marker; starts at 1 and increments on every update.
	#[serde(skip_serializing)]
	pub version: u32,
}

/// Password of a user being registered or changed.
///
/// Keeps the plaintext around only so length rules can be checked after hashing.
#[derive(Clone, Debug, Default)]
pub struct Password {
	plaintext: Option<Secret>,
	hash: Option<PasswordHash>,
}
impl Password {
	/// Builds a password from a plaintext and its already computed hash.
	pub fn hashed(plaintext: impl Into<String>, hash: PasswordHash) -> Self {
		Self { plaintext: Some(Secret::new(plaintext)), hash: Some(hash) }
	}

	/// Hashes `plaintext` and stores both.
	pub fn set(&mut self, hasher: &PasswordHasher, plaintext: &str) -> Result<()> {
		self.hash = Some(hasher.set(plaintext)?);
		self.plaintext = Some(Secret::new(plaintext));

		Ok(())
	}

	/// Plaintext, if this password was set in the current process.
	pub fn plaintext(&self) -> Option<&Secret> {
		self.plaintext.as_ref()
	}

	/// Hash, if one was computed.
	pub fn hash(&self) -> Option<&PasswordHash> {
		self.hash.as_ref()
	}
}

/// Draft of a user that has not been persisted yet.
#[derive(Clone, Debug)]
pub struct NewUser {
	/// Requested display name.
	pub name: String,
	/// Requested email address.
	pub email: String,
	/// Password material.
	pub password: Password,
}
impl NewUser {
	/// Creates a draft with an unset password.
	pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
		Self { name: name.into(), email: email.into(), password: Password::default() }
	}

	/// Attaches password material.
	pub fn with_password(mut self, password: Password) -> Self {
		self.password = password;

		self
	}

	/// Validates name, email, and password rules.
	///
	/// # Panics
	///
	/// A draft without a password hash means the caller skipped hashing, which is a wiring bug
	/// rather than bad input.
	pub fn validate(&self) -> Result<(), ValidationErrors> {
		let mut v = ValidationErrors::new();

		validate::validate_name(&mut v, &self.name);
		validate::validate_email(&mut v, &self.email);

		if let Some(plaintext) = self.password.plaintext() {
			validate::validate_password_plaintext(&mut v, plaintext.expose());
		}
		if self.password.hash().is_none() {
			panic!("missing password hash for user");
		}

		v.into_result()
	}

	/// Materializes the persisted record with `version` 1.
	///
	/// # Panics
	///
	/// Panics if no password hash was set, for the same reason as [`NewUser::validate`].
	pub fn into_user(self, id: UserId, created_at: OffsetDateTime) -> User {
		let Some(password_hash) = self.password.hash else {
			panic!("missing password hash for user");
		};

		User {
			id,
			created_at,
			name: self.name,
			email: self.email,
			password_hash,
			activated: false,
			version: 1,
		}
	}
}

/// Who is making a request, as established by the authentication gate.
///
/// `Anonymous` is its own variant rather than a placeholder user, so it can never compare equal
/// to a real account and is never activated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
	/// No credential was presented.
	Anonymous,
	/// A live authentication token resolved to this user.
	User(Arc<User>),
}
impl Identity {
	/// Returns `true` for [`Identity::Anonymous`].
	pub fn is_anonymous(&self) -> bool {
		matches!(self, Self::Anonymous)
	}

	/// Returns `true` only for an authenticated, activated user.
	pub fn is_activated(&self) -> bool {
		self.user().is_some_and(|user| user.activated)
	}

	/// The authenticated user, if any.
	pub fn user(&self) -> Option<&Arc<User>> {
		match self {
			Self::Anonymous => None,
			Self::User(user) => Some(user),
		}
	}
}
impl From<User> for Identity {
	fn from(user: User) -> Self {
		Self::User(Arc::new(user))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn hash() -> PasswordHash {
		PasswordHash::from_phc(
			"$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$2nqdrG9mJkNpp+NLyQ2+KRYzMIqJp+F/YUDuMxdJhsg",
		)
		.expect("PHC fixture should parse.")
	}

	fn draft(name: &str, email: &str, password: &str) -> NewUser {
		NewUser::new(name, email).with_password(Password::hashed(password, hash()))
	}

	#[test]
	fn valid_draft_passes() {
		assert!(draft("ada", "ada@x.com", "correct-horse").validate().is_ok());
	}

	#[test]
	fn invalid_fields_are_collected() {
		let errors = draft("", "not-an-email", "short")
			.validate()
			.expect_err("Invalid draft should fail validation.");

		assert_eq!(errors.get("name"), Some("must be provided"));
		assert_eq!(errors.get("email"), Some("must be a valid email address"));
		assert_eq!(errors.get("password"), Some("must be at least 8 bytes long"));
	}

	#[test]
	#[should_panic(expected = "missing password hash for user")]
	fn missing_hash_is_fatal() {
		let _ = NewUser::new("ada", "ada@x.com").validate();
	}

	#[test]
	fn into_user_starts_at_version_one() {
		let id = UserId::new("user-1").expect("User fixture should be valid.");
		let user = draft("ada", "ada@x.com", "correct-horse")
			.into_user(id.clone(), OffsetDateTime::UNIX_EPOCH);

		assert_eq!(user.id, id);
		assert_eq!(user.version, 1);
		assert!(!user.activated);
	}

	#[test]
	fn serialized_user_omits_secrets() {
		let user = draft("ada", "ada@x.com", "correct-horse").into_user(
			UserId::new("user-1").expect("User fixture should be valid."),
			OffsetDateTime::UNIX_EPOCH,
		);
		let json = serde_json::to_string(&user).expect("User should serialize to JSON.");

		assert!(!json.contains("argon2"));
		assert!(!json.contains("version"));
		assert!(json.contains("\"activated\":false"));
	}

	#[test]
	fn anonymous_is_never_activated() {
		let user = draft("ada", "ada@x.com", "correct-horse").into_user(
			UserId::new("user-1").expect("User fixture should be valid."),
			OffsetDateTime::UNIX_EPOCH,
		);
		let activated = User { activated: true, ..user };

		assert!(Identity::Anonymous.is_anonymous());
		assert!(!Identity::Anonymous.is_activated());
		assert!(Identity::from(activated.clone()).is_activated());
		assert_ne!(Identity::Anonymous, Identity::from(activated));
	}
}
