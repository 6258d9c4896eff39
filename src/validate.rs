//! Field-keyed validation for credentials, user records, and token plaintexts.

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
// self
use crate::{_prelude::*, auth::TOKEN_PLAINTEXT_LEN};

/// Loose email shape check; deliverability is the mailer's problem.
///
/// Word characters are ASCII only.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?-u)^\w+([-+.']\w+)*@\w+([-.]\w+)*\.\w+([-.]\w+)*$")
		.expect("Email pattern is a valid regular expression.")
});

/// Minimum accepted password length in bytes.
pub const PASSWORD_MIN_LEN: usize = 8;
/// Maximum accepted password length in bytes.
pub const PASSWORD_MAX_LEN: usize = 72;
/// Maximum accepted user name length in bytes.
pub const NAME_MAX_LEN: usize = 500;

/// Collected validation failures keyed by field name.
///
/// Only the first message recorded for a field is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);
impl ValidationErrors {
	/// Creates an empty collector.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` if no failures were recorded.
	pub fn is_valid(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of failing fields.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if no failures were recorded.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Records `message` for `field` unless the field already failed.
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.0.entry(field.into()).or_insert_with(|| message.into());
	}

	/// Records `message` for `field` when `ok` is `false`.
	pub fn check(&mut self, ok: bool, field: &str, message: &str) {
		if !ok {
			self.add(field, message);
		}
	}

	/// Message recorded for `field`, if any.
	pub fn get(&self, field: &str) -> Option<&str> {
		self.0.get(field).map(String::as_str)
	}

	/// Iterator over `(field, message)` pairs in field order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Converts the collector into a `Result`, failing if anything was recorded.
	pub fn into_result(self) -> Result<(), Self> {
		if self.is_valid() { Ok(()) } else { Err(self) }
	}

	/// Builds a collector holding a single failure.
	pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
		let mut errors = Self::new();

		errors.add(field, message);

		errors
	}
}
impl Display for ValidationErrors {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, (field, message)) in self.iter().enumerate() {
			if idx > 0 {
				f.write_str("; ")?;
			}

			write!(f, "{field}: {message}")?;
		}

		Ok(())
	}
}
impl StdError for ValidationErrors {}

/// Checks that `email` is present and email-shaped.
pub fn validate_email(v: &mut ValidationErrors, email: &str) {
	v.check(!email.is_empty(), "email", "must be provided");
	v.check(EMAIL_RX.is_match(email), "email", "must be a valid email address");
}

/// Checks that a plaintext password is present and within the accepted byte length.
pub fn validate_password_plaintext(v: &mut ValidationErrors, password: &str) {
	v.check(!password.is_empty(), "password", "must be provided");
	v.check(password.len() >= PASSWORD_MIN_LEN, "password", "must be at least 8 bytes long");
	v.check(password.len() <= PASSWORD_MAX_LEN, "password", "must not be more than 72 bytes long");
}

/// Checks that a user name is present and not oversized.
pub fn validate_name(v: &mut ValidationErrors, name: &str) {
	v.check(!name.is_empty(), "name", "must be provided");
	v.check(name.len() <= NAME_MAX_LEN, "name", "must not be more than 500 bytes long");
}

/// Checks that a token plaintext is present and exactly as long as generated tokens are.
pub fn validate_token_plaintext(v: &mut ValidationErrors, token: &str) {
	v.check(!token.is_empty(), "token", "must be provided");
	v.check(token.len() == TOKEN_PLAINTEXT_LEN, "token", "must be 26 bytes long");
}
