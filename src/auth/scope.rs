//! Token scopes separating authentication tokens from activation tokens.

// self
use crate::_prelude::*;

/// Purpose a token was issued for; a token only ever resolves under its own scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
	/// Bearer credential presented on API requests.
	Authentication,
	/// One-shot credential proving control of the registered email address.
	Activation,
}
impl TokenScope {
	/// Returns a stable label suitable for storage keys, spans, and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenScope::Authentication => "authentication",
			TokenScope::Activation => "activation",
		}
	}
}
impl Display for TokenScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for TokenScope {
	type Err = UnknownScopeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"authentication" => Ok(Self::Authentication),
			"activation" => Ok(Self::Activation),
			other => Err(UnknownScopeError { scope: other.to_owned() }),
		}
	}
}

/// Error returned when parsing an unknown scope label.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown token scope: {scope}.")]
pub struct UnknownScopeError {
	/// The label that failed to parse.
	pub scope: String,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_parse_back() {
		for scope in [TokenScope::Authentication, TokenScope::Activation] {
			assert_eq!(scope.as_str().parse::<TokenScope>(), Ok(scope));
		}

		assert!("Authentication".parse::<TokenScope>().is_err());
	}

	#[test]
	fn serde_uses_labels() {
		assert_eq!(
			serde_json::to_string(&TokenScope::Activation)
				.expect("Token scope should serialize to JSON."),
			"\"activation\""
		);
	}
}
