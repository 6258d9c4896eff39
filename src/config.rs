//! Serde-backed configuration for the limiter, token lifetimes, password work factor, and
//! collaborator timeouts.

// crates.io
use argon2::Params;
// self
use crate::{_prelude::*, error::ConfigError, limit::TokenBucket};

/// Argon2 memory cost floor in KiB.
pub const MIN_MEMORY_KIB: u32 = 19_456;
/// Argon2 iteration floor.
pub const MIN_ITERATIONS: u32 = 2;
/// Argon2 lane floor.
pub const MIN_PARALLELISM: u32 = 1;

/// Top-level configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
	/// Per-client rate limiter.
	pub limiter: LimiterConfig,
	/// Token lifetimes.
	pub tokens: TokenConfig,
	/// Password hashing work factor.
	pub password: PasswordConfig,
	/// Upper bound for every store call and password hash, in milliseconds.
	pub store_timeout_ms: u64,
}
impl GatekeeperConfig {
	/// Parses a JSON document and validates every section.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(raw)?;

		config.validate()?;

		Ok(config)
	}

	/// Validates every section.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.limiter.validate()?;
		self.password.params()?;

		Ok(())
	}

	/// [`GatekeeperConfig::store_timeout_ms`] as a duration.
	pub fn store_timeout(&self) -> StdDuration {
		StdDuration::from_millis(self.store_timeout_ms)
	}
}
impl Default for GatekeeperConfig {
	fn default() -> Self {
		Self {
			limiter: LimiterConfig::default(),
			tokens: TokenConfig::default(),
			password: PasswordConfig::default(),
			store_timeout_ms: 5_000,
		}
	}
}

/// Token-bucket limiter settings shared by every client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
	/// When `false` the rate gate lets every request through.
	pub enabled: bool,
	/// Refill rate in permits per second.
	pub rps: f64,
	/// Bucket capacity.
	pub burst: u32,
	/// Seconds between reaper sweeps.
	pub sweep_interval_secs: u64,
	/// Seconds a client may stay idle before its entry is evicted.
	pub idle_ttl_secs: u64,
}
impl LimiterConfig {
	/// Rejects settings under which no request could ever be admitted.
	pub fn validate(&self) -> Result<(), ConfigError> {
		TokenBucket::check(self.burst, self.rps)?;

		if self.sweep_interval_secs == 0 {
			return Err(ConfigError::InvalidLimiter {
				reason: "sweep interval must be at least one second",
			});
		}

		Ok(())
	}

	/// Interval between reaper sweeps.
	pub fn sweep_interval(&self) -> StdDuration {
		StdDuration::from_secs(self.sweep_interval_secs)
	}

	/// Idle threshold after which an entry is evicted.
	pub fn idle_ttl(&self) -> StdDuration {
		StdDuration::from_secs(self.idle_ttl_secs)
	}
}
impl Default for LimiterConfig {
	fn default() -> Self {
		Self { enabled: true, rps: 2., burst: 4, sweep_interval_secs: 60, idle_ttl_secs: 180 }
	}
}

/// Lifetimes of issued tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
	/// Lifetime of authentication tokens in seconds.
	pub authentication_ttl_secs: i64,
	/// Lifetime of activation tokens in seconds.
	pub activation_ttl_secs: i64,
}
impl TokenConfig {
	/// Lifetime of authentication tokens.
	pub fn authentication_ttl(&self) -> Duration {
		Duration::seconds(self.authentication_ttl_secs)
	}

	/// Lifetime of activation tokens.
	pub fn activation_ttl(&self) -> Duration {
		Duration::seconds(self.activation_ttl_secs)
	}
}
impl Default for TokenConfig {
	fn default() -> Self {
		Self { authentication_ttl_secs: 24 * 60 * 60, activation_ttl_secs: 60 * 60 }
	}
}

/// Argon2id work factor. Defaults sit at the enforced floor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
	/// Memory cost in KiB.
	pub memory_kib: u32,
	/// Number of passes.
	pub iterations: u32,
	/// Degree of parallelism.
	pub parallelism: u32,
}
impl PasswordConfig {
	/// Builds Argon2 parameters, refusing anything below the floor.
	pub fn params(&self) -> Result<Params, ConfigError> {
		if self.memory_kib < MIN_MEMORY_KIB {
			return Err(ConfigError::WeakPasswordParams { reason: "memory cost below 19456 KiB" });
		}
		if self.iterations < MIN_ITERATIONS {
			return Err(ConfigError::WeakPasswordParams { reason: "fewer than 2 iterations" });
		}
		if self.parallelism < MIN_PARALLELISM {
			return Err(ConfigError::WeakPasswordParams { reason: "parallelism below 1" });
		}

		Params::new(self.memory_kib, self.iterations, self.parallelism, None)
			.map_err(ConfigError::PasswordParams)
	}
}
impl Default for PasswordConfig {
	fn default() -> Self {
		Self { memory_kib: MIN_MEMORY_KIB, iterations: MIN_ITERATIONS, parallelism: MIN_PARALLELISM }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = GatekeeperConfig::default();

		assert!(config.limiter.enabled);
		assert_eq!(config.limiter.rps, 2.);
		assert_eq!(config.limiter.burst, 4);
		assert_eq!(config.limiter.sweep_interval(), StdDuration::from_secs(60));
		assert_eq!(config.limiter.idle_ttl(), StdDuration::from_secs(180));
		assert_eq!(config.tokens.authentication_ttl(), Duration::hours(24));
		assert_eq!(config.tokens.activation_ttl(), Duration::hours(1));
		assert_eq!(config.store_timeout(), StdDuration::from_secs(5));
		assert!(config.validate().is_ok());
	}

	#[test]
	fn partial_documents_fill_defaults() {
		let config = GatekeeperConfig::from_json(r#"{"limiter":{"enabled":false,"burst":10}}"#)
			.expect("Partial configuration should parse.");

		assert!(!config.limiter.enabled);
		assert_eq!(config.limiter.burst, 10);
		assert_eq!(config.limiter.rps, 2.);
		assert_eq!(config.password, PasswordConfig::default());
	}

	#[test]
	fn unusable_limiter_settings_are_rejected() {
		for raw in [
			r#"{"limiter":{"rps":0}}"#,
			r#"{"limiter":{"rps":-1.5}}"#,
			r#"{"limiter":{"burst":0}}"#,
		] {
			let err = GatekeeperConfig::from_json(raw).expect_err("Limiter settings should fail.");

			assert!(matches!(err, ConfigError::InvalidLimiter { .. }), "unexpected error for {raw}");
		}
	}

	#[test]
	fn weak_password_params_are_rejected() {
		let weak = PasswordConfig { memory_kib: 1024, ..PasswordConfig::default() };

		assert!(matches!(weak.params(), Err(ConfigError::WeakPasswordParams { .. })));

		let weak = PasswordConfig { iterations: 1, ..PasswordConfig::default() };

		assert!(matches!(weak.params(), Err(ConfigError::WeakPasswordParams { .. })));
		assert!(matches!(
			GatekeeperConfig::from_json("{not json"),
			Err(ConfigError::Parse(_))
		));
	}
}
