//! Continuous-refill token bucket.

// crates.io
use tokio::time::Instant;
// self
use crate::error::ConfigError;

/// Token bucket whose permits refill with elapsed time, capped at its capacity.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenBucket {
	capacity: f64,
	rate: f64,
	tokens: f64,
	last_refill: Instant,
}
impl TokenBucket {
	/// Creates a full bucket holding `capacity` permits that refills at `rate` permits per second.
	///
	/// `rate` must be finite and positive and `capacity` at least 1.
	pub fn new(capacity: u32, rate: f64, now: Instant) -> Result<Self, ConfigError> {
		Self::check(capacity, rate)?;

		Ok(Self::full(capacity, rate, now))
	}

	/// Rejects a shape under which the bucket could go negative or never deny.
	pub(crate) fn check(capacity: u32, rate: f64) -> Result<(), ConfigError> {
		if !(rate.is_finite() && rate > 0.) {
			return Err(ConfigError::InvalidLimiter { reason: "rps must be a positive number" });
		}
		if capacity == 0 {
			return Err(ConfigError::InvalidLimiter { reason: "burst must be at least 1" });
		}

		Ok(())
	}

	/// Builds a full bucket from a shape that already passed [`TokenBucket::check`].
	pub(crate) fn full(capacity: u32, rate: f64, now: Instant) -> Self {
		let capacity = f64::from(capacity);

		Self { capacity, rate, tokens: capacity, last_refill: now }
	}

	/// Refills for the time elapsed since the last call, then takes one permit if available.
	///
	/// Instants earlier than the last refill count as no elapsed time.
	pub fn try_take(&mut self, now: Instant) -> bool {
		self.refill(now);

		if self.tokens >= 1. {
			self.tokens -= 1.;

			true
		} else {
			false
		}
	}

	/// Permits currently available, as of the last refill.
	pub fn available(&self) -> f64 {
		self.tokens
	}

	/// Maximum permits the bucket holds.
	pub fn capacity(&self) -> f64 {
		self.capacity
	}

	fn refill(&mut self, now: Instant) {
		let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();

		self.tokens = elapsed.mul_add(self.rate, self.tokens).min(self.capacity);
		self.last_refill = self.last_refill.max(now);
	}
}
