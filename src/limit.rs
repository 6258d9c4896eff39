//! Per-process, per-client request throttling.
//!
//! State lives in this process only; with several instances behind a balancer each keeps its own
//! buckets, so configured limits are per-instance lower bounds on aggregate throughput.

pub mod bucket;
pub mod registry;

pub use bucket::*;
pub use registry::*;

// std
use std::net::{IpAddr, SocketAddr};
// self
use crate::{
	_prelude::*,
	config::LimiterConfig,
	error::ConfigError,
	gate::{self, Decision, Rejection},
	obs::{GateKind, GateSpan},
};

/// Request-facing throttle consulting a [`ClientLimiterRegistry`] keyed by client IP.
#[derive(Clone, Debug)]
pub struct RateLimitGate {
	enabled: bool,
	registry: Arc<ClientLimiterRegistry>,
	sweep_interval: StdDuration,
}
impl RateLimitGate {
	/// Builds the gate and its registry from validated settings.
	pub fn from_config(config: &LimiterConfig) -> Result<Self, ConfigError> {
		Ok(Self {
			enabled: config.enabled,
			registry: Arc::new(ClientLimiterRegistry::from_config(config)?),
			sweep_interval: config.sweep_interval(),
		})
	}

	/// Whether the gate throttles at all.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Shared registry behind the gate.
	pub fn registry(&self) -> &Arc<ClientLimiterRegistry> {
		&self.registry
	}

	/// Starts the idle-entry reaper at the configured interval.
	///
	/// The owner keeps the returned handle for as long as the gate serves requests.
	pub fn start_reaper(&self) -> Result<Reaper, ConfigError> {
		self.registry.spawn_reaper(self.sweep_interval)
	}

	/// Evaluates a request arriving from `remote_addr` (`ip:port`, as reported by the transport).
	///
	/// A disabled gate continues without looking at the address. An unparseable address is
	/// [`Error::ClientAddress`], never a silent allow or deny.
	pub fn check(&self, remote_addr: &str) -> Result<Decision> {
		let span = GateSpan::new(GateKind::RateLimit, "check");
		let result = span.in_scope(|| {
			if !self.enabled {
				return Ok(Decision::Continue(()));
			}

			remote_addr
				.parse::<SocketAddr>()
				.map_err(|_| Error::ClientAddress { addr: remote_addr.to_owned() })
				.map(|addr| self.decide(addr.ip()))
		});

		span.record(gate::observe(GateKind::RateLimit, &result));

		result
	}

	/// Evaluates a request from an already resolved client IP.
	pub fn check_ip(&self, ip: IpAddr) -> Decision {
		if !self.enabled {
			return Decision::Continue(());
		}

		let decision = self.decide(ip);

		gate::observe(GateKind::RateLimit, &Ok(decision.clone()));

		decision
	}

	fn decide(&self, ip: IpAddr) -> Decision {
		if self.registry.allow(&ip.to_string()) {
			Decision::Continue(())
		} else {
			Decision::Reject(Rejection::RateLimited)
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn gate(enabled: bool) -> RateLimitGate {
		RateLimitGate::from_config(&LimiterConfig { enabled, ..LimiterConfig::default() })
			.expect("Limiter configuration should be valid.")
	}

	#[tokio::test(start_paused = true)]
	async fn throttles_by_ip_not_port() {
		let gate = gate(true);
		let decisions = (0..5)
			.map(|port| gate.check(&format!("203.0.113.5:{}", 40_000 + port)))
			.collect::<Result<Vec<_>>>()
			.expect("Addresses should parse.");

		assert_eq!(
			decisions,
			[
				Decision::Continue(()),
				Decision::Continue(()),
				Decision::Continue(()),
				Decision::Continue(()),
				Decision::Reject(Rejection::RateLimited),
			]
		);
		assert_eq!(gate.registry().len(), 1);
		assert!(gate.registry().contains("203.0.113.5"));
	}

	#[tokio::test(start_paused = true)]
	async fn ipv6_addresses_are_supported() {
		let gate = gate(true);

		assert!(gate.check("[2001:db8::1]:443").expect("Address should parse.").is_continue());
		assert!(gate.registry().contains("2001:db8::1"));
	}

	#[test]
	fn malformed_addresses_are_server_errors() {
		let gate = gate(true);

		for addr in ["", "203.0.113.5", "not-an-address:80", "203.0.113.5:port"] {
			let err = gate.check(addr).expect_err("Malformed address should fail.");

			assert!(matches!(err, Error::ClientAddress { .. }), "unexpected error for {addr:?}");
			assert!(err.is_server_error());
		}

		assert!(gate.registry().is_empty());
	}

	#[test]
	fn disabled_gate_passes_everything_through() {
		let gate = gate(false);

		for _ in 0..10 {
			assert!(gate.check("garbage").expect("Disabled gate should not parse.").is_continue());
			assert!(gate.check_ip(IpAddr::from([203, 0, 113, 5])).is_continue());
		}

		assert!(gate.registry().is_empty());
	}
}
