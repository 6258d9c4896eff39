//! Per-client bucket registry and its idle-entry reaper.

// std
use std::sync::Weak;
// crates.io
use tokio::{
	sync::oneshot,
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{_prelude::*, config::LimiterConfig, error::ConfigError, limit::TokenBucket};

#[derive(Debug)]
struct ClientEntry {
	bucket: TokenBucket,
	last_seen: Instant,
}

/// Concurrency-safe map from client identity to its token bucket.
///
/// One lock guards the map and every bucket. It is held only for the refill-and-take
/// arithmetic or a sweep, never across I/O.
#[derive(Debug)]
pub struct ClientLimiterRegistry {
	clients: Mutex<HashMap<String, ClientEntry>>,
	capacity: u32,
	rate: f64,
	idle_ttl: StdDuration,
}
impl ClientLimiterRegistry {
	/// Creates an empty registry handing out buckets of `capacity` permits refilled at `rate`
	/// per second; entries idle longer than `idle_ttl` are swept.
	///
	/// Fails on the same bucket shapes [`TokenBucket::new`] refuses.
	pub fn new(capacity: u32, rate: f64, idle_ttl: StdDuration) -> Result<Self, ConfigError> {
		TokenBucket::check(capacity, rate)?;

		Ok(Self { clients: Mutex::new(HashMap::new()), capacity, rate, idle_ttl })
	}

	/// Builds a registry from validated limiter settings.
	pub fn from_config(config: &LimiterConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		Self::new(config.burst, config.rps, config.idle_ttl())
	}

	/// Takes one permit for `identity`, creating a full bucket on first sight.
	pub fn allow(&self, identity: &str) -> bool {
		self.allow_at(identity, Instant::now())
	}

	/// Same as [`ClientLimiterRegistry::allow`], observed at `now`.
	///
	/// The identity's last-seen time is refreshed whether or not a permit was available.
	pub fn allow_at(&self, identity: &str, now: Instant) -> bool {
		let mut clients = self.clients.lock();
		let entry = clients.entry(identity.to_owned()).or_insert_with(|| {
			#[cfg(feature = "tracing")]
			tracing::debug!(client = identity, "tracking new client");

			ClientEntry { bucket: TokenBucket::full(self.capacity, self.rate, now), last_seen: now }
		});

		entry.last_seen = entry.last_seen.max(now);

		entry.bucket.try_take(now)
	}

	/// Evicts every entry idle for longer than the configured threshold; returns how many.
	pub fn sweep(&self) -> usize {
		self.sweep_at(Instant::now())
	}

	/// Same as [`ClientLimiterRegistry::sweep`], judged at `now`.
	pub fn sweep_at(&self, now: Instant) -> usize {
		let mut clients = self.clients.lock();
		let before = clients.len();

		clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= self.idle_ttl);

		let evicted = before - clients.len();

		#[cfg(feature = "tracing")]
		if evicted > 0 {
			tracing::debug!(evicted, remaining = clients.len(), "swept idle clients");
		}

		evicted
	}

	/// Number of tracked clients.
	pub fn len(&self) -> usize {
		self.clients.lock().len()
	}

	/// Returns `true` when no client is tracked.
	pub fn is_empty(&self) -> bool {
		self.clients.lock().is_empty()
	}

	/// Returns `true` if `identity` currently has an entry.
	pub fn contains(&self, identity: &str) -> bool {
		self.clients.lock().contains_key(identity)
	}

	/// Starts a background task sweeping the registry every `interval`.
	///
	/// The task holds only a weak reference and exits on its own once the registry is dropped.
	/// A zero `interval` is refused. Must be called from within a Tokio runtime.
	pub fn spawn_reaper(self: &Arc<Self>, interval: StdDuration) -> Result<Reaper, ConfigError> {
		if interval.is_zero() {
			return Err(ConfigError::InvalidLimiter { reason: "sweep interval must be positive" });
		}

		let registry = Arc::downgrade(self);
		let (stop_tx, stop_rx) = oneshot::channel();
		let handle = tokio::spawn(reap(registry, interval, stop_rx));

		Ok(Reaper { stop: Some(stop_tx), handle: Some(handle) })
	}
}

async fn reap(
	registry: Weak<ClientLimiterRegistry>,
	interval: StdDuration,
	mut stop: oneshot::Receiver<()>,
) {
	let mut ticker = time::interval_at(Instant::now() + interval, interval);

	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			_ = ticker.tick() => {
				let Some(registry) = registry.upgrade() else { break };

				registry.sweep();
			},
			_ = &mut stop => break,
		}
	}

	#[cfg(feature = "tracing")]
	tracing::debug!("client reaper stopped");
}

/// Handle to a running reaper task; dropping it stops the task.
#[derive(Debug)]
pub struct Reaper {
	stop: Option<oneshot::Sender<()>>,
	handle: Option<JoinHandle<()>>,
}
impl Reaper {
	/// Signals the task to stop and waits for it to exit.
	pub async fn shutdown(mut self) -> Result<()> {
		self.signal();

		if let Some(handle) = self.handle.take() {
			handle.await?;
		}

		Ok(())
	}

	/// Returns `true` once the task has exited.
	pub fn is_finished(&self) -> bool {
		self.handle.as_ref().is_none_or(JoinHandle::is_finished)
	}

	fn signal(&mut self) {
		if let Some(stop) = self.stop.take() {
			let _ = stop.send(());
		}
	}
}
impl Drop for Reaper {
	fn drop(&mut self) {
		self.signal();
	}
}
