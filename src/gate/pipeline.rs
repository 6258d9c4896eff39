//! The full per-request chain: rate limit, then authentication, then a route's stages.

// self
use crate::{
	_prelude::*,
	auth::Identity,
	config::GatekeeperConfig,
	error::ConfigError,
	gate::{Authenticator, Decision, RequestContext, Stage},
	limit::RateLimitGate,
	store::UserRepository,
	tokens::TokenStore,
};

/// Transport-level facts about an incoming request.
#[derive(Clone, Copy, Debug)]
pub struct IncomingRequest<'a> {
	/// Peer address as `ip:port`.
	pub remote_addr: &'a str,
	/// Raw `Authorization` header, if sent.
	pub authorization: Option<&'a str>,
}
impl<'a> IncomingRequest<'a> {
	/// Describes a request from `remote_addr` without credentials.
	pub fn new(remote_addr: &'a str) -> Self {
		Self { remote_addr, authorization: None }
	}

	/// Attaches the raw `Authorization` header.
	pub fn with_authorization(mut self, authorization: &'a str) -> Self {
		self.authorization = Some(authorization);

		self
	}
}

/// Result of running a request through the [`Pipeline`].
///
/// Headers travel beside the result, so a failed evaluation still tells the web layer what the
/// error response must carry.
#[derive(Debug)]
pub struct PipelineOutcome<T> {
	/// Verdict of the first gate that stopped the request or the handler's output; `Err` when
	/// the request could not be evaluated.
	pub result: Result<Decision<T>>,
	/// Headers the response must carry whatever the result.
	pub headers: Vec<(&'static str, &'static str)>,
}
impl<T> PipelineOutcome<T> {
	/// The decision, when evaluation succeeded.
	pub fn decision(&self) -> Option<&Decision<T>> {
		self.result.as_ref().ok()
	}

	/// Drops the headers and keeps the result.
	pub fn into_result(self) -> Result<Decision<T>> {
		self.result
	}
}

/// Runs [`RateLimitGate`] and [`Authenticator`] in order, then hands the request to a route's
/// [`Stage`] chain. The first rejection wins; later gates and the handler never run.
#[derive(Clone, Debug)]
pub struct Pipeline {
	rate_limit: RateLimitGate,
	authenticator: Authenticator,
}
impl Pipeline {
	/// Assembles the pipeline.
	pub fn new(rate_limit: RateLimitGate, authenticator: Authenticator) -> Self {
		Self { rate_limit, authenticator }
	}

	/// Wires the pipeline from configuration and the token/user collaborators.
	pub fn from_config(
		config: &GatekeeperConfig,
		tokens: TokenStore,
		users: Arc<dyn UserRepository>,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(
			RateLimitGate::from_config(&config.limiter)?,
			Authenticator::new(tokens, users, config.store_timeout()),
		))
	}

	/// The rate gate, for starting its reaper.
	pub fn rate_limit(&self) -> &RateLimitGate {
		&self.rate_limit
	}

	/// Evaluates `request` and, if every gate admits it, `route`.
	///
	/// `Vary: Authorization` is in the headers of every outcome, errors included.
	pub async fn run<S>(&self, request: IncomingRequest<'_>, route: &S) -> PipelineOutcome<S::Output>
	where
		S: Stage<RequestContext>,
	{
		let mut headers = vec![Authenticator::VARY];
		let result = self.evaluate(request, route, &mut headers).await;

		PipelineOutcome { result, headers }
	}

	async fn evaluate<S>(
		&self,
		request: IncomingRequest<'_>,
		route: &S,
		headers: &mut Vec<(&'static str, &'static str)>,
	) -> Result<Decision<S::Output>>
	where
		S: Stage<RequestContext>,
	{
		if let Decision::Reject(rejection) = self.rate_limit.check(request.remote_addr)? {
			return Ok(Decision::Reject(rejection));
		}

		let authenticated = self.authenticator.authenticate(request.authorization).await?;
		let identity: Identity = match authenticated {
			Decision::Continue(identity) => identity,
			Decision::Reject(rejection) => {
				if rejection.challenges_bearer() {
					headers.push(("WWW-Authenticate", "Bearer"));
				}

				return Ok(Decision::Reject(rejection));
			},
		};

		route.call(RequestContext::new(identity, request.remote_addr)).await
	}
}
