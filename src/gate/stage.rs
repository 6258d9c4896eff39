//! Composable authorization stages guarding a handler.
//!
//! Stages nest: [`require_permission`] wraps the handler in a permission check, which sits behind
//! an activation check, which sits behind the authentication check. Each layer runs its own
//! predicate and only then delegates inward, so the first failing predicate ends the request.
//! The authentication layer turns a [`RequestContext`] into a [`UserContext`], which makes an
//! anonymous request unrepresentable past that point.

// self
use crate::{
	_prelude::*,
	auth::{PermissionCode, PermissionSet},
	gate::{self, Decision, Rejection, RequestContext, UserContext},
	obs::{GateKind, GateSpan},
	store::{self, PermissionRepository},
};

/// Boxed future returned by [`Stage::call`].
pub type StageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<Decision<T>>> + 'a + Send>>;

/// One link in a gate chain, consuming a context of type `C`.
pub trait Stage<C>
where
	Self: Send + Sync,
{
	/// Value produced when every layer lets the request through.
	type Output;

	/// Evaluates this stage and, on success, everything it wraps.
	fn call(&self, ctx: C) -> StageFuture<'_, Self::Output>;
}

/// Adapts an async closure into the innermost [`Stage`].
#[derive(Clone, Debug)]
pub struct Handler<F>(F);
impl<C, F, Fut, R> Stage<C> for Handler<F>
where
	F: Send + Sync + Fn(C) -> Fut,
	Fut: 'static + Send + Future<Output = Result<R>>,
	R: Send,
{
	type Output = R;

	fn call(&self, ctx: C) -> StageFuture<'_, R> {
		let fut = (self.0)(ctx);

		Box::pin(async move { fut.await.map(Decision::Continue) })
	}
}

/// Rejects anonymous requests; the wrapped stage receives a [`UserContext`].
#[derive(Clone, Debug)]
pub struct RequireAuthenticated<S>(S);
impl<S> Stage<RequestContext> for RequireAuthenticated<S>
where
	S: Stage<UserContext>,
{
	type Output = S::Output;

	fn call(&self, ctx: RequestContext) -> StageFuture<'_, S::Output> {
		Box::pin(async move {
			match ctx.into_user() {
				Some(ctx) => {
					pass(GateKind::RequireAuthenticated);

					self.0.call(ctx).await
				},
				None => Ok(refuse(GateKind::RequireAuthenticated, Rejection::AuthenticationRequired)),
			}
		})
	}
}

/// Rejects users that have not completed activation.
#[derive(Clone, Debug)]
pub struct RequireActivated<S>(S);
impl<S> Stage<UserContext> for RequireActivated<S>
where
	S: Stage<UserContext>,
{
	type Output = S::Output;

	fn call(&self, ctx: UserContext) -> StageFuture<'_, S::Output> {
		Box::pin(async move {
			if !ctx.user.activated {
				return Ok(refuse(GateKind::RequireActivated, Rejection::InactiveAccount));
			}

			pass(GateKind::RequireActivated);

			self.0.call(ctx).await
		})
	}
}

/// Loads permission sets for [`RequirePermission`], bounded by a timeout.
#[derive(Clone)]
pub struct PermissionLookup {
	repository: Arc<dyn PermissionRepository>,
	timeout: StdDuration,
}
impl PermissionLookup {
	/// Wraps a repository; `timeout` bounds each lookup.
	pub fn new(repository: Arc<dyn PermissionRepository>, timeout: StdDuration) -> Self {
		Self { repository, timeout }
	}

	/// Fetches the permission set for the user in `ctx`.
	pub async fn permissions_for(&self, ctx: &UserContext) -> Result<PermissionSet> {
		let call = self.repository.permissions_for(&ctx.user.id);

		store::bounded("permission lookup", self.timeout, call).await
	}
}
impl Debug for PermissionLookup {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PermissionLookup").field("timeout", &self.timeout).finish_non_exhaustive()
	}
}

/// Rejects users whose permission set lacks `code`.
#[derive(Clone, Debug)]
pub struct RequirePermission<S> {
	lookup: PermissionLookup,
	code: PermissionCode,
	inner: S,
}
impl<S> Stage<UserContext> for RequirePermission<S>
where
	S: Stage<UserContext>,
{
	type Output = S::Output;

	fn call(&self, ctx: UserContext) -> StageFuture<'_, S::Output> {
		Box::pin(async move {
			let span = GateSpan::new(GateKind::RequirePermission, "permissions_for");
			let permissions = match span.instrument(self.lookup.permissions_for(&ctx)).await {
				Ok(permissions) => permissions,
				Err(e) => {
					let failed = Err(e);

					span.record(gate::observe(GateKind::RequirePermission, &failed));

					return failed;
				},
			};

			if !permissions.contains(&self.code) {
				return Ok(refuse(GateKind::RequirePermission, Rejection::NotPermitted));
			}

			pass(GateKind::RequirePermission);

			self.inner.call(ctx).await
		})
	}
}

fn pass(kind: GateKind) {
	gate::observe(kind, &Ok(Decision::Continue(())));
}

fn refuse<T>(kind: GateKind, rejection: Rejection) -> Decision<T> {
	gate::observe::<()>(kind, &Ok(Decision::Reject(rejection)));

	Decision::Reject(rejection)
}

/// Wraps an async closure as the innermost stage.
pub fn handler<F>(f: F) -> Handler<F> {
	Handler(f)
}

/// Lets `inner` run only for authenticated requests.
pub fn require_authenticated<S>(inner: S) -> RequireAuthenticated<S>
where
	S: Stage<UserContext>,
{
	RequireAuthenticated(inner)
}

/// Lets `inner` run only for authenticated, activated users.
pub fn require_activated<S>(inner: S) -> RequireAuthenticated<RequireActivated<S>>
where
	S: Stage<UserContext>,
{
	require_authenticated(RequireActivated(inner))
}

/// Lets `inner` run only for authenticated, activated users holding `code`.
pub fn require_permission<S>(
	lookup: PermissionLookup,
	code: PermissionCode,
	inner: S,
) -> RequireAuthenticated<RequireActivated<RequirePermission<S>>>
where
	S: Stage<UserContext>,
{
	require_activated(RequirePermission { lookup, code, inner })
}
