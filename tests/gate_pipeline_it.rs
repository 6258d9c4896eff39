// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use time::Duration;
// self
use api_gatekeeper::{
	auth::{NewUser, Password, PasswordHash, PermissionCode, TokenScope, User},
	config::GatekeeperConfig,
	error::Error,
	gate::{
		Decision, IncomingRequest, PermissionLookup, Pipeline, Rejection, RequestContext, Stage,
		UserContext, handler, require_activated, require_authenticated, require_permission,
	},
	store::{MemoryStore, UpdateOutcome, UserRepository},
	tokens::TokenStore,
};

const PHC: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$2nqdrG9mJkNpp+NLyQ2+KRYzMIqJp+F/YUDuMxdJhsg";
const CLIENT: &str = "203.0.113.5:51000";

struct Fixture {
	memory: Arc<MemoryStore>,
	tokens: TokenStore,
	pipeline: Pipeline,
}
impl Fixture {
	fn new() -> Self {
		let config = GatekeeperConfig::default();
		let memory = Arc::new(MemoryStore::default());
		let tokens = TokenStore::new(memory.clone(), config.store_timeout());
		let pipeline = Pipeline::from_config(&config, tokens.clone(), memory.clone())
			.expect("Default configuration should be valid.");

		Self { memory, tokens, pipeline }
	}

	fn lookup(&self) -> PermissionLookup {
		PermissionLookup::new(self.memory.clone(), StdDuration::from_secs(5))
	}

	async fn user(&self, name: &str, activated: bool) -> User {
		let hash = PasswordHash::from_phc(PHC).expect("PHC fixture should parse.");
		let draft = NewUser::new(name, format!("{name}@x.com"))
			.with_password(Password::hashed("correct-horse", hash));
		let user = UserRepository::insert(self.memory.as_ref(), draft)
			.await
			.expect("Insert should succeed.");

		if !activated {
			return user;
		}

		match UserRepository::update(self.memory.as_ref(), User { activated: true, ..user })
			.await
			.expect("Update should succeed.")
		{
			UpdateOutcome::Updated(user) => user,
			other => panic!("Unexpected update outcome {other:?}."),
		}
	}

	async fn bearer(&self, user: &User) -> String {
		let token = self
			.tokens
			.issue(&user.id, Duration::hours(24), TokenScope::Authentication)
			.await
			.expect("Issuing should succeed.");

		format!("Bearer {}", token.plaintext.expose())
	}

	async fn run<S>(&self, authorization: Option<&str>, route: &S) -> Decision<S::Output>
	where
		S: Stage<RequestContext>,
	{
		let mut request = IncomingRequest::new(CLIENT);

		if let Some(authorization) = authorization {
			request = request.with_authorization(authorization);
		}

		self.pipeline.run(request, route).await.into_result().expect("Pipeline should evaluate.")
	}
}

fn greet() -> impl Stage<UserContext, Output = String> {
	handler(|ctx: UserContext| async move { Ok(format!("hello {}", ctx.user.name)) })
}

#[tokio::test]
async fn anonymous_requests_reach_open_routes_but_not_protected_ones() {
	let fixture = Fixture::new();
	let open = handler(|ctx: RequestContext| async move { Ok(ctx.identity.is_anonymous()) });

	assert_eq!(fixture.run(None, &open).await, Decision::Continue(true));
	assert_eq!(
		fixture.run(None, &require_authenticated(greet())).await,
		Decision::Reject(Rejection::AuthenticationRequired)
	);
}

#[tokio::test]
async fn invalid_credentials_stop_before_the_route() {
	let fixture = Fixture::new();
	let calls = Arc::new(AtomicUsize::new(0));
	let counted = calls.clone();
	let open = handler(move |_: RequestContext| {
		counted.fetch_add(1, Ordering::SeqCst);

		async { Ok(()) }
	});
	let outcome = fixture
		.pipeline
		.run(IncomingRequest::new(CLIENT).with_authorization("Bearer nope"), &open)
		.await;

	assert_eq!(outcome.decision(), Some(&Decision::Reject(Rejection::InvalidAuthenticationToken)));
	assert!(outcome.headers.contains(&("Vary", "Authorization")));
	assert!(outcome.headers.contains(&("WWW-Authenticate", "Bearer")));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_outcome_advertises_vary_authorization() {
	let fixture = Fixture::new();
	let open = handler(|_: RequestContext| async { Ok(()) });

	for _ in 0..5 {
		let outcome = fixture.pipeline.run(IncomingRequest::new(CLIENT), &open).await;

		assert!(outcome.result.is_ok());
		assert!(outcome.headers.contains(&("Vary", "Authorization")));
	}
}

#[tokio::test]
async fn activation_is_required_even_with_the_right_permission() {
	let fixture = Fixture::new();
	let pending = fixture.user("pending", false).await;
	let code = PermissionCode::new("movies:write").expect("Permission fixture should be valid.");

	fixture.memory.grant_permissions(&pending.id, [code.clone()]);

	let header = fixture.bearer(&pending).await;

	assert_eq!(
		fixture.run(Some(&header), &require_activated(greet())).await,
		Decision::Reject(Rejection::InactiveAccount)
	);
	assert_eq!(
		fixture.run(Some(&header), &require_permission(fixture.lookup(), code, greet())).await,
		Decision::Reject(Rejection::InactiveAccount)
	);
	assert_eq!(
		fixture.run(Some(&header), &require_authenticated(greet())).await,
		Decision::Continue("hello pending".to_owned())
	);
}

#[tokio::test]
async fn permission_gate_admits_only_holders_of_the_code() {
	let fixture = Fixture::new();
	let reader = fixture.user("reader", true).await;
	let writer = fixture.user("writer", true).await;
	let read = PermissionCode::new("movies:read").expect("Permission fixture should be valid.");
	let write = PermissionCode::new("movies:write").expect("Permission fixture should be valid.");

	fixture.memory.grant_permissions(&reader.id, [read.clone()]);
	fixture.memory.grant_permissions(&writer.id, [read, write.clone()]);

	let route = require_permission(fixture.lookup(), write, greet());
	let reader_header = fixture.bearer(&reader).await;
	let writer_header = fixture.bearer(&writer).await;

	assert_eq!(
		fixture.run(Some(&reader_header), &route).await,
		Decision::Reject(Rejection::NotPermitted)
	);
	assert_eq!(
		fixture.run(Some(&writer_header), &route).await,
		Decision::Continue("hello writer".to_owned())
	);
	assert_eq!(fixture.run(None, &route).await, Decision::Reject(Rejection::AuthenticationRequired));
}

#[tokio::test]
async fn rate_limit_runs_before_authentication() {
	let fixture = Fixture::new();
	let open = handler(|_: RequestContext| async { Ok(()) });

	for _ in 0..4 {
		fixture.run(Some("Bearer nope"), &open).await;
	}

	assert_eq!(
		fixture.run(Some("Bearer nope"), &open).await,
		Decision::Reject(Rejection::RateLimited)
	);
}

#[tokio::test]
async fn handler_errors_and_bad_addresses_are_server_errors() {
	let fixture = Fixture::new();
	let failing = handler(|_: RequestContext| async { Err::<(), _>(Error::NotFound) });
	let err = fixture
		.pipeline
		.run(IncomingRequest::new(CLIENT), &failing)
		.await
		.into_result()
		.expect_err("Handler error should propagate.");

	assert!(err.is_not_found());

	let err = fixture
		.pipeline
		.run(IncomingRequest::new("unix-socket"), &failing)
		.await
		.into_result()
		.expect_err("Malformed address should fail.");

	assert!(matches!(err, Error::ClientAddress { .. }));
}

#[tokio::test]
async fn failed_evaluations_still_advertise_vary_authorization() {
	let fixture = Fixture::new();
	let stalled =
		handler(|_: RequestContext| async { Err::<(), _>(Error::Timeout { operation: "report" }) });

	for remote_addr in [CLIENT, "unix-socket"] {
		let outcome = fixture.pipeline.run(IncomingRequest::new(remote_addr), &stalled).await;

		assert!(outcome.result.is_err_and(|e| e.is_server_error()), "{remote_addr}");
		assert_eq!(outcome.headers, [("Vary", "Authorization")]);
	}
}
