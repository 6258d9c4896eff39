// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use time::{Duration, macros};
// self
use api_gatekeeper::{
	auth::{
		NewUser, TOKEN_PLAINTEXT_LEN, TokenCodec, TokenHash, TokenRecord, TokenScope, User, UserId,
	},
	error::Error,
	gate::Authenticator,
	store::{
		MemoryStore, StoreError, StoreFuture, TokenRepository, UpdateOutcome, UserRepository,
	},
	tokens::TokenStore,
};

fn user(id: &str) -> UserId {
	UserId::new(id).expect("User fixture should be valid.")
}

fn token_store() -> (TokenStore, Arc<MemoryStore>) {
	let memory = Arc::new(MemoryStore::default());

	(TokenStore::new(memory.clone(), StdDuration::from_secs(5)), memory)
}

#[tokio::test]
async fn round_trip_resolves_the_issuing_user_for_every_scope() {
	let (store, _) = token_store();
	let ada = user("ada");

	for scope in [TokenScope::Authentication, TokenScope::Activation] {
		let token =
			store.issue(&ada, Duration::hours(1), scope).await.expect("Issuing should succeed.");

		assert_eq!(token.plaintext.len(), TOKEN_PLAINTEXT_LEN);
		assert_eq!(
			store.get(scope, token.plaintext.expose()).await.expect("Token should resolve."),
			ada
		);
	}
}

#[tokio::test]
async fn wrong_scope_is_indistinguishable_from_missing() {
	let (store, _) = token_store();
	let token = store
		.issue(&user("ada"), Duration::hours(1), TokenScope::Activation)
		.await
		.expect("Issuing should succeed.");
	let wrong_scope = store
		.get(TokenScope::Authentication, token.plaintext.expose())
		.await
		.expect_err("Wrong scope should not resolve.");
	let missing = store
		.get(TokenScope::Authentication, &"Z".repeat(TOKEN_PLAINTEXT_LEN))
		.await
		.expect_err("Unknown token should not resolve.");

	assert!(wrong_scope.is_not_found());
	assert!(missing.is_not_found());
	assert_eq!(wrong_scope.to_string(), missing.to_string());
}

#[tokio::test]
async fn expired_tokens_never_resolve_even_when_still_stored() {
	let (store, memory) = token_store();
	let issued_at = macros::datetime!(2025-06-01 12:00 UTC);
	let token = TokenCodec::generate_at(
		&user("ada"),
		Duration::hours(24),
		TokenScope::Authentication,
		issued_at,
	);

	store.insert(&token).await.expect("Insert should succeed.");

	// Long past its expiry.
	let err = store
		.get(TokenScope::Authentication, token.plaintext.expose())
		.await
		.expect_err("Expired token should not resolve.");

	assert!(err.is_not_found());
	assert_eq!(memory.token_count(), 1);
	let before_expiry = issued_at + Duration::hours(23);

	assert!(
		store
			.get_at(TokenScope::Authentication, token.plaintext.expose(), before_expiry)
			.await
			.is_ok()
	);
}

#[tokio::test]
async fn only_the_hash_is_persisted() {
	let (store, memory) = token_store();
	let token = store
		.issue(&user("ada"), Duration::hours(1), TokenScope::Authentication)
		.await
		.expect("Issuing should succeed.");
	let record = memory
		.find(&TokenHash::of(token.plaintext.expose()), TokenScope::Authentication)
		.await
		.expect("Lookup should succeed.")
		.expect("Record should exist.");
	let stored = serde_json::to_string(&record).expect("Record should serialize.");

	assert!(!stored.contains(token.plaintext.expose()));
	assert_eq!(record, token.record);
}

#[tokio::test]
async fn delete_all_for_user_reports_nothing_to_revoke() {
	let (store, _) = token_store();
	let ada = user("ada");

	for _ in 0..2 {
		store.issue(&ada, Duration::hours(1), TokenScope::Activation).await.expect("Issue.");
	}

	assert_eq!(
		store.delete_all_for_user(TokenScope::Activation, &ada).await.expect("Delete should work."),
		2
	);
	assert!(
		store
			.delete_all_for_user(TokenScope::Activation, &ada)
			.await
			.expect_err("Nothing should remain.")
			.is_not_found()
	);
}

struct Unreachable;
impl TokenRepository for Unreachable {
	fn insert(&self, _: TokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async { Err(StoreError::Backend { message: "connection refused".into() }) })
	}

	fn find<'a>(
		&'a self,
		_: &'a TokenHash,
		_: TokenScope,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async { Err(StoreError::Backend { message: "connection refused".into() }) })
	}

	fn delete_for_user<'a>(&'a self, _: TokenScope, _: &'a UserId) -> StoreFuture<'a, u64> {
		Box::pin(std::future::pending())
	}
}

#[tokio::test(start_paused = true)]
async fn store_failures_and_stalls_are_server_errors() {
	let store = TokenStore::new(Arc::new(Unreachable), StdDuration::from_millis(100));
	let lookup = store
		.get(TokenScope::Authentication, &"A".repeat(TOKEN_PLAINTEXT_LEN))
		.await
		.expect_err("Backend failure should surface.");
	let delete = store
		.delete_all_for_user(TokenScope::Activation, &user("ada"))
		.await
		.expect_err("Stalled delete should time out.");

	assert!(matches!(lookup, Error::Storage(StoreError::Backend { .. })));
	assert!(matches!(delete, Error::Timeout { .. }));
	assert!(lookup.is_server_error() && delete.is_server_error());
}

struct StalledUsers;
impl UserRepository for StalledUsers {
	fn insert(&self, _: NewUser) -> StoreFuture<'_, User> {
		Box::pin(std::future::pending())
	}

	fn get_by_id<'a>(&'a self, _: &'a UserId) -> StoreFuture<'a, Option<User>> {
		Box::pin(std::future::pending())
	}

	fn get_by_email<'a>(&'a self, _: &'a str) -> StoreFuture<'a, Option<User>> {
		Box::pin(std::future::pending())
	}

	fn update(&self, _: User) -> StoreFuture<'_, UpdateOutcome> {
		Box::pin(std::future::pending())
	}
}

#[tokio::test(start_paused = true)]
async fn authenticator_reports_backend_trouble_as_errors_not_rejections() {
	let timeout = StdDuration::from_millis(100);
	let header = format!("Bearer {}", "A".repeat(TOKEN_PLAINTEXT_LEN));
	let unreachable_tokens = Authenticator::new(
		TokenStore::new(Arc::new(Unreachable), timeout),
		Arc::new(MemoryStore::default()),
		timeout,
	)
	.authenticate(Some(&header))
	.await
	.expect_err("Token backend failure should not become a rejection.");

	assert!(matches!(unreachable_tokens, Error::Storage(StoreError::Backend { .. })));

	let (tokens, _) = token_store();
	let token = tokens
		.issue(&user("ada"), Duration::hours(1), TokenScope::Authentication)
		.await
		.expect("Issuing should succeed.");
	let stalled_users = Authenticator::new(tokens, Arc::new(StalledUsers), timeout)
		.authenticate(Some(&format!("Bearer {}", token.plaintext.expose())))
		.await
		.expect_err("Stalled user lookup should time out.");

	assert!(matches!(stalled_users, Error::Timeout { operation: "user lookup" }));
	assert!(unreachable_tokens.is_server_error() && stalled_users.is_server_error());
}
