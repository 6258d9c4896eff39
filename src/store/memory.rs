//! Thread-safe in-memory repositories for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{
		NewUser, PermissionCode, PermissionSet, TokenHash, TokenRecord, TokenScope, User, UserId,
	},
	store::{
		PermissionRepository, StoreError, StoreFuture, TokenRepository, UniqueField, UpdateOutcome,
		UserRepository,
	},
};

type TokenMap = Arc<RwLock<HashMap<(TokenHash, TokenScope), TokenRecord>>>;
type UserMap = Arc<RwLock<HashMap<UserId, User>>>;
type PermissionMap = Arc<RwLock<HashMap<UserId, PermissionSet>>>;

/// Storage backend that keeps tokens, users, and permission grants in-process.
///
/// Expired tokens are never purged here; callers are expected to check expiry themselves.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	tokens: TokenMap,
	users: UserMap,
	permissions: PermissionMap,
}
impl MemoryStore {
	/// Adds permission codes to `user`'s grants.
	pub fn grant_permissions<I>(&self, user: &UserId, codes: I)
	where
		I: IntoIterator<Item = PermissionCode>,
	{
		let mut guard = self.permissions.write();
		let merged = guard.get(user).cloned().unwrap_or_default().with(codes);

		guard.insert(user.clone(), merged);
	}

	/// Number of token records currently held, expired ones included.
	pub fn token_count(&self) -> usize {
		self.tokens.read().len()
	}

	/// Number of users currently held.
	pub fn user_count(&self) -> usize {
		self.users.read().len()
	}

	fn insert_user_now(users: UserMap, draft: NewUser) -> Result<User, StoreError> {
		let mut guard = users.write();

		if guard.values().any(|existing| existing.name == draft.name) {
			return Err(StoreError::Duplicate { field: UniqueField::Name });
		}
		if guard.values().any(|existing| existing.email.eq_ignore_ascii_case(&draft.email)) {
			return Err(StoreError::Duplicate { field: UniqueField::Email });
		}

		let user = draft.into_user(UserId::generate(), OffsetDateTime::now_utc());

		guard.insert(user.id.clone(), user.clone());

		Ok(user)
	}

	fn update_user_now(users: UserMap, mut user: User) -> Result<UpdateOutcome, StoreError> {
		let mut guard = users.write();
		let current_version = match guard.get(&user.id) {
			Some(existing) => existing.version,
			None => return Ok(UpdateOutcome::Missing),
		};

		if current_version != user.version {
			return Ok(UpdateOutcome::VersionMismatch);
		}
		if guard
			.values()
			.any(|other| other.id != user.id && other.email.eq_ignore_ascii_case(&user.email))
		{
			return Err(StoreError::Duplicate { field: UniqueField::Email });
		}
		if guard.values().any(|other| other.id != user.id && other.name == user.name) {
			return Err(StoreError::Duplicate { field: UniqueField::Name });
		}

		user.version += 1;
		guard.insert(user.id.clone(), user.clone());

		Ok(UpdateOutcome::Updated(user))
	}

	fn delete_for_user_now(tokens: TokenMap, scope: TokenScope, user: UserId) -> u64 {
		let mut guard = tokens.write();
		let before = guard.len();

		guard.retain(|_, record| !(record.scope == scope && record.user_id == user));

		(before - guard.len()) as u64
	}
}
impl TokenRepository for MemoryStore {
	fn insert(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let map = self.tokens.clone();

		Box::pin(async move {
			map.write().insert((record.hash, record.scope), record);

			Ok(())
		})
	}

	fn find<'a>(
		&'a self,
		hash: &'a TokenHash,
		scope: TokenScope,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.tokens.clone();
		let key = (*hash, scope);

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn delete_for_user<'a>(&'a self, scope: TokenScope, user: &'a UserId) -> StoreFuture<'a, u64> {
		let map = self.tokens.clone();
		let user = user.to_owned();

		Box::pin(async move { Ok(Self::delete_for_user_now(map, scope, user)) })
	}
}
impl UserRepository for MemoryStore {
	fn insert(&self, user: NewUser) -> StoreFuture<'_, User> {
		let map = self.users.clone();

		Box::pin(async move { Self::insert_user_now(map, user) })
	}

	fn get_by_id<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<User>> {
		let map = self.users.clone();

		Box::pin(async move { Ok(map.read().get(id).cloned()) })
	}

	fn get_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>> {
		let map = self.users.clone();

		Box::pin(async move {
			Ok(map.read().values().find(|user| user.email.eq_ignore_ascii_case(email)).cloned())
		})
	}

	fn update(&self, user: User) -> StoreFuture<'_, UpdateOutcome> {
		let map = self.users.clone();

		Box::pin(async move { Self::update_user_now(map, user) })
	}
}
impl PermissionRepository for MemoryStore {
	fn permissions_for<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, PermissionSet> {
		let map = self.permissions.clone();

		Box::pin(async move { Ok(map.read().get(user).cloned().unwrap_or_default()) })
	}
}
