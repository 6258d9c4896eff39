//! Auth-domain identifiers, token scopes, permission sets, tokens, passwords, and users.

pub mod id;
pub mod password;
pub mod permission;
pub mod scope;
pub mod secret;
pub mod token;
pub mod user;

pub use id::*;
pub use password::*;
pub use permission::*;
pub use scope::*;
pub use secret::*;
pub use token::{codec::*, hash::*, record::*};
pub use user::*;
