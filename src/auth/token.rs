//! Bearer token generation, hashing, and persisted records.

pub mod codec;
pub mod hash;
pub mod record;
