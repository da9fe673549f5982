//! Session (passport) management
//!
//! The store is the only writer of the cached identity; the storage backends
//! hold its durable copy.

mod storage;
mod store;
mod types;

pub use storage::{FilePassportStorage, MemoryPassportStorage, PassportStorage};
pub use store::{PassportStore, RestoreOutcome};
pub use types::{Credentials, DEFAULT_AVATAR_URL, Passport, Registration};
