//! Session persistence and the cross-instance logout signal.

pub mod signal;
pub mod storage;
pub mod store;

pub use signal::{BroadcastLogoutSignal, LogoutEvent, LogoutReason, LogoutSignal};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{Session, SessionStore, TOKEN_KEY, USER_KEY};
