pub mod local_storage;
pub mod preferences;
pub mod session_store;

pub use local_storage::{LocalStorage, SharedStorage};
pub use preferences::{Preferences, Theme};
pub use session_store::{SessionSnapshot, SessionStore};
