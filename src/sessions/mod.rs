pub mod store;
pub mod types;

pub use store::{InMemorySessionStore, SessionHandle, SessionStore};
pub use types::{MAX_HISTORY_TURNS, Session};
