pub mod state;
pub mod history;
pub mod store;

pub use state::{SessionState, Stage};
pub use history::{SessionHistory, SessionEvent, SessionEventType};
pub use store::{SessionHandle, SessionStore};
