pub mod poller;
pub mod session;
pub mod session_store;
pub mod traits;

pub use poller::{PollLoop, PollStats};
pub use session::SessionManager;
pub use session_store::{FileSessionStore, SessionStore, SessionStoreError};
pub use traits::SearchTransport;
