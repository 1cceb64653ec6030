//! Session state holder.

mod state;

pub use state::{AuthStatus, SessionState};
