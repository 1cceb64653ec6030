//! Lexo - command line session client
//!
//! Wires the reqwest transport, token persistence and session state into an
//! [`AuthenticatedClient`](lexo_application::AuthenticatedClient) and runs
//! one command against it.

pub mod cli;
mod runner;

pub use cli::{Cli, Command};
pub use runner::{App, AppError};
