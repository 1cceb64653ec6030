//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line client for the Lexo platform API.
#[derive(Debug, Parser)]
#[command(name = "lexo")]
#[command(version)]
#[command(about = "Lexo session client")]
pub struct Cli {
    /// Configuration file (defaults to ./lexo.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep tokens in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations against the API.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Signs in with email and password
    SignIn {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long, env = "LEXO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Creates an account
    SignUp {
        /// Display name
        #[arg(long)]
        name: String,
        /// Account email
        #[arg(long)]
        email: String,
        /// Chosen password
        #[arg(long, env = "LEXO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Signs in with a Google ID token
    Google {
        /// ID token issued by Google Sign-In
        #[arg(long, value_name = "TOKEN")]
        id_token: String,
    },
    /// Signs out and forgets the stored tokens
    SignOut,
    /// Requests a reset code, or sets a new password with one
    ResetPassword {
        /// Account email
        #[arg(long)]
        email: String,
        /// Code received by email
        #[arg(long, requires = "new_password")]
        code: Option<String>,
        /// New password
        #[arg(long, requires = "code")]
        new_password: Option<String>,
    },
    /// Shows whether a session is stored
    Status,
    /// Sends an authenticated GET
    Get {
        /// Path relative to the base URL
        path: String,
    },
    /// Sends an authenticated POST
    Post {
        /// Path relative to the base URL
        path: String,
        /// JSON body
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
}
