use std::net::SocketAddr;

use thiserror::Error;
use tickerdesk_core::{HttpError, ValidationError};

/// Account store failures, shown to the user verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Enter username and password")]
    MissingCredentials,
    #[error("User '{username}' already exists")]
    Conflict { username: String },
    #[error("Invalid username or password")]
    Authentication,
}

/// Returned by protected operations while nobody is logged in.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("login required")]
pub struct AccessDenied;

/// The selected ticker could not be turned into a provider symbol; nothing
/// else is fetched for it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Error creating ticker '{ticker}': {source}")]
pub struct SnapshotError {
    pub ticker: String,
    #[source]
    pub source: ValidationError,
}

/// Startup failures of the `tickerdesk` binary, mapped to exit codes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("http client setup failed: {0}")]
    HttpClient(#[from] HttpError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ServerError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::HttpClient(_) => 3,
            Self::Bind { .. } => 10,
            Self::Serve(_) => 11,
        }
    }
}
