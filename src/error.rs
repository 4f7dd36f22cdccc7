// Error types for the migration library.
//
// The interactive layer (`ui`, `main`) works with `anyhow` like the rest of
// the CLI; everything below it returns `MigrateError` so callers can tell
// an HTTP rejection apart from a broken archive or a missing session.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Debug, Error)]
pub enum MigrateError {
    /// The instance answered with a non-success status.
    #[error("{name} failed: {status} - {body}")]
    Http {
        name: String,
        status: StatusCode,
        body: String,
    },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("{name} request could not be sent: {source}")]
    Network {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A success response that lacks a field the workflow depends on.
    #[error("{name} returned an unexpected response: {reason}")]
    UnexpectedResponse { name: String, reason: String },

    #[error("Session expired and could not be refreshed, please authenticate again")]
    SessionExpired,

    #[error("Not authenticated to an instance")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive '{path}' is not a valid client ZIP: {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    #[error("File '{path}' is invalid: {reason}")]
    InvalidFile { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    /// Status code of an HTTP rejection, if this error is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
