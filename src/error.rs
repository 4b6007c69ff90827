//! Error taxonomy shared by every component
//!
//! Three families surface to the user:
//! - validation errors, detected locally before any network call
//! - transport errors, when the backend cannot be reached at all
//! - server errors, when the backend answers with a non-2xx status
//!
//! Storage and serialization errors come from the local key-value store.

use thiserror::Error;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a query and select a database";
pub const NO_RESULTS_MESSAGE: &str = "No results returned";
pub const DUPLICATE_CONNECTION_MESSAGE: &str = "This database connection already exists.";
pub const BACKEND_UNAVAILABLE_MESSAGE: &str =
    "Cannot connect to the backend API. Please check if the backend server is running.";

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{}", DUPLICATE_CONNECTION_MESSAGE)]
    DuplicateConnection,

    #[error("{}", EMPTY_QUERY_MESSAGE)]
    EmptyQuery,

    #[error("{}", NO_RESULTS_MESSAGE)]
    NoResults,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{}", BACKEND_UNAVAILABLE_MESSAGE)]
    BackendUnavailable,

    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_messages() {
        assert_eq!(
            Error::EmptyQuery.to_string(),
            "Please enter a query and select a database"
        );
        assert_eq!(Error::NoResults.to_string(), "No results returned");
        assert!(Error::DuplicateConnection
            .to_string()
            .contains("already exists"));
    }

    #[test]
    fn test_server_error_is_verbatim() {
        let err = Error::Server {
            status: 400,
            message: "Database does not exist".to_string(),
        };
        assert_eq!(err.to_string(), "Database does not exist");
    }
}
