//! Infrastructure error type.

use thiserror::Error;

/// The error type returned by warden's fallible setup and serving operations.
///
/// Request-level refusals (404, 500 from the interception stage) are
/// [`Failure`](crate::Failure)s turned into responses, never `Error`s. This
/// type surfaces infrastructure problems: binding a port, accepting a
/// connection, or reading configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {key}: {message}")]
    Config { key: &'static str, message: String },
}

impl Error {
    pub(crate) fn config(key: &'static str, message: impl Into<String>) -> Self {
        Self::Config { key, message: message.into() }
    }
}
