//! Error type shared by the Buildkite client and the entity mappers

use thiserror::Error;

/// Errors raised while talking to Buildkite or converting its entities
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP request could not be sent or did not complete
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Io(#[source] reqwest::Error),

    /// The response is not valid JSON, or does not fit the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response does not follow the expected protocol
    #[error("{0}")]
    Protocol(String),

    /// The REST API answered with a non-success status
    #[error("API error (status {status}): {body}")]
    Status { status: u16, body: String },

    /// A `key=value` entry lacks its `=` separator
    #[error("Malformed metadata entry `{0}`: expected `key=value`")]
    MalformedMetadata(String),

    /// Reading this kind of entity is not wired to the API yet
    #[error("Reading {0} is not implemented")]
    NotImplemented(&'static str),

    /// The provider configuration is incomplete
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MalformedMetadata("queue".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed metadata entry `queue`: expected `key=value`"
        );

        let err = Error::Status {
            status: 401,
            body: "Authentication required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (status 401): Authentication required"
        );

        let err = Error::NotImplemented("teams");
        assert_eq!(err.to_string(), "Reading teams is not implemented");
    }

    #[test]
    fn test_decode_error_from_serde() {
        let err: Error = serde_json::from_str::<Vec<String>>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
