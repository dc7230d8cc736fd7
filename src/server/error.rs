use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::feed::{FetchError, ParseError};
use crate::registry::RegistryError;

/// Body for every 5xx: upstream detail stays in the logs.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to fetch RSS feed";

/// Everything a request can fail with, converted to a status and JSON body
/// at the handler boundary.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Unknown platform or topic
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Upstream unreachable, slow, oversized or non-2xx
    #[error("Upstream fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Upstream body is not a feed of the expected format
    #[error("Upstream parse failed: {0}")]
    Parse(#[from] ParseError),

    /// No route matched
    #[error("Not found")]
    NotFound,
}

/// API error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Registry(_) | RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::Fetch(_) | RelayError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::Registry(e) => e.to_string(),
            RelayError::NotFound => self.to_string(),
            RelayError::Fetch(_) | RelayError::Parse(_) => UPSTREAM_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FeedFormat;

    fn parse_error() -> ParseError {
        crate::feed::parse_feed(b"<broken", FeedFormat::Rss).unwrap_err()
    }

    #[test]
    fn test_registry_errors_are_404_with_distinct_messages() {
        let platform = RelayError::from(RegistryError::PlatformNotFound);
        let topic = RelayError::from(RegistryError::TopicNotFound);
        assert_eq!(platform.status(), StatusCode::NOT_FOUND);
        assert_eq!(topic.status(), StatusCode::NOT_FOUND);
        assert_eq!(platform.public_message(), "Platform not found");
        assert_eq!(topic.public_message(), "Topic not found");
    }

    #[test]
    fn test_upstream_errors_are_opaque_500() {
        let fetch = RelayError::from(FetchError::HttpStatus(502));
        let parse = RelayError::from(parse_error());
        for err in [fetch, parse] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.public_message(), UPSTREAM_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_internal_display_keeps_cause() {
        let err = RelayError::from(FetchError::HttpStatus(502));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_into_response_status() {
        let response = RelayError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = RelayError::from(FetchError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
