//! BusNearby client error types.

/// Errors from the BusNearby HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum BusNearbyError {
    /// Connection to the API failed (after retries, for transient
    /// network errors)
    #[error("connection error: {0}")]
    Connection(String),

    /// Request timed out, including all retries
    #[error("request timed out after {retries} retries")]
    Timeout { retries: u32 },

    /// Identifier unknown to the upstream service
    #[error("stop {0} not known to upstream")]
    NotFound(String),

    /// Response did not match the expected schema
    #[error("malformed response: {message}")]
    Malformed {
        message: String,
        /// Truncated response body, for diagnostics
        body: Option<String>,
    },

    /// API returned an unexpected error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

impl BusNearbyError {
    /// Build a `Malformed` error carrying a truncated body snippet.
    pub(crate) fn malformed(message: impl Into<String>, body: &str) -> Self {
        BusNearbyError::Malformed {
            message: message.into(),
            body: Some(body.chars().take(500).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BusNearbyError::Timeout { retries: 3 };
        assert_eq!(err.to_string(), "request timed out after 3 retries");

        let err = BusNearbyError::NotFound("24068".into());
        assert_eq!(err.to_string(), "stop 24068 not known to upstream");

        let err = BusNearbyError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");
    }

    #[test]
    fn malformed_truncates_body() {
        let body = "x".repeat(2000);
        let err = BusNearbyError::malformed("missing times", &body);
        match err {
            BusNearbyError::Malformed { body: Some(b), .. } => assert_eq!(b.len(), 500),
            _ => panic!("expected malformed error"),
        }
    }
}
