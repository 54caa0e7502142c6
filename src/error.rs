#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The auth service answered with a non-success status.
    #[error("{operation} failed: {}", .message.as_deref().unwrap_or("no error message"))]
    Api {
        operation: &'static str,
        status: Option<u16>,
        message: Option<String>,
        code: Option<String>,
    },
    #[cfg(feature = "rest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// A collaborator failed with a payload that carries no message.
    #[error("unstructured error: {0}")]
    Opaque(serde_json::Value),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Human-readable message carried by the error, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Api { message, .. } => message.clone(),
            #[cfg(feature = "rest")]
            Self::Http(e) => Some(e.to_string()),
            Self::Opaque(value) => value
                .get("message")
                .and_then(|v| v.as_str())
                .map(str::to_owned),
            Self::Config(msg) => Some(msg.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message() {
        let err = Error::Api {
            operation: "login",
            status: Some(401),
            message: Some("Invalid user credentials.".into()),
            code: Some("INVALID_CREDENTIALS".into()),
        };
        assert_eq!(err.message().as_deref(), Some("Invalid user credentials."));
        assert_eq!(err.to_string(), "login failed: Invalid user credentials.");
    }

    #[test]
    fn api_error_without_message() {
        let err = Error::Api {
            operation: "refresh",
            status: Some(500),
            message: None,
            code: None,
        };
        assert!(err.message().is_none());
        assert_eq!(err.to_string(), "refresh failed: no error message");
    }

    #[test]
    fn opaque_error_picks_up_message_field() {
        let err = Error::Opaque(serde_json::json!({ "message": "invalid credentials" }));
        assert_eq!(err.message().as_deref(), Some("invalid credentials"));

        let err = Error::Opaque(serde_json::json!(42));
        assert!(err.message().is_none());
    }
}
