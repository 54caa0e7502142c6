use crate::error::Error;

/// Failure of a session operation, as reported at the controller boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    /// Error carrying a human-readable message.
    #[error("{message}")]
    Structured { message: String, source: Error },

    /// Error without a message; `detail` is its raw rendering.
    #[error("{detail}")]
    Unstructured { detail: String, source: Error },
}

impl AuthFailure {
    /// The error message, for structured failures.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Structured { message, .. } => Some(message),
            Self::Unstructured { .. } => None,
        }
    }

    /// The collaborator error this failure wraps.
    #[must_use]
    pub fn error(&self) -> &Error {
        match self {
            Self::Structured { source, .. } | Self::Unstructured { source, .. } => source,
        }
    }

    /// Emit the diagnostic for a contained failure.
    pub(super) fn report(&self, context: &str) {
        match self {
            Self::Structured { message, .. } => {
                tracing::error!(reason = %message, "{context}");
            }
            Self::Unstructured { detail, .. } => {
                tracing::error!(error = %detail, "{context}");
            }
        }
    }
}

impl From<Error> for AuthFailure {
    fn from(e: Error) -> Self {
        match e.message() {
            Some(message) => Self::Structured { message, source: e },
            None => Self::Unstructured {
                detail: match &e {
                    Error::Opaque(value) => value.to_string(),
                    other => format!("{other:?}"),
                },
                source: e,
            },
        }
    }
}
