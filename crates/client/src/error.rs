use academy_core::validation::ValidationFailure;
use serde::Deserialize;

/// Errors surfaced by the HTTP collaborator.
///
/// Cloneable so the list controller can keep the last one in its state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The server rejected the payload (400 with a failure list).
    #[error("Validation failed for {} propert(ies)", .0.len())]
    Validation(Vec<ValidationFailure>),

    /// Credentials missing or expired (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response.
    #[error("API error ({status}) {code}: {message}")]
    Http {
        status: u16,
        code: String,
        message: String,
    },

    /// The request never produced a response (connect, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// The `{error, code}` body the server sends for non-validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: String,
}

impl TransportError {
    /// HTTP status behind the error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Validation(_) => Some(400),
            TransportError::Unauthorized(_) => Some(401),
            TransportError::NotFound(_) => Some(404),
            TransportError::Http { status, .. } => Some(*status),
            TransportError::Network(_) | TransportError::Decode(_) => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, TransportError::Unauthorized(_))
    }

    /// Classify a non-2xx response from its status and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 400 {
            if let Ok(failures) = serde_json::from_str::<Vec<ValidationFailure>>(body) {
                return TransportError::Validation(failures);
            }
        }

        let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => (parsed.code, parsed.error),
            Err(_) => (String::new(), body.to_string()),
        };

        match status {
            401 => TransportError::Unauthorized(message),
            404 => TransportError::NotFound(message),
            _ => TransportError::Http {
                status,
                code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
