//! Authentication error types.

use super::validation::ValidationError;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected before any network call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Non-2xx response other than 401
    #[error("{message}")]
    Api { status: u16, message: String },

    /// 401 response; the local session has already been torn down
    #[error("{message}")]
    Unauthorized { message: String },

    /// Request could not be sent or the response could not be read
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Success response whose body did not match the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// A newer login, registration or logout overtook this request
    #[error("Request superseded by a newer authentication change")]
    Superseded,
}

impl AuthError {
    /// Whether this error came from a 401 response
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized { .. })
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Api { status, .. } => Some(*status),
            AuthError::Unauthorized { .. } => Some(401),
            AuthError::Network(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Human-readable message suitable for display, if one is available.
    ///
    /// Transport and decoding details are not shown to the user; the
    /// caller substitutes its own fallback text for those.
    pub fn client_message(&self) -> Option<String> {
        match self {
            AuthError::Network(_) | AuthError::InvalidResponse(_) => None,
            AuthError::Api { message, .. } | AuthError::Unauthorized { message }
                if message.trim().is_empty() =>
            {
                None
            }
            _ => Some(self.to_string()),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_server_message() {
        let err = AuthError::Api {
            status: 400,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(err.client_message().as_deref(), Some("Invalid credentials"));
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_blank_api_message_has_no_client_message() {
        let err = AuthError::Api {
            status: 500,
            message: "  ".to_string(),
        };
        assert!(err.client_message().is_none());
    }

    #[test]
    fn test_invalid_response_is_hidden_from_client() {
        let err = AuthError::InvalidResponse("missing field `token`".to_string());
        assert!(err.client_message().is_none());
    }

    #[test]
    fn test_unauthorized() {
        let err = AuthError::Unauthorized {
            message: "Token expired".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_validation_is_transparent() {
        let err = AuthError::from(ValidationError::PasswordMismatch);
        assert_eq!(err.to_string(), ValidationError::PasswordMismatch.to_string());
    }
}
